use ratatui::{
    layout::Alignment,
    prelude::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

use super::UiComponent;
use crate::data::ConnectionStatus;

impl UiComponent {
    pub fn status(status: ConnectionStatus) -> Paragraph<'static> {
        let (label, color) = match status {
            ConnectionStatus::Connected => ("● Connected", Color::Green),
            ConnectionStatus::Loading => ("◌ Connecting...", Color::Yellow),
            ConnectionStatus::Error => ("● Connection Error", Color::Red),
        };

        Paragraph::new(label)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color))
                    .title(" Status "),
            )
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
    }
}
