use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    widgets::{Block, BorderType, Paragraph, Widget},
};

use crate::app::App;
use crate::ui::chat_history;

const SPINNER_FRAMES: [&str; 4] = ["   ", ".  ", ".. ", "..."];

pub fn render_advisor(app: &App, area: Rect, buf: &mut Buffer) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(1),    // Chat history
            Constraint::Length(1), // Thinking indicator
            Constraint::Length(3), // Input box
            Constraint::Length(3), // Help
        ])
        .split(area);

    // Title
    let title = Paragraph::new("💬 FinanceBot Pro - AI Financial Advisor")
        .block(
            Block::bordered()
                .title("Advisor")
                .title_alignment(Alignment::Center)
                .border_type(BorderType::Rounded),
        )
        .fg(Color::Green)
        .alignment(Alignment::Center);
    title.render(main_layout[0], buf);

    // Chat history
    chat_history::render_chat_history(app, main_layout[1], buf);

    // Thinking indicator, only while a send is in flight
    if app.chat.is_busy() {
        let dots = SPINNER_FRAMES[app.spinner_frame % SPINNER_FRAMES.len()];
        let thinking = Paragraph::new(format!("  Advisor is thinking{}", dots)).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::ITALIC),
        );
        thinking.render(main_layout[2], buf);
    }

    // Input box
    let input_text = format!("> {}", app.chat.input());
    let input_widget = Paragraph::new(input_text)
        .block(
            Block::bordered()
                .title("Ask about investments, markets, or planning")
                .border_type(BorderType::Rounded),
        )
        .fg(Color::Yellow);
    input_widget.render(main_layout[3], buf);

    // Help
    let help = Paragraph::new("Enter: Send • ↑↓: Scroll • Ctrl+L: Clear chat • Esc: Dashboard")
        .block(
            Block::bordered()
                .title("Controls")
                .border_type(BorderType::Rounded),
        )
        .fg(Color::Yellow)
        .alignment(Alignment::Center);
    help.render(main_layout[4], buf);
}
