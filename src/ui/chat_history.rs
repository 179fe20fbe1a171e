use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Paragraph, Widget, Wrap},
};

use crate::app::App;
use crate::chat::Role;

pub fn render_chat_history(app: &App, area: Rect, buf: &mut Buffer) {
    let messages = app.chat.messages();

    let content = if messages.is_empty() {
        Text::from("Connecting to your advisor...")
    } else {
        let mut lines = Vec::new();

        for msg in messages {
            let (prefix, prefix_style) = match msg.role {
                Role::User => ("You: ", Style::default().fg(Color::Cyan)),
                Role::Assistant if msg.is_error => ("Advisor: ", Style::default().fg(Color::Red)),
                Role::Assistant => ("Advisor: ", Style::default().fg(Color::Green)),
            };
            let body_style = if msg.is_error {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::White)
            };

            let content_lines: Vec<String> = msg.content.lines().map(|s| s.to_string()).collect();
            let first_line = content_lines.first().cloned().unwrap_or_default();

            lines.push(Line::from(vec![
                Span::styled(
                    format!("[{}] ", msg.timestamp.format("%H:%M")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(prefix, prefix_style.add_modifier(Modifier::BOLD)),
                Span::styled(first_line, body_style),
            ]));

            for line in content_lines.into_iter().skip(1) {
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(line, body_style),
                ]));
            }
            lines.push(Line::from(""));
        }
        Text::from(lines)
    };

    let chat_widget = Paragraph::new(content)
        .block(
            Block::bordered()
                .title("Conversation (↑↓ to scroll)")
                .border_type(BorderType::Rounded),
        )
        .wrap(Wrap { trim: true })
        .scroll((app.chat.scroll_offset() as u16, 0));

    chat_widget.render(area, buf);
}
