use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Paragraph, Widget, Wrap},
};

use crate::app::App;
use crate::ui::components::UiComponent;

pub fn render_dashboard(app: &App, area: Rect, buf: &mut Buffer) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(1),    // Content
            Constraint::Length(3), // Status/Help
        ])
        .split(area);

    // Title
    let title = Paragraph::new("📈 FinanceBot Pro - Market Dashboard")
        .block(
            Block::bordered()
                .title("FinanceBot Pro")
                .title_alignment(Alignment::Center)
                .border_type(BorderType::Rounded),
        )
        .fg(Color::Green)
        .alignment(Alignment::Center);
    title.render(main_layout[0], buf);

    // Content area split between market quotes and the portfolio
    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55), // Market
            Constraint::Percentage(45), // Portfolio
        ])
        .split(main_layout[1]);

    render_market_panel(app, content_layout[0], buf);
    render_portfolio_panel(app, content_layout[1], buf);

    // Status badge and help text
    let bottom_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(26), Constraint::Min(1)])
        .split(main_layout[2]);

    UiComponent::status(app.status).render(bottom_layout[0], buf);

    let help = Paragraph::new("'a'/Enter: Advisor • 'r': Refresh • 'q': Quit")
        .block(
            Block::bordered()
                .title("Controls")
                .border_type(BorderType::Rounded),
        )
        .fg(Color::Yellow)
        .alignment(Alignment::Center);
    help.render(bottom_layout[1], buf);
}

fn render_market_panel(app: &App, area: Rect, buf: &mut Buffer) {
    if app.market.is_empty() {
        let empty_msg = Paragraph::new("Loading market data...")
            .block(
                Block::bordered()
                    .title("Market")
                    .border_type(BorderType::Rounded),
            )
            .fg(Color::Yellow)
            .alignment(Alignment::Center);
        empty_msg.render(area, buf);
        return;
    }

    let mut lines = vec![
        Line::from(Span::styled(
            format!(
                "{:<8} {:>12} {:>10} {:>10}",
                "Symbol", "Price", "Change", "Change %"
            ),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    // HashMap iteration order is arbitrary; sort for a stable display.
    let mut symbols: Vec<&String> = app.market.keys().collect();
    symbols.sort();

    for symbol in symbols {
        let quote = &app.market[symbol];
        let change_style = if quote.change.starts_with('-') {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };

        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<8} ", symbol),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("{:>11.2} ", quote.price)),
            Span::styled(format!("{:>9} ", quote.change), change_style),
            Span::styled(format!("{:>9}", quote.change_percent), change_style),
        ]));
    }

    let market_widget = Paragraph::new(Text::from(lines)).block(
        Block::bordered()
            .title("Market")
            .border_type(BorderType::Rounded),
    );
    market_widget.render(area, buf);
}

fn render_portfolio_panel(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(portfolio) = &app.portfolio else {
        let empty_msg = Paragraph::new("Loading portfolio...")
            .block(
                Block::bordered()
                    .title("Portfolio")
                    .border_type(BorderType::Rounded),
            )
            .fg(Color::Yellow)
            .alignment(Alignment::Center);
        empty_msg.render(area, buf);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Total Value: ${:.2}", portfolio.total_value),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::raw(format!(
                "Total Return: {}   ",
                portfolio.performance.total_return
            )),
            Span::raw(format!("Today: {}", portfolio.performance.daily_change)),
        ]),
        Line::from(""),
    ];

    for asset in &portfolio.assets {
        let gain_style = if asset.current_price >= asset.avg_price {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Red)
        };

        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<8}", asset.symbol),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("{:>8.0} sh ", asset.shares)),
            Span::raw(format!("@ {:>8.2} ", asset.avg_price)),
            Span::styled(format!("now {:>8.2}", asset.current_price), gain_style),
        ]));
    }

    let portfolio_widget = Paragraph::new(Text::from(lines))
        .block(
            Block::bordered()
                .title("Portfolio")
                .border_type(BorderType::Rounded),
        )
        .wrap(Wrap { trim: true });
    portfolio_widget.render(area, buf);
}
