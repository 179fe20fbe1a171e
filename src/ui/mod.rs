pub mod advisor;
pub mod chat_history;
pub mod components;
pub mod dashboard;

use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use crate::app::{App, AppView};

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.view {
            AppView::Dashboard => dashboard::render_dashboard(self, area, buf),
            AppView::Advisor => advisor::render_advisor(self, area, buf),
        }
    }
}
