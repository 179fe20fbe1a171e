use std::collections::HashMap;

use color_eyre::Result;
use ratatui::crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers};
use ratatui::DefaultTerminal;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::chat::ChatManager;
use crate::data::{
    fallback_portfolio, ConnectionStatus, MarketQuote, PortfolioSnapshot, DEMO_USER_ID,
    FALLBACK_MARKET_DATA,
};
use crate::event::{AppEvent, Event, EventHandler};
use crate::session::SessionStore;

/// Which screen is on display. Dashboard is the initial state; navigation
/// toggles between the two for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    Dashboard,
    Advisor,
}

/// Application.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    pub running: bool,
    /// Current screen.
    pub view: AppView,

    /// Durable client-side state (session id).
    pub session_store: SessionStore,
    /// Session id scoping chat history on the backend.
    pub session_id: String,
    /// Backend API client.
    pub client: ApiClient,

    /// Latest market snapshot, keyed by symbol. Empty until the first load
    /// settles.
    pub market: HashMap<String, MarketQuote>,
    /// Latest portfolio snapshot; `None` until the first load settles.
    pub portfolio: Option<PortfolioSnapshot>,
    /// Outcome of the most recent network operation.
    pub status: ConnectionStatus,

    /// Advisor chat transcript and input state.
    pub chat: ChatManager,
    /// Advances while a send is in flight; drives the thinking indicator.
    pub spinner_frame: usize,

    /// Event handler.
    pub events: EventHandler,
}

impl App {
    /// Set up state and kick off the initial data loads. The loads settle
    /// as events, so the dashboard renders immediately in a loading state.
    pub fn new() -> Result<Self> {
        let app = Self::with_parts(SessionStore::open_default()?, ApiClient::new())?;
        app.load_market_data();
        app.load_portfolio();
        app.load_chat_history();
        Ok(app)
    }

    /// Build an app around existing parts without triggering the startup
    /// fetches.
    pub fn with_parts(session_store: SessionStore, client: ApiClient) -> Result<Self> {
        let session_id = session_store.get_or_create_session_id()?;
        info!("Using session {}", session_id);

        Ok(Self {
            running: true,
            view: AppView::Dashboard,
            session_store,
            session_id,
            client,
            market: HashMap::new(),
            portfolio: None,
            status: ConnectionStatus::Loading,
            chat: ChatManager::new(),
            spinner_frame: 0,
            events: EventHandler::new(),
        })
    }

    /// Run the application's main loop.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        let mut needs_redraw = true;

        while self.running {
            if needs_redraw {
                terminal.draw(|frame| frame.render_widget(&self, frame.area()))?;
                needs_redraw = false;
            }

            match self.events.next().await? {
                Event::Tick => {
                    // Animate the indicator only while something is in flight.
                    if self.chat.is_busy() || self.status == ConnectionStatus::Loading {
                        self.spinner_frame = self.spinner_frame.wrapping_add(1);
                        needs_redraw = true;
                    }
                }
                Event::Crossterm(event) => {
                    if let CrosstermEvent::Key(key_event) = event {
                        self.handle_key_events(key_event)?;
                        needs_redraw = true;
                    }
                }
                Event::App(app_event) => {
                    self.handle_app_event(app_event);
                    needs_redraw = true;
                }
            }
        }
        Ok(())
    }

    /// Handles the key events and updates the state of [`App`].
    pub fn handle_key_events(&mut self, key_event: KeyEvent) -> Result<()> {
        // The advisor screen owns most keys as chat input.
        if self.view == AppView::Advisor {
            match key_event.code {
                KeyCode::Esc => self.events.send(AppEvent::OpenDashboard),
                KeyCode::Enter => self.events.send(AppEvent::ChatSubmit),
                KeyCode::Backspace => self.events.send(AppEvent::ChatBackspace),
                KeyCode::Char('l' | 'L') if key_event.modifiers == KeyModifiers::CONTROL => {
                    self.events.send(AppEvent::ClearChat)
                }
                KeyCode::Char('c' | 'C') if key_event.modifiers == KeyModifiers::CONTROL => {
                    self.events.send(AppEvent::Quit)
                }
                KeyCode::Char(ch) => self.events.send(AppEvent::ChatInput(ch)),
                KeyCode::Up | KeyCode::PageUp => self.events.send(AppEvent::ScrollChatUp),
                KeyCode::Down | KeyCode::PageDown => self.events.send(AppEvent::ScrollChatDown),
                _ => {}
            }
            return Ok(());
        }

        // Dashboard navigation.
        match key_event.code {
            KeyCode::Esc | KeyCode::Char('q') => self.events.send(AppEvent::Quit),
            KeyCode::Char('c' | 'C') if key_event.modifiers == KeyModifiers::CONTROL => {
                self.events.send(AppEvent::Quit)
            }
            KeyCode::Char('a') | KeyCode::Enter => self.events.send(AppEvent::OpenAdvisor),
            KeyCode::Char('r') => self.events.send(AppEvent::Refresh),
            _ => {}
        }
        Ok(())
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit => self.quit(),
            AppEvent::OpenAdvisor => self.view = AppView::Advisor,
            AppEvent::OpenDashboard => self.view = AppView::Dashboard,
            AppEvent::Refresh => {
                self.status = ConnectionStatus::Loading;
                self.load_market_data();
                self.load_portfolio();
            }
            AppEvent::MarketLoaded(result) => self.apply_market_result(result),
            AppEvent::PortfolioLoaded(result) => self.apply_portfolio_result(result),
            AppEvent::HistoryLoaded(result) => self.chat.initialize_from(result),
            AppEvent::ChatInput(ch) => self.chat.push_input(ch),
            AppEvent::ChatBackspace => self.chat.backspace(),
            AppEvent::ChatSubmit => self.submit_chat_message(),
            AppEvent::ChatCompleted(result) => {
                self.status = if result.is_ok() {
                    ConnectionStatus::Connected
                } else {
                    ConnectionStatus::Error
                };
                self.chat.complete_send(result);
            }
            AppEvent::ClearChat => self.clear_chat(),
            AppEvent::ScrollChatUp => self.chat.scroll_up(),
            AppEvent::ScrollChatDown => self.chat.scroll_down(),
        }
    }

    /// Fetch the market snapshot; the result comes back as an event.
    pub fn load_market_data(&self) {
        let client = self.client.clone();
        let sender = self.events.sender();
        tokio::spawn(async move {
            let result = client.market_data().await.map_err(|e| e.to_string());
            let _ = sender.send(Event::App(AppEvent::MarketLoaded(result)));
        });
    }

    /// Fetch the demo portfolio; the result comes back as an event.
    pub fn load_portfolio(&self) {
        let client = self.client.clone();
        let sender = self.events.sender();
        tokio::spawn(async move {
            let result = client
                .portfolio(DEMO_USER_ID)
                .await
                .map_err(|e| e.to_string());
            let _ = sender.send(Event::App(AppEvent::PortfolioLoaded(result)));
        });
    }

    /// Fetch prior chat history for the current session.
    pub fn load_chat_history(&self) {
        let client = self.client.clone();
        let session_id = self.session_id.clone();
        let sender = self.events.sender();
        tokio::spawn(async move {
            let result = client
                .chat_history(&session_id)
                .await
                .map_err(|e| e.to_string());
            let _ = sender.send(Event::App(AppEvent::HistoryLoaded(result)));
        });
    }

    fn apply_market_result(&mut self, result: Result<HashMap<String, MarketQuote>, String>) {
        match result {
            Ok(data) => {
                self.market = data;
                self.status = ConnectionStatus::Connected;
            }
            Err(e) => {
                warn!("Market data fetch failed, using fallback: {}", e);
                self.market = FALLBACK_MARKET_DATA.clone();
                self.status = ConnectionStatus::Error;
            }
        }
    }

    fn apply_portfolio_result(&mut self, result: Result<PortfolioSnapshot, String>) {
        match result {
            Ok(snapshot) => {
                self.portfolio = Some(snapshot);
                self.status = ConnectionStatus::Connected;
            }
            Err(e) => {
                warn!("Portfolio fetch failed, using fallback: {}", e);
                self.portfolio = Some(fallback_portfolio());
                self.status = ConnectionStatus::Error;
            }
        }
    }

    /// Dispatch the chat input. The optimistic user entry is appended
    /// before the request leaves; the settled reply lands as a
    /// `ChatCompleted` event, which releases the busy flag.
    pub fn submit_chat_message(&mut self) {
        let Some(text) = self.chat.begin_send() else {
            return;
        };

        let client = self.client.clone();
        let session_id = self.session_id.clone();
        let sender = self.events.sender();
        tokio::spawn(async move {
            let result = client
                .send_chat(&text, &session_id)
                .await
                .map_err(|e| e.to_string());
            let _ = sender.send(Event::App(AppEvent::ChatCompleted(result)));
        });
    }

    /// Wipe the transcript and rotate the session id so future history
    /// loads no longer see the old conversation.
    pub fn clear_chat(&mut self) {
        self.chat.clear();
        match self.session_store.reset_session() {
            Ok(id) => {
                info!("Session reset, now {}", id);
                self.session_id = id;
            }
            Err(e) => warn!("Failed to reset session: {}", e),
        }
    }

    /// Set running to false to quit the application.
    pub fn quit(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::open(dir.path().join("test.db")).unwrap();
        // Port 9 is discard; nothing in these tests performs network IO.
        let client = ApiClient::with_url("http://127.0.0.1:9".to_string());
        let app = App::with_parts(store, client).unwrap();
        (dir, app)
    }

    #[tokio::test]
    async fn starts_on_the_dashboard_and_toggles_views() {
        let (_dir, mut app) = test_app();
        assert_eq!(app.view, AppView::Dashboard);

        app.handle_app_event(AppEvent::OpenAdvisor);
        assert_eq!(app.view, AppView::Advisor);
        app.handle_app_event(AppEvent::OpenDashboard);
        assert_eq!(app.view, AppView::Dashboard);
    }

    #[tokio::test]
    async fn market_failure_substitutes_the_fallback_mapping() {
        let (_dir, mut app) = test_app();
        assert_eq!(app.status, ConnectionStatus::Loading);

        app.handle_app_event(AppEvent::MarketLoaded(Err("HTTP 500".to_string())));
        assert_eq!(app.market, *FALLBACK_MARKET_DATA);
        assert_eq!(app.status, ConnectionStatus::Error);
    }

    #[tokio::test]
    async fn portfolio_failure_substitutes_the_fallback_snapshot() {
        let (_dir, mut app) = test_app();
        app.handle_app_event(AppEvent::PortfolioLoaded(Err("connect refused".to_string())));
        assert_eq!(app.portfolio, Some(fallback_portfolio()));
        assert_eq!(app.status, ConnectionStatus::Error);
    }

    #[tokio::test]
    async fn successful_loads_replace_state_wholesale() {
        let (_dir, mut app) = test_app();
        let mut quotes = HashMap::new();
        quotes.insert(
            "TSLA".to_string(),
            MarketQuote {
                price: 242.65,
                change: "+8.40".to_string(),
                change_percent: "+3.58%".to_string(),
            },
        );

        app.handle_app_event(AppEvent::MarketLoaded(Ok(quotes.clone())));
        assert_eq!(app.market, quotes);
        assert_eq!(app.status, ConnectionStatus::Connected);

        // A later load overwrites rather than merges.
        app.handle_app_event(AppEvent::MarketLoaded(Ok(HashMap::new())));
        assert!(app.market.is_empty());
    }

    #[tokio::test]
    async fn clear_chat_rotates_the_session_id() {
        let (_dir, mut app) = test_app();
        let original = app.session_id.clone();

        app.handle_app_event(AppEvent::ClearChat);
        assert_ne!(app.session_id, original);
        assert_eq!(
            app.session_store.get_or_create_session_id().unwrap(),
            app.session_id
        );
        assert_eq!(app.chat.messages().len(), 1);
    }

    #[tokio::test]
    async fn chat_completion_updates_connection_status() {
        let (_dir, mut app) = test_app();
        app.handle_app_event(AppEvent::ChatInput('h'));
        app.handle_app_event(AppEvent::ChatInput('i'));
        assert!(app.chat.begin_send().is_some());

        app.handle_app_event(AppEvent::ChatCompleted(Err("timed out".to_string())));
        assert_eq!(app.status, ConnectionStatus::Error);
        assert!(!app.chat.is_busy());
    }
}
