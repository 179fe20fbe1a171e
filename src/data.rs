//! Market and portfolio data model, plus the fixed fallback datasets shown
//! when a live fetch fails.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// The backend keys portfolios by user id, but this client always asks for
/// the demo user; portfolio identity is not derived from the chat session.
pub const DEMO_USER_ID: &str = "demo_user";

/// One quoted symbol. `change` and `change_percent` keep the backend's
/// signed-string formatting so the UI renders them verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub price: f64,
    pub change: String,
    pub change_percent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub shares: f64,
    pub avg_price: f64,
    pub current_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_return: String,
    pub daily_change: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub user_id: String,
    pub assets: Vec<Asset>,
    pub total_value: f64,
    pub performance: PerformanceSummary,
}

/// Outcome of the most recently settled network operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Loading,
    Error,
}

lazy_static! {
    /// Shown when the market-data fetch fails; mirrors the backend's mock table.
    pub static ref FALLBACK_MARKET_DATA: HashMap<String, MarketQuote> = {
        let mut quotes = HashMap::new();
        quotes.insert(
            "AAPL".to_string(),
            MarketQuote {
                price: 195.30,
                change: "+2.45".to_string(),
                change_percent: "+1.27%".to_string(),
            },
        );
        quotes.insert(
            "GOOGL".to_string(),
            MarketQuote {
                price: 2875.20,
                change: "-15.30".to_string(),
                change_percent: "-0.53%".to_string(),
            },
        );
        quotes.insert(
            "MSFT".to_string(),
            MarketQuote {
                price: 415.75,
                change: "+3.20".to_string(),
                change_percent: "+0.78%".to_string(),
            },
        );
        quotes
    };
}

/// Shown when the portfolio fetch fails; mirrors the backend's default
/// holdings for a fresh user, including its precomputed totals.
pub fn fallback_portfolio() -> PortfolioSnapshot {
    PortfolioSnapshot {
        user_id: DEMO_USER_ID.to_string(),
        assets: vec![
            Asset {
                symbol: "AAPL".to_string(),
                shares: 10.0,
                avg_price: 190.50,
                current_price: 195.30,
            },
            Asset {
                symbol: "GOOGL".to_string(),
                shares: 2.0,
                avg_price: 2800.00,
                current_price: 2875.20,
            },
            Asset {
                symbol: "MSFT".to_string(),
                shares: 5.0,
                avg_price: 400.00,
                current_price: 415.75,
            },
        ],
        total_value: 8727.25,
        performance: PerformanceSummary {
            total_return: "+5.2%".to_string(),
            daily_change: "+1.1%".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_market_data_is_the_three_symbol_stub() {
        assert_eq!(FALLBACK_MARKET_DATA.len(), 3);
        for symbol in ["AAPL", "GOOGL", "MSFT"] {
            assert!(FALLBACK_MARKET_DATA.contains_key(symbol));
        }
        assert_eq!(FALLBACK_MARKET_DATA["GOOGL"].change, "-15.30");
    }

    #[test]
    fn fallback_portfolio_has_three_assets() {
        let portfolio = fallback_portfolio();
        assert_eq!(portfolio.user_id, DEMO_USER_ID);
        assert_eq!(portfolio.assets.len(), 3);
        assert_eq!(portfolio.total_value, 8727.25);
    }

    #[test]
    fn portfolio_tolerates_extra_backend_fields() {
        // The backend document carries created_at/updated_at; the client
        // model ignores anything it does not render.
        let raw = r#"{
            "user_id": "demo_user",
            "assets": [
                {"symbol": "AAPL", "shares": 10, "avg_price": 190.5, "current_price": 195.3}
            ],
            "total_value": 1953.0,
            "performance": {"total_return": "+5.2%", "daily_change": "+1.1%"},
            "created_at": "2025-07-01T00:00:00"
        }"#;

        let snapshot: PortfolioSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.assets[0].symbol, "AAPL");
        assert_eq!(snapshot.assets[0].shares, 10.0);
    }
}
