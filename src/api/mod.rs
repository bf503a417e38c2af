pub mod paper;
pub mod upbit;

pub use paper::PaperExchange;
pub use upbit::{Credentials, UpbitClient};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::ExchangeError;
use crate::models::{OrderResult, Ticker};

/// Market data and order execution for a single exchange account
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Closing prices of the last `count` candles, oldest first
    async fn get_recent_closes(
        &self,
        ticker: &Ticker,
        interval_minutes: u32,
        count: usize,
    ) -> Result<Vec<f64>, ExchangeError>;

    /// Available balance of `currency`, zero when the account holds none
    async fn get_balance(&self, currency: &str) -> Result<Decimal, ExchangeError>;

    /// Market buy spending `quote_amount` of the quote currency
    async fn submit_market_buy(
        &self,
        ticker: &Ticker,
        quote_amount: Decimal,
    ) -> Result<OrderResult, ExchangeError>;

    /// Market sell of `base_amount` of the base currency
    async fn submit_market_sell(
        &self,
        ticker: &Ticker,
        base_amount: Decimal,
    ) -> Result<OrderResult, ExchangeError>;
}
