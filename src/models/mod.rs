use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ExchangeError;

/// Market identifier in `QUOTE-BASE` form, e.g. `KRW-BTC`
///
/// The quote currency funds buys, the base currency is what gets sold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker {
    quote: String,
    base: String,
}

impl Ticker {
    pub fn new(quote: &str, base: &str) -> Self {
        Self {
            quote: quote.to_uppercase(),
            base: base.to_uppercase(),
        }
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    pub fn base(&self) -> &str {
        &self.base
    }
}

impl FromStr for Ticker {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((quote, base))
                if !quote.is_empty() && !base.is_empty() && !base.contains('-') =>
            {
                Ok(Self::new(quote, base))
            }
            _ => Err(ExchangeError::InvalidTicker(s.to_string())),
        }
    }
}

impl TryFrom<String> for Ticker {
    type Error = ExchangeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.to_string()
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.quote, self.base)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => f.write_str("buy"),
            TradeAction::Sell => f.write_str("sell"),
        }
    }
}

/// Order produced by arbitration and handed to the exchange
///
/// For a buy `amount` is in the quote currency, for a sell in the base currency.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderIntent {
    pub action: TradeAction,
    pub ticker: Ticker,
    pub amount: Decimal,
}

/// Exchange acknowledgement of an accepted order
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderResult {
    #[serde(rename = "uuid")]
    pub order_id: String,
    pub state: String,
}

/// One executed order, as written to the trade history
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub timestamp: DateTime<Local>,
    pub action: TradeAction,
    pub price: f64,
    pub volume: Decimal,
}
