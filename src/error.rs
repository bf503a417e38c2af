use thiserror::Error;

/// Failures reported by an exchange client.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("exchange API error ({status}) {name}: {message}")]
    Api {
        status: u16,
        name: String,
        message: String,
    },

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid ticker '{0}', expected QUOTE-BASE (e.g. KRW-BTC)")]
    InvalidTicker(String),

    #[error("order rejected: {0}")]
    Rejected(String),
}

/// Failures while collecting the recent price series.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error("insufficient price data: got {got} samples, need {need}")]
    Insufficient { got: usize, need: usize },

    #[error("price feed failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<FeedError>,
    },
}

/// An order that could not be executed within the retry budget.
#[derive(Debug, Error)]
#[error("order failed after {attempts} attempts: {last}")]
pub struct OrderError {
    pub attempts: u32,
    #[source]
    pub last: ExchangeError,
}

/// A position change that would break the single-owner rule.
#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("cannot enter for strategy {strategy}: strategy {holder} already holds the position")]
    AlreadyHolding { strategy: usize, holder: usize },

    #[error("cannot exit for strategy {strategy}: no open position")]
    NotHolding { strategy: usize },

    #[error("strategy {strategy} cannot exit a position held by strategy {holder}")]
    NotOwner { strategy: usize, holder: usize },
}

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: String, reason: String },
}
