// Technical indicators module
// Pure functions over a chronological close-price series (most recent last)

pub mod bollinger;
pub mod macd;
pub mod moving_average;
pub mod rsi;

pub use bollinger::{calculate_bollinger, BollingerBands};
pub use macd::{calculate_macd, Macd, SignalLine};
pub use moving_average::{calculate_ema, calculate_sma};
pub use rsi::calculate_rsi;
