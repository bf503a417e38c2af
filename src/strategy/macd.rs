use serde::Deserialize;

use super::Strategy;
use crate::indicators::{calculate_macd, Macd, SignalLine};

/// MACD crossover: buy while MACD is above its signal line, sell while below
///
/// With the default `SignalLine::Degenerate` the two lines coincide and the
/// strategy stays silent; configure `signal_line = "ema"` for real crossovers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MacdStrategy {
    pub short: usize,
    pub long: usize,
    pub signal: usize,
    pub signal_line: SignalLine,
}

impl Default for MacdStrategy {
    fn default() -> Self {
        Self {
            short: 12,
            long: 26,
            signal: 9,
            signal_line: SignalLine::Degenerate,
        }
    }
}

impl MacdStrategy {
    fn macd(&self, prices: &[f64]) -> Option<Macd> {
        let value = calculate_macd(prices, self.short, self.long, self.signal, self.signal_line)?;
        tracing::debug!(
            strategy = self.name(),
            "MACD: {:.4}, Signal: {:.4}",
            value.macd,
            value.signal
        );
        Some(value)
    }
}

impl Strategy for MacdStrategy {
    fn should_buy(&self, prices: &[f64]) -> bool {
        self.macd(prices).is_some_and(|m| m.macd > m.signal)
    }

    fn should_sell(&self, prices: &[f64]) -> bool {
        self.macd(prices).is_some_and(|m| m.macd < m.signal)
    }

    fn name(&self) -> &str {
        "MacdStrategy"
    }

    fn min_samples(&self) -> usize {
        self.long + self.signal
    }
}
