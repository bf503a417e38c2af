use serde::Deserialize;

use super::Strategy;
use crate::indicators::{calculate_rsi, calculate_sma};

/// Moving-average trend filter combined with RSI
///
/// Buys when the short MA is above the long MA while RSI is below the buy
/// threshold; sells when the short MA drops below the long MA or RSI rises
/// above the sell threshold.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MovingAverageRsiStrategy {
    pub rsi_period: usize,
    pub rsi_buy_threshold: f64,
    pub rsi_sell_threshold: f64,
    pub short_ma_period: usize,
    pub long_ma_period: usize,
}

impl Default for MovingAverageRsiStrategy {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_buy_threshold: 35.0,
            rsi_sell_threshold: 70.0,
            short_ma_period: 5,
            long_ma_period: 20,
        }
    }
}

impl MovingAverageRsiStrategy {
    /// (short MA, long MA, RSI), or `None` without enough history
    fn indicators(&self, prices: &[f64]) -> Option<(f64, f64, f64)> {
        if prices.len() < self.min_samples() {
            return None;
        }

        let short_ma = calculate_sma(prices, self.short_ma_period)?;
        let long_ma = calculate_sma(prices, self.long_ma_period)?;
        let rsi = calculate_rsi(prices, self.rsi_period)?;

        tracing::debug!(
            strategy = self.name(),
            "MA{}: {:.2}, MA{}: {:.2}, RSI: {:.2}",
            self.short_ma_period,
            short_ma,
            self.long_ma_period,
            long_ma,
            rsi
        );

        Some((short_ma, long_ma, rsi))
    }
}

impl Strategy for MovingAverageRsiStrategy {
    fn should_buy(&self, prices: &[f64]) -> bool {
        self.indicators(prices)
            .is_some_and(|(short_ma, long_ma, rsi)| {
                short_ma > long_ma && rsi < self.rsi_buy_threshold
            })
    }

    fn should_sell(&self, prices: &[f64]) -> bool {
        self.indicators(prices)
            .is_some_and(|(short_ma, long_ma, rsi)| {
                short_ma < long_ma || rsi > self.rsi_sell_threshold
            })
    }

    fn name(&self) -> &str {
        "MovingAverageRsiStrategy"
    }

    fn min_samples(&self) -> usize {
        self.long_ma_period.max(self.short_ma_period).max(self.rsi_period + 1)
    }
}
