use serde::Deserialize;

use super::Strategy;
use crate::indicators::calculate_rsi;

/// Plain RSI oversold/overbought strategy
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RsiStrategy {
    pub period: usize,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
}

impl Default for RsiStrategy {
    fn default() -> Self {
        Self {
            period: 14,
            buy_threshold: 30.0,
            sell_threshold: 70.0,
        }
    }
}

impl RsiStrategy {
    fn rsi(&self, prices: &[f64]) -> Option<f64> {
        let rsi = calculate_rsi(prices, self.period)?;
        tracing::debug!(strategy = self.name(), "RSI: {:.2}", rsi);
        Some(rsi)
    }
}

impl Strategy for RsiStrategy {
    fn should_buy(&self, prices: &[f64]) -> bool {
        self.rsi(prices).is_some_and(|rsi| rsi < self.buy_threshold)
    }

    fn should_sell(&self, prices: &[f64]) -> bool {
        self.rsi(prices).is_some_and(|rsi| rsi > self.sell_threshold)
    }

    fn name(&self) -> &str {
        "RsiStrategy"
    }

    fn min_samples(&self) -> usize {
        self.period + 1
    }
}
