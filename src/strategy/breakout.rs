use serde::Deserialize;

use super::Strategy;

/// Volatility breakout: buy when the latest price clears the previous one by
/// `k` times the prior step's range. There is no sell leg.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VolatilityBreakoutStrategy {
    pub k: f64,
}

impl Default for VolatilityBreakoutStrategy {
    fn default() -> Self {
        Self { k: 0.5 }
    }
}

impl VolatilityBreakoutStrategy {
    pub fn target(&self, prices: &[f64]) -> Option<f64> {
        if prices.len() < self.min_samples() {
            return None;
        }

        let n = prices.len();
        let yesterday = prices[n - 2];
        let day_before = prices[n - 3];
        Some(yesterday + (yesterday - day_before).abs() * self.k)
    }
}

impl Strategy for VolatilityBreakoutStrategy {
    fn should_buy(&self, prices: &[f64]) -> bool {
        let Some(target) = self.target(prices) else {
            return false;
        };
        let today = prices[prices.len() - 1];

        tracing::debug!(strategy = self.name(), "price: {}, target: {}", today, target);
        today > target
    }

    fn should_sell(&self, _prices: &[f64]) -> bool {
        false
    }

    fn name(&self) -> &str {
        "VolatilityBreakoutStrategy"
    }

    fn min_samples(&self) -> usize {
        3
    }
}
