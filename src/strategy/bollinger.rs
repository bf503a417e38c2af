use serde::Deserialize;

use super::Strategy;
use crate::indicators::{calculate_bollinger, BollingerBands};

/// Bollinger band crossing: buy below the lower band, sell above the upper band
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BollingerBandStrategy {
    pub window: usize,
    pub num_std_dev: f64,
}

impl Default for BollingerBandStrategy {
    fn default() -> Self {
        Self {
            window: 20,
            num_std_dev: 2.0,
        }
    }
}

impl BollingerBandStrategy {
    fn bands(&self, prices: &[f64]) -> Option<(f64, BollingerBands)> {
        let bands = calculate_bollinger(prices, self.window, self.num_std_dev)?;
        let price = *prices.last()?;

        tracing::debug!(
            strategy = self.name(),
            "price: {:.2}, lower: {:.2}, upper: {:.2}",
            price,
            bands.lower,
            bands.upper
        );
        Some((price, bands))
    }
}

impl Strategy for BollingerBandStrategy {
    fn should_buy(&self, prices: &[f64]) -> bool {
        self.bands(prices)
            .is_some_and(|(price, bands)| price < bands.lower)
    }

    fn should_sell(&self, prices: &[f64]) -> bool {
        self.bands(prices)
            .is_some_and(|(price, bands)| price > bands.upper)
    }

    fn name(&self) -> &str {
        "BollingerBandStrategy"
    }

    fn min_samples(&self) -> usize {
        self.window
    }
}
