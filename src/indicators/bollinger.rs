#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Calculate Bollinger Bands over the last `window` prices
///
/// Uses the population standard deviation; bands sit `num_std_dev` deviations
/// either side of the mean.
pub fn calculate_bollinger(prices: &[f64], window: usize, num_std_dev: f64) -> Option<BollingerBands> {
    if window == 0 || prices.len() < window {
        return None;
    }

    let recent = &prices[prices.len() - window..];
    let n = window as f64;
    let mean = recent.iter().sum::<f64>() / n;
    let variance = recent.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
    let offset = variance.sqrt() * num_std_dev;

    Some(BollingerBands {
        upper: mean + offset,
        middle: mean,
        lower: mean - offset,
    })
}
