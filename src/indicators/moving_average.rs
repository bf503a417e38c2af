/// Simple moving average of the trailing `period` prices
///
/// `None` for a zero period or fewer than `period` prices.
pub fn calculate_sma(prices: &[f64], period: usize) -> Option<f64> {
    let window = trailing(prices, period)?;
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Exponential moving average seeded with the SMA of the first `period` prices
pub fn calculate_ema(prices: &[f64], period: usize) -> Option<f64> {
    let seed = calculate_sma(prices.get(..period)?, period)?;
    let alpha = 2.0 / (period as f64 + 1.0);

    Some(
        prices[period..]
            .iter()
            .fold(seed, |ema, price| ema + alpha * (price - ema)),
    )
}

fn trailing(prices: &[f64], period: usize) -> Option<&[f64]> {
    if period == 0 {
        return None;
    }
    prices.len().checked_sub(period).map(|start| &prices[start..])
}
