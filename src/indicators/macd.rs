use serde::Deserialize;

use super::moving_average::{calculate_ema, calculate_sma};

/// How the MACD signal line is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalLine {
    /// Average of `signal` copies of the current MACD value, so the signal
    /// always equals the MACD line and crossovers never fire. Kept as the
    /// default to match the behaviour existing trade logs were produced with.
    #[default]
    Degenerate,
    /// EMA over the MACD history, one MACD value per available price.
    Ema,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
}

/// Calculate MACD using simple moving averages for the short and long legs
///
/// Returns `None` when fewer than `long + signal` prices are available.
pub fn calculate_macd(
    prices: &[f64],
    short: usize,
    long: usize,
    signal: usize,
    mode: SignalLine,
) -> Option<Macd> {
    if signal == 0 || prices.len() < long + signal {
        return None;
    }

    let macd = macd_line(prices, short, long)?;

    let signal_value = match mode {
        // The mean of `signal` identical values, taken directly so rounding
        // cannot open a gap between the two lines
        SignalLine::Degenerate => macd,
        SignalLine::Ema => {
            // One MACD value for every prefix long enough to fill the long window
            let history: Vec<f64> = (long..=prices.len())
                .filter_map(|end| macd_line(&prices[..end], short, long))
                .collect();
            calculate_ema(&history, signal)?
        }
    };

    Some(Macd {
        macd,
        signal: signal_value,
    })
}

fn macd_line(prices: &[f64], short: usize, long: usize) -> Option<f64> {
    Some(calculate_sma(prices, short)? - calculate_sma(prices, long)?)
}
