// Trading strategy module
pub mod bollinger;
pub mod breakout;
pub mod ma_rsi;
pub mod macd;
pub mod rsi;

pub use bollinger::BollingerBandStrategy;
pub use breakout::VolatilityBreakoutStrategy;
pub use ma_rsi::MovingAverageRsiStrategy;
pub use macd::MacdStrategy;
pub use rsi::RsiStrategy;

use serde::Deserialize;

/// Buy/sell decision rule over a chronological close-price series
///
/// Implementations hold only fixed parameters and recompute their indicators
/// on every call. With fewer than `min_samples()` prices both decisions are
/// `false`.
pub trait Strategy: Send + Sync {
    fn should_buy(&self, prices: &[f64]) -> bool;

    fn should_sell(&self, prices: &[f64]) -> bool;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Minimum prices required before the strategy can signal
    fn min_samples(&self) -> usize;
}

/// The fixed set of strategies that can be registered from configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    MaRsi(MovingAverageRsiStrategy),
    Rsi(RsiStrategy),
    VolatilityBreakout(VolatilityBreakoutStrategy),
    Macd(MacdStrategy),
    Bollinger(BollingerBandStrategy),
}

impl StrategyConfig {
    /// Registration order used when no strategies are configured
    pub fn defaults() -> Vec<StrategyConfig> {
        vec![
            StrategyConfig::MaRsi(MovingAverageRsiStrategy::default()),
            StrategyConfig::Rsi(RsiStrategy::default()),
            StrategyConfig::VolatilityBreakout(VolatilityBreakoutStrategy::default()),
            StrategyConfig::Macd(MacdStrategy::default()),
            StrategyConfig::Bollinger(BollingerBandStrategy::default()),
        ]
    }

    pub fn build(&self) -> Box<dyn Strategy> {
        match self {
            StrategyConfig::MaRsi(s) => Box::new(s.clone()),
            StrategyConfig::Rsi(s) => Box::new(s.clone()),
            StrategyConfig::VolatilityBreakout(s) => Box::new(s.clone()),
            StrategyConfig::Macd(s) => Box::new(s.clone()),
            StrategyConfig::Bollinger(s) => Box::new(s.clone()),
        }
    }

    /// Check parameters, returning a description of the first problem found
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StrategyConfig::MaRsi(s) => {
                if s.rsi_period == 0 || s.short_ma_period == 0 {
                    return Err("ma_rsi periods must be positive".to_string());
                }
                if s.short_ma_period >= s.long_ma_period {
                    return Err("ma_rsi short_ma_period must be below long_ma_period".to_string());
                }
                check_thresholds("ma_rsi", s.rsi_buy_threshold, s.rsi_sell_threshold)
            }
            StrategyConfig::Rsi(s) => {
                if s.period == 0 {
                    return Err("rsi period must be positive".to_string());
                }
                check_thresholds("rsi", s.buy_threshold, s.sell_threshold)
            }
            StrategyConfig::VolatilityBreakout(s) => {
                if !(s.k.is_finite() && s.k >= 0.0) {
                    return Err("volatility_breakout k must be a non-negative number".to_string());
                }
                Ok(())
            }
            StrategyConfig::Macd(s) => {
                if s.short == 0 || s.signal == 0 {
                    return Err("macd periods must be positive".to_string());
                }
                if s.short >= s.long {
                    return Err("macd short must be below long".to_string());
                }
                Ok(())
            }
            StrategyConfig::Bollinger(s) => {
                if s.window < 2 {
                    return Err("bollinger window must be at least 2".to_string());
                }
                if !(s.num_std_dev.is_finite() && s.num_std_dev > 0.0) {
                    return Err("bollinger num_std_dev must be positive".to_string());
                }
                Ok(())
            }
        }
    }
}

fn check_thresholds(kind: &str, buy: f64, sell: f64) -> Result<(), String> {
    let in_range = |v: f64| (0.0..=100.0).contains(&v);
    if !in_range(buy) || !in_range(sell) {
        return Err(format!("{kind} thresholds must lie in [0, 100]"));
    }
    if buy >= sell {
        return Err(format!("{kind} buy threshold must be below sell threshold"));
    }
    Ok(())
}
