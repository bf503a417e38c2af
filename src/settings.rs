use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SettingsError;
use crate::execution::{MarketDataFeed, RetryPolicy, TradingRules};
use crate::models::Ticker;
use crate::strategy::{Strategy, StrategyConfig};

/// Candle units the exchange serves, in minutes
const CANDLE_UNITS: [u32; 8] = [1, 3, 5, 10, 15, 30, 60, 240];
const MAX_CANDLE_COUNT: usize = 200;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub attempts: u32,
    pub delay_secs: u64,
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_secs(self.delay_secs))
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_secs: 3,
        }
    }
}

/// Application settings
///
/// Layered as built-in defaults, then the TOML file, then `AUTOTRADER__*`
/// environment variables (e.g. `AUTOTRADER__TICKER=KRW-ETH`,
/// `AUTOTRADER__ORDER_RETRY__ATTEMPTS=5`). API keys are never read from here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ticker: Ticker,
    pub candle_interval_minutes: u32,
    pub candle_count: usize,
    /// Fewer closes than this and the price fetch is retried
    pub min_samples: usize,
    pub poll_interval_secs: u64,
    pub feed_retry: RetrySettings,
    pub order_retry: RetrySettings,
    pub min_order_quote: Decimal,
    pub quote_fraction: Decimal,
    pub min_sell_base: Decimal,
    pub trade_log: PathBuf,
    pub log_dir: PathBuf,
    pub strategies: Vec<StrategyConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        let rules = TradingRules::default();

        Self {
            ticker: Ticker::new("KRW", "BTC"),
            candle_interval_minutes: 5,
            candle_count: 40,
            min_samples: 20,
            poll_interval_secs: 300,
            feed_retry: RetrySettings {
                attempts: 5,
                delay_secs: 3,
            },
            order_retry: RetrySettings::default(),
            min_order_quote: rules.min_order_quote,
            quote_fraction: rules.quote_fraction,
            min_sell_base: rules.min_sell_base,
            trade_log: PathBuf::from("logs/trade_history.csv"),
            log_dir: PathBuf::from("logs"),
            strategies: StrategyConfig::defaults(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from an optional `autotrader.toml` in the
    /// working directory when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("autotrader").required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("AUTOTRADER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !CANDLE_UNITS.contains(&self.candle_interval_minutes) {
            return Err(invalid(
                "candle_interval_minutes",
                format!("must be one of {:?}", CANDLE_UNITS),
            ));
        }
        if self.min_samples == 0 {
            return Err(invalid("min_samples", "must be positive"));
        }
        if self.candle_count < self.min_samples || self.candle_count > MAX_CANDLE_COUNT {
            return Err(invalid(
                "candle_count",
                format!("must lie between min_samples ({}) and {}", self.min_samples, MAX_CANDLE_COUNT),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(invalid("poll_interval_secs", "must be positive"));
        }
        if self.feed_retry.attempts == 0 {
            return Err(invalid("feed_retry.attempts", "must be at least 1"));
        }
        if self.order_retry.attempts == 0 {
            return Err(invalid("order_retry.attempts", "must be at least 1"));
        }
        if self.quote_fraction <= Decimal::ZERO || self.quote_fraction > Decimal::ONE {
            return Err(invalid("quote_fraction", "must lie in (0, 1]"));
        }
        if self.min_order_quote.is_sign_negative() {
            return Err(invalid("min_order_quote", "must not be negative"));
        }
        if self.min_sell_base.is_sign_negative() {
            return Err(invalid("min_sell_base", "must not be negative"));
        }
        if self.strategies.is_empty() {
            return Err(invalid("strategies", "at least one strategy is required"));
        }
        for (i, config) in self.strategies.iter().enumerate() {
            let field = format!("strategies[{}]", i);
            config.validate().map_err(|reason| invalid(&field, reason))?;

            // Such a strategy could never signal
            let strategy = config.build();
            if strategy.min_samples() > self.candle_count {
                return Err(invalid(
                    &field,
                    format!(
                        "{} needs {} candles but candle_count is {}",
                        strategy.name(),
                        strategy.min_samples(),
                        self.candle_count
                    ),
                ));
            }
        }
        Ok(())
    }

    pub fn trading_rules(&self) -> TradingRules {
        TradingRules {
            min_order_quote: self.min_order_quote,
            quote_fraction: self.quote_fraction,
            min_sell_base: self.min_sell_base,
            order_retry: self.order_retry.policy(),
        }
    }

    pub fn market_data_feed(&self) -> MarketDataFeed {
        MarketDataFeed::new(
            self.ticker.clone(),
            self.candle_interval_minutes,
            self.candle_count,
            self.min_samples,
            self.feed_retry.policy(),
        )
    }

    /// Instantiate the configured strategies in registration order
    pub fn build_strategies(&self) -> Vec<Box<dyn Strategy>> {
        self.strategies.iter().map(StrategyConfig::build).collect()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> SettingsError {
    SettingsError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{MacdStrategy, RsiStrategy, VolatilityBreakoutStrategy};
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.ticker.to_string(), "KRW-BTC");
        assert_eq!(settings.strategies.len(), 5);
        assert_eq!(settings.feed_retry.attempts, 5);
        assert_eq!(settings.order_retry.attempts, 3);
    }

    #[test]
    fn test_load_toml_file() {
        let file = write_config(
            r#"
            ticker = "KRW-ETH"
            poll_interval_secs = 60
            quote_fraction = 0.5

            [order_retry]
            attempts = 4

            [[strategies]]
            kind = "rsi"
            period = 10
            buy_threshold = 25

            [[strategies]]
            kind = "volatility_breakout"
            k = 0.7
            "#,
        );

        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.ticker, Ticker::new("KRW", "ETH"));
        assert_eq!(settings.poll_interval(), Duration::from_secs(60));
        assert_eq!(settings.quote_fraction, Decimal::new(5, 1));
        assert_eq!(settings.order_retry.attempts, 4);
        assert_eq!(settings.order_retry.delay_secs, 3);
        assert_eq!(settings.candle_count, 40);
        assert_eq!(
            settings.strategies,
            vec![
                StrategyConfig::Rsi(RsiStrategy {
                    period: 10,
                    buy_threshold: 25.0,
                    sell_threshold: 70.0,
                }),
                StrategyConfig::VolatilityBreakout(VolatilityBreakoutStrategy { k: 0.7 }),
            ]
        );
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = Settings::load(Some(Path::new("/nonexistent/autotrader.toml")));
        assert!(matches!(result, Err(SettingsError::Load(_))));
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases: Vec<(&str, Settings)> = vec![
            (
                "quote_fraction",
                Settings {
                    quote_fraction: Decimal::new(15, 1),
                    ..Settings::default()
                },
            ),
            (
                "candle_interval_minutes",
                Settings {
                    candle_interval_minutes: 7,
                    ..Settings::default()
                },
            ),
            (
                "candle_count",
                Settings {
                    candle_count: 10,
                    ..Settings::default()
                },
            ),
            (
                "order_retry.attempts",
                Settings {
                    order_retry: RetrySettings {
                        attempts: 0,
                        delay_secs: 1,
                    },
                    ..Settings::default()
                },
            ),
            (
                "strategies",
                Settings {
                    strategies: Vec::new(),
                    ..Settings::default()
                },
            ),
        ];

        for (field, settings) in cases {
            match settings.validate() {
                Err(SettingsError::Invalid { field: got, .. }) => assert_eq!(got, field),
                other => panic!("{} should be rejected, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_invalid_strategy_is_located() {
        let settings = Settings {
            strategies: vec![
                StrategyConfig::Rsi(RsiStrategy::default()),
                StrategyConfig::Rsi(RsiStrategy {
                    period: 0,
                    ..RsiStrategy::default()
                }),
            ],
            ..Settings::default()
        };

        match settings.validate() {
            Err(SettingsError::Invalid { field, .. }) => assert_eq!(field, "strategies[1]"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_strategy_needing_more_candles() {
        let settings = Settings {
            strategies: vec![
                StrategyConfig::Rsi(RsiStrategy::default()),
                StrategyConfig::Macd(MacdStrategy {
                    long: 50,
                    ..MacdStrategy::default()
                }),
            ],
            ..Settings::default()
        };

        match settings.validate() {
            Err(SettingsError::Invalid { field, reason }) => {
                assert_eq!(field, "strategies[1]");
                assert!(reason.contains("needs 59 candles"));
            }
            other => panic!("unexpected: {:?}", other),
        }

        let settings = Settings {
            candle_count: 59,
            ..settings
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_trading_rules_follow_settings() {
        let settings = Settings {
            min_order_quote: Decimal::from(10_000),
            order_retry: RetrySettings {
                attempts: 2,
                delay_secs: 1,
            },
            ..Settings::default()
        };

        let rules = settings.trading_rules();
        assert_eq!(rules.min_order_quote, Decimal::from(10_000));
        assert_eq!(rules.order_retry, RetryPolicy::new(2, Duration::from_secs(1)));
    }
}
