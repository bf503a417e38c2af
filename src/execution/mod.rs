// Position arbitration and order execution module
pub mod arbiter;
pub mod price_feed;
pub mod retry;
pub mod trader;

pub use arbiter::{Intent, PositionArbiter, PositionState, StrategyId};
pub use price_feed::MarketDataFeed;
pub use retry::RetryPolicy;
pub use trader::{CycleOutcome, Trader, TradingRules};
