use chrono::Local;
use rust_decimal::{Decimal, RoundingStrategy};
use std::time::Duration;
use tokio::time::sleep;

use super::{Intent, MarketDataFeed, PositionArbiter, PositionState, RetryPolicy};
use crate::api::ExchangeClient;
use crate::error::{FeedError, OrderError};
use crate::models::{OrderIntent, OrderResult, Ticker, TradeAction, TradeRecord};
use crate::persistence::TradeRecorder;

/// Order sizing and execution limits
#[derive(Debug, Clone, PartialEq)]
pub struct TradingRules {
    /// Quote balance must exceed this before a buy is attempted
    pub min_order_quote: Decimal,
    /// Share of the quote balance spent per buy, leaving room for fees
    pub quote_fraction: Decimal,
    /// Base balance must exceed this before a sell is attempted
    pub min_sell_base: Decimal,
    pub order_retry: RetryPolicy,
}

impl Default for TradingRules {
    fn default() -> Self {
        Self {
            min_order_quote: Decimal::from(5_000),
            quote_fraction: Decimal::new(9_995, 4),
            min_sell_base: Decimal::new(1, 4),
            order_retry: RetryPolicy::new(3, Duration::from_secs(3)),
        }
    }
}

/// Result of one evaluation cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    NoSignal,
    Skipped { strategy: String, reason: String },
    Entered { strategy: String, trade: TradeRecord },
    Exited { strategy: String, trade: TradeRecord },
    OrderFailed { strategy: String, action: TradeAction },
}

/// Runs arbitration against one exchange account and one market
///
/// Everything happens in sequence on the caller's task: evaluate, size,
/// submit with retry, then confirm the transition and record the trade.
/// A failed or skipped order leaves the position state untouched and lets
/// the next buy candidate try within the same cycle.
pub struct Trader<E, R> {
    exchange: E,
    recorder: R,
    arbiter: PositionArbiter,
    ticker: Ticker,
    rules: TradingRules,
}

impl<E, R> Trader<E, R>
where
    E: ExchangeClient,
    R: TradeRecorder,
{
    pub fn new(
        exchange: E,
        recorder: R,
        arbiter: PositionArbiter,
        ticker: Ticker,
        rules: TradingRules,
    ) -> Self {
        Self {
            exchange,
            recorder,
            arbiter,
            ticker,
            rules,
        }
    }

    pub fn state(&self) -> PositionState {
        self.arbiter.state()
    }

    pub fn exchange(&self) -> &E {
        &self.exchange
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    /// Poll forever: fetch, evaluate, maybe trade, sleep
    ///
    /// Feed failures end only the current cycle.
    pub async fn run(&mut self, feed: &MarketDataFeed, poll_interval: Duration) {
        tracing::info!(
            "🚀 Trading loop started for {} with {} strategies",
            self.ticker,
            self.arbiter.strategies().len()
        );

        loop {
            match self.tick(feed).await {
                Ok(outcome) => log_outcome(&outcome),
                Err(e) => tracing::error!("❗ Cycle aborted: {}", e),
            }

            tracing::info!("⏳ Next check in {}s", poll_interval.as_secs());
            sleep(poll_interval).await;
        }
    }

    /// Fetch fresh prices and run one cycle on them
    pub async fn tick(&mut self, feed: &MarketDataFeed) -> Result<CycleOutcome, FeedError> {
        let prices = feed.fetch(&self.exchange).await?;
        Ok(self.run_cycle(&prices).await)
    }

    /// Evaluate strategies on `prices` and execute at most one order
    ///
    /// Returns the executed trade, or the outcome of the last candidate tried.
    pub async fn run_cycle(&mut self, prices: &[f64]) -> CycleOutcome {
        let Some(&price) = prices.last() else {
            return CycleOutcome::NoSignal;
        };

        match self.arbiter.state() {
            PositionState::Idle => {
                tracing::info!("📊 Price {}: evaluating strategies, no open position", price)
            }
            PositionState::Holding(id) => tracing::info!(
                "📊 Price {}: evaluating strategies, {} holds the position",
                price,
                self.arbiter.strategy_name(id)
            ),
        }

        // A candidate whose order is skipped or fails hands the cycle to the
        // next strategy; at most one order executes.
        let mut outcome = CycleOutcome::NoSignal;
        let mut from = 0;
        while let Some(intent) = self.arbiter.evaluate(prices, from) {
            outcome = self.execute(intent, price).await;
            if matches!(
                outcome,
                CycleOutcome::Entered { .. } | CycleOutcome::Exited { .. }
            ) {
                break;
            }
            from = intent.strategy() + 1;
        }
        outcome
    }

    /// Size, submit and, on success, confirm and record one intent
    async fn execute(&mut self, intent: Intent, price: f64) -> CycleOutcome {
        let strategy = self.arbiter.strategy_name(intent.strategy()).to_string();

        let order = match self.size_order(intent).await {
            Ok(order) => order,
            Err(reason) => {
                tracing::info!("🚫 [{}] order skipped: {}", strategy, reason);
                return CycleOutcome::Skipped { strategy, reason };
            }
        };

        if let Err(e) = self.submit(&order).await {
            tracing::error!("❌ [{}] {} order failed: {}", strategy, order.action, e);
            return CycleOutcome::OrderFailed {
                strategy,
                action: order.action,
            };
        }

        if let Err(e) = self.arbiter.confirm(intent) {
            tracing::error!("Position state rejected executed order: {}", e);
        }

        let trade = TradeRecord {
            timestamp: Local::now(),
            action: order.action,
            price,
            volume: match order.action {
                TradeAction::Buy => estimate_volume(order.amount, price),
                TradeAction::Sell => order.amount,
            },
        };

        if let Err(e) = self.recorder.record(&trade) {
            tracing::error!("Failed to record {} trade: {}", trade.action, e);
        }

        match order.action {
            TradeAction::Buy => {
                tracing::info!("✅ [{}] buy executed", strategy);
                CycleOutcome::Entered { strategy, trade }
            }
            TradeAction::Sell => {
                tracing::info!("✅ [{}] sell executed", strategy);
                CycleOutcome::Exited { strategy, trade }
            }
        }
    }

    /// Turn an intent into a concrete order, or explain why not
    async fn size_order(&self, intent: Intent) -> Result<OrderIntent, String> {
        match intent {
            Intent::Enter(_) => {
                let currency = self.ticker.quote();
                let balance = self.balance(currency).await;
                tracing::info!("💰 {} balance: {}", currency, balance);

                if balance <= self.rules.min_order_quote {
                    return Err(format!(
                        "{} balance {} not above minimum {}",
                        currency, balance, self.rules.min_order_quote
                    ));
                }

                Ok(OrderIntent {
                    action: TradeAction::Buy,
                    ticker: self.ticker.clone(),
                    amount: (balance * self.rules.quote_fraction).trunc(),
                })
            }
            Intent::Exit(_) => {
                let currency = self.ticker.base();
                let balance = self.balance(currency).await;
                tracing::info!("📦 {} balance: {}", currency, balance);

                if balance <= self.rules.min_sell_base {
                    return Err(format!(
                        "{} balance {} not above minimum {}",
                        currency, balance, self.rules.min_sell_base
                    ));
                }

                Ok(OrderIntent {
                    action: TradeAction::Sell,
                    ticker: self.ticker.clone(),
                    amount: balance,
                })
            }
        }
    }

    /// Balance lookups that fail count as zero so no order is sized from them
    async fn balance(&self, currency: &str) -> Decimal {
        match self.exchange.get_balance(currency).await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!("❌ Balance query for {} failed, treating as zero: {}", currency, e);
                Decimal::ZERO
            }
        }
    }

    async fn submit(&self, order: &OrderIntent) -> Result<OrderResult, OrderError> {
        let exchange = &self.exchange;
        let ticker = &order.ticker;
        let amount = order.amount;
        let what = format!("{} order ({})", order.action, amount);

        let result = match order.action {
            TradeAction::Buy => {
                self.rules
                    .order_retry
                    .run(&what, move || exchange.submit_market_buy(ticker, amount))
                    .await
            }
            TradeAction::Sell => {
                self.rules
                    .order_retry
                    .run(&what, move || exchange.submit_market_sell(ticker, amount))
                    .await
            }
        };

        result.map_err(|last| OrderError {
            attempts: self.rules.order_retry.attempts,
            last,
        })
    }
}

/// Base volume a quote amount buys at `price`, zero if the price is unusable
fn estimate_volume(quote_amount: Decimal, price: f64) -> Decimal {
    Decimal::from_f64_retain(price)
        .filter(|p| *p > Decimal::ZERO)
        .and_then(|p| quote_amount.checked_div(p))
        .map(|v| v.round_dp_with_strategy(8, RoundingStrategy::ToZero))
        .unwrap_or(Decimal::ZERO)
}

fn log_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::NoSignal => tracing::info!("Cycle complete: no trade"),
        CycleOutcome::Skipped { strategy, reason } => {
            tracing::info!("Cycle complete: [{}] skipped ({})", strategy, reason)
        }
        CycleOutcome::Entered { strategy, trade } | CycleOutcome::Exited { strategy, trade } => {
            tracing::info!(
                "Cycle complete: [{}] {} {} @ {}",
                strategy,
                trade.action,
                trade.volume,
                trade.price
            )
        }
        CycleOutcome::OrderFailed { strategy, action } => {
            tracing::warn!("Cycle complete: [{}] {} failed, will retry next cycle", strategy, action)
        }
    }
}
