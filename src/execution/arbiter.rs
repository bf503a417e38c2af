use crate::error::TransitionError;
use crate::strategy::Strategy;

/// Index of a strategy in registration order
pub type StrategyId = usize;

/// Account-wide position: nobody holds it, or exactly one strategy does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionState {
    #[default]
    Idle,
    Holding(StrategyId),
}

/// What arbitration wants done this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Enter(StrategyId),
    Exit(StrategyId),
}

impl Intent {
    pub fn strategy(&self) -> StrategyId {
        match self {
            Intent::Enter(id) | Intent::Exit(id) => *id,
        }
    }
}

/// Decides which strategy may trade and owns the position state
///
/// While idle, strategies are asked `should_buy` in registration order and
/// the first one to answer yes is offered the entry. If that entry does not
/// execute, the caller resumes evaluation after it. While holding, only the
/// holder is consulted, and only for `should_sell`. The state changes solely
/// through [`PositionArbiter::confirm`] once an order has executed.
pub struct PositionArbiter {
    strategies: Vec<Box<dyn Strategy>>,
    state: PositionState,
}

impl PositionArbiter {
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self {
            strategies,
            state: PositionState::Idle,
        }
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn strategies(&self) -> &[Box<dyn Strategy>] {
        &self.strategies
    }

    pub fn strategy_name(&self, id: StrategyId) -> &str {
        self.strategies
            .get(id)
            .map(|s| s.name())
            .unwrap_or("<unknown>")
    }

    /// Next intent for strategies at index `from` or later
    ///
    /// Start with `from = 0`; after an intent fails to execute, call again
    /// with `from = intent.strategy() + 1`.
    pub fn evaluate(&self, prices: &[f64], from: StrategyId) -> Option<Intent> {
        match self.state {
            PositionState::Idle => {
                for (id, strategy) in self.strategies.iter().enumerate().skip(from) {
                    if strategy.should_buy(prices) {
                        tracing::info!("🟢 [{}] buy condition met", strategy.name());
                        return Some(Intent::Enter(id));
                    }
                    tracing::debug!("[{}] no buy signal", strategy.name());
                }
                None
            }
            PositionState::Holding(holder) => {
                if from > holder {
                    return None;
                }

                for (id, strategy) in self.strategies.iter().enumerate() {
                    if id != holder {
                        tracing::debug!(
                            "⛔ [{}] skipped, {} holds the position",
                            strategy.name(),
                            self.strategy_name(holder)
                        );
                    }
                }

                let strategy = self.strategies.get(holder)?;
                if strategy.should_sell(prices) {
                    tracing::info!("🔴 [{}] sell condition met", strategy.name());
                    Some(Intent::Exit(holder))
                } else {
                    tracing::debug!("[{}] holding, no sell signal", strategy.name());
                    None
                }
            }
        }
    }

    /// Apply an executed order to the position state
    ///
    /// Rejects any transition that would give the position a second owner or
    /// let a non-holder close it.
    pub fn confirm(&mut self, intent: Intent) -> Result<PositionState, TransitionError> {
        let next = match (self.state, intent) {
            (PositionState::Idle, Intent::Enter(id)) => PositionState::Holding(id),
            (PositionState::Holding(holder), Intent::Enter(id)) => {
                return Err(TransitionError::AlreadyHolding {
                    strategy: id,
                    holder,
                })
            }
            (PositionState::Holding(holder), Intent::Exit(id)) if holder == id => {
                PositionState::Idle
            }
            (PositionState::Holding(holder), Intent::Exit(id)) => {
                return Err(TransitionError::NotOwner {
                    strategy: id,
                    holder,
                })
            }
            (PositionState::Idle, Intent::Exit(id)) => {
                return Err(TransitionError::NotHolding { strategy: id })
            }
        };

        self.state = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fixed answers plus call counters
    struct Fixed {
        name: &'static str,
        buy: bool,
        sell: bool,
        buy_calls: Arc<AtomicUsize>,
        sell_calls: Arc<AtomicUsize>,
    }

    impl Fixed {
        fn new(name: &'static str, buy: bool, sell: bool) -> Self {
            Self {
                name,
                buy,
                sell,
                buy_calls: Arc::default(),
                sell_calls: Arc::default(),
            }
        }
    }

    impl Strategy for Fixed {
        fn should_buy(&self, _prices: &[f64]) -> bool {
            self.buy_calls.fetch_add(1, Ordering::SeqCst);
            self.buy
        }

        fn should_sell(&self, _prices: &[f64]) -> bool {
            self.sell_calls.fetch_add(1, Ordering::SeqCst);
            self.sell
        }

        fn name(&self) -> &str {
            self.name
        }

        fn min_samples(&self) -> usize {
            0
        }
    }

    #[test]
    fn test_idle_picks_first_buyer_in_order() {
        let arbiter = PositionArbiter::new(vec![
            Box::new(Fixed::new("a", false, true)),
            Box::new(Fixed::new("b", true, false)),
            Box::new(Fixed::new("c", true, false)),
        ]);

        assert_eq!(arbiter.evaluate(&[], 0), Some(Intent::Enter(1)));
    }

    #[test]
    fn test_idle_resumes_after_skipped_candidate() {
        let a = Fixed::new("a", true, false);
        let a_buys = a.buy_calls.clone();
        let arbiter = PositionArbiter::new(vec![
            Box::new(a),
            Box::new(Fixed::new("b", false, false)),
            Box::new(Fixed::new("c", true, false)),
        ]);

        assert_eq!(arbiter.evaluate(&[], 0), Some(Intent::Enter(0)));
        assert_eq!(arbiter.evaluate(&[], 1), Some(Intent::Enter(2)));
        assert_eq!(arbiter.evaluate(&[], 3), None);
        assert_eq!(a_buys.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_holding_has_no_candidate_after_holder() {
        let mut arbiter = PositionArbiter::new(vec![
            Box::new(Fixed::new("a", true, true)),
            Box::new(Fixed::new("b", true, true)),
        ]);
        arbiter.confirm(Intent::Enter(0)).unwrap();

        assert_eq!(arbiter.evaluate(&[], 0), Some(Intent::Exit(0)));
        assert_eq!(arbiter.evaluate(&[], 1), None);
    }

    #[test]
    fn test_idle_never_sells() {
        let arbiter = PositionArbiter::new(vec![Box::new(Fixed::new("a", false, true))]);
        assert_eq!(arbiter.evaluate(&[], 0), None);
    }

    #[test]
    fn test_holding_consults_only_holder_for_sell() {
        let a = Fixed::new("a", false, false);
        let b = Fixed::new("b", true, true);
        let (a_buys, a_sells) = (a.buy_calls.clone(), a.sell_calls.clone());
        let (b_buys, b_sells) = (b.buy_calls.clone(), b.sell_calls.clone());

        let mut arbiter = PositionArbiter::new(vec![Box::new(a), Box::new(b)]);
        arbiter.confirm(Intent::Enter(0)).unwrap();

        assert_eq!(arbiter.evaluate(&[], 0), None);
        assert_eq!(a_buys.load(Ordering::SeqCst), 0);
        assert_eq!(a_sells.load(Ordering::SeqCst), 1);
        assert_eq!(b_buys.load(Ordering::SeqCst), 0);
        assert_eq!(b_sells.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_holder_sell_signal_exits() {
        let mut arbiter = PositionArbiter::new(vec![
            Box::new(Fixed::new("a", true, false)),
            Box::new(Fixed::new("b", true, true)),
        ]);
        arbiter.confirm(Intent::Enter(1)).unwrap();

        assert_eq!(arbiter.evaluate(&[], 0), Some(Intent::Exit(1)));
    }

    #[test]
    fn test_confirm_transitions() {
        let mut arbiter = PositionArbiter::new(vec![
            Box::new(Fixed::new("a", true, true)),
            Box::new(Fixed::new("b", true, true)),
        ]);

        assert_eq!(arbiter.confirm(Intent::Enter(0)), Ok(PositionState::Holding(0)));
        assert_eq!(arbiter.confirm(Intent::Exit(0)), Ok(PositionState::Idle));
        assert_eq!(arbiter.state(), PositionState::Idle);
    }

    #[test]
    fn test_confirm_rejects_second_owner() {
        let mut arbiter = PositionArbiter::new(vec![
            Box::new(Fixed::new("a", true, true)),
            Box::new(Fixed::new("b", true, true)),
        ]);
        arbiter.confirm(Intent::Enter(0)).unwrap();

        assert_eq!(
            arbiter.confirm(Intent::Enter(1)),
            Err(TransitionError::AlreadyHolding { strategy: 1, holder: 0 })
        );
        assert_eq!(
            arbiter.confirm(Intent::Exit(1)),
            Err(TransitionError::NotOwner { strategy: 1, holder: 0 })
        );
        assert_eq!(arbiter.state(), PositionState::Holding(0));
    }

    #[test]
    fn test_confirm_rejects_exit_while_idle() {
        let mut arbiter = PositionArbiter::new(vec![Box::new(Fixed::new("a", true, true))]);

        assert_eq!(
            arbiter.confirm(Intent::Exit(0)),
            Err(TransitionError::NotHolding { strategy: 0 })
        );
        assert_eq!(arbiter.state(), PositionState::Idle);
    }
}
