use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::ExchangeClient;
use crate::error::ExchangeError;
use crate::models::{OrderResult, Ticker};

/// Taker fee charged on both sides of a simulated fill (0.05%)
const FEE_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 4);

/// Simulated account over a live price source
///
/// Closes come from the wrapped client; balances live in memory and orders
/// fill immediately at the most recent close.
pub struct PaperExchange<E> {
    source: E,
    balances: Mutex<HashMap<String, Decimal>>,
    last_price: Mutex<Option<Decimal>>,
}

impl<E: ExchangeClient> PaperExchange<E> {
    pub fn new(source: E, ticker: &Ticker, starting_quote: Decimal) -> Self {
        let mut balances = HashMap::new();
        balances.insert(ticker.quote().to_string(), starting_quote);

        Self {
            source,
            balances: Mutex::new(balances),
            last_price: Mutex::new(None),
        }
    }

    fn reference_price(&self) -> Result<Decimal, ExchangeError> {
        self.last_price
            .lock()
            .unwrap()
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| ExchangeError::Rejected("no reference price yet".to_string()))
    }

    /// Move `debit` out of one currency and `credit` into another
    fn settle(
        &self,
        from: &str,
        debit: Decimal,
        to: &str,
        credit: Decimal,
    ) -> Result<(), ExchangeError> {
        let mut balances = self.balances.lock().unwrap();
        let available = balances.get(from).copied().unwrap_or(Decimal::ZERO);
        if debit <= Decimal::ZERO || debit > available {
            return Err(ExchangeError::Rejected(format!(
                "insufficient {}: need {}, have {}",
                from, debit, available
            )));
        }

        balances.insert(from.to_string(), available - debit);
        *balances.entry(to.to_string()).or_insert(Decimal::ZERO) += credit;
        Ok(())
    }

    fn fill(state: &str) -> OrderResult {
        OrderResult {
            order_id: format!("paper-{}", Uuid::new_v4()),
            state: state.to_string(),
        }
    }
}

#[async_trait]
impl<E: ExchangeClient> ExchangeClient for PaperExchange<E> {
    async fn get_recent_closes(
        &self,
        ticker: &Ticker,
        interval_minutes: u32,
        count: usize,
    ) -> Result<Vec<f64>, ExchangeError> {
        let closes = self
            .source
            .get_recent_closes(ticker, interval_minutes, count)
            .await?;

        if let Some(last) = closes.last() {
            *self.last_price.lock().unwrap() = Decimal::from_f64_retain(*last);
        }
        Ok(closes)
    }

    async fn get_balance(&self, currency: &str) -> Result<Decimal, ExchangeError> {
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&currency.to_uppercase())
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn submit_market_buy(
        &self,
        ticker: &Ticker,
        quote_amount: Decimal,
    ) -> Result<OrderResult, ExchangeError> {
        let price = self.reference_price()?;
        let volume = (quote_amount * (Decimal::ONE - FEE_RATE) / price)
            .round_dp_with_strategy(8, RoundingStrategy::ToZero);

        self.settle(ticker.quote(), quote_amount, ticker.base(), volume)?;
        tracing::info!(
            "📝 Paper BUY {} {} for {} {} @ {}",
            volume,
            ticker.base(),
            quote_amount,
            ticker.quote(),
            price
        );
        Ok(Self::fill("done"))
    }

    async fn submit_market_sell(
        &self,
        ticker: &Ticker,
        base_amount: Decimal,
    ) -> Result<OrderResult, ExchangeError> {
        let price = self.reference_price()?;
        let proceeds = base_amount * price * (Decimal::ONE - FEE_RATE);

        self.settle(ticker.base(), base_amount, ticker.quote(), proceeds)?;
        tracing::info!(
            "📝 Paper SELL {} {} for {} {} @ {}",
            base_amount,
            ticker.base(),
            proceeds,
            ticker.quote(),
            price
        );
        Ok(Self::fill("done"))
    }
}
