#![allow(dead_code)]

use async_trait::async_trait;
use autotrader::error::{ExchangeError, RecorderError};
use autotrader::persistence::TradeRecorder;
use autotrader::{ExchangeClient, OrderResult, Strategy, Ticker, TradeRecord};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory exchange with fixed closes, settable balances and
/// a configurable number of failing orders
#[derive(Default)]
pub struct ScriptedExchange {
    pub closes: Mutex<Vec<f64>>,
    pub balances: Mutex<HashMap<String, Decimal>>,
    pub failing_balance: Mutex<Option<String>>,
    pub order_failures: AtomicUsize,
    pub buys: Mutex<Vec<Decimal>>,
    pub sells: Mutex<Vec<Decimal>>,
    pub order_attempts: AtomicUsize,
}

impl ScriptedExchange {
    pub fn new(closes: Vec<f64>) -> Self {
        Self {
            closes: Mutex::new(closes),
            ..Self::default()
        }
    }

    pub fn with_balance(self, currency: &str, amount: Decimal) -> Self {
        self.balances
            .lock()
            .unwrap()
            .insert(currency.to_string(), amount);
        self
    }

    /// Fail the next `n` order submissions
    pub fn fail_orders(self, n: usize) -> Self {
        self.order_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn attempts(&self) -> usize {
        self.order_attempts.load(Ordering::SeqCst)
    }

    fn next_order(&self) -> Result<OrderResult, ExchangeError> {
        self.order_attempts.fetch_add(1, Ordering::SeqCst);

        let remaining = self.order_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.order_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ExchangeError::Api {
                status: 500,
                name: "server_error".to_string(),
                message: "simulated outage".to_string(),
            });
        }

        Ok(OrderResult {
            order_id: format!("order-{}", self.order_attempts.load(Ordering::SeqCst)),
            state: "done".to_string(),
        })
    }
}

#[async_trait]
impl ExchangeClient for ScriptedExchange {
    async fn get_recent_closes(
        &self,
        _ticker: &Ticker,
        _interval_minutes: u32,
        count: usize,
    ) -> Result<Vec<f64>, ExchangeError> {
        let closes = self.closes.lock().unwrap();
        let start = closes.len().saturating_sub(count);
        Ok(closes[start..].to_vec())
    }

    async fn get_balance(&self, currency: &str) -> Result<Decimal, ExchangeError> {
        if self.failing_balance.lock().unwrap().as_deref() == Some(currency) {
            return Err(ExchangeError::Auth("invalid access key".to_string()));
        }
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(currency)
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn submit_market_buy(
        &self,
        _ticker: &Ticker,
        quote_amount: Decimal,
    ) -> Result<OrderResult, ExchangeError> {
        let result = self.next_order()?;
        self.buys.lock().unwrap().push(quote_amount);
        Ok(result)
    }

    async fn submit_market_sell(
        &self,
        _ticker: &Ticker,
        base_amount: Decimal,
    ) -> Result<OrderResult, ExchangeError> {
        let result = self.next_order()?;
        self.sells.lock().unwrap().push(base_amount);
        Ok(result)
    }
}

/// Keeps trades in memory
#[derive(Default)]
pub struct MemoryRecorder {
    pub trades: Vec<TradeRecord>,
}

impl TradeRecorder for MemoryRecorder {
    fn record(&mut self, trade: &TradeRecord) -> Result<(), RecorderError> {
        self.trades.push(trade.clone());
        Ok(())
    }
}

/// Strategy whose answers can be flipped from outside, counting every call
#[derive(Clone)]
pub struct Switch {
    pub name: &'static str,
    pub buy: Arc<AtomicBool>,
    pub sell: Arc<AtomicBool>,
    pub buy_calls: Arc<AtomicUsize>,
    pub sell_calls: Arc<AtomicUsize>,
}

impl Switch {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            buy: Arc::default(),
            sell: Arc::default(),
            buy_calls: Arc::default(),
            sell_calls: Arc::default(),
        }
    }

    pub fn set_buy(&self, value: bool) {
        self.buy.store(value, Ordering::SeqCst);
    }

    pub fn set_sell(&self, value: bool) {
        self.sell.store(value, Ordering::SeqCst);
    }

    pub fn buy_calls(&self) -> usize {
        self.buy_calls.load(Ordering::SeqCst)
    }

    pub fn sell_calls(&self) -> usize {
        self.sell_calls.load(Ordering::SeqCst)
    }
}

impl Strategy for Switch {
    fn should_buy(&self, _prices: &[f64]) -> bool {
        self.buy_calls.fetch_add(1, Ordering::SeqCst);
        self.buy.load(Ordering::SeqCst)
    }

    fn should_sell(&self, _prices: &[f64]) -> bool {
        self.sell_calls.fetch_add(1, Ordering::SeqCst);
        self.sell.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        self.name
    }

    fn min_samples(&self) -> usize {
        1
    }
}

pub fn krw_btc() -> Ticker {
    Ticker::new("KRW", "BTC")
}

/// Formatted log output collected from the current thread
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route this thread's tracing output into a [`LogCapture`] until the guard drops
pub fn capture_logs() -> (LogCapture, tracing::subscriber::DefaultGuard) {
    let capture = LogCapture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();

    (capture, tracing::subscriber::set_default(subscriber))
}
