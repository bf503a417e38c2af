use super::RetryPolicy;
use crate::api::ExchangeClient;
use crate::error::FeedError;
use crate::models::Ticker;

/// Collects the recent close-price series for one market
///
/// A response with fewer than `min_samples` closes counts as a failed attempt
/// and is retried like a network failure.
#[derive(Debug, Clone)]
pub struct MarketDataFeed {
    ticker: Ticker,
    interval_minutes: u32,
    count: usize,
    min_samples: usize,
    retry: RetryPolicy,
}

impl MarketDataFeed {
    pub fn new(
        ticker: Ticker,
        interval_minutes: u32,
        count: usize,
        min_samples: usize,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            ticker,
            interval_minutes,
            count,
            min_samples,
            retry,
        }
    }

    /// Fetch closes, oldest first
    pub async fn fetch<E>(&self, exchange: &E) -> Result<Vec<f64>, FeedError>
    where
        E: ExchangeClient + ?Sized,
    {
        let what = format!("price fetch for {}", self.ticker);

        let prices = self
            .retry
            .run(&what, || self.fetch_once(exchange))
            .await
            .map_err(|last| FeedError::Exhausted {
                attempts: self.retry.attempts,
                last: Box::new(last),
            })?;

        tracing::info!(
            "✅ Received {} candles for {}",
            prices.len(),
            self.ticker
        );
        Ok(prices)
    }

    async fn fetch_once<E>(&self, exchange: &E) -> Result<Vec<f64>, FeedError>
    where
        E: ExchangeClient + ?Sized,
    {
        let prices = exchange
            .get_recent_closes(&self.ticker, self.interval_minutes, self.count)
            .await?;

        if prices.len() < self.min_samples {
            return Err(FeedError::Insufficient {
                got: prices.len(),
                need: self.min_samples,
            });
        }

        Ok(prices)
    }
}
