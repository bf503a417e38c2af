use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use jsonwebtoken::{EncodingKey, Header};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::ExchangeClient;
use crate::error::ExchangeError;
use crate::models::{OrderResult, Ticker};

const UPBIT_API_BASE: &str = "https://api.upbit.com";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const RATE_LIMIT_PER_SECOND: u32 = 8;
const VOLUME_DECIMALS: u32 = 8;

// Type alias for the rate limiter to simplify signatures
type UpbitRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// API key pair for authenticated endpoints
#[derive(Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl Credentials {
    /// Read `UPBIT_ACCESS_KEY` / `UPBIT_SECRET_KEY`, `None` if either is unset
    pub fn from_env() -> Option<Self> {
        let access_key = std::env::var("UPBIT_ACCESS_KEY").ok()?;
        let secret_key = std::env::var("UPBIT_SECRET_KEY").ok()?;
        Some(Self {
            access_key,
            secret_key,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Upbit REST client
///
/// Candle queries are public; balances and orders need credentials and are
/// signed with an HS256 JWT per request. All clones share one rate limiter.
#[derive(Clone)]
pub struct UpbitClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
    rate_limiter: Arc<UpbitRateLimiter>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    access_key: String,
    nonce: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_hash_alg: Option<String>,
}

/// Entry from /v1/candles/minutes/{unit}
#[derive(Debug, Deserialize)]
struct CandleEntry {
    trade_price: f64,
}

/// Entry from /v1/accounts
#[derive(Debug, Deserialize)]
struct AccountEntry {
    currency: String,
    balance: Decimal,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    name: String,
    message: String,
}

impl UpbitClient {
    pub fn new(credentials: Option<Credentials>) -> Result<Self, ExchangeError> {
        Self::with_base_url(UPBIT_API_BASE, credentials)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        credentials: Option<Credentials>,
    ) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            credentials,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(
                NonZeroU32::new(RATE_LIMIT_PER_SECOND).unwrap_or(NonZeroU32::MIN),
            ))),
        })
    }

    /// Build the `Authorization` header value, hashing `query` when present
    fn authorization(&self, query: Option<&str>) -> Result<String, ExchangeError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| ExchangeError::Auth("missing API credentials".to_string()))?;

        let query_hash = query.map(|q| hex::encode(Sha512::digest(q.as_bytes())));
        let claims = Claims {
            access_key: credentials.access_key.clone(),
            nonce: Uuid::new_v4().to_string(),
            query_hash_alg: query_hash.as_ref().map(|_| "SHA512".to_string()),
            query_hash,
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(credentials.secret_key.as_bytes()),
        )
        .map_err(|e| ExchangeError::Auth(e.to_string()))?;

        Ok(format!("Bearer {}", token))
    }

    /// Send a rate-limited request and decode the JSON body
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ExchangeError> {
        self.rate_limiter.until_ready().await;

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorBody>(&body) {
                Ok(err) => ExchangeError::Api {
                    status: status.as_u16(),
                    name: err.error.name,
                    message: err.error.message,
                },
                Err(_) => ExchangeError::Api {
                    status: status.as_u16(),
                    name: "unknown".to_string(),
                    message: body,
                },
            });
        }

        serde_json::from_str(&body).map_err(|e| ExchangeError::Decode(format!("{}: {}", e, body)))
    }

    /// POST /v1/orders; the signed query string and the JSON body carry the
    /// same parameters in the same order
    async fn place_order(&self, params: &[(&str, String)]) -> Result<OrderResult, ExchangeError> {
        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");
        let body: serde_json::Map<String, serde_json::Value> = params
            .iter()
            .map(|(key, value)| (key.to_string(), serde_json::Value::String(value.clone())))
            .collect();

        let request = self
            .client
            .post(format!("{}/v1/orders", self.base_url))
            .header(AUTHORIZATION, self.authorization(Some(&query))?)
            .json(&body);

        let result: OrderResult = self.send(request).await?;
        tracing::info!(order_id = %result.order_id, state = %result.state, "Order accepted");
        Ok(result)
    }
}

#[async_trait]
impl ExchangeClient for UpbitClient {
    async fn get_recent_closes(
        &self,
        ticker: &Ticker,
        interval_minutes: u32,
        count: usize,
    ) -> Result<Vec<f64>, ExchangeError> {
        let request = self
            .client
            .get(format!(
                "{}/v1/candles/minutes/{}",
                self.base_url, interval_minutes
            ))
            .query(&[("market", ticker.to_string()), ("count", count.to_string())]);

        let candles: Vec<CandleEntry> = self.send(request).await?;

        // Upbit returns newest first
        Ok(candles.iter().rev().map(|c| c.trade_price).collect())
    }

    async fn get_balance(&self, currency: &str) -> Result<Decimal, ExchangeError> {
        let request = self
            .client
            .get(format!("{}/v1/accounts", self.base_url))
            .header(AUTHORIZATION, self.authorization(None)?);

        let accounts: Vec<AccountEntry> = self.send(request).await?;

        Ok(accounts
            .into_iter()
            .find(|a| a.currency.eq_ignore_ascii_case(currency))
            .map(|a| a.balance)
            .unwrap_or(Decimal::ZERO))
    }

    async fn submit_market_buy(
        &self,
        ticker: &Ticker,
        quote_amount: Decimal,
    ) -> Result<OrderResult, ExchangeError> {
        let price = quote_amount.trunc().normalize();
        if price <= Decimal::ZERO {
            return Err(ExchangeError::Rejected(format!(
                "buy amount {} rounds to nothing",
                quote_amount
            )));
        }

        self.place_order(&[
            ("market", ticker.to_string()),
            ("side", "bid".to_string()),
            ("ord_type", "price".to_string()),
            ("price", price.to_string()),
        ])
        .await
    }

    async fn submit_market_sell(
        &self,
        ticker: &Ticker,
        base_amount: Decimal,
    ) -> Result<OrderResult, ExchangeError> {
        let volume = base_amount
            .round_dp_with_strategy(VOLUME_DECIMALS, RoundingStrategy::ToZero)
            .normalize();
        if volume <= Decimal::ZERO {
            return Err(ExchangeError::Rejected(format!(
                "sell volume {} rounds to nothing",
                base_amount
            )));
        }

        self.place_order(&[
            ("market", ticker.to_string()),
            ("side", "ask".to_string()),
            ("ord_type", "market".to_string()),
            ("volume", volume.to_string()),
        ])
        .await
    }
}
