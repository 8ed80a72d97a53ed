use crate::blockchain::models::{SignatureRecord, TransactionDetail};
use crate::config::Config;
use backon::{ConstantBuilder, Retryable};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC endpoint returned HTTP {0}")]
    Status(StatusCode),

    /// HTTP 429. Absorbed by the retry loop, never returned to callers.
    #[error("Rate limited by RPC endpoint")]
    RateLimited,

    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc { code: i64, message: String },

    #[error("Malformed RPC response: {0}")]
    Malformed(String),

    #[error("RPC call cancelled")]
    Cancelled,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC client for the two history methods.
///
/// Every HTTP attempt first passes the optional global rate gate. A 429 sleeps
/// for the configured backoff and resends the identical request, as many times
/// as it takes; any other failure is returned to the caller. Cancelling the
/// shutdown token ends the backoff early and the call returns `Cancelled`.
pub struct SolanaClient {
    http: reqwest::Client,
    rpc_url: String,
    rate_limit_backoff: Duration,
    limiter: Option<DefaultDirectRateLimiter>,
    next_id: AtomicU64,
    shutdown: CancellationToken,
}

impl SolanaClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let timeout = Duration::from_secs(config.rpc_timeout_secs);

        info!(
            "Initializing Solana client with RPC endpoint: {}, rate limit: {:?}",
            config.solana_rpc_url, config.rpc_rate_limit
        );

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        let limiter = config
            .rpc_rate_limit
            .and_then(NonZeroU32::new)
            .map(|per_second| RateLimiter::direct(Quota::per_second(per_second)));

        Ok(Self {
            http,
            rpc_url: config.solana_rpc_url.clone(),
            rate_limit_backoff: config.rate_limit_backoff,
            limiter,
            next_id: AtomicU64::new(1),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Get up to `limit` signatures for `address` older than `before`,
    /// newest first. An empty vector means there is nothing further back.
    pub async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
        before: Option<&str>,
        commitment: Option<&str>,
    ) -> Result<Vec<SignatureRecord>, ClientError> {
        let mut options = Map::new();
        options.insert("limit".to_string(), json!(limit));
        if let Some(before) = before {
            options.insert("before".to_string(), json!(before));
        }
        if let Some(commitment) = commitment {
            options.insert("commitment".to_string(), json!(commitment));
        }

        let signatures: Option<Vec<SignatureRecord>> = self
            .call("getSignaturesForAddress", json!([address, options]))
            .await?;

        Ok(signatures.unwrap_or_default())
    }

    /// Get the full `jsonParsed` transaction. `None` when the node does not
    /// have it (yet).
    pub async fn get_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<TransactionDetail>, ClientError> {
        let params = json!([
            signature,
            {
                "encoding": "jsonParsed",
                "maxSupportedTransactionVersion": 0
            }
        ]);

        let result: Option<Value> = self.call("getTransaction", params).await?;

        match result {
            None => Ok(None),
            Some(Value::Object(raw)) if raw.is_empty() => Ok(None),
            Some(Value::Object(raw)) => Ok(Some(TransactionDetail::from_payload(signature, raw))),
            Some(other) => Err(ClientError::Malformed(format!(
                "getTransaction result for {} is not an object: {}",
                signature, other
            ))),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, ClientError> {
        // Built once so a retry after 429 resends the same request
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let backoff = ConstantBuilder::default()
            .with_delay(self.rate_limit_backoff)
            .without_max_times();

        let shutdown = &self.shutdown;
        let body = &body;
        let attempt = || async move {
            if shutdown.is_cancelled() {
                return Err(ClientError::Cancelled);
            }
            self.send::<T>(body).await
        };

        let sleep_token = self.shutdown.clone();
        let sleep = move |delay: Duration| {
            let token = sleep_token.clone();
            async move {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = token.cancelled() => {}
                }
            }
        };

        attempt
            .retry(backoff)
            .sleep(sleep)
            .when(|e| matches!(e, ClientError::RateLimited))
            .notify(|_, delay| {
                warn!("Rate limit hit on {}. Waiting {:?} before retrying", method, delay);
            })
            .await
    }

    async fn send<T: DeserializeOwned>(&self, body: &Value) -> Result<Option<T>, ClientError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let response = self.http.post(&self.rpc_url).json(body).send().await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ClientError::RateLimited);
        }
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }

        let text = response.text().await?;
        let parsed: JsonRpcResponse<T> = serde_json::from_str(&text)
            .map_err(|e| ClientError::Malformed(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(ClientError::JsonRpc {
                code: error.code,
                message: error.message,
            });
        }

        if parsed.result.is_none() {
            debug!("Empty result for {}", body["method"]);
        }

        Ok(parsed.result)
    }
}
