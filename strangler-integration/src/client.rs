use crate::circuit_breaker::CircuitBreaker;
use crate::error::IntegrationError;
use crate::rate_limit::{Priority, RateLimiter};
use crate::rest::RestRequest;
use crate::retry::retry_with_backoff;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Thin, typed façade over an HTTP brokerage API: applies Bearer auth, the
/// process-wide [`RateLimiter`] and [`CircuitBreaker`], and the retry/backoff
/// contract around any [`RestRequest`].
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    bearer_token: Arc<str>,
    rate_limiter: RateLimiter,
    circuit_breaker: CircuitBreaker,
}

impl RestClient {
    pub fn new(
        base_url: Url,
        bearer_token: impl Into<Arc<str>>,
        rate_limiter: RateLimiter,
        circuit_breaker: CircuitBreaker,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            bearer_token: bearer_token.into(),
            rate_limiter,
            circuit_breaker,
        }
    }

    /// Execute `request`, honoring `cancel`, the circuit breaker, the rate
    /// limiter, and (for idempotent requests) the exponential-backoff retry
    /// contract.
    pub async fn execute<R>(
        &self,
        request: &R,
        priority: Priority,
        cancel: &CancellationToken,
    ) -> Result<R::Response, IntegrationError>
    where
        R: RestRequest,
    {
        if !self.circuit_breaker.is_call_permitted() {
            return Err(IntegrationError::BrokerUnavailable);
        }

        let max_attempts = if request.idempotent() {
            DEFAULT_MAX_ATTEMPTS
        } else {
            1
        };

        let result = retry_with_backoff(
            max_attempts,
            |err: &IntegrationError| err.is_retryable(),
            || self.execute_once(request, priority, cancel),
        )
        .await;

        match &result {
            Ok(_) => self.circuit_breaker.record_success(),
            Err(IntegrationError::Transient(_)) | Err(IntegrationError::RateLimited) => {
                self.circuit_breaker.record_failure()
            }
            Err(_) => {}
        }

        result
    }

    async fn execute_once<R>(
        &self,
        request: &R,
        priority: Priority,
        cancel: &CancellationToken,
    ) -> Result<R::Response, IntegrationError>
    where
        R: RestRequest,
    {
        tokio::select! {
            _ = cancel.cancelled() => Err(IntegrationError::Canceled),
            result = self.send(request, priority) => result,
        }
    }

    async fn send<R>(&self, request: &R, priority: Priority) -> Result<R::Response, IntegrationError>
    where
        R: RestRequest,
    {
        self.rate_limiter.acquire(priority).await;

        let mut url = self
            .base_url
            .join(&request.path())
            .map_err(|err| IntegrationError::Validation(err.to_string()))?;
        if let Some(query) = request.query_params() {
            let qs = serde_urlencoded::to_string(query)
                .map_err(|err| IntegrationError::Validation(err.to_string()))?;
            url.set_query(Some(&qs));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.bearer_token);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|err| IntegrationError::Validation(err.to_string()))?,
        );

        let mut builder = self
            .http
            .request(request.method(), url)
            .headers(headers)
            .timeout(request.timeout());

        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        debug!(path = %request.path(), "executing broker request");

        let response = builder.send().await.map_err(IntegrationError::from)?;
        let status = response.status();

        if status.is_success() {
            response.json::<R::Response>().await.map_err(IntegrationError::from)
        } else if status.as_u16() == 404 {
            Err(IntegrationError::NotFound(request.path().into_owned()))
        } else if status.as_u16() == 429 {
            Err(IntegrationError::RateLimited)
        } else if status.as_u16() == 401 || status.as_u16() == 403 {
            let body = response.text().await.unwrap_or_default();
            Err(IntegrationError::Auth(body))
        } else if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            Err(IntegrationError::Transient(format!("{status}: {body}")))
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %body, "broker rejected request");
            Err(IntegrationError::Validation(format!("{status}: {body}")))
        }
    }
}

/// Race an operation against a deadline and external cancellation, returning
/// [`IntegrationError::DeadlineExceeded`] / [`IntegrationError::Canceled`] as
/// appropriate. Used by polling loops.
pub async fn with_deadline<T, F>(
    deadline: Duration,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T, IntegrationError>
where
    F: std::future::Future<Output = T>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(IntegrationError::Canceled),
        result = tokio::time::timeout(deadline, fut) => {
            result.map_err(|_| IntegrationError::DeadlineExceeded)
        }
    }
}
