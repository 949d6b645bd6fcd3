//! Authenticated request dispatch.

use crate::config::ClientConfig;
use crate::error::RequestError;
use crate::token_cache::TokenCache;
use crate::version::ProtocolVersion;
use reqwest::{Client, Method, Response, StatusCode, header};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Ceiling for a single backoff delay, however many retries ran.
const BACKOFF_CAP: Duration = Duration::from_secs(10);

/// Builds outbound requests, attaches the current token and
/// classifies responses.
///
/// A response on the configured re-auth status set invalidates the
/// cached token and is retried exactly once with a fresh mint; 5xx
/// and transport failures are retried with bounded backoff. Retry
/// state is local to each call.
#[derive(Clone)]
pub(crate) struct RequestDispatcher {
    http: Client,
    base_url: String,
    version: ProtocolVersion,
    tokens: TokenCache,
    max_retries: u32,
    retry_delay: Duration,
    reauth_statuses: Vec<u16>,
}

impl RequestDispatcher {
    pub(crate) fn new(http: Client, config: &ClientConfig, tokens: TokenCache) -> Self {
        Self {
            http,
            base_url: config.appliance_url.trim_end_matches('/').to_string(),
            version: config.version,
            tokens,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
            reauth_statuses: config.reauth_statuses.clone(),
        }
    }

    /// Backoff delay for a zero-based retry attempt.
    ///
    /// Doubles per attempt up to [`BACKOFF_CAP`], with up to 25%
    /// jitter so concurrent clients do not retry in lockstep.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let doubled = self
            .retry_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(BACKOFF_CAP);
        doubled.mul_f64(1.0 + rand::random::<f64>() * 0.25)
    }

    /// Issue an authenticated request and return the raw response for
    /// the caller to interpret.
    #[instrument(skip(self, query, body), fields(method = %method, path))]
    pub(crate) async fn dispatch(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Vec<u8>>,
    ) -> Result<Response, RequestError> {
        let mut reauthenticated = false;
        let mut transient_attempts: u32 = 0;

        loop {
            let token = self.tokens.get().await?;

            let mut request = self
                .http
                .request(method.clone(), format!("{}{}", self.base_url, path))
                .header(header::AUTHORIZATION, self.version.token_header(token.raw()));
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(b) = &body {
                request = request.body(b.clone());
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    if transient_attempts < self.max_retries {
                        let delay = self.backoff_delay(transient_attempts);
                        warn!(error = %e, attempt = transient_attempts, "transport failure, backing off");
                        tokio::time::sleep(delay).await;
                        transient_attempts += 1;
                        continue;
                    }
                    return Err(RequestError::unavailable(e.to_string()));
                }
            };

            let status = response.status();
            if self.reauth_statuses.contains(&status.as_u16()) {
                if reauthenticated {
                    return Err(RequestError::forbidden(format!(
                        "token rejected twice with status {status}"
                    )));
                }
                debug!(status = status.as_u16(), "token rejected, re-authenticating");
                self.tokens.invalidate().await;
                reauthenticated = true;
                continue;
            }
            if status.is_server_error() {
                if transient_attempts < self.max_retries {
                    let delay = self.backoff_delay(transient_attempts);
                    warn!(status = status.as_u16(), attempt = transient_attempts, "server error, backing off");
                    tokio::time::sleep(delay).await;
                    transient_attempts += 1;
                    continue;
                }
                let text = response.text().await.unwrap_or_default();
                return Err(RequestError::unavailable(format!("status {status}: {text}")));
            }
            if status == StatusCode::NOT_FOUND {
                return Err(RequestError::not_found(path));
            }
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(RequestError::protocol(format!(
                    "unexpected status {status}: {text}"
                )));
            }
            return Ok(response);
        }
    }
}
