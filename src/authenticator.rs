//! Authentication handshake against the vault.

use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::error::AuthError;
use crate::token::Token;
use crate::version::ProtocolVersion;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Source of freshly minted authorization tokens.
///
/// The token cache holds an implementation behind this seam; tests
/// substitute their own.
#[async_trait]
pub trait Authenticate: Send + Sync {
    /// Mint a new token.
    ///
    /// Performs no retries; retry policy belongs to the dispatcher.
    async fn authenticate(&self) -> Result<Token, AuthError>;
}

/// Authenticator performing the handshake over HTTP.
///
/// API-key credentials send the key as the request body; certificate
/// credentials send no body, their identity already travels in the
/// TLS handshake of the HTTP client this authenticator was built
/// with. Static tokens are served locally without a network call.
pub struct HttpAuthenticator {
    http: Client,
    base_url: String,
    account: String,
    version: ProtocolVersion,
    credential: Credential,
    token_lifetime: Duration,
}

impl HttpAuthenticator {
    /// Create an authenticator for the given credential.
    #[must_use]
    pub fn new(http: Client, config: &ClientConfig, credential: Credential) -> Self {
        Self {
            http,
            base_url: config.appliance_url.trim_end_matches('/').to_string(),
            account: config.account.clone(),
            version: config.version,
            token_lifetime: config
                .token_lifetime
                .unwrap_or_else(|| config.version.token_lifetime()),
            credential,
        }
    }
}

#[async_trait]
impl Authenticate for HttpAuthenticator {
    #[instrument(
        skip(self),
        fields(kind = self.credential.kind(), account = %self.account)
    )]
    async fn authenticate(&self) -> Result<Token, AuthError> {
        if let Credential::StaticToken { raw } = &self.credential {
            debug!("serving externally supplied token");
            return Ok(Token::unbounded(raw.expose_secret().as_bytes().to_vec()));
        }

        let path = self.version.authn_path(&self.account, &self.credential);
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.http.post(&url);
        if let Credential::ApiKey { api_key, .. } = &self.credential {
            request = request.body(api_key.expose_secret().to_string());
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::transient(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::invalid_credentials(format!(
                "status {status}: {text}"
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::transient(format!("status {status}: {text}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::transient(e.to_string()))?;
        let raw = self.version.parse_token_envelope(&body)?;

        info!(
            lifetime_secs = self.token_lifetime.as_secs(),
            "authenticated with vault"
        );
        Ok(Token::new(raw, self.token_lifetime))
    }
}
