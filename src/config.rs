//! Client configuration.

use crate::error::ConfigError;
use crate::version::ProtocolVersion;
use std::time::Duration;
use url::Url;

/// Configuration for a vault client.
///
/// The appliance URL, account and protocol version are immutable for
/// the client's lifetime.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the vault appliance
    pub appliance_url: String,
    /// Organization account served by the appliance
    pub account: String,
    /// Wire protocol generation spoken by the appliance
    pub version: ProtocolVersion,
    /// Additional root CA bundle (PEM) trusted for the appliance
    pub ssl_cert_pem: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Maximum transient retry attempts per request
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_delay: Duration,
    /// Margin subtracted from token expiry so a token cannot expire
    /// mid-flight on a slow network
    pub token_safety_margin: Duration,
    /// Response statuses that invalidate the cached token and trigger
    /// one re-authenticated retry
    pub reauth_statuses: Vec<u16>,
    /// Override for the protocol version's declared token lifetime
    pub token_lifetime: Option<Duration>,
    /// User agent header
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            appliance_url: String::new(),
            account: String::new(),
            version: ProtocolVersion::default(),
            ssl_cert_pem: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_delay: Duration::from_millis(100),
            token_safety_margin: Duration::from_secs(30),
            reauth_statuses: vec![401, 403],
            token_lifetime: None,
            user_agent: "vault-api-client/0.1".to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given appliance and account.
    #[must_use]
    pub fn new(appliance_url: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            appliance_url: appliance_url.into(),
            account: account.into(),
            ..Default::default()
        }
    }

    /// Merge settings from `VAULT_*` environment variables.
    ///
    /// Reads `VAULT_APPLIANCE_URL`, `VAULT_ACCOUNT` and
    /// `VAULT_VERSION`; unset or unrecognized values leave the
    /// defaults in place.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("VAULT_APPLIANCE_URL") {
            config.appliance_url = v;
        }
        if let Ok(v) = std::env::var("VAULT_ACCOUNT") {
            config.account = v;
        }
        if let Some(version) = std::env::var("VAULT_VERSION")
            .ok()
            .as_deref()
            .and_then(ProtocolVersion::parse)
        {
            config.version = version;
        }
        config
    }

    /// Set the protocol version.
    #[must_use]
    pub const fn with_version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum transient retry attempts.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base retry delay.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the token safety margin.
    #[must_use]
    pub const fn with_token_safety_margin(mut self, margin: Duration) -> Self {
        self.token_safety_margin = margin;
        self
    }

    /// Set the statuses that trigger invalidate-and-retry.
    #[must_use]
    pub fn with_reauth_statuses(mut self, statuses: Vec<u16>) -> Self {
        self.reauth_statuses = statuses;
        self
    }

    /// Override the declared token lifetime.
    #[must_use]
    pub const fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = Some(lifetime);
        self
    }

    /// Trust an additional root CA bundle (PEM).
    #[must_use]
    pub fn with_ssl_cert(mut self, pem: impl Into<String>) -> Self {
        self.ssl_cert_pem = Some(pem.into());
        self
    }

    /// Validate that the configuration can address an appliance.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the appliance URL is missing or
    /// unparseable, or the account is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.appliance_url.is_empty() {
            return Err(ConfigError::MissingField("appliance_url"));
        }
        Url::parse(&self.appliance_url)?;
        if self.account.is_empty() {
            return Err(ConfigError::MissingField("account"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.version, ProtocolVersion::Current);
        assert_eq!(config.token_safety_margin, Duration::from_secs(30));
        assert_eq!(config.reauth_statuses, vec![401, 403]);
        assert_eq!(config.max_retries, 3);
        assert!(config.token_lifetime.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("https://vault.example.com", "cucumber")
            .with_version(ProtocolVersion::Legacy)
            .with_max_retries(5)
            .with_token_lifetime(Duration::from_secs(120));

        assert_eq!(config.version, ProtocolVersion::Legacy);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.token_lifetime, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_validate_requires_url_and_account() {
        let config = ClientConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("appliance_url"))
        ));

        let config = ClientConfig::new("https://vault.example.com", "");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("account"))
        ));

        let config = ClientConfig::new("not a url", "cucumber");
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));

        let config = ClientConfig::new("https://vault.example.com", "cucumber");
        assert!(config.validate().is_ok());
    }
}
