//! Client façade wiring credentials, authentication and dispatch.

use crate::authenticator::HttpAuthenticator;
use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::dispatcher::RequestDispatcher;
use crate::error::{ApiResult, ConfigError, RequestError};
use crate::policy::{PolicyMode, PolicyResponse};
use crate::resource::{Resource, ResourceFilter, ResourceId};
use crate::token_cache::TokenCache;
use crate::version::Operation;
use reqwest::Method;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::instrument;

/// Authenticated client bound to one vault appliance and one
/// identity.
///
/// Construction wires the credential, authenticator, token cache and
/// dispatcher once; clones share the same session. All operations may
/// be called concurrently.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    dispatcher: RequestDispatcher,
}

impl Client {
    /// Build a client that authenticates with a login and API key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn from_api_key(
        config: ClientConfig,
        login: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let credential = Credential::ApiKey {
            login: login.into(),
            api_key: SecretString::from(api_key.into()),
        };
        Self::new(config, credential)
    }

    /// Build a client that authenticates with a client certificate.
    ///
    /// Both arguments are PEM-encoded; the identity is installed on
    /// the underlying HTTP client for mutual TLS.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the configuration or certificate
    /// material is invalid.
    pub fn from_certificate(
        config: ClientConfig,
        client_cert_pem: Vec<u8>,
        private_key_pem: Vec<u8>,
    ) -> Result<Self, ConfigError> {
        let credential = Credential::Certificate {
            client_cert_pem,
            private_key_pem,
        };
        Self::new(config, credential)
    }

    /// Build a client around an externally supplied token.
    ///
    /// The token bypasses expiry logic and is attached as-is.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the configuration is invalid.
    pub fn from_token(config: ClientConfig, raw: impl Into<String>) -> Result<Self, ConfigError> {
        let credential = Credential::StaticToken {
            raw: SecretString::from(raw.into()),
        };
        Self::new(config, credential)
    }

    /// Wire a client from validated configuration and a credential.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: ClientConfig, credential: Credential) -> Result<Self, ConfigError> {
        config.validate()?;
        let http = build_http_client(&config, &credential)?;
        let authenticator = HttpAuthenticator::new(http.clone(), &config, credential);
        let tokens = TokenCache::new(Arc::new(authenticator), config.token_safety_margin);
        let dispatcher = RequestDispatcher::new(http, &config, tokens);
        Ok(Self { config, dispatcher })
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn ensure_supported(&self, op: Operation) -> Result<(), RequestError> {
        if self.config.version.supports(op) {
            Ok(())
        } else {
            Err(RequestError::unsupported(format!(
                "{op:?} is not available on {:?} appliances",
                self.config.version
            )))
        }
    }

    /// Load a policy document onto a branch.
    ///
    /// # Errors
    ///
    /// Returns `RequestError` when dispatch fails or the response
    /// cannot be decoded.
    #[instrument(skip(self, content))]
    pub async fn load_policy(
        &self,
        mode: PolicyMode,
        branch: &str,
        content: &str,
    ) -> ApiResult<PolicyResponse> {
        self.ensure_supported(Operation::LoadPolicy)?;
        let path = self.config.version.policy_path(&self.config.account, branch);
        let response = self
            .dispatcher
            .dispatch(
                mode.http_method(),
                &path,
                &[],
                Some(content.as_bytes().to_vec()),
            )
            .await?;
        response
            .json()
            .await
            .map_err(|e| RequestError::protocol(e.to_string()))
    }

    /// Fetch a single resource by its fully qualified id.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::NotFound` when the resource does not
    /// exist or is not visible to the authenticated role.
    #[instrument(skip(self))]
    pub async fn resource(&self, id: &str) -> ApiResult<Resource> {
        self.ensure_supported(Operation::ShowResource)?;
        let rid: ResourceId = id.parse()?;
        let path = self
            .config
            .version
            .resource_path(&rid.account, &rid.kind, &rid.identifier);
        let response = self.dispatcher.dispatch(Method::GET, &path, &[], None).await?;
        response
            .json()
            .await
            .map_err(|e| RequestError::protocol(e.to_string()))
    }

    /// List resources, optionally filtered by kind, search term and
    /// pagination.
    ///
    /// Fails fast with `UnsupportedOperation` on Legacy appliances;
    /// no network call is made.
    ///
    /// # Errors
    ///
    /// Returns `RequestError` when the version gate rejects the call
    /// or dispatch fails.
    #[instrument(skip(self, filter))]
    pub async fn resources(&self, filter: Option<&ResourceFilter>) -> ApiResult<Vec<Resource>> {
        self.ensure_supported(Operation::ListResources)?;
        let path = self.config.version.resource_list_path(&self.config.account);
        let query = filter.map(ResourceFilter::to_query).unwrap_or_default();
        let response = self
            .dispatcher
            .dispatch(Method::GET, &path, &query, None)
            .await?;
        response
            .json()
            .await
            .map_err(|e| RequestError::protocol(e.to_string()))
    }

    /// Check whether the authenticated role holds `privilege` on a
    /// resource.
    ///
    /// A denial — including a resource the role cannot see — is a
    /// negative result, not an error.
    ///
    /// # Errors
    ///
    /// Returns `RequestError` for failures other than a denial.
    #[instrument(skip(self))]
    pub async fn check_permission(&self, resource_id: &str, privilege: &str) -> ApiResult<bool> {
        self.ensure_supported(Operation::CheckPermission)?;
        let rid: ResourceId = resource_id.parse()?;
        let path = self
            .config
            .version
            .resource_path(&rid.account, &rid.kind, &rid.identifier);
        let query = [
            ("check", "true".to_string()),
            ("privilege", privilege.to_string()),
        ];
        match self.dispatcher.dispatch(Method::GET, &path, &query, None).await {
            Ok(_) => Ok(true),
            Err(RequestError::NotFound(_) | RequestError::Forbidden(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Read a secret value.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::NotFound` when the secret has no value
    /// or the variable does not exist.
    #[instrument(skip(self))]
    pub async fn retrieve_secret(&self, id: &str) -> ApiResult<SecretString> {
        self.ensure_supported(Operation::RetrieveSecret)?;
        let rid: ResourceId = id.parse()?;
        let path = self
            .config
            .version
            .secret_path(&rid.account, &rid.kind, &rid.identifier);
        let response = self.dispatcher.dispatch(Method::GET, &path, &[], None).await?;
        let text = response
            .text()
            .await
            .map_err(|e| RequestError::protocol(e.to_string()))?;
        Ok(SecretString::from(text))
    }

    /// Write a secret value.
    ///
    /// # Errors
    ///
    /// Returns `RequestError` when the version gate rejects the call
    /// or dispatch fails.
    #[instrument(skip(self, value))]
    pub async fn add_secret(&self, id: &str, value: &str) -> ApiResult<()> {
        self.ensure_supported(Operation::AddSecret)?;
        let rid: ResourceId = id.parse()?;
        let path = self
            .config
            .version
            .secret_path(&rid.account, &rid.kind, &rid.identifier);
        self.dispatcher
            .dispatch(Method::POST, &path, &[], Some(value.as_bytes().to_vec()))
            .await?;
        Ok(())
    }

    /// Rotate a role's API key, returning the newly minted key.
    ///
    /// # Errors
    ///
    /// Returns `RequestError` when the version gate rejects the call
    /// or dispatch fails.
    #[instrument(skip(self))]
    pub async fn rotate_api_key(&self, role_id: &str) -> ApiResult<SecretString> {
        self.ensure_supported(Operation::RotateApiKey)?;
        let path = self.config.version.rotate_api_key_path(&self.config.account);
        let query = [("role", role_id.to_string())];
        let response = self
            .dispatcher
            .dispatch(Method::PUT, &path, &query, None)
            .await?;
        let text = response
            .text()
            .await
            .map_err(|e| RequestError::protocol(e.to_string()))?;
        Ok(SecretString::from(text))
    }
}

/// Build the shared HTTP client, feeding TLS material to the builder.
fn build_http_client(
    config: &ClientConfig,
    credential: &Credential,
) -> Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(&config.user_agent)
        .use_rustls_tls();

    if let Some(pem) = &config.ssl_cert_pem {
        let cert = reqwest::Certificate::from_pem(pem.as_bytes())
            .map_err(|e| ConfigError::InvalidCertificate(e.to_string()))?;
        builder = builder.add_root_certificate(cert);
    }

    if let Credential::Certificate {
        client_cert_pem,
        private_key_pem,
    } = credential
    {
        let mut identity_pem = client_cert_pem.clone();
        identity_pem.extend_from_slice(private_key_pem);
        let identity = reqwest::Identity::from_pem(&identity_pem)
            .map_err(|e| ConfigError::InvalidCertificate(e.to_string()))?;
        builder = builder.identity(identity);
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::ProtocolVersion;

    #[test]
    fn test_construction_rejects_invalid_config() {
        let result = Client::from_api_key(ClientConfig::default(), "alice", "key");
        assert!(matches!(result, Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn test_construction_rejects_bad_certificate_material() {
        let config = ClientConfig::new("https://vault.example.com", "cucumber");
        let result = Client::from_certificate(config, b"garbage".to_vec(), b"garbage".to_vec());
        assert!(matches!(result, Err(ConfigError::InvalidCertificate(_))));
    }

    #[tokio::test]
    async fn test_capability_gate_is_local() {
        let config = ClientConfig::new("https://vault.example.com", "cucumber")
            .with_version(ProtocolVersion::Legacy);
        let client = Client::from_api_key(config, "alice", "key").expect("client");

        let err = client.resources(None).await.expect_err("gated");
        assert!(matches!(err, RequestError::UnsupportedOperation(_)));

        let err = client
            .add_secret("cucumber:variable:x", "v")
            .await
            .expect_err("gated");
        assert!(matches!(err, RequestError::UnsupportedOperation(_)));
    }

    #[tokio::test]
    async fn test_malformed_id_rejected_before_dispatch() {
        let config = ClientConfig::new("https://vault.example.com", "cucumber");
        let client = Client::from_api_key(config, "alice", "key").expect("client");

        let err = client.resource("not-an-id").await.expect_err("rejected");
        assert!(matches!(err, RequestError::InvalidInput(_)));
    }
}
