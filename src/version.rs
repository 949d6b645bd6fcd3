//! Protocol version adapter.
//!
//! The two vault server generations expose incompatible wire formats:
//! endpoint paths, token envelope shape, declared token lifetime and
//! the available operation set all differ. The adapter is consulted
//! once per difference; operations never branch on the version
//! themselves.

use crate::credential::Credential;
use crate::error::AuthError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::time::Duration;

/// Operations whose availability differs between protocol versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Enumerate resources with server-side filtering
    ListResources,
    /// Show a single resource
    ShowResource,
    /// Check a privilege on a resource
    CheckPermission,
    /// Load a policy document
    LoadPolicy,
    /// Read a secret value
    RetrieveSecret,
    /// Write a secret value
    AddSecret,
    /// Rotate a role's API key
    RotateApiKey,
}

/// Wire protocol generation spoken by the target appliance.
///
/// The two generations are distinct wire formats, not adjustable
/// flags; a client must be configured with the generation its
/// appliance actually speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolVersion {
    /// v4-generation appliances
    Legacy,
    /// v5-generation appliances
    #[default]
    Current,
}

impl ProtocolVersion {
    /// Parse a version name as found in configuration.
    ///
    /// Accepts `legacy`/`v4`/`4` and `current`/`v5`/`5`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "v4" | "4" => Some(Self::Legacy),
            "current" | "v5" | "5" => Some(Self::Current),
            _ => None,
        }
    }

    /// Declared lifetime of tokens minted by this generation.
    #[must_use]
    pub const fn token_lifetime(self) -> Duration {
        match self {
            Self::Legacy => Duration::from_secs(5 * 60),
            Self::Current => Duration::from_secs(8 * 60),
        }
    }

    /// Whether this generation's API routes the operation at all.
    #[must_use]
    pub const fn supports(self, op: Operation) -> bool {
        match self {
            Self::Current => true,
            Self::Legacy => !matches!(
                op,
                Operation::ListResources | Operation::AddSecret | Operation::RotateApiKey
            ),
        }
    }

    /// Path of the authenticate endpoint for the given credential.
    ///
    /// Certificate credentials carry no login; their endpoints are the
    /// login-less variants and identity travels in the TLS handshake.
    #[must_use]
    pub fn authn_path(self, account: &str, credential: &Credential) -> String {
        match (self, credential.login()) {
            (Self::Current, Some(login)) => {
                format!("/authn/{account}/{}/authenticate", encode_segment(login))
            }
            (Self::Current, None) => format!("/authn/{account}/authenticate"),
            (Self::Legacy, Some(login)) => {
                format!("/api/authn/users/{}/authenticate", encode_segment(login))
            }
            (Self::Legacy, None) => "/api/authn/users/authenticate".to_string(),
        }
    }

    /// Render the `Authorization` header value carrying a token.
    ///
    /// Current appliances take the JSON token base64-encoded; Legacy
    /// appliances mint base64 text and expect it attached verbatim.
    #[must_use]
    pub fn token_header(self, raw: &[u8]) -> String {
        match self {
            Self::Current => format!("Token token=\"{}\"", BASE64.encode(raw)),
            Self::Legacy => format!("Token token=\"{}\"", String::from_utf8_lossy(raw)),
        }
    }

    /// Validate a token envelope returned by the authenticate
    /// endpoint, returning the opaque payload to cache.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Protocol` when the body does not match this
    /// generation's envelope shape.
    pub fn parse_token_envelope(self, body: &[u8]) -> Result<Vec<u8>, AuthError> {
        match self {
            Self::Current => {
                serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(body)
                    .map_err(|e| {
                        AuthError::protocol(format!("token envelope is not a JSON object: {e}"))
                    })?;
                Ok(body.to_vec())
            }
            Self::Legacy => {
                let text = std::str::from_utf8(body)
                    .map_err(|_| AuthError::protocol("token envelope is not UTF-8"))?
                    .trim();
                if text.is_empty() {
                    return Err(AuthError::protocol("empty token envelope"));
                }
                BASE64
                    .decode(text)
                    .map_err(|e| AuthError::protocol(format!("token envelope is not base64: {e}")))?;
                Ok(text.as_bytes().to_vec())
            }
        }
    }

    /// Policy load path for a branch.
    #[must_use]
    pub fn policy_path(self, account: &str, branch: &str) -> String {
        match self {
            Self::Current => format!("/policies/{account}/policy/{}", encode_segment(branch)),
            Self::Legacy => format!("/api/policies/{}", encode_segment(branch)),
        }
    }

    /// Resource show/check path.
    #[must_use]
    pub fn resource_path(self, account: &str, kind: &str, identifier: &str) -> String {
        match self {
            Self::Current => {
                format!("/resources/{account}/{kind}/{}", encode_segment(identifier))
            }
            Self::Legacy => format!(
                "/api/authz/{account}/resources/{kind}/{}",
                encode_segment(identifier)
            ),
        }
    }

    /// Resource listing path. Only Current appliances route this;
    /// callers gate on [`Self::supports`] first.
    #[must_use]
    pub fn resource_list_path(self, account: &str) -> String {
        format!("/resources/{account}")
    }

    /// Secret read/write path.
    #[must_use]
    pub fn secret_path(self, account: &str, kind: &str, identifier: &str) -> String {
        match self {
            Self::Current => format!("/secrets/{account}/{kind}/{}", encode_segment(identifier)),
            Self::Legacy => format!("/api/variables/{}/value", encode_segment(identifier)),
        }
    }

    /// API key rotation path; the role travels as a query parameter.
    #[must_use]
    pub fn rotate_api_key_path(self, account: &str) -> String {
        format!("/authn/{account}/api_key")
    }
}

/// Identifiers and logins may contain `/`, which must survive
/// URL-encoded inside a single path segment.
fn encode_segment(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}
