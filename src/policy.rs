//! Policy load modes and responses.

use reqwest::Method;
use serde::Deserialize;
use std::collections::HashMap;

/// How a policy document is applied to its branch.
///
/// The mode set is an external contract; values are fixed by the
/// vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    /// Replace the branch with the document
    Put,
    /// Add the document's statements to the branch
    Post,
    /// Apply the document, allowing deletions
    Patch,
}

impl PolicyMode {
    /// HTTP method the vault expects for this mode.
    #[must_use]
    pub fn http_method(self) -> Method {
        match self {
            Self::Put => Method::PUT,
            Self::Post => Method::POST,
            Self::Patch => Method::PATCH,
        }
    }
}

/// Role created as a side effect of a policy load.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedRole {
    /// Fully qualified role id
    pub id: String,
    /// API key minted for the role, when one was
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Response to a policy load.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyResponse {
    /// Roles created by this load, keyed by role id
    #[serde(default)]
    pub created_roles: HashMap<String, CreatedRole>,
    /// New version of the policy branch
    pub version: u32,
}
