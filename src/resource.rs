//! Resource identifiers, filters and representations.

use crate::error::RequestError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Fully qualified resource identifier, `account:kind:identifier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    /// Organization account
    pub account: String,
    /// Resource kind, e.g. `variable` or `host`
    pub kind: String,
    /// Identifier within the kind; may contain `/` and `:`
    pub identifier: String,
}

impl FromStr for ResourceId {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(account), Some(kind), Some(identifier))
                if !account.is_empty() && !kind.is_empty() && !identifier.is_empty() =>
            {
                Ok(Self {
                    account: account.to_string(),
                    kind: kind.to_string(),
                    identifier: identifier.to_string(),
                })
            }
            _ => Err(RequestError::invalid_input(format!(
                "malformed resource id: {s}"
            ))),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.account, self.kind, self.identifier)
    }
}

/// Server-side filters for resource listing, forwarded as query
/// parameters. Filter semantics are server-defined.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    /// Exact kind match
    pub kind: Option<String>,
    /// Search term
    pub search: Option<String>,
    /// Page size
    pub limit: Option<u32>,
    /// Page start
    pub offset: Option<u32>,
}

impl ResourceFilter {
    /// Create an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by resource kind.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Filter by search term.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Limit the number of results.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip results before this offset.
    #[must_use]
    pub const fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Render the set fields as query pairs.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(kind) = &self.kind {
            query.push(("kind", kind.clone()));
        }
        if let Some(search) = &self.search {
            query.push(("search", search.clone()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            query.push(("offset", offset.to_string()));
        }
        query
    }
}

/// Permission entry on a resource.
#[derive(Debug, Clone, Deserialize)]
pub struct Permission {
    /// Privilege granted, e.g. `execute`
    pub privilege: String,
    /// Role the privilege is granted to
    pub role: String,
}

/// Annotation attached to a resource.
#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    /// Annotation name
    pub name: String,
    /// Annotation value
    #[serde(default)]
    pub value: String,
}

/// A resource as reported by the vault.
#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    /// Fully qualified id
    pub id: String,
    /// Owning role
    #[serde(default)]
    pub owner: Option<String>,
    /// Policy that created the resource
    #[serde(default)]
    pub policy: Option<String>,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Permissions held on the resource
    #[serde(default)]
    pub permissions: Vec<Permission>,
    /// Annotations
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}
