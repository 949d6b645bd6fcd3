//! Authenticated client for the vault secrets-management service.
//!
//! Provides token-based authentication with safe caching and renewal
//! under concurrent use, transparent re-authentication on rejected
//! requests, and support for both the legacy and current wire
//! protocols.

pub mod authenticator;
pub mod client;
pub mod config;
pub mod credential;
mod dispatcher;
pub mod error;
pub mod policy;
pub mod resource;
pub mod token;
pub mod token_cache;
pub mod version;

pub use authenticator::{Authenticate, HttpAuthenticator};
pub use client::Client;
pub use config::ClientConfig;
pub use credential::Credential;
pub use error::{ApiResult, AuthError, ConfigError, RequestError};
pub use policy::{PolicyMode, PolicyResponse};
pub use resource::{Resource, ResourceFilter, ResourceId};
pub use token::Token;
pub use token_cache::TokenCache;
pub use version::{Operation, ProtocolVersion};
