//! Authorization token value type.

use std::fmt;
use std::time::{Duration, Instant};

/// Short-lived authorization token minted by the vault.
///
/// The payload is opaque to this crate; the vault defines its internal
/// structure. Only the validity window is interpreted locally.
#[derive(Clone)]
pub struct Token {
    raw: Vec<u8>,
    issued_at: Instant,
    expires_at: Option<Instant>,
}

impl Token {
    /// Create a token with a bounded validity window.
    #[must_use]
    pub fn new(raw: Vec<u8>, lifetime: Duration) -> Self {
        let issued_at = Instant::now();
        Self {
            raw,
            issued_at,
            expires_at: Some(issued_at + lifetime),
        }
    }

    /// Create a token without an expiry, for externally supplied
    /// long-lived tokens.
    #[must_use]
    pub fn unbounded(raw: Vec<u8>) -> Self {
        Self {
            raw,
            issued_at: Instant::now(),
            expires_at: None,
        }
    }

    /// Raw token payload.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// When the token was minted.
    #[must_use]
    pub const fn issued_at(&self) -> Instant {
        self.issued_at
    }

    /// Whether the token is still usable once `safety_margin` is set
    /// aside for request flight time.
    #[must_use]
    pub fn is_valid(&self, safety_margin: Duration) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => Instant::now() + safety_margin < expires_at,
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("raw", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token_is_valid() {
        let token = Token::new(b"payload".to_vec(), Duration::from_secs(480));
        assert!(token.is_valid(Duration::from_secs(30)));
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let token = Token::new(b"payload".to_vec(), Duration::ZERO);
        assert!(!token.is_valid(Duration::ZERO));
    }

    #[test]
    fn test_safety_margin_invalidates_early() {
        let token = Token::new(b"payload".to_vec(), Duration::from_secs(10));
        assert!(token.is_valid(Duration::from_secs(1)));
        assert!(!token.is_valid(Duration::from_secs(30)));
    }

    #[test]
    fn test_unbounded_token_always_valid() {
        let token = Token::unbounded(b"payload".to_vec());
        assert!(token.is_valid(Duration::from_secs(3600)));
    }

    #[test]
    fn test_debug_redacts_payload() {
        let token = Token::new(b"super-secret-payload".to_vec(), Duration::from_secs(60));
        let debug = format!("{token:?}");
        assert!(!debug.contains("super-secret-payload"));
        assert!(debug.contains("[REDACTED]"));
    }
}
