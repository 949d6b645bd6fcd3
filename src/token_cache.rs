//! Token caching with single-flight refresh.
//!
//! All callers share one cached token per client. When the token is
//! missing or inside the safety margin of its expiry, the first
//! caller installs a shared refresh future and performs the
//! authenticate round-trip outside the session lock; concurrent
//! callers await the same future instead of minting their own token.
//! A generation counter guarantees that a refresh completing after an
//! [`TokenCache::invalidate`] cannot resurrect superseded state.

use crate::authenticator::Authenticate;
use crate::error::AuthError;
use crate::token::Token;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

type SharedRefresh = Shared<BoxFuture<'static, Result<Token, AuthError>>>;

/// Mutable session state, all behind one lock.
struct AuthSession {
    current: Option<Token>,
    generation: u64,
    refresh_seq: u64,
    inflight: Option<(u64, SharedRefresh)>,
}

/// Thread-safe holder of the current authorization token.
///
/// Clones share the same session.
#[derive(Clone)]
pub struct TokenCache {
    session: Arc<Mutex<AuthSession>>,
    authenticator: Arc<dyn Authenticate>,
    safety_margin: Duration,
}

impl TokenCache {
    /// Create an empty cache backed by the given authenticator.
    #[must_use]
    pub fn new(authenticator: Arc<dyn Authenticate>, safety_margin: Duration) -> Self {
        Self {
            session: Arc::new(Mutex::new(AuthSession {
                current: None,
                generation: 0,
                refresh_seq: 0,
                inflight: None,
            })),
            authenticator,
            safety_margin,
        }
    }

    /// Return a valid token, refreshing if needed.
    ///
    /// Concurrent calls while no valid token exists coalesce into a
    /// single authenticator invocation; every caller receives that
    /// invocation's outcome.
    ///
    /// # Errors
    ///
    /// Propagates the shared refresh's [`AuthError`].
    pub async fn get(&self) -> Result<Token, AuthError> {
        let refresh = {
            let mut session = self.session.lock().await;
            if let Some(token) = &session.current {
                if token.is_valid(self.safety_margin) {
                    return Ok(token.clone());
                }
            }
            let existing = session.inflight.as_ref().map(|(_, f)| f.clone());
            match existing {
                Some(inflight) => inflight,
                None => self.install_refresh(&mut session),
            }
        };
        refresh.await
    }

    /// Drop the cached token unconditionally.
    ///
    /// Called after the vault rejects an attached token. An in-flight
    /// refresh that completes afterwards is discarded rather than
    /// installed; callers already awaiting it still inherit its
    /// outcome.
    pub async fn invalidate(&self) {
        let mut session = self.session.lock().await;
        session.current = None;
        session.inflight = None;
        session.generation += 1;
    }

    /// Build a refresh future, register it as in flight and return it.
    ///
    /// Install and clear of the result run inside the future body so
    /// they execute exactly once regardless of which awaiter drives
    /// the future; cancelling the initiating caller cannot strand the
    /// in-flight marker.
    fn install_refresh(&self, session: &mut AuthSession) -> SharedRefresh {
        session.refresh_seq += 1;
        let seq = session.refresh_seq;
        let generation = session.generation;
        let authenticator = Arc::clone(&self.authenticator);
        let shared_session = Arc::clone(&self.session);

        let fut: BoxFuture<'static, Result<Token, AuthError>> = Box::pin(async move {
            let result = authenticator.authenticate().await;

            let mut session = shared_session.lock().await;
            if session.inflight.as_ref().is_some_and(|(s, _)| *s == seq) {
                session.inflight = None;
            }
            let token = result?;
            if session.generation == generation {
                session.current = Some(token.clone());
            } else {
                debug!("discarding token refresh superseded by invalidation");
            }
            Ok(token)
        });

        let shared = fut.shared();
        session.inflight = Some((seq, shared.clone()));
        shared
    }
}
