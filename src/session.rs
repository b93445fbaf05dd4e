//! # Fetch Session Pool
//!
//! Both sources fetch through one shared HTTP session: a configured
//! `reqwest::Client` carrying the user agent, per-request timeout, and warm
//! connection pool. The pool hands out cheap cloned handles, discards the
//! session when a fetch reports it unusable, and rebuilds it lazily on the
//! next acquire. Dropping a handle releases it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use metrics::counter;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::FetchConfig;

/// Errors produced by the session pool.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to build fetch session: {0}")]
    Build(#[from] reqwest::Error),
    #[error("session pool is shut down")]
    ShutDown,
}

/// Handle to the shared fetch session.
#[derive(Clone, Debug)]
pub struct Session {
    client: reqwest::Client,
    generation: u64,
}

impl Session {
    /// The HTTP client backing this session.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Monotonic generation stamp, used to match a failing handle against
    /// the pool's current session.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

enum Slot {
    Empty,
    Ready(Session),
    Closed,
}

/// Pool owning the shared session slot.
pub struct SessionPool {
    slot: Mutex<Slot>,
    generations: AtomicU64,
    user_agent: String,
    request_timeout: Duration,
}

impl SessionPool {
    pub fn new(fetch: &FetchConfig) -> Self {
        Self {
            slot: Mutex::new(Slot::Empty),
            generations: AtomicU64::new(0),
            user_agent: fetch.user_agent.clone(),
            request_timeout: Duration::from_millis(fetch.timeout_ms),
        }
    }

    /// Returns the current session, building one first if none exists.
    pub async fn acquire(&self) -> Result<Session, SessionError> {
        let mut slot = self.slot.lock().await;
        match &*slot {
            Slot::Closed => Err(SessionError::ShutDown),
            Slot::Ready(session) => Ok(session.clone()),
            Slot::Empty => {
                let session = self.build_session()?;
                info!(generation = session.generation, "built fetch session");
                *slot = Slot::Ready(session.clone());
                Ok(session)
            }
        }
    }

    /// Discards the shared session if `session` is still the current one.
    ///
    /// Called when a fetch fails in a way that taints the whole session.
    /// Stale handles (a concurrent fetch already invalidated) are ignored so
    /// a fresh session is not torn down by old failures.
    pub async fn invalidate(&self, session: &Session) {
        let mut slot = self.slot.lock().await;
        if let Slot::Ready(current) = &*slot
            && current.generation == session.generation
        {
            info!(
                generation = session.generation,
                "discarding fetch session after unrecoverable error"
            );
            counter!("session_pool_discards_total").increment(1);
            *slot = Slot::Empty;
        } else {
            debug!(
                generation = session.generation,
                "ignoring invalidate for stale session handle"
            );
        }
    }

    /// Shuts the pool down. Subsequent acquires fail fast; in-flight handles
    /// stay usable until dropped.
    pub async fn shutdown(&self) {
        let mut slot = self.slot.lock().await;
        *slot = Slot::Closed;
        info!("session pool shut down");
    }

    fn build_session(&self) -> Result<Session, SessionError> {
        let client = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.request_timeout)
            .connect_timeout(self.request_timeout.min(Duration::from_secs(10)))
            .build()?;
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        counter!("session_pool_builds_total").increment(1);
        Ok(Session { client, generation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> SessionPool {
        SessionPool::new(&FetchConfig {
            rankings_base_url: "https://rankings.test".to_string(),
            leaderboard_base_url: "https://leaderboard.test".to_string(),
            ..FetchConfig::default()
        })
    }

    #[tokio::test]
    async fn acquire_reuses_the_current_session() {
        let pool = pool();

        let first = pool.acquire().await.unwrap();
        let second = pool.acquire().await.unwrap();

        assert_eq!(first.generation(), second.generation());
    }

    #[tokio::test]
    async fn invalidate_forces_a_rebuild() {
        let pool = pool();

        let first = pool.acquire().await.unwrap();
        pool.invalidate(&first).await;
        let second = pool.acquire().await.unwrap();

        assert_ne!(first.generation(), second.generation());
    }

    #[tokio::test]
    async fn stale_invalidate_leaves_fresh_session_alone() {
        let pool = pool();

        let stale = pool.acquire().await.unwrap();
        pool.invalidate(&stale).await;
        let fresh = pool.acquire().await.unwrap();

        // A second invalidate with the old handle must not tear down the
        // rebuilt session.
        pool.invalidate(&stale).await;
        let current = pool.acquire().await.unwrap();

        assert_eq!(fresh.generation(), current.generation());
    }

    #[tokio::test]
    async fn shutdown_fails_subsequent_acquires() {
        let pool = pool();

        pool.shutdown().await;

        assert!(matches!(
            pool.acquire().await,
            Err(SessionError::ShutDown)
        ));
    }
}
