//! Fetch driver
//!
//! Wraps a single source fetch with session acquisition, bounded retries and
//! exponential backoff. Session-level failures rotate the pooled session
//! before the next attempt.

use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use rand::{Rng, thread_rng};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::session::{SessionError, SessionPool};

use super::trait_::{FetchError, FetchErrorKind, FetchOutcome, FetchParams, Source};

/// Upper bound for a single retry delay.
const MAX_BACKOFF_MS: f64 = 30_000.0;

/// Jitter factor applied on top of the exponential backoff.
const JITTER_FACTOR: f64 = 0.25;

/// Fetch from a source, retrying transient failures up to the configured
/// retry budget.
///
/// A successful fetch that yields zero records is a success and is never
/// retried. Session-crash errors invalidate the pooled session so the next
/// attempt runs on a fresh one.
pub async fn fetch_with_retry(
    source: &dyn Source,
    pool: &SessionPool,
    params: &FetchParams,
    config: &FetchConfig,
) -> Result<FetchOutcome, FetchError> {
    let labels = vec![("source", source.id().to_string())];
    let mut attempt: u32 = 0;

    loop {
        let session = match pool.acquire().await {
            Ok(session) => session,
            Err(SessionError::ShutDown) => {
                return Err(FetchError::permanent(
                    source.id(),
                    "session pool is shut down",
                ));
            }
            Err(err) => {
                return Err(FetchError::transient(source.id(), err.to_string()));
            }
        };

        let started = Instant::now();
        match source.fetch(&session, params).await {
            Ok(outcome) => {
                histogram!("fetch_duration_ms", &labels)
                    .record(started.elapsed().as_millis() as f64);
                debug!(
                    source = source.id(),
                    records = outcome.records.len(),
                    skipped = outcome.skipped,
                    "Fetch succeeded"
                );
                return Ok(outcome);
            }
            Err(err) => {
                if err.kind == FetchErrorKind::SessionCrashed {
                    pool.invalidate(&session).await;
                }
                if !err.is_retryable() || attempt >= config.max_retries {
                    counter!("fetch_failures_total", &labels).increment(1);
                    return Err(err);
                }

                let delay = retry_delay(attempt, config.retry_backoff_ms);
                warn!(
                    source = source.id(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Fetch attempt failed, retrying"
                );
                counter!("fetch_retries_total", &labels).increment(1);
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Delay before retry number `attempt + 1`: exponential backoff from the
/// configured base, capped, with additive jitter.
fn retry_delay(attempt: u32, base_ms: u64) -> Duration {
    let base = base_ms.max(1) as f64;
    let exp_backoff = (base * 2_f64.powi(attempt as i32)).min(MAX_BACKOFF_MS);
    let jitter = thread_rng().gen_range(0.0..(JITTER_FACTOR * exp_backoff));
    Duration::from_millis((exp_backoff + jitter) as u64)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::session::Session;

    struct ScriptedSource {
        failures: u32,
        kind: FetchErrorKind,
        calls: AtomicU32,
        generations: Mutex<Vec<u64>>,
    }

    impl ScriptedSource {
        fn failing(failures: u32, kind: FetchErrorKind) -> Self {
            Self {
                failures,
                kind,
                calls: AtomicU32::new(0),
                generations: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Source for ScriptedSource {
        fn id(&self) -> &'static str {
            "scripted"
        }

        async fn fetch(
            &self,
            session: &Session,
            _params: &FetchParams,
        ) -> Result<FetchOutcome, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.generations.lock().unwrap().push(session.generation());
            if call < self.failures {
                Err(match self.kind {
                    FetchErrorKind::Transient => {
                        FetchError::transient(self.id(), "scripted transient failure")
                    }
                    FetchErrorKind::Permanent => {
                        FetchError::permanent(self.id(), "scripted permanent failure")
                    }
                    FetchErrorKind::SessionCrashed => {
                        FetchError::session_crashed(self.id(), "scripted session crash")
                    }
                })
            } else {
                Ok(FetchOutcome::default())
            }
        }
    }

    fn test_config() -> FetchConfig {
        FetchConfig {
            max_retries: 2,
            retry_backoff_ms: 1,
            ..FetchConfig::default()
        }
    }

    #[tokio::test]
    async fn transient_failures_retry_until_success() {
        let config = test_config();
        let pool = SessionPool::new(&config);
        let source = ScriptedSource::failing(2, FetchErrorKind::Transient);

        let result =
            fetch_with_retry(&source, &pool, &FetchParams::default(), &config).await;

        assert!(result.is_ok());
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_do_not_retry() {
        let config = test_config();
        let pool = SessionPool::new(&config);
        let source = ScriptedSource::failing(10, FetchErrorKind::Permanent);

        let result =
            fetch_with_retry(&source, &pool, &FetchParams::default(), &config).await;

        assert!(matches!(
            result,
            Err(FetchError {
                kind: FetchErrorKind::Permanent,
                ..
            })
        ));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_stop_at_the_configured_budget() {
        let config = test_config();
        let pool = SessionPool::new(&config);
        let source = ScriptedSource::failing(10, FetchErrorKind::Transient);

        let result =
            fetch_with_retry(&source, &pool, &FetchParams::default(), &config).await;

        assert!(result.is_err());
        // One initial attempt plus max_retries retries.
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn session_crash_rotates_the_session() {
        let config = test_config();
        let pool = SessionPool::new(&config);
        let source = ScriptedSource::failing(1, FetchErrorKind::SessionCrashed);

        let result =
            fetch_with_retry(&source, &pool, &FetchParams::default(), &config).await;

        assert!(result.is_ok());
        let generations = source.generations.lock().unwrap();
        assert_eq!(generations.len(), 2);
        assert_ne!(generations[0], generations[1], "expected a fresh session");
    }

    #[tokio::test]
    async fn shutdown_pool_fails_without_calling_the_source() {
        let config = test_config();
        let pool = SessionPool::new(&config);
        pool.shutdown().await;
        let source = ScriptedSource::failing(0, FetchErrorKind::Transient);

        let result =
            fetch_with_retry(&source, &pool, &FetchParams::default(), &config).await;

        assert!(result.is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn retry_delay_grows_and_stays_bounded() {
        let first = retry_delay(0, 500);
        let second = retry_delay(1, 500);
        assert!(first.as_millis() >= 500);
        assert!(second.as_millis() >= 1000);
        assert!(retry_delay(30, 500).as_millis() as f64 <= MAX_BACKOFF_MS * (1.0 + JITTER_FACTOR));
    }
}
