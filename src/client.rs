// src/client.rs

use crate::config::Config;
use crate::error::FetchError;
use crate::model::{JsonWebKey, JsonWebKeySet, KeySet};
use arc_swap::ArcSwapOption;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Where a [`KeySetCache`] gets a fresh copy of the provider's keys.
pub trait KeySource: Send + Sync + 'static {
    fn fetch_keys(&self) -> impl Future<Output = Result<Vec<JsonWebKey>, FetchError>> + Send;
}

/// Fetches the key set from a JWKS endpoint over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpKeySource {
    http_client: reqwest::Client,
    jwks_url: Url,
}

impl HttpKeySource {
    /// Creates a source whose every request is bounded by `timeout`.
    pub fn new(jwks_url: Url, timeout: Duration) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            jwks_url,
        })
    }

    pub fn jwks_url(&self) -> &Url {
        &self.jwks_url
    }

    #[instrument(skip(self), fields(url = %self.jwks_url), err)]
    async fn fetch(&self) -> Result<Vec<JsonWebKey>, FetchError> {
        debug!("Fetching JWKS");
        let response = self.http_client.get(self.jwks_url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        let jwks: JsonWebKeySet =
            serde_json::from_slice(&body).map_err(|e| FetchError::InvalidBody(e.to_string()))?;

        Ok(jwks.keys)
    }
}

impl KeySource for HttpKeySource {
    fn fetch_keys(&self) -> impl Future<Output = Result<Vec<JsonWebKey>, FetchError>> + Send {
        self.fetch()
    }
}

/// A time-bounded cache of the provider's signing keys.
///
/// The current [`KeySet`] is held as one immutable snapshot and replaced with
/// a single atomic swap, so readers always see keys and fetch time from the
/// same fetch. Refreshes are serialised: callers that queued behind a refresh
/// share its outcome, failure included, instead of fetching again. A failed
/// refresh leaves the previous snapshot in place but is reported to the
/// caller; stale keys are never served.
pub struct KeySetCache<S = HttpKeySource> {
    source: S,
    ttl: Duration,
    current: ArcSwapOption<KeySet>,
    /// Completed fetch attempts, successful or not.
    attempts: AtomicU64,
    /// Held for the duration of a fetch. Stores why the last attempt failed.
    refresh_lock: Mutex<Option<String>>,
}

impl KeySetCache<HttpKeySource> {
    /// Builds an HTTP-backed cache from the JWKS URL, timeout and TTL in `config`.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let source = HttpKeySource::new(config.jwks_url.clone(), config.fetch_timeout)?;
        Ok(Self::new(source, config.cache_ttl))
    }
}

impl<S: KeySource> KeySetCache<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            current: ArcSwapOption::empty(),
            attempts: AtomicU64::new(0),
            refresh_lock: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The snapshot currently held, fresh or not, without fetching.
    pub fn cached(&self) -> Option<Arc<KeySet>> {
        self.current.load_full()
    }

    /// Returns a key set no older than the TTL, fetching one if needed.
    #[instrument(skip(self), err)]
    pub async fn get_key_set(&self) -> Result<Arc<KeySet>, FetchError> {
        if let Some(snapshot) = self.fresh_snapshot() {
            debug!("JWKS cache hit");
            return Ok(snapshot);
        }

        let seen_attempts = self.attempts.load(Ordering::Acquire);
        let mut last_failure = self.refresh_lock.lock().await;

        // double check that no one beat us to updating the cache.
        if let Some(snapshot) = self.fresh_snapshot() {
            debug!("JWKS refreshed by a concurrent caller");
            return Ok(snapshot);
        }

        // a fetch finished while we were queued: take its outcome as ours.
        if self.attempts.load(Ordering::Acquire) != seen_attempts {
            match (last_failure.as_ref(), self.cached()) {
                (Some(reason), _) => {
                    debug!("Concurrent JWKS refresh failed, not retrying");
                    return Err(FetchError::RefreshFailed(reason.clone()));
                }
                (None, Some(snapshot)) => return Ok(snapshot),
                (None, None) => {}
            }
        }

        debug!("JWKS cache miss or expired");
        self.fetch_and_store(&mut last_failure).await
    }

    /// Fetches and stores a new key set regardless of the current one's age.
    #[instrument(skip(self), err)]
    pub async fn refresh(&self) -> Result<Arc<KeySet>, FetchError> {
        let mut last_failure = self.refresh_lock.lock().await;
        self.fetch_and_store(&mut last_failure).await
    }

    fn fresh_snapshot(&self) -> Option<Arc<KeySet>> {
        let now = Instant::now();
        self.current
            .load_full()
            .filter(|snapshot| !snapshot.is_stale(now, self.ttl))
    }

    /// Must be called with `refresh_lock` held; `last_failure` is its content.
    async fn fetch_and_store(&self, last_failure: &mut Option<String>) -> Result<Arc<KeySet>, FetchError> {
        let started = Instant::now();
        let fetched = self.source.fetch_keys().await;
        self.attempts.fetch_add(1, Ordering::AcqRel);

        let keys = match fetched {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to refresh JWKS");
                *last_failure = Some(e.to_string());
                return Err(e);
            }
        };

        let snapshot = Arc::new(KeySet::new(keys, started));
        self.current.store(Some(Arc::clone(&snapshot)));
        *last_failure = None;

        info!(key_count = snapshot.keys().len(), ttl = ?self.ttl, "JWKS cache refreshed");
        Ok(snapshot)
    }
}
