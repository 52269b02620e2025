//! Report cache with single-flight fetches.
//!
//! One slot per [`FetchKey`]. A slot is either a committed matrix with its
//! ttl, or a pending fetch that every concurrent caller for the key awaits.
//! The fetch runs on its own task, so a caller that goes away does not take
//! the fetch (or the other waiters) with it.
//!
//! Expiry is checked on read; nothing sweeps the map. Failures are never
//! stored: the slot is cleared and the next caller starts a new fetch.

use costboard_common::{CostError, CostMatrix, FetchKey};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub type CachedMatrix = Arc<CostMatrix>;
type FetchResult = Result<CachedMatrix, CostError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: CachedMatrix,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    /// Live strictly before `created_at + ttl`.
    pub fn is_live(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) < self.ttl
    }
}

enum Slot {
    Ready(CacheEntry),
    Pending { generation: u64, fetch: SharedFetch },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct CacheStats {
    /// Served from a live entry.
    pub hits: u64,
    /// Started a new upstream fetch.
    pub misses: u64,
    /// Joined a fetch another caller had already started.
    pub coalesced: u64,
}

#[derive(Default)]
pub struct CostCache {
    slots: Mutex<HashMap<FetchKey, Slot>>,
    next_generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
}

impl CostCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Return the live value for `key`, or run `fetch` once for everyone
    /// currently asking for it.
    pub async fn get_or_fetch<F, Fut>(
        self: &Arc<Self>,
        key: FetchKey,
        ttl: Duration,
        fetch: F,
    ) -> Result<CachedMatrix, CostError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CostMatrix, CostError>> + Send + 'static,
    {
        let pending = {
            let mut slots = self.slots.lock().await;
            match slots.get(&key) {
                Some(Slot::Ready(entry)) if entry.is_live(Instant::now()) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(key = %key, "cache hit");
                    return Ok(Arc::clone(&entry.value));
                }
                Some(Slot::Pending { fetch, .. }) => {
                    self.coalesced.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(key = %key, "joining in-flight fetch");
                    fetch.clone()
                }
                _ => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(key = %key, generation, "cache miss, fetching");
                    let shared = self.spawn_fetch(key.clone(), generation, ttl, fetch());
                    slots.insert(
                        key,
                        Slot::Pending {
                            generation,
                            fetch: shared.clone(),
                        },
                    );
                    shared
                }
            }
        };

        pending.await
    }

    fn spawn_fetch<Fut>(
        self: &Arc<Self>,
        key: FetchKey,
        generation: u64,
        ttl: Duration,
        fetch: Fut,
    ) -> SharedFetch
    where
        Fut: Future<Output = Result<CostMatrix, CostError>> + Send + 'static,
    {
        let cache = Arc::clone(self);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let result = match AssertUnwindSafe(fetch).catch_unwind().await {
                Ok(result) => result.map(Arc::new),
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    tracing::error!(key = %task_key, error = %message, "fetch panicked");
                    Err(CostError::Internal(format!("fetch panicked: {}", message)))
                }
            };
            // Commit from the task so the slot is settled even with no waiter left.
            cache.commit(&task_key, generation, ttl, &result).await;
            result
        });

        let cache = Arc::clone(self);
        async move {
            match handle.await {
                Ok(result) => result,
                // Aborted (runtime shutdown); panics are handled inside the task.
                Err(join_error) => {
                    tracing::error!(key = %key, error = %join_error, "fetch task did not complete");
                    cache.release(&key, generation).await;
                    Err(CostError::Internal(format!(
                        "fetch task did not complete: {}",
                        join_error
                    )))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Store a finished fetch, unless the slot was invalidated (or taken over
    /// by a newer fetch) in the meantime.
    async fn commit(&self, key: &FetchKey, generation: u64, ttl: Duration, result: &FetchResult) {
        let mut slots = self.slots.lock().await;
        if !Self::is_current(&slots, key, generation) {
            tracing::debug!(key = %key, generation, "dropping result of detached fetch");
            return;
        }
        match result {
            Ok(value) => {
                slots.insert(
                    key.clone(),
                    Slot::Ready(CacheEntry {
                        value: Arc::clone(value),
                        created_at: Instant::now(),
                        ttl,
                    }),
                );
            }
            Err(error) => {
                tracing::warn!(key = %key, error = %error, "fetch failed, not caching");
                slots.remove(key);
            }
        }
    }

    async fn release(&self, key: &FetchKey, generation: u64) {
        let mut slots = self.slots.lock().await;
        if Self::is_current(&slots, key, generation) {
            slots.remove(key);
        }
    }

    fn is_current(slots: &HashMap<FetchKey, Slot>, key: &FetchKey, generation: u64) -> bool {
        matches!(slots.get(key), Some(Slot::Pending { generation: g, .. }) if *g == generation)
    }

    /// Drop whatever is held for `key`. Callers already waiting on an
    /// in-flight fetch still get its result, but it is not stored.
    pub async fn invalidate(&self, key: &FetchKey) -> bool {
        let removed = self.slots.lock().await.remove(key).is_some();
        if removed {
            tracing::info!(key = %key, "cache entry invalidated");
        }
        removed
    }

    /// Committed, unexpired entry for `key`, without triggering a fetch.
    pub async fn peek(&self, key: &FetchKey) -> Option<CacheEntry> {
        match self.slots.lock().await.get(key) {
            Some(Slot::Ready(entry)) if entry.is_live(Instant::now()) => Some(entry.clone()),
            _ => None,
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
