pub mod key;

pub use key::CacheKey;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use crate::error::ParseError;
use crate::record::TravelRecord;

/// State published by a computation leader to its waiters.
#[derive(Debug, Clone)]
enum Progress {
    Running,
    Done(Result<TravelRecord, ParseError>),
}

struct ReadyEntry {
    record: TravelRecord,
    stored_at: Instant,
    last_used: Instant,
}

#[derive(Default)]
struct CacheState {
    ready: HashMap<CacheKey, ReadyEntry>,
    pending: HashMap<CacheKey, watch::Receiver<Progress>>,
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The computation ran (here or in a sharing caller) and failed.
    #[error(transparent)]
    Compute(ParseError),

    /// The leading caller went away before publishing a result.
    #[error("computation was cancelled before completing")]
    Cancelled,
}

/// Coordinates duplicate work across concurrent and repeated requests.
///
/// At most one computation runs per key at a time; concurrent callers for
/// the same key wait on the leader's outcome instead of recomputing.
/// Successful records are kept until their TTL passes (checked lazily on
/// read) or until evicted as least recently used. Failures are never kept.
pub struct ParseCache {
    ttl: Duration,
    max_entries: usize,
    state: Mutex<CacheState>,
}

impl ParseCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Return the cached record for `key`, or run `compute` to produce it.
    ///
    /// Errors from `compute` propagate to every caller sharing this key.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: CacheKey,
        compute: F,
    ) -> Result<TravelRecord, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TravelRecord, ParseError>>,
    {
        let (leader_tx, rx) = {
            let mut state = self.lock_state();

            if let Some(entry) = state.ready.get_mut(&key) {
                if entry.stored_at.elapsed() <= self.ttl {
                    entry.last_used = Instant::now();
                    debug!(key = %key, "cache hit");
                    return Ok(entry.record.clone());
                }
                debug!(key = %key, "cache entry expired");
                state.ready.remove(&key);
            }

            match state.pending.get(&key) {
                Some(rx) => (None, rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(Progress::Running);
                    state.pending.insert(key.clone(), rx.clone());
                    (Some(tx), rx)
                }
            }
        };

        match leader_tx {
            Some(tx) => self.lead(key, tx, rx, compute).await,
            None => self.wait(key, rx).await,
        }
    }

    async fn lead<F, Fut>(
        &self,
        key: CacheKey,
        tx: watch::Sender<Progress>,
        rx: watch::Receiver<Progress>,
        compute: F,
    ) -> Result<TravelRecord, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TravelRecord, ParseError>>,
    {
        // Unregisters the pending slot even if this future is dropped
        // mid-computation; the sender drop after that wakes any waiters.
        let _guard = PendingGuard {
            cache: self,
            key: key.clone(),
            rx,
        };

        let result = compute().await;

        if let Ok(record) = &result {
            self.store(&key, record.clone());
        }
        let _ = tx.send(Progress::Done(result.clone()));

        result.map_err(CacheError::Compute)
    }

    async fn wait(
        &self,
        key: CacheKey,
        mut rx: watch::Receiver<Progress>,
    ) -> Result<TravelRecord, CacheError> {
        debug!(key = %key, "awaiting in-flight computation");
        loop {
            {
                let progress = rx.borrow_and_update();
                if let Progress::Done(result) = &*progress {
                    return result.clone().map_err(CacheError::Compute);
                }
            }
            if rx.changed().await.is_err() {
                // Leader dropped without publishing; its guard already
                // unregistered the pending slot.
                return Err(CacheError::Cancelled);
            }
        }
    }

    fn store(&self, key: &CacheKey, record: TravelRecord) {
        let mut state = self.lock_state();

        if state.ready.len() >= self.max_entries && !state.ready.contains_key(key) {
            state
                .ready
                .retain(|_, entry| entry.stored_at.elapsed() <= self.ttl);
        }
        if state.ready.len() >= self.max_entries && !state.ready.contains_key(key) {
            let lru = state
                .ready
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(lru) = lru {
                debug!(key = %lru, "evicting least recently used entry");
                state.ready.remove(&lru);
            }
        }

        let now = Instant::now();
        state.ready.insert(
            key.clone(),
            ReadyEntry {
                record,
                stored_at: now,
                last_used: now,
            },
        );
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct PendingGuard<'a> {
    cache: &'a ParseCache,
    key: CacheKey,
    rx: watch::Receiver<Progress>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.cache.lock_state();
        if let Some(current) = state.pending.get(&self.key)
            && current.same_channel(&self.rx)
        {
            state.pending.remove(&self.key);
        }
    }
}
