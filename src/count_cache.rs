use crate::model::{ParentScope, TenantId};
use crate::store::StoreError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info};

/// Cache key: one count per tenant and parent scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountKey {
    pub tenant: TenantId,
    pub parent: ParentScope,
}

type CountResult = Result<u64, StoreError>;
type Entries = Arc<Mutex<HashMap<CountKey, Entry>>>;

#[derive(Debug, Clone)]
enum Entry {
    Ready(u64),
    InFlight {
        rx: watch::Receiver<Option<CountResult>>,
        generation: u64,
    },
}

/// Keyed single-flight count cache.
///
/// At most one computation runs per key; callers arriving while it is in
/// flight share its result. The lock covers only entry lookup and creation,
/// never the computation, so counts for different keys never serialize.
/// Values do not expire; [`CountCache::invalidate`] drops one key.
#[derive(Debug, Default)]
pub struct CountCache {
    entries: Entries,
    generation: AtomicU64,
}

impl CountCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached count for `key`, computing it with `compute` on a
    /// miss.
    ///
    /// The computation runs on a detached task: a caller that stops waiting
    /// abandons only its own wait, the computation still completes for every
    /// other caller of the same key. Failed computations are not cached, the
    /// next caller retries.
    pub async fn get_or_compute<F, Fut>(&self, key: CountKey, compute: F) -> CountResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CountResult> + Send + 'static,
    {
        let mut rx = {
            let mut entries = self.entries.lock();
            match entries.get(&key).cloned() {
                Some(Entry::Ready(count)) => return Ok(count),
                Some(Entry::InFlight { rx, .. }) => rx,
                None => {
                    let (tx, rx) = watch::channel(None);
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    entries.insert(key.clone(), Entry::InFlight {
                        rx: rx.clone(),
                        generation,
                    });
                    drop(entries);
                    debug!(tenant = %key.tenant, "count cache miss, computing");
                    self.spawn_compute(key, generation, tx, compute());
                    rx
                }
            }
        };
        loop {
            if let Some(result) = rx.borrow_and_update().clone() {
                return result;
            }
            if rx.changed().await.is_err() {
                return Err(StoreError::Connection(
                    "count computation dropped before completing".to_string(),
                ));
            }
        }
    }

    /// Drops any cached or in-flight value for `key`. An in-flight
    /// computation keeps running for its current waiters, but its result is
    /// no longer cached.
    pub fn invalidate(&self, key: &CountKey) {
        let removed = self.entries.lock().remove(key);
        if removed.is_some() {
            info!(tenant = %key.tenant, "count cache entry invalidated");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn spawn_compute<Fut>(
        &self,
        key: CountKey,
        generation: u64,
        tx: watch::Sender<Option<CountResult>>,
        fut: Fut,
    ) where
        Fut: Future<Output = CountResult> + Send + 'static,
    {
        let entries = Arc::clone(&self.entries);
        tokio::spawn(async move {
            let mut guard = WritebackGuard {
                entries,
                key,
                generation,
                count: None,
            };
            let result = fut.await;
            if let Ok(count) = &result {
                guard.count = Some(*count);
            }
            let _ = tx.send(Some(result));
        });
    }
}

/// Settles the map entry when the computation task finishes, including when
/// it panics: a completed count becomes `Ready`, anything else clears the
/// entry so the next caller recomputes. Skips the writeback when the entry
/// was invalidated or replaced mid-flight.
#[derive(Debug)]
struct WritebackGuard {
    entries: Entries,
    key: CountKey,
    generation: u64,
    count: Option<u64>,
}

impl Drop for WritebackGuard {
    fn drop(&mut self) {
        let mut entries = self.entries.lock();
        let current = matches!(
            entries.get(&self.key),
            Some(Entry::InFlight { generation, .. }) if *generation == self.generation
        );
        if !current {
            return;
        }
        match self.count {
            Some(count) => {
                entries.insert(self.key.clone(), Entry::Ready(count));
            }
            None => {
                entries.remove(&self.key);
            }
        }
    }
}
