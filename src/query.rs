//! Shared cache of backend responses used by every page.
//!
//! - concurrent reads of one key share a single backend round trip
//! - invalidating a key while its fetch is in flight means the fetch's result still reaches whoever was
//!   waiting on it, but is never stored
//! - entries older than `stale_after` are fetched again on next read, but [`QueryCache::peek`] still sees them,
//!   including while that refetch is in flight

use crate::error::{VaxError, VaxResult};
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

type SharedFetch<V> = Shared<BoxFuture<'static, Result<Arc<V>, Arc<VaxError>>>>;

enum Slot<V> {
    Ready {
        value: Arc<V>,
        fetched_at: Instant,
    },
    Loading {
        fetch: SharedFetch<V>,
        generation: u64,
        /// A stale value being refetched, still visible to [`QueryCache::peek`].
        previous: Option<(Arc<V>, Instant)>,
    },
}

struct Inner<K, V> {
    slots: HashMap<K, Slot<V>>,
    generations: HashMap<K, u64>,
}

impl<K: Hash + Eq, V> Inner<K, V> {
    fn generation(&self, key: &K) -> u64 {
        self.generations.get(key).copied().unwrap_or_default()
    }

    fn bump(&mut self, key: K) {
        *self.generations.entry(key).or_default() += 1;
    }
}

pub struct QueryCache<K, V> {
    inner: Arc<Mutex<Inner<K, V>>>,
    stale_after: Duration,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            stale_after: self.stale_after,
        }
    }
}

impl<K, V> std::fmt::Debug for QueryCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("stale_after", &self.stale_after)
            .finish_non_exhaustive()
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(stale_after: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                slots: HashMap::new(),
                generations: HashMap::new(),
            })),
            stale_after,
        }
    }

    /// Returns the cached value for `key`, running `fetch` only if there is no fresh value and nobody else is
    /// already fetching it.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> VaxResult<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = VaxResult<V>> + Send + 'static,
    {
        let (shared, generation) = {
            let mut inner = self.inner.lock().await;
            let generation = inner.generation(&key);

            match inner.slots.get(&key) {
                Some(Slot::Ready { value, fetched_at })
                    if fetched_at.elapsed() < self.stale_after =>
                {
                    return Ok(Arc::clone(value));
                }
                Some(Slot::Loading { fetch: in_flight, .. }) => (in_flight.clone(), generation),
                _ => {
                    let previous = match inner.slots.remove(&key) {
                        Some(Slot::Ready { value, fetched_at }) => Some((value, fetched_at)),
                        _ => None,
                    };
                    let shared = fetch()
                        .map(|result| result.map(Arc::new).map_err(Arc::new))
                        .boxed()
                        .shared();
                    inner.slots.insert(
                        key.clone(),
                        Slot::Loading {
                            fetch: shared.clone(),
                            generation,
                            previous,
                        },
                    );
                    (shared, generation)
                }
            }
        };

        let result = shared.await;

        let mut inner = self.inner.lock().await;
        if inner.generation(&key) != generation {
            if result.is_ok() {
                debug!("discarding result of a fetch that was invalidated while in flight");
            }
        } else if matches!(
            inner.slots.get(&key),
            Some(Slot::Loading { generation: g, .. }) if *g == generation
        ) {
            //another waiter on the same fetch may have already stored it, which leaves nothing to do
            let previous = match inner.slots.remove(&key) {
                Some(Slot::Loading { previous, .. }) => previous,
                _ => None,
            };
            match (&result, previous) {
                (Ok(value), _) => {
                    inner.slots.insert(
                        key,
                        Slot::Ready {
                            value: Arc::clone(value),
                            fetched_at: Instant::now(),
                        },
                    );
                }
                //failures aren't cached, the next read tries again against the old value's age
                (Err(_), Some((value, fetched_at))) => {
                    inner.slots.insert(key, Slot::Ready { value, fetched_at });
                }
                (Err(_), None) => {}
            }
        }
        drop(inner);

        result.map_err(VaxError::from_shared)
    }

    /// Drops whatever is cached and fetches again.
    pub async fn refresh<F, Fut>(&self, key: K, fetch: F) -> VaxResult<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = VaxResult<V>> + Send + 'static,
    {
        self.invalidate(key.clone()).await;
        self.get_or_fetch(key, fetch).await
    }

    /// What was last loaded for `key`, however old. Never fetches.
    pub async fn peek(&self, key: &K) -> Option<Arc<V>> {
        match self.inner.lock().await.slots.get(key) {
            Some(
                Slot::Ready { value, .. }
                | Slot::Loading {
                    previous: Some((value, _)),
                    ..
                },
            ) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    /// Edits a loaded value in place. Any fetch in flight for `key` is invalidated, as its result would no
    /// longer reflect the edit.
    ///
    /// Returns `false` if nothing was loaded for `key`.
    pub async fn update(&self, key: K, edit: impl FnOnce(&mut V)) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.slots.get_mut(&key) {
            Some(Slot::Ready { value, .. }) => {
                edit(Arc::make_mut(value));
                true
            }
            Some(Slot::Loading { .. }) => {
                inner.slots.remove(&key);
                inner.bump(key);
                false
            }
            None => false,
        }
    }

    pub async fn invalidate(&self, key: K) {
        let mut inner = self.inner.lock().await;
        inner.slots.remove(&key);
        inner.bump(key);
    }
}
