//! Single-flight TTL cache.
//!
//! Generic "at-most-one-concurrent-computation-per-key" primitive. A `get`
//! takes one of three paths:
//!
//! 1. A live cache entry exists: return it (hit).
//! 2. A computation for the key is already in flight: attach to it. All
//!    attached callers receive the identical result.
//! 3. Otherwise: insert a new flight and run the computation. The flight
//!    stores the result on success and removes itself from the in-flight
//!    table on completion, success or failure, so a failed computation never
//!    wedges the key.
//!
//! Both tables sit behind one mutex, making check-then-insert and `clear`
//! atomic with respect to concurrent `get` calls. The lock is only held for
//! table operations, never across an await. Flights are shared futures
//! (`futures_util::future::Shared`), so whichever attached caller polls
//! drives the computation, and a cancelled leader does not strand the rest.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::clock::Clock;

/// How a value was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetch<V> {
    /// Served from a live cache entry.
    Hit(V),
    /// Freshly computed, or received from an in-flight computation.
    Computed(V),
}

impl<V> Fetch<V> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Fetch::Hit(_))
    }

    pub fn into_value(self) -> V {
        match self {
            Fetch::Hit(value) | Fetch::Computed(value) => value,
        }
    }
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

type Flight<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

struct Tables<K, V, E> {
    entries: HashMap<K, CacheEntry<V>>,
    in_flight: HashMap<K, Flight<V, E>>,
    /// Bumped by `clear`. A flight from an older generation must not store
    /// its result or touch the in-flight table; the tables it knew are gone.
    generation: u64,
}

/// TTL cache with single-flight computation per key.
pub struct SingleFlight<K, V, E> {
    tables: Arc<Mutex<Tables<K, V, E>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V, E> SingleFlight<K, V, E>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
                generation: 0,
            })),
            ttl,
            clock,
        }
    }

    /// Get the value for `key`, computing it at most once concurrently.
    pub async fn get<F>(&self, key: K, compute: F) -> Result<Fetch<V>, E>
    where
        F: Future<Output = Result<V, E>> + Send + 'static,
    {
        let flight = {
            let mut tables = self.tables.lock().expect("single-flight mutex poisoned");

            if let Some(entry) = tables.entries.get(&key) {
                let age = self.clock.now().saturating_duration_since(entry.stored_at);
                if age < self.ttl {
                    return Ok(Fetch::Hit(entry.value.clone()));
                }
            }

            if let Some(existing) = tables.in_flight.get(&key) {
                existing.clone()
            } else {
                let generation = tables.generation;
                let tables_handle = Arc::clone(&self.tables);
                let clock = Arc::clone(&self.clock);
                let flight_key = key.clone();

                let flight: Flight<V, E> = async move {
                    let result = compute.await;

                    let mut tables = tables_handle.lock().expect("single-flight mutex poisoned");
                    if tables.generation == generation {
                        if let Ok(value) = &result {
                            tables.entries.insert(
                                flight_key.clone(),
                                CacheEntry {
                                    value: value.clone(),
                                    stored_at: clock.now(),
                                },
                            );
                        }
                        tables.in_flight.remove(&flight_key);
                    }
                    result
                }
                .boxed()
                .shared();

                tables.in_flight.insert(key, flight.clone());
                flight
            }
        };

        flight.await.map(Fetch::Computed)
    }

    /// Drop all entries and in-flight registrations. Flights already running
    /// complete for their current waiters but leave no trace in the tables.
    pub fn clear(&self) {
        let mut tables = self.tables.lock().expect("single-flight mutex poisoned");
        tables.entries.clear();
        tables.in_flight.clear();
        tables.generation += 1;
    }

    /// Number of cached entries (fresh or expired-but-unreplaced).
    pub fn len(&self) -> usize {
        self.tables
            .lock()
            .expect("single-flight mutex poisoned")
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
