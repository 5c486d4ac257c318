//! Single-flight request deduplication.
//!
//! [`SingleFlightGroup`] collapses concurrent calls for the same key into one
//! execution. The first caller spawns the computation onto the runtime and
//! registers a shared receiver for it; later callers with the same key clone
//! that receiver and wait on it. The registration is removed by a drop guard
//! owned by the spawned task, so it disappears on success, failure and panic
//! alike.
//!
//! Because the computation is a spawned task, dropping any waiter, the
//! first one included, never cancels work the others are waiting on.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::Shared;
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::telemetry;
use crate::{HuginnError, Result};

type Flight<V> = Shared<oneshot::Receiver<Result<V>>>;
type FlightMap<V> = Arc<Mutex<HashMap<String, Flight<V>>>>;

/// Runs a closure when dropped.
struct CallOnDrop {
    f: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl CallOnDrop {
    fn new<F: FnOnce() + Send + 'static>(f: F) -> Self {
        Self {
            f: Some(Box::new(f)),
        }
    }
}

impl Drop for CallOnDrop {
    fn drop(&mut self) {
        if let Some(f) = self.f.take() {
            f();
        }
    }
}

/// Process-wide registry of in-flight computations keyed by string.
///
/// Keys should carry an operation prefix (see [`cache_key`](crate::cache_key))
/// so unrelated operations sharing a group cannot collide.
pub struct SingleFlightGroup<V> {
    flights: FlightMap<V>,
}

impl<V> SingleFlightGroup<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            flights: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `operation` for `key`, or join the run already in progress.
    ///
    /// `operation` is only invoked when no flight for `key` exists. Every
    /// caller of an overlapping window receives a clone of the same result,
    /// errors included; nothing is retried.
    ///
    /// # Panics
    ///
    /// Must be called within a tokio runtime; the leader spawns its
    /// computation.
    pub async fn get_or_execute<F, Fut>(&self, key: &str, operation: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let flight = {
            let mut flights = self.lock();
            match flights.get(key) {
                Some(flight) => {
                    debug!(key, "joining in-flight request");
                    metrics::counter!(
                        telemetry::DEDUP_JOINS_TOTAL,
                        "operation" => operation_label(key).to_owned()
                    )
                    .increment(1);
                    flight.clone()
                }
                None => {
                    let flight = self.spawn_flight(key.to_owned(), operation());
                    flights.insert(key.to_owned(), flight.clone());
                    flight
                }
            }
        };

        flight.await.unwrap_or_else(|_| {
            error!(key, "in-flight computation ended without a result");
            Err(HuginnError::Internal(format!(
                "computation for {key} was aborted"
            )))
        })
    }

    /// Number of computations currently registered.
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    fn spawn_flight<Fut>(&self, key: String, computation: Fut) -> Flight<V>
    where
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();

        let flights = Arc::clone(&self.flights);
        let remove_flight = CallOnDrop::new(move || {
            flights
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);
        });

        tokio::spawn(async move {
            let result = computation.await;
            // Deregister before publishing: a caller arriving after this
            // point starts a fresh flight instead of joining a finished one.
            drop(remove_flight);
            sender.send(result).ok();
        });

        receiver.shared()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Flight<V>>> {
        self.flights.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V> Default for SingleFlightGroup<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn operation_label(key: &str) -> &str {
    key.split_once(':').map_or(key, |(operation, _)| operation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_label_takes_prefix() {
        assert_eq!(operation_label("audio:00ff"), "audio");
        assert_eq!(operation_label("bare"), "bare");
    }

    #[tokio::test]
    async fn registration_removed_after_completion() {
        let group = SingleFlightGroup::<u32>::new();
        let value = group.get_or_execute("k", || async { Ok(7) }).await;
        assert_eq!(value, Ok(7));
        tokio::task::yield_now().await;
        assert_eq!(group.in_flight(), 0);
    }
}
