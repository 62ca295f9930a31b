//! Request Deduplication
//!
//! Collapses concurrent loads of the same key into one execution.

use std::collections::HashMap;
use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::Result;

type Pending<T> = watch::Receiver<Option<Result<T>>>;

// == Single Flight ==
/// Table of in-flight loads keyed by cache key.
///
/// The first caller for a key (the leader) runs the load; callers arriving
/// while it runs (followers) wait and receive a clone of its result, error
/// included. The table lock only guards inserts and removals, never the load
/// itself, so different keys never wait on each other.
#[derive(Debug)]
pub struct SingleFlight<T> {
    calls: Mutex<HashMap<String, Pending<T>>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone + Send + Sync> SingleFlight<T> {
    // == Constructor ==
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    // == Run ==
    /// Runs `load` unless a load for `key` is already in flight, in which
    /// case waits for that one and returns its result.
    ///
    /// The key leaves the table as soon as the load finishes, so the next call
    /// starts a fresh load. If a leader is dropped before finishing, its
    /// followers retry and one of them takes over.
    pub async fn run<F, Fut>(&self, key: &str, load: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let (tx, own) = loop {
            let mut pending = {
                let mut calls = self.calls.lock();
                match calls.get(key) {
                    Some(pending) => pending.clone(),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        calls.insert(key.to_string(), rx.clone());
                        break (tx, rx);
                    }
                }
            };

            let outcome = pending
                .wait_for(Option::is_some)
                .await
                .ok()
                .and_then(|done| (*done).clone());
            if let Some(result) = outcome {
                return result;
            }
        };

        let in_flight = InFlight {
            calls: &self.calls,
            key,
            own,
        };
        let result = load().await;
        drop(in_flight);

        tx.send_replace(Some(result.clone()));
        result
    }

    // == In Flight ==
    /// Number of keys currently loading.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

/// Removes the leader's table entry when the load ends or is dropped.
struct InFlight<'a, T> {
    calls: &'a Mutex<HashMap<String, Pending<T>>>,
    key: &'a str,
    own: Pending<T>,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        let mut calls = self.calls.lock();
        if calls
            .get(self.key)
            .is_some_and(|pending| pending.same_channel(&self.own))
        {
            calls.remove(self.key);
        }
    }
}
