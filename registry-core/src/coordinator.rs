use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use registry_models::StorageError;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::outcome::ApplyOutcome;

/// Number of independent shards backing the slot map (§9 "concurrent slot
/// map"). Sized for a single node's worth of concurrent in-flight writes,
/// not for cluster-wide fan-out; 32 keeps lock contention negligible without
/// wasting memory on mostly-empty shards.
const SHARD_COUNT: usize = 32;

/// How long a completed slot lingers after `complete()` before `reap()` may
/// drop it, so a duplicate delivery of the same UUID (re-processed by a
/// retried producer, or observed twice across a consumer restart) still
/// finds a slot to complete against instead of silently no-op'ing into the
/// void (§4.G "removes the slot after a short grace window").
const GRACE_WINDOW: Duration = Duration::from_secs(30);

struct Slot {
    notify: Notify,
    outcome: Mutex<Option<Result<ApplyOutcome, StorageError>>>,
    completed_at: Mutex<Option<std::time::Instant>>,
}

impl Slot {
    fn pending() -> Arc<Self> {
        Arc::new(Self {
            notify: Notify::new(),
            outcome: Mutex::new(None),
            completed_at: Mutex::new(None),
        })
    }
}

/// The UUID rendezvous point between the Submitter (§4.F) and whichever
/// node's Sink (§4.I) applies the corresponding journal record — which, for
/// the originating node, is this node's own Sink, since every node
/// (including the originator) consumes its own write back off the journal.
///
/// A sharded map avoids a single global lock serializing every submit/apply
/// pair in the process (§9 "avoid a single global lock").
pub struct Coordinator {
    shards: Vec<Mutex<HashMap<Uuid, Arc<Slot>>>>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, uuid: Uuid) -> &Mutex<HashMap<Uuid, Arc<Slot>>> {
        let idx = (uuid.as_u128() % SHARD_COUNT as u128) as usize;
        &self.shards[idx]
    }

    /// Creates an empty slot. Must happen *before* the message is handed to
    /// the journal producer, so that even a Sink that applies the record
    /// before `submit()` returns still finds somewhere to put its result
    /// (§4.F "registers an empty slot in the Coordinator before writing to
    /// the journal").
    pub fn register(&self, uuid: Uuid) {
        self.shard(uuid).lock().unwrap().insert(uuid, Slot::pending());
    }

    /// Drops a slot that will never be completed because the producer never
    /// accepted the record (§4.F "Producer failure removes the slot").
    pub fn cancel(&self, uuid: Uuid) {
        self.shard(uuid).lock().unwrap().remove(&uuid);
    }

    /// Suspends the calling task until `uuid`'s slot is completed or
    /// `timeout` elapses. A `Timeout` here means "unknown outcome, resolve
    /// by reading" (§5) — the slot is left in place in case the apply still
    /// lands after the caller stops waiting.
    pub async fn wait_for_response(&self, uuid: Uuid, timeout: Duration) -> Result<ApplyOutcome, StorageError> {
        let slot = match self.shard(uuid).lock().unwrap().get(&uuid).cloned() {
            Some(slot) => slot,
            // Only reachable if `complete()` already reaped this slot before
            // we got here, which `GRACE_WINDOW` makes exceedingly unlikely
            // for a caller that registered and is now waiting on the same
            // UUID. Treat it the same as a timeout: unknown outcome.
            None => return Err(StorageError::Timeout),
        };

        let wait = async {
            loop {
                // Must construct the `notified()` future *before* checking
                // the outcome, so a `complete()` racing in between is still
                // observed by this exact `.await` rather than missed.
                let notified = slot.notify.notified();
                if let Some(outcome) = slot.outcome.lock().unwrap().take() {
                    return outcome;
                }
                notified.await;
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(outcome) => outcome,
            Err(_) => Err(StorageError::Timeout),
        }
    }

    /// Fulfills `uuid`'s slot, if one is still registered. Unknown UUIDs are
    /// a no-op by design — the record originated on another node, whose
    /// Coordinator (not ours) is the one a caller might be blocked on
    /// (§4.I "the completion is a no-op and only the local state mutation
    /// matters").
    pub fn complete(&self, uuid: Uuid, outcome: Result<ApplyOutcome, StorageError>) {
        let shard = self.shard(uuid);
        let slot = shard.lock().unwrap().get(&uuid).cloned();
        let Some(slot) = slot else { return };

        *slot.outcome.lock().unwrap() = Some(outcome);
        *slot.completed_at.lock().unwrap() = Some(std::time::Instant::now());
        slot.notify.notify_waiters();
    }

    /// Drops every slot whose grace window has elapsed. Intended to be
    /// called periodically (e.g. alongside the Consumer Loop's heartbeat);
    /// never load-bearing for correctness, only for bounding memory.
    pub fn reap_expired(&self) {
        let now = std::time::Instant::now();
        for shard in &self.shards {
            shard.lock().unwrap().retain(|_, slot| {
                match *slot.completed_at.lock().unwrap() {
                    Some(at) => now.duration_since(at) < GRACE_WINDOW,
                    None => true,
                }
            });
        }
    }

    /// Fails every still-pending slot with `Shutdown` so no waiter blocks
    /// forever past process shutdown (§4.G).
    pub fn shutdown(&self) {
        for shard in &self.shards {
            let map = shard.lock().unwrap();
            for slot in map.values() {
                let mut outcome = slot.outcome.lock().unwrap();
                if outcome.is_none() {
                    *outcome = Some(Err(StorageError::StorageUnavailable(anyhow::anyhow!(
                        "coordinator shutting down"
                    ))));
                }
                drop(outcome);
                slot.notify.notify_waiters();
            }
        }
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn wait_returns_the_completed_value() {
        let coordinator = Arc::new(Coordinator::new());
        let uuid = Uuid::new_v4();
        coordinator.register(uuid);

        let waiter = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.wait_for_response(uuid, Duration::from_secs(1)).await })
        };

        tokio::task::yield_now().await;
        coordinator.complete(uuid, Ok(ApplyOutcome::Unit));

        let result = waiter.await.unwrap();
        assert!(matches!(result, Ok(ApplyOutcome::Unit)));
    }

    #[tokio::test]
    async fn unregistered_uuid_completion_is_a_noop() {
        let coordinator = Coordinator::new();
        coordinator.complete(Uuid::new_v4(), Ok(ApplyOutcome::Unit));
    }

    #[tokio::test]
    async fn wait_times_out_when_never_completed() {
        let coordinator = Coordinator::new();
        let uuid = Uuid::new_v4();
        coordinator.register(uuid);

        let result = coordinator.wait_for_response(uuid, Duration::from_millis(20)).await;
        assert!(matches!(result, Err(StorageError::Timeout)));
    }

    #[tokio::test]
    async fn shutdown_fails_pending_waiters() {
        let coordinator = Arc::new(Coordinator::new());
        let uuid = Uuid::new_v4();
        coordinator.register(uuid);

        let waiter = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.wait_for_response(uuid, Duration::from_secs(5)).await })
        };

        tokio::task::yield_now().await;
        coordinator.shutdown();

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(StorageError::StorageUnavailable(_))));
    }
}
