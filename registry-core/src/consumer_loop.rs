use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use registry_journal::{JournalConsumer, JournalError, JournalKey, JournalProducer, JournalRecord};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::events::{EventBus, StorageEvent};
use crate::sink::Sink;

/// Partition key used for the node's own Bootstrap record. Bootstrap is not
/// scoped to any tenant — it is this node's private signal to itself that it
/// has now observed everything the journal held when it started consuming
/// (§4.H) — so it gets a fixed key rather than `partition_key(tenant, ...)`.
const BOOTSTRAP_PARTITION_KEY: &[u8] = b"__bootstrap__";

/// Depth of the hand-off queue between the record reader and the apply loop
/// (§4.H). A bounded channel rather than an unbounded one: once it is full the
/// reader's `send` suspends, so a slow Sink applies back-pressure onto journal
/// consumption instead of letting unapplied records pile up in memory.
const HANDOFF_CAPACITY: usize = 1024;

/// The single per-node task that drains the journal topic and hands every
/// record to the Sink, in delivery order (§4.H). Deliberately
/// single-threaded: applied order must equal partition order, which is the
/// only source of truth this system has for conflict resolution.
pub struct ConsumerLoop {
    producer: Arc<dyn JournalProducer>,
    sink: Arc<Sink>,
    events: EventBus,
    ready: Arc<AtomicBool>,
    last_heartbeat_unix_ms: Arc<AtomicI64>,
}

impl ConsumerLoop {
    pub fn new(producer: Arc<dyn JournalProducer>, sink: Arc<Sink>, events: EventBus) -> Self {
        Self {
            producer,
            sink,
            events,
            ready: Arc::new(AtomicBool::new(false)),
            last_heartbeat_unix_ms: Arc::new(AtomicI64::new(Utc::now().timestamp_millis())),
        }
    }

    /// A cheap, cloneable handle to this loop's readiness flag, for health
    /// endpoints that must never block on the loop itself (§4.J, §5
    /// "Liveness vs. readiness").
    pub fn readiness(&self) -> ReadinessHandle {
        ReadinessHandle {
            ready: self.ready.clone(),
            last_heartbeat_unix_ms: self.last_heartbeat_unix_ms.clone(),
        }
    }

    /// Runs until the consumer returns a terminal error or a `Fatal` apply
    /// stops the loop. Writes this node's Bootstrap record before entering
    /// the poll loop, per §4.H.
    ///
    /// Reading and applying run as two cooperating halves joined by a bounded
    /// hand-off queue: a reader task drains `consumer.recv()` as fast as the
    /// journal delivers and pushes onto the queue (updating the heartbeat on
    /// every record so `alive` tracks consumption progress, not apply
    /// progress); this task drains the queue in order and dispatches each
    /// record to the Sink. Applied order still equals delivery order — the
    /// queue only decouples *pace*, never order.
    pub async fn run(&self, mut consumer: Box<dyn JournalConsumer>) -> anyhow::Result<()> {
        let bootstrap_id = Uuid::new_v4();
        self.producer
            .send(BOOTSTRAP_PARTITION_KEY.to_vec(), JournalRecord::bootstrap(bootstrap_id))
            .await?;
        info!(%bootstrap_id, "submitted bootstrap record, entering poll loop");

        let (tx, mut rx) = mpsc::channel::<Result<JournalRecord, JournalError>>(HANDOFF_CAPACITY);
        let heartbeat = self.last_heartbeat_unix_ms.clone();
        let reader = tokio::spawn(async move {
            loop {
                let outcome = consumer.recv().await;
                heartbeat.store(Utc::now().timestamp_millis(), Ordering::Relaxed);
                let is_err = outcome.is_err();
                // Blocking send: once the queue is full this suspends, so a
                // lagging Sink slows journal consumption rather than letting
                // unapplied records accumulate unbounded in memory.
                if tx.send(outcome).await.is_err() {
                    return;
                }
                if is_err {
                    return;
                }
            }
        });

        let result = self.drain(&mut rx, bootstrap_id).await;
        reader.abort();
        result
    }

    async fn drain(
        &self,
        rx: &mut mpsc::Receiver<Result<JournalRecord, JournalError>>,
        bootstrap_id: Uuid,
    ) -> anyhow::Result<()> {
        while let Some(outcome) = rx.recv().await {
            let record = match outcome {
                Ok(record) => record,
                Err(err) => {
                    error!(%err, "journal consumer failed, stopping consumer loop");
                    return Err(err.into());
                }
            };

            match &record.key {
                JournalKey::Bootstrap { uuid } if *uuid == bootstrap_id => {
                    self.ready.store(true, Ordering::Release);
                    self.events.publish(StorageEvent::Ready);
                    info!("observed own bootstrap record, node is now ready");
                }
                JournalKey::Bootstrap { uuid } => {
                    // Another node's bootstrap record. Nothing to do here;
                    // it carries no payload and isn't this node's readiness
                    // signal.
                    debug!(%uuid, "observed a peer's bootstrap record");
                }
                JournalKey::Mutation { .. } => {
                    let ready = self.ready.load(Ordering::Acquire);
                    if let Err(err) = self.sink.handle(record, ready).await {
                        error!(%err, "sink reported a fatal error, stopping consumer loop");
                        return Err(err.into());
                    }
                }
            }
        }
        // The reader exited (consumer closed cleanly) without ever sending
        // an error; nothing left to drain.
        Ok(())
    }
}

/// What a health endpoint needs from the Consumer Loop, without holding a
/// reference to the loop itself (§4.J: "the health surface must never slow
/// down apply").
#[derive(Clone)]
pub struct ReadinessHandle {
    ready: Arc<AtomicBool>,
    last_heartbeat_unix_ms: Arc<AtomicI64>,
}

impl ReadinessHandle {
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// `alive` per §5: ready, and the loop's last observed record (or
    /// startup, if none yet) is recent enough that it isn't wedged.
    pub fn is_alive(&self, heartbeat_staleness_budget: Duration) -> bool {
        if !self.is_ready() {
            return false;
        }
        let last = self.last_heartbeat_unix_ms.load(Ordering::Relaxed);
        let age_ms = Utc::now().timestamp_millis().saturating_sub(last);
        age_ms >= 0 && Duration::from_millis(age_ms as u64) <= heartbeat_staleness_budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_journal::InMemoryJournal;

    // A full run() against a real Sink needs Postgres (see registry-core's
    // `#[sqlx::test]` integration tests for that); this exercises just the
    // bootstrap handshake's readiness bookkeeping against an in-memory
    // journal.
    #[tokio::test]
    async fn becomes_ready_after_observing_its_own_bootstrap() {
        let journal = InMemoryJournal::new(16);
        let producer = journal.producer();
        let mut consumer = journal.consumer();

        let ready = Arc::new(AtomicBool::new(false));
        let heartbeat = Arc::new(AtomicI64::new(Utc::now().timestamp_millis()));
        let handle = ReadinessHandle {
            ready: ready.clone(),
            last_heartbeat_unix_ms: heartbeat.clone(),
        };
        assert!(!handle.is_ready());

        let bootstrap_id = Uuid::new_v4();
        producer
            .send(BOOTSTRAP_PARTITION_KEY.to_vec(), JournalRecord::bootstrap(bootstrap_id))
            .await
            .unwrap();

        let record = consumer.recv().await.unwrap();
        match record.key {
            JournalKey::Bootstrap { uuid } if uuid == bootstrap_id => {
                ready.store(true, Ordering::Release);
            }
            _ => panic!("expected this node's own bootstrap record"),
        }
        assert!(handle.is_ready());
        assert!(handle.is_alive(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn not_alive_before_ready() {
        let ready = Arc::new(AtomicBool::new(false));
        let heartbeat = Arc::new(AtomicI64::new(Utc::now().timestamp_millis()));
        let handle = ReadinessHandle { ready, last_heartbeat_unix_ms: heartbeat };
        assert!(!handle.is_alive(Duration::from_secs(60)));
    }
}
