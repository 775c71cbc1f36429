use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::{JournalError, Result};
use crate::journal::{JournalConsumer, JournalProducer};
use crate::message::JournalRecord;

/// An in-process stand-in for a Kafka topic, used by tests that construct an
/// in-process `Core` with an in-memory journal adapter (§9 Design Notes).
/// Every subscriber sees every record in send order, which models the
/// "multiple nodes each consuming the full log" property of §4.H without a
/// broker. The partition key is accepted and ignored: a single `broadcast`
/// channel already delivers every record to every consumer in one total
/// order, which is a strict superset of what per-partition ordering provides.
#[derive(Clone)]
pub struct InMemoryJournal {
    sender: broadcast::Sender<JournalRecord>,
}

impl InMemoryJournal {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn producer(&self) -> InMemoryJournalProducer {
        InMemoryJournalProducer {
            sender: self.sender.clone(),
        }
    }

    /// Creates a new consumer subscribed from this call forward. Each call
    /// models one node joining the cluster: it will not see records sent
    /// before it subscribed, matching how a fresh node must bootstrap from
    /// whatever the log retains (tests seed the log before subscribing new
    /// "replica" nodes to exercise that distinction explicitly).
    pub fn consumer(&self) -> InMemoryJournalConsumer {
        InMemoryJournalConsumer {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for InMemoryJournal {
    fn default() -> Self {
        Self::new(1024)
    }
}

pub struct InMemoryJournalProducer {
    sender: broadcast::Sender<JournalRecord>,
}

#[async_trait]
impl JournalProducer for InMemoryJournalProducer {
    async fn send(&self, _partition_key: Vec<u8>, record: JournalRecord) -> Result<()> {
        self.sender
            .send(record)
            .map(|_subscriber_count| ())
            .map_err(|_| JournalError::Closed)
    }
}

pub struct InMemoryJournalConsumer {
    receiver: broadcast::Receiver<JournalRecord>,
}

#[async_trait]
impl JournalConsumer for InMemoryJournalConsumer {
    async fn recv(&mut self) -> Result<JournalRecord> {
        loop {
            match self.receiver.recv().await {
                Ok(record) => return Ok(record),
                // A slow consumer that falls behind the channel's bounded
                // capacity observes lag, not data loss in this model; skip
                // ahead rather than fail, since §4.H treats lag as acceptable
                // back-pressure and only a real broker would retain history
                // far enough to replay past it anyway.
                Err(broadcast::error::RecvError::Lagged(_skipped)) => continue,
                Err(broadcast::error::RecvError::Closed) => return Err(JournalError::Closed),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::JournalRecord;
    use uuid::Uuid;

    #[tokio::test]
    async fn every_consumer_sees_every_record() {
        let journal = InMemoryJournal::new(16);
        let producer = journal.producer();
        let mut consumer_a = journal.consumer();
        let mut consumer_b = journal.consumer();

        let uuid = Uuid::new_v4();
        producer
            .send(b"k".to_vec(), JournalRecord::bootstrap(uuid))
            .await
            .unwrap();

        let a = consumer_a.recv().await.unwrap();
        let b = consumer_b.recv().await.unwrap();
        assert_eq!(a.key.uuid(), uuid);
        assert_eq!(b.key.uuid(), uuid);
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_records() {
        let journal = InMemoryJournal::new(16);
        let producer = journal.producer();
        producer
            .send(b"k".to_vec(), JournalRecord::bootstrap(Uuid::new_v4()))
            .await
            .unwrap();

        let mut late = journal.consumer();
        let second = Uuid::new_v4();
        producer
            .send(b"k".to_vec(), JournalRecord::bootstrap(second))
            .await
            .unwrap();

        let received = late.recv().await.unwrap();
        assert_eq!(received.key.uuid(), second);
    }
}
