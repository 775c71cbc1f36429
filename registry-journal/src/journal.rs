use async_trait::async_trait;

use crate::error::Result;
use crate::message::JournalRecord;

/// The producing half of the journal topic (§4.F, §6). `send` returns once the
/// broker/in-memory bus has acknowledged the record; it does not wait for any
/// consumer to observe it.
#[async_trait]
pub trait JournalProducer: Send + Sync {
    async fn send(&self, partition_key: Vec<u8>, record: JournalRecord) -> Result<()>;
}

/// The consuming half (§4.H). `recv` yields records one at a time, in the
/// order the underlying log delivers them for this consumer's partition
/// assignment. There is exactly one `JournalConsumer` per node (single-threaded
/// Consumer Loop, §4.H), though the trait itself does not enforce that.
#[async_trait]
pub trait JournalConsumer: Send {
    async fn recv(&mut self) -> Result<JournalRecord>;
}
