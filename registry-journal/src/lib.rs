//! The Journal Codec and journal transport adapters (§4.E, §6).
//!
//! This crate owns the wire shape of mutation messages and the Bootstrap
//! sentinel, plus the `JournalProducer`/`JournalConsumer` traits that
//! `registry-core`'s Submitter (§4.F) and Consumer Loop (§4.H) depend on.
//! It knows nothing about the relational store or the Coordinator.

pub mod error;
pub mod in_memory;
pub mod journal;
pub mod kafka;
pub mod message;

pub use error::{JournalError, Result};
pub use in_memory::{InMemoryJournal, InMemoryJournalConsumer, InMemoryJournalProducer};
pub use journal::{JournalConsumer, JournalProducer};
pub use kafka::{KafkaJournalConfig, KafkaJournalConsumer, KafkaJournalProducer};
pub use message::{
    partition_key, JournalKey, JournalPayload, JournalRecord, MessagePayload, MessageType,
    PartitionScope, SCHEMA_VERSION,
};
