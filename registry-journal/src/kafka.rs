use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;

use crate::error::{JournalError, Result};
use crate::journal::{JournalConsumer, JournalProducer};
use crate::message::JournalRecord;

/// Settings for building the Kafka-backed journal (§6 "Journal topic").
/// `group_id` is the Kafka consumer group; each node uses a distinct one so
/// every node sees the full log independently (§4.H: "multiple nodes each
/// consuming the full log, not... parallel consumption").
#[derive(Debug, Clone)]
pub struct KafkaJournalConfig {
    pub bootstrap_servers: String,
    pub topic: String,
    pub group_id: String,
    pub producer_timeout: Duration,
}

pub struct KafkaJournalProducer {
    producer: FutureProducer,
    topic: String,
    send_timeout: Duration,
}

impl KafkaJournalProducer {
    pub fn new(config: &KafkaJournalConfig) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("message.timeout.ms", "30000")
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .create()
            .map_err(|err| JournalError::ProducerUnavailable(err.into()))?;
        Ok(Self {
            producer,
            topic: config.topic.clone(),
            send_timeout: config.producer_timeout,
        })
    }
}

#[async_trait]
impl JournalProducer for KafkaJournalProducer {
    async fn send(&self, partition_key: Vec<u8>, record: JournalRecord) -> Result<()> {
        let payload = serde_json::to_vec(&record).map_err(JournalError::Encode)?;
        let result = self
            .producer
            .send(
                FutureRecord::to(&self.topic)
                    .key(&partition_key)
                    .payload(&payload),
                self.send_timeout,
            )
            .await;
        match result {
            Ok(_delivery) => Ok(()),
            Err((err, _owned_message)) => {
                Err(JournalError::ProducerUnavailable(producer_err(err)))
            }
        }
    }
}

fn producer_err(err: KafkaError) -> anyhow::Error {
    anyhow::anyhow!("kafka producer error: {err}")
}

pub struct KafkaJournalConsumer {
    consumer: StreamConsumer,
}

impl KafkaJournalConsumer {
    pub fn new(config: &KafkaJournalConfig) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .create()
            .map_err(|err| JournalError::ConsumerUnavailable(err.into()))?;
        consumer
            .subscribe(&[config.topic.as_str()])
            .map_err(|err| JournalError::ConsumerUnavailable(err.into()))?;
        Ok(Self { consumer })
    }
}

#[async_trait]
impl JournalConsumer for KafkaJournalConsumer {
    async fn recv(&mut self) -> Result<JournalRecord> {
        let message = self
            .consumer
            .recv()
            .await
            .map_err(|err| JournalError::ConsumerUnavailable(err.into()))?;
        match message.payload() {
            Some(bytes) => serde_json::from_slice(bytes).map_err(JournalError::Decode),
            // A record with no value can't decode to a `JournalRecord` at all
            // (unlike a tombstone, which still carries a key alongside a null
            // value); treat it as a transport-level anomaly and surface it to
            // the caller, who logs and continues per §4.H step 1.
            None => Err(JournalError::EmptyPayload),
        }
    }
}
