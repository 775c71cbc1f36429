use std::sync::Arc;

use chrono::{DateTime, Utc};
use registry_journal::{partition_key, JournalProducer, JournalRecord, MessagePayload, PartitionScope};
use registry_models::{StorageError, TenantId};
use uuid::Uuid;

use crate::coordinator::Coordinator;

/// Serializes a mutation onto the journal topic with a generated correlation
/// UUID (§4.F). Every write path in the Local Store Facade goes through
/// exactly one `Submitter`; the Sink never does (it applies directly).
pub struct Submitter {
    producer: Arc<dyn JournalProducer>,
    coordinator: Arc<Coordinator>,
}

impl Submitter {
    pub fn new(producer: Arc<dyn JournalProducer>, coordinator: Arc<Coordinator>) -> Self {
        Self { producer, coordinator }
    }

    /// Registers a Coordinator slot, then produces the record. On producer
    /// failure the slot is dropped and the error propagates to the caller
    /// before it ever waits (§4.F).
    pub async fn submit(
        &self,
        tenant_id: &TenantId,
        scope: PartitionScope<'_>,
        body: MessagePayload,
        submitted_at: DateTime<Utc>,
    ) -> Result<Uuid, StorageError> {
        let uuid = Uuid::new_v4();
        self.coordinator.register(uuid);

        let key = partition_key(tenant_id, scope);
        let record = JournalRecord::mutation(uuid, tenant_id.clone(), body, submitted_at);

        if let Err(err) = self.producer.send(key, record).await {
            self.coordinator.cancel(uuid);
            return Err(StorageError::StorageUnavailable(err.into()));
        }

        Ok(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use registry_journal::{InMemoryJournal, JournalError};

    struct FailingProducer;

    #[async_trait]
    impl JournalProducer for FailingProducer {
        async fn send(&self, _partition_key: Vec<u8>, _record: JournalRecord) -> registry_journal::Result<()> {
            Err(JournalError::Closed)
        }
    }

    fn reset_id_sequences_payload() -> MessagePayload {
        MessagePayload::ResetIdSequences(registry_journal::ResetIdSequencesPayload {})
    }

    #[tokio::test]
    async fn submit_registers_a_slot_before_producing() {
        let journal = InMemoryJournal::new(16);
        let mut consumer = journal.consumer();
        let coordinator = Arc::new(Coordinator::new());
        let submitter = Submitter::new(Arc::new(journal.producer()), coordinator.clone());

        let tenant_id = TenantId::new("acme".to_string());
        let uuid = submitter
            .submit(
                &tenant_id,
                PartitionScope::TenantGlobal,
                reset_id_sequences_payload(),
                Utc::now(),
            )
            .await
            .unwrap();

        let record = consumer.recv().await.unwrap();
        assert_eq!(record.key.uuid(), uuid);

        // The slot exists and is still pending; complete() must find it.
        coordinator.complete(uuid, Ok(crate::outcome::ApplyOutcome::Unit));
        let outcome = coordinator.wait_for_response(uuid, std::time::Duration::from_secs(1)).await;
        assert!(matches!(outcome, Ok(crate::outcome::ApplyOutcome::Unit)));
    }

    #[tokio::test]
    async fn producer_failure_cancels_the_slot() {
        let coordinator = Arc::new(Coordinator::new());
        let submitter = Submitter::new(Arc::new(FailingProducer), coordinator.clone());

        let tenant_id = TenantId::new("acme".to_string());
        let result = submitter
            .submit(
                &tenant_id,
                PartitionScope::TenantGlobal,
                reset_id_sequences_payload(),
                Utc::now(),
            )
            .await;

        assert!(matches!(result, Err(StorageError::StorageUnavailable(_))));
    }
}
