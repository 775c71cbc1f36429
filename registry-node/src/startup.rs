use std::sync::Arc;

use anyhow::Context;
use registry_core::{CoreConfig, Engine, NoopRuleEvaluator, SystemClock};
use registry_journal::{
    InMemoryJournal, JournalConsumer, JournalProducer, KafkaJournalConfig, KafkaJournalConsumer,
    KafkaJournalProducer,
};
use registry_store::PgStore;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::config::{JournalBackend, Settings};

/// Opens the Postgres pool and runs pending migrations (§4.J "open the
/// Postgres pool"). Migrations run unconditionally at startup rather than as
/// a separate operator step, matching how this corpus's smaller services
/// bootstrap their own schema.
pub async fn connect_store(settings: &Settings) -> anyhow::Result<PgStore> {
    let pool = PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&settings.database.url)
        .await
        .context("connecting to database")?;

    let store = PgStore::new(pool);
    store.migrate().await.context("running migrations")?;
    Ok(store)
}

/// Builds the matching producer/consumer pair for the configured journal
/// backend (§6 "Journal topic"). Every node gets its own consumer group so
/// each sees the full log independently (§4.H).
pub fn build_journal(
    settings: &Settings,
) -> anyhow::Result<(Arc<dyn JournalProducer>, Box<dyn JournalConsumer>)> {
    match settings.journal.backend {
        JournalBackend::InMemory => {
            let journal = InMemoryJournal::default();
            let producer: Arc<dyn JournalProducer> = Arc::new(journal.producer());
            let consumer: Box<dyn JournalConsumer> = Box::new(journal.consumer());
            Ok((producer, consumer))
        }
        JournalBackend::Kafka => {
            let bootstrap_servers = settings
                .journal
                .bootstrap_servers
                .clone()
                .context("journal.bootstrap_servers is required for the kafka backend")?;
            let topic = settings
                .journal
                .topic
                .clone()
                .context("journal.topic is required for the kafka backend")?;
            let group_id = settings
                .journal
                .consumer_group
                .clone()
                .unwrap_or_else(|| format!("registry-node-{}", Uuid::new_v4()));

            let config = KafkaJournalConfig {
                bootstrap_servers,
                topic,
                group_id,
                producer_timeout: std::time::Duration::from_millis(settings.journal.producer_timeout_ms),
            };

            let producer: Arc<dyn JournalProducer> = Arc::new(KafkaJournalProducer::new(&config)?);
            let consumer: Box<dyn JournalConsumer> = Box::new(KafkaJournalConsumer::new(&config)?);
            Ok((producer, consumer))
        }
    }
}

/// Wires storage, the journal, and the core into one `Engine`, but does not
/// yet spawn the Consumer Loop or bind a listener — `cmd::serve::run` does
/// both once it also has a shutdown signal to hand them.
pub async fn build_engine(settings: &Settings) -> anyhow::Result<(Engine, Box<dyn JournalConsumer>)> {
    let store = connect_store(settings).await?;
    let (producer, consumer) = build_journal(settings)?;

    let core_config = CoreConfig {
        reference_strictness: settings.core.reference_strictness(),
        write_timeout: std::time::Duration::from_secs(settings.core.write_timeout_secs),
    };

    let engine = registry_core::build_engine(
        store,
        producer,
        Arc::new(SystemClock),
        Arc::new(NoopRuleEvaluator),
        core_config,
    );

    Ok((engine, consumer))
}
