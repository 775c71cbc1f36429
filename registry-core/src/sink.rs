use std::sync::Arc;

use registry_journal::{JournalKey, JournalRecord, MessagePayload};
use registry_models::{
    CommentId, ContentId, DownloadId, ReferenceStrictness, StorageError, TenantId, VersionState,
};
use registry_store::PgStore;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::coordinator::Coordinator;
use crate::events::{EventBus, StorageEvent};
use crate::outcome::ApplyOutcome;

/// Applies a decoded journal record to local state and publishes the result
/// into the Coordinator (§4.I). One `Sink` per node, owned by that node's
/// Consumer Loop; never shared with request handlers.
pub struct Sink {
    store: PgStore,
    coordinator: Arc<Coordinator>,
    events: EventBus,
    reference_strictness: ReferenceStrictness,
}

impl Sink {
    pub fn new(
        store: PgStore,
        coordinator: Arc<Coordinator>,
        events: EventBus,
        reference_strictness: ReferenceStrictness,
    ) -> Self {
        Self {
            store,
            coordinator,
            events,
            reference_strictness,
        }
    }

    /// Handles one non-Bootstrap record. Returns `Err` only for `Fatal`
    /// errors, which the Consumer Loop treats as grounds to stop (§7).
    /// Everything else — including a swallowed idempotent-replay error — is
    /// resolved internally and always returns `Ok`.
    pub async fn handle(&self, record: JournalRecord, ready: bool) -> Result<(), StorageError> {
        let JournalKey::Mutation { message_type, uuid, tenant_id } = record.key else {
            // Bootstrap records never reach the Sink; the Consumer Loop
            // intercepts them (§4.H step 2).
            return Ok(());
        };

        let Some(payload) = record.value else {
            // Tombstone: a null payload on a non-Bootstrap key (§4.E).
            debug!(%uuid, ?message_type, "skipping tombstone record");
            return Ok(());
        };

        let outcome = self.apply(&tenant_id, payload.body, payload.submitted_at).await;

        match outcome {
            Ok(value) => {
                self.coordinator.complete(uuid, Ok(value));
                self.events.publish(StorageEvent::Applied {
                    uuid,
                    message_type,
                    succeeded: true,
                });
                Ok(())
            }
            Err(StorageError::Fatal { detail }) => {
                warn!(%uuid, ?message_type, %detail, "fatal error applying journal record, stopping consumer loop");
                self.coordinator
                    .complete(uuid, Err(StorageError::Fatal { detail: detail.clone() }));
                self.events.publish(StorageEvent::Applied {
                    uuid,
                    message_type,
                    succeeded: false,
                });
                Err(StorageError::Fatal { detail })
            }
            Err(err) if !ready && err.is_idempotent_replay_error() => {
                // Historical replay during bootstrap: this node is catching
                // up on a message some other node (or this node, in a prior
                // life) already applied. The non-fatal outcome is logged and
                // swallowed rather than handed to the Coordinator, since no
                // caller on *this* node is waiting on a message that old
                // (§4.I idempotence policy).
                debug!(%uuid, ?message_type, %err, "swallowing idempotent replay error during bootstrap");
                self.events.publish(StorageEvent::Applied {
                    uuid,
                    message_type,
                    succeeded: true,
                });
                Ok(())
            }
            Err(err) => {
                self.coordinator.complete(uuid, Err(err));
                self.events.publish(StorageEvent::Applied {
                    uuid,
                    message_type,
                    succeeded: false,
                });
                Ok(())
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    async fn apply(
        &self,
        tenant_id: &TenantId,
        body: MessagePayload,
        submitted_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<ApplyOutcome, StorageError> {
        match body {
            MessagePayload::CreateGroup(p) => {
                let group = self
                    .store
                    .apply_create_group(
                        tenant_id,
                        &p.group_id,
                        &p.owner,
                        p.description.as_deref(),
                        &p.labels,
                        submitted_at,
                    )
                    .await?;
                Ok(ApplyOutcome::Group(group))
            }
            MessagePayload::UpdateGroup(p) => {
                let group = self
                    .store
                    .apply_update_group(
                        tenant_id,
                        &p.group_id,
                        &p.modified_by,
                        p.description.as_ref().map(|d| d.as_deref()),
                        p.labels.as_ref(),
                        submitted_at,
                    )
                    .await?;
                Ok(ApplyOutcome::Group(group))
            }
            MessagePayload::DeleteGroup(p) => {
                self.store.apply_delete_group(tenant_id, &p.group_id).await?;
                Ok(ApplyOutcome::Unit)
            }
            MessagePayload::CreateArtifact(p) => {
                let (artifact, version) = self
                    .store
                    .apply_create_artifact(
                        tenant_id,
                        &p.group_id,
                        &p.artifact_id,
                        &p.artifact_type,
                        &p.owner,
                        p.name.as_deref(),
                        p.description.as_deref(),
                        &p.labels,
                        p.version.as_deref(),
                        &p.content_bytes,
                        &p.content_references,
                        &p.version_properties,
                        p.version_markdown.as_deref(),
                        self.reference_strictness,
                        submitted_at,
                    )
                    .await?;
                Ok(ApplyOutcome::ArtifactAndVersion(artifact, version))
            }
            MessagePayload::UpdateArtifactMetadata(p) => {
                let artifact = self
                    .store
                    .apply_update_artifact_metadata(
                        tenant_id,
                        &p.group_id,
                        &p.artifact_id,
                        &p.modified_by,
                        p.name.as_ref().map(|n| n.as_deref()),
                        p.description.as_ref().map(|d| d.as_deref()),
                        p.labels.as_ref(),
                        submitted_at,
                    )
                    .await?;
                Ok(ApplyOutcome::Artifact(artifact))
            }
            MessagePayload::DeleteArtifact(p) => {
                self.store.apply_delete_artifact(tenant_id, &p.group_id, &p.artifact_id).await?;
                Ok(ApplyOutcome::Unit)
            }
            MessagePayload::CreateVersion(p) => {
                let version = self
                    .store
                    .apply_create_version(
                        tenant_id,
                        &p.group_id,
                        &p.artifact_id,
                        p.version.as_deref(),
                        &p.owner,
                        &p.content_bytes,
                        &p.content_references,
                        &p.properties,
                        p.markdown.as_deref(),
                        self.reference_strictness,
                        submitted_at,
                    )
                    .await?;
                Ok(ApplyOutcome::Version(version))
            }
            MessagePayload::UpdateVersionState(p) => {
                let next_state: VersionState = p.next_state;
                let version = self
                    .store
                    .apply_update_version_state(tenant_id, &p.group_id, &p.artifact_id, &p.version, next_state)
                    .await?;
                Ok(ApplyOutcome::Version(version))
            }
            MessagePayload::UpdateVersionMetadata(p) => {
                let version = self
                    .store
                    .apply_update_version_metadata(
                        tenant_id,
                        &p.group_id,
                        &p.artifact_id,
                        &p.version,
                        &p.modified_by,
                        p.name.as_ref().map(|n| n.as_deref()),
                        p.description.as_ref().map(|d| d.as_deref()),
                        p.labels.as_ref(),
                        p.properties.as_ref(),
                        submitted_at,
                    )
                    .await?;
                Ok(ApplyOutcome::Version(version))
            }
            MessagePayload::DeleteVersion(p) => {
                self.store.apply_delete_version(tenant_id, &p.group_id, &p.artifact_id, &p.version).await?;
                Ok(ApplyOutcome::Unit)
            }
            MessagePayload::UpdateContentCanonicalHash(p) => {
                self.store
                    .apply_update_content_canonical_hash(
                        tenant_id,
                        ContentId::new(p.content_id),
                        &p.expected_content_hash,
                        &p.new_canonical_hash,
                    )
                    .await?;
                Ok(ApplyOutcome::Unit)
            }
            MessagePayload::SetGlobalRule(p) => {
                let rule = self.store.apply_set_global_rule(tenant_id, &p.rule_type, &p.config).await?;
                Ok(ApplyOutcome::Rule(rule))
            }
            MessagePayload::DeleteGlobalRule(p) => {
                self.store.apply_delete_global_rule(tenant_id, &p.rule_type).await?;
                Ok(ApplyOutcome::Unit)
            }
            MessagePayload::DeleteAllGlobalRules(_) => {
                self.store.apply_delete_all_global_rules(tenant_id).await?;
                Ok(ApplyOutcome::Unit)
            }
            MessagePayload::SetArtifactRule(p) => {
                let rule = self
                    .store
                    .apply_set_artifact_rule(tenant_id, &p.group_id, &p.artifact_id, &p.rule_type, &p.config)
                    .await?;
                Ok(ApplyOutcome::Rule(rule))
            }
            MessagePayload::DeleteArtifactRule(p) => {
                self.store
                    .apply_delete_artifact_rule(tenant_id, &p.group_id, &p.artifact_id, &p.rule_type)
                    .await?;
                Ok(ApplyOutcome::Unit)
            }
            MessagePayload::DeleteAllArtifactRules(p) => {
                self.store.apply_delete_all_artifact_rules(tenant_id, &p.group_id, &p.artifact_id).await?;
                Ok(ApplyOutcome::Unit)
            }
            MessagePayload::CreateComment(p) => {
                let version = self.store.get_version(tenant_id, &p.group_id, &p.artifact_id, &p.version).await?;
                let comment = self
                    .store
                    .apply_create_comment(tenant_id, version.global_id, &p.owner, &p.value, p.created_on)
                    .await?;
                Ok(ApplyOutcome::Comment(comment))
            }
            MessagePayload::UpdateComment(p) => {
                self.store.apply_update_comment(tenant_id, CommentId::new(p.comment_id), &p.value).await?;
                Ok(ApplyOutcome::Unit)
            }
            MessagePayload::DeleteComment(p) => {
                self.store.apply_delete_comment(tenant_id, CommentId::new(p.comment_id)).await?;
                Ok(ApplyOutcome::Unit)
            }
            MessagePayload::SetRoleMapping(p) => {
                let mapping = self
                    .store
                    .apply_set_role_mapping(tenant_id, &p.principal_id, &p.role, p.principal_name.as_deref())
                    .await?;
                Ok(ApplyOutcome::RoleMapping(mapping))
            }
            MessagePayload::DeleteRoleMapping(p) => {
                self.store.apply_delete_role_mapping(tenant_id, &p.principal_id).await?;
                Ok(ApplyOutcome::Unit)
            }
            MessagePayload::CreateDownload(p) => {
                let download = self
                    .store
                    .apply_create_download(tenant_id, DownloadId::new(p.download_id), p.context, p.expires_on)
                    .await?;
                Ok(ApplyOutcome::Download(download))
            }
            MessagePayload::ConsumeDownload(p) => {
                let download = self
                    .store
                    .apply_consume_download(tenant_id, DownloadId::new(p.download_id), submitted_at)
                    .await?;
                Ok(ApplyOutcome::Download(download))
            }
            MessagePayload::SetConfigProperty(p) => {
                let property = self
                    .store
                    .apply_set_config_property(tenant_id, &p.property_name, &p.property_value, p.modified_on)
                    .await?;
                Ok(ApplyOutcome::ConfigProperty(property))
            }
            MessagePayload::DeleteConfigProperty(p) => {
                self.store.apply_delete_config_property(tenant_id, &p.property_name).await?;
                Ok(ApplyOutcome::Unit)
            }
            MessagePayload::ResetIdSequences(_) => {
                self.store.apply_reset_id_sequences(tenant_id).await?;
                Ok(ApplyOutcome::Unit)
            }
            MessagePayload::ReserveGlobalId(p) => {
                self.store.apply_reserve_global_id(tenant_id, p.global_id).await?;
                Ok(ApplyOutcome::Unit)
            }
            MessagePayload::DeleteAllTenantData(_) => {
                self.store.apply_delete_all_tenant_data(tenant_id).await?;
                Ok(ApplyOutcome::Unit)
            }
        }
    }
}

// `handle()`/`apply()` need a live Postgres pool; see the
// `#[sqlx::test]`-based integration tests in `tests/` for coverage of the
// tombstone-skip, idempotent-replay-swallow, and fatal-stop paths.

