use std::sync::Arc;
use std::time::Duration;

use registry_journal::{
    ConsumeDownloadPayload, CreateArtifactPayload, CreateCommentPayload, CreateDownloadPayload,
    CreateGroupPayload, CreateVersionPayload, DeleteAllArtifactRulesPayload, DeleteAllGlobalRulesPayload,
    DeleteAllTenantDataPayload, DeleteArtifactPayload, DeleteArtifactRulePayload, DeleteCommentPayload,
    DeleteConfigPropertyPayload, DeleteGlobalRulePayload, DeleteGroupPayload, DeleteRoleMappingPayload,
    DeleteVersionPayload, MessagePayload, PartitionScope, ReserveGlobalIdPayload, ResetIdSequencesPayload,
    SetArtifactRulePayload, SetConfigPropertyPayload, SetGlobalRulePayload, SetRoleMappingPayload,
    UpdateArtifactMetadataPayload, UpdateCommentPayload, UpdateContentCanonicalHashPayload, UpdateGroupPayload,
    UpdateVersionMetadataPayload, UpdateVersionStatePayload,
};
use registry_models::{
    Artifact, Comment, CommentId, ConfigProperty, Content, ContentId, Download, DownloadId,
    Group, Labels, Properties, ReferenceStrictness, RoleMapping, Rule, SearchQuery, SearchResults,
    StorageError, TenantId, Version, VersionState,
};
use registry_store::PgStore;
use uuid::Uuid;

use crate::clock::Clock;
use crate::coordinator::Coordinator;
use crate::outcome::ApplyOutcome;
use crate::rule_evaluator::RuleEvaluator;
use crate::submitter::Submitter;

/// How long a write waits on the Coordinator before surfacing `Timeout`
/// (§5: "configurable timeout (default 30 s)").
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables that apply uniformly across every write, never on a per-call
/// basis (§9 Open Questions: reference strictness is "a documented policy
/// flag, not per-call behavior").
#[derive(Debug, Clone, Copy)]
pub struct CoreConfig {
    pub reference_strictness: ReferenceStrictness,
    pub write_timeout: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            reference_strictness: ReferenceStrictness::Strict,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// The Local Store Facade (§4.D): the single public entry point onto both
/// read and write operations. Reads run straight against `PgStore`. Writes
/// build a `MessagePayload`, hand it to the Submitter, and suspend on the
/// Coordinator until this node's own Sink has applied it — "dual-mode" in
/// the sense that the Sink re-enters the very same `PgStore` apply-mode
/// methods this facade never calls directly for writes (§9).
///
/// Cheaply `Clone`: every field is an `Arc` or a `Clone`-cheap handle
/// (`PgStore` wraps a pooled connection), matching "no global mutable state"
/// (§9) — every component gets its own handle rather than reaching for one.
#[derive(Clone)]
pub struct Core {
    store: PgStore,
    submitter: Arc<Submitter>,
    coordinator: Arc<Coordinator>,
    clock: Arc<dyn Clock>,
    rule_evaluator: Arc<dyn RuleEvaluator>,
    config: CoreConfig,
}

impl Core {
    pub fn new(
        store: PgStore,
        submitter: Arc<Submitter>,
        coordinator: Arc<Coordinator>,
        clock: Arc<dyn Clock>,
        rule_evaluator: Arc<dyn RuleEvaluator>,
        config: CoreConfig,
    ) -> Self {
        Self {
            store,
            submitter,
            coordinator,
            clock,
            rule_evaluator,
            config,
        }
    }

    pub fn store(&self) -> &PgStore {
        &self.store
    }

    pub fn reference_strictness(&self) -> ReferenceStrictness {
        self.config.reference_strictness
    }

    /// Fails every in-flight write waiting on the Coordinator (§4.G), so a
    /// graceful shutdown doesn't leave request tasks blocked past process exit.
    pub fn shutdown(&self) {
        self.coordinator.shutdown();
    }

    async fn execute(
        &self,
        tenant_id: &TenantId,
        scope: PartitionScope<'_>,
        body: MessagePayload,
    ) -> Result<ApplyOutcome, StorageError> {
        let submitted_at = self.clock.now();
        let uuid: Uuid = self.submitter.submit(tenant_id, scope, body, submitted_at).await?;
        self.coordinator.wait_for_response(uuid, self.config.write_timeout).await
    }

    async fn validate_against_rules(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        content_bytes: &[u8],
        declared_type: &str,
    ) -> Result<(), StorageError> {
        let rules = self.store.applicable_rules(tenant_id, group_id, artifact_id).await?;
        for rule in rules {
            self.rule_evaluator
                .evaluate(&rule.rule_type, &rule.config, content_bytes, declared_type)?;
        }
        Ok(())
    }

    fn artifact_scope<'a>(group_id: &'a str, artifact_id: &'a str) -> PartitionScope<'a> {
        PartitionScope::Artifact { group_id, artifact_id }
    }

    // ---- reads (§4.D "Reads run directly against A/B/C") -----------------

    pub async fn get_group(&self, tenant_id: &TenantId, group_id: &str) -> Result<Group, StorageError> {
        self.store.get_group(tenant_id, group_id).await
    }

    pub async fn search_groups(
        &self,
        tenant_id: &TenantId,
        query: &SearchQuery,
    ) -> Result<SearchResults<Group>, StorageError> {
        self.store.search_groups(tenant_id, query).await
    }

    pub async fn get_artifact(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Artifact, StorageError> {
        self.store.get_artifact(tenant_id, group_id, artifact_id).await
    }

    pub async fn search_artifacts(
        &self,
        tenant_id: &TenantId,
        query: &SearchQuery,
    ) -> Result<SearchResults<Artifact>, StorageError> {
        self.store.search_artifacts(tenant_id, query).await
    }

    pub async fn get_version(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> Result<Version, StorageError> {
        self.store.get_version(tenant_id, group_id, artifact_id, version).await
    }

    pub async fn get_version_by_global_id(
        &self,
        tenant_id: &TenantId,
        global_id: registry_models::GlobalId,
    ) -> Result<Version, StorageError> {
        self.store.get_version_by_global_id(tenant_id, global_id).await
    }

    pub async fn list_versions(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<Version>, StorageError> {
        self.store.list_versions(tenant_id, group_id, artifact_id).await
    }

    pub async fn count_versions(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<i64, StorageError> {
        self.store.count_versions(tenant_id, group_id, artifact_id).await
    }

    pub async fn search_versions(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        query: &SearchQuery,
    ) -> Result<SearchResults<Version>, StorageError> {
        self.store.search_versions(tenant_id, group_id, artifact_id, query).await
    }

    pub async fn get_content_by_id(
        &self,
        tenant_id: &TenantId,
        content_id: ContentId,
    ) -> Result<Content, StorageError> {
        self.store.get_content_by_id(tenant_id, content_id).await
    }

    pub async fn get_content_by_hash(&self, tenant_id: &TenantId, hash: &str) -> Result<Content, StorageError> {
        self.store.get_content_by_hash(tenant_id, hash).await
    }

    pub async fn get_global_rule(&self, tenant_id: &TenantId, rule_type: &str) -> Result<Rule, StorageError> {
        self.store.get_global_rule(tenant_id, rule_type).await
    }

    pub async fn list_global_rules(&self, tenant_id: &TenantId) -> Result<Vec<Rule>, StorageError> {
        self.store.list_global_rules(tenant_id).await
    }

    pub async fn list_artifact_rules(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<Rule>, StorageError> {
        self.store.list_artifact_rules(tenant_id, group_id, artifact_id).await
    }

    pub async fn list_comments(
        &self,
        tenant_id: &TenantId,
        global_id: registry_models::GlobalId,
    ) -> Result<Vec<Comment>, StorageError> {
        self.store.list_comments(tenant_id, global_id).await
    }

    pub async fn list_role_mappings(&self, tenant_id: &TenantId) -> Result<Vec<RoleMapping>, StorageError> {
        self.store.list_role_mappings(tenant_id).await
    }

    pub async fn get_config_property(
        &self,
        tenant_id: &TenantId,
        property_name: &str,
    ) -> Result<ConfigProperty, StorageError> {
        self.store.get_config_property(tenant_id, property_name).await
    }

    pub async fn list_config_properties(&self, tenant_id: &TenantId) -> Result<Vec<ConfigProperty>, StorageError> {
        self.store.list_config_properties(tenant_id).await
    }

    // ---- writes (§4.D "delegate to the Submitter, await the Coordinator") -

    pub async fn create_group(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        owner: &str,
        description: Option<&str>,
        labels: &Labels,
    ) -> Result<Group, StorageError> {
        let body = MessagePayload::CreateGroup(CreateGroupPayload {
            group_id: group_id.to_string(),
            owner: owner.to_string(),
            description: description.map(str::to_string),
            labels: labels.clone(),
        });
        let outcome = self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?;
        Ok(outcome.into_group())
    }

    pub async fn update_group(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        modified_by: &str,
        description: Option<Option<&str>>,
        labels: Option<&Labels>,
    ) -> Result<Group, StorageError> {
        let body = MessagePayload::UpdateGroup(UpdateGroupPayload {
            group_id: group_id.to_string(),
            modified_by: modified_by.to_string(),
            description: description.map(|d| d.map(str::to_string)),
            labels: labels.cloned(),
        });
        let outcome = self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?;
        Ok(outcome.into_group())
    }

    pub async fn delete_group(&self, tenant_id: &TenantId, group_id: &str) -> Result<(), StorageError> {
        let body = MessagePayload::DeleteGroup(DeleteGroupPayload { group_id: group_id.to_string() });
        self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?.into_unit();
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_artifact(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        artifact_type: &str,
        owner: &str,
        name: Option<&str>,
        description: Option<&str>,
        labels: &Labels,
        version: Option<&str>,
        content_bytes: &[u8],
        content_references: &[registry_models::ArtifactReference],
        version_properties: &Properties,
        version_markdown: Option<&str>,
    ) -> Result<(Artifact, Version), StorageError> {
        self.validate_against_rules(tenant_id, group_id, artifact_id, content_bytes, artifact_type)
            .await?;

        let body = MessagePayload::CreateArtifact(CreateArtifactPayload {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            artifact_type: artifact_type.to_string(),
            owner: owner.to_string(),
            name: name.map(str::to_string),
            description: description.map(str::to_string),
            labels: labels.clone(),
            version: version.map(str::to_string),
            content_bytes: content_bytes.to_vec(),
            content_references: content_references.to_vec(),
            version_properties: version_properties.clone(),
            version_markdown: version_markdown.map(str::to_string),
        });
        let outcome = self.execute(tenant_id, Self::artifact_scope(group_id, artifact_id), body).await?;
        Ok(outcome.into_artifact_and_version())
    }

    pub async fn update_artifact_metadata(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        modified_by: &str,
        name: Option<Option<&str>>,
        description: Option<Option<&str>>,
        labels: Option<&Labels>,
    ) -> Result<Artifact, StorageError> {
        let body = MessagePayload::UpdateArtifactMetadata(UpdateArtifactMetadataPayload {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            modified_by: modified_by.to_string(),
            name: name.map(|n| n.map(str::to_string)),
            description: description.map(|d| d.map(str::to_string)),
            labels: labels.cloned(),
        });
        let outcome = self.execute(tenant_id, Self::artifact_scope(group_id, artifact_id), body).await?;
        Ok(outcome.into_artifact())
    }

    pub async fn delete_artifact(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<(), StorageError> {
        let body = MessagePayload::DeleteArtifact(DeleteArtifactPayload {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
        });
        self.execute(tenant_id, Self::artifact_scope(group_id, artifact_id), body).await?.into_unit();
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_version(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        version: Option<&str>,
        owner: &str,
        content_bytes: &[u8],
        content_references: &[registry_models::ArtifactReference],
        properties: &Properties,
        markdown: Option<&str>,
    ) -> Result<Version, StorageError> {
        let artifact = self.store.get_artifact(tenant_id, group_id, artifact_id).await?;
        self.validate_against_rules(
            tenant_id,
            group_id,
            artifact_id,
            content_bytes,
            &artifact.artifact_type,
        )
        .await?;

        let body = MessagePayload::CreateVersion(CreateVersionPayload {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.map(str::to_string),
            owner: owner.to_string(),
            content_bytes: content_bytes.to_vec(),
            content_references: content_references.to_vec(),
            properties: properties.clone(),
            markdown: markdown.map(str::to_string),
        });
        let outcome = self.execute(tenant_id, Self::artifact_scope(group_id, artifact_id), body).await?;
        Ok(outcome.into_version())
    }

    pub async fn update_version_state(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        next_state: VersionState,
    ) -> Result<Version, StorageError> {
        let body = MessagePayload::UpdateVersionState(UpdateVersionStatePayload {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            next_state,
        });
        let outcome = self.execute(tenant_id, Self::artifact_scope(group_id, artifact_id), body).await?;
        Ok(outcome.into_version())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_version_metadata(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        modified_by: &str,
        name: Option<Option<&str>>,
        description: Option<Option<&str>>,
        labels: Option<&Labels>,
        properties: Option<&Properties>,
    ) -> Result<Version, StorageError> {
        let body = MessagePayload::UpdateVersionMetadata(UpdateVersionMetadataPayload {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            modified_by: modified_by.to_string(),
            name: name.map(|n| n.map(str::to_string)),
            description: description.map(|d| d.map(str::to_string)),
            labels: labels.cloned(),
            properties: properties.cloned(),
        });
        let outcome = self.execute(tenant_id, Self::artifact_scope(group_id, artifact_id), body).await?;
        Ok(outcome.into_version())
    }

    pub async fn delete_version(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> Result<(), StorageError> {
        let body = MessagePayload::DeleteVersion(DeleteVersionPayload {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
        });
        self.execute(tenant_id, Self::artifact_scope(group_id, artifact_id), body).await?.into_unit();
        Ok(())
    }

    /// `update_content_canonical_hash` (§9 "Lazy canonical hashing"): goes
    /// through the journal like any other write so the backfilled hash
    /// propagates to every node, not just the one that happened to compute
    /// it on demand.
    pub async fn update_content_canonical_hash(
        &self,
        tenant_id: &TenantId,
        content_id: ContentId,
        expected_content_hash: &str,
        new_canonical_hash: &str,
    ) -> Result<(), StorageError> {
        let body = MessagePayload::UpdateContentCanonicalHash(UpdateContentCanonicalHashPayload {
            content_id: content_id.get(),
            expected_content_hash: expected_content_hash.to_string(),
            new_canonical_hash: new_canonical_hash.to_string(),
        });
        self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?.into_unit();
        Ok(())
    }

    pub async fn set_global_rule(&self, tenant_id: &TenantId, rule_type: &str, config: &str) -> Result<Rule, StorageError> {
        let body = MessagePayload::SetGlobalRule(SetGlobalRulePayload {
            rule_type: rule_type.to_string(),
            config: config.to_string(),
        });
        let outcome = self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?;
        Ok(outcome.into_rule())
    }

    pub async fn delete_global_rule(&self, tenant_id: &TenantId, rule_type: &str) -> Result<(), StorageError> {
        let body = MessagePayload::DeleteGlobalRule(DeleteGlobalRulePayload { rule_type: rule_type.to_string() });
        self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?.into_unit();
        Ok(())
    }

    pub async fn delete_all_global_rules(&self, tenant_id: &TenantId) -> Result<(), StorageError> {
        let body = MessagePayload::DeleteAllGlobalRules(DeleteAllGlobalRulesPayload {});
        self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?.into_unit();
        Ok(())
    }

    pub async fn set_artifact_rule(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        rule_type: &str,
        config: &str,
    ) -> Result<Rule, StorageError> {
        let body = MessagePayload::SetArtifactRule(SetArtifactRulePayload {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            rule_type: rule_type.to_string(),
            config: config.to_string(),
        });
        let outcome = self.execute(tenant_id, Self::artifact_scope(group_id, artifact_id), body).await?;
        Ok(outcome.into_rule())
    }

    pub async fn delete_artifact_rule(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        rule_type: &str,
    ) -> Result<(), StorageError> {
        let body = MessagePayload::DeleteArtifactRule(DeleteArtifactRulePayload {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            rule_type: rule_type.to_string(),
        });
        self.execute(tenant_id, Self::artifact_scope(group_id, artifact_id), body).await?.into_unit();
        Ok(())
    }

    pub async fn delete_all_artifact_rules(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<(), StorageError> {
        let body = MessagePayload::DeleteAllArtifactRules(DeleteAllArtifactRulesPayload {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
        });
        self.execute(tenant_id, Self::artifact_scope(group_id, artifact_id), body).await?.into_unit();
        Ok(())
    }

    pub async fn create_comment(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        owner: &str,
        value: &str,
    ) -> Result<Comment, StorageError> {
        let body = MessagePayload::CreateComment(CreateCommentPayload {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            owner: owner.to_string(),
            value: value.to_string(),
            created_on: self.clock.now(),
        });
        let outcome = self.execute(tenant_id, Self::artifact_scope(group_id, artifact_id), body).await?;
        Ok(outcome.into_comment())
    }

    pub async fn update_comment(
        &self,
        tenant_id: &TenantId,
        comment_id: CommentId,
        value: &str,
    ) -> Result<(), StorageError> {
        let body = MessagePayload::UpdateComment(UpdateCommentPayload {
            comment_id: comment_id.get(),
            value: value.to_string(),
        });
        self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?.into_unit();
        Ok(())
    }

    pub async fn delete_comment(&self, tenant_id: &TenantId, comment_id: CommentId) -> Result<(), StorageError> {
        let body = MessagePayload::DeleteComment(DeleteCommentPayload { comment_id: comment_id.get() });
        self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?.into_unit();
        Ok(())
    }

    pub async fn set_role_mapping(
        &self,
        tenant_id: &TenantId,
        principal_id: &str,
        role: &str,
        principal_name: Option<&str>,
    ) -> Result<RoleMapping, StorageError> {
        let body = MessagePayload::SetRoleMapping(SetRoleMappingPayload {
            principal_id: principal_id.to_string(),
            role: role.to_string(),
            principal_name: principal_name.map(str::to_string),
        });
        let outcome = self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?;
        Ok(outcome.into_role_mapping())
    }

    pub async fn delete_role_mapping(&self, tenant_id: &TenantId, principal_id: &str) -> Result<(), StorageError> {
        let body = MessagePayload::DeleteRoleMapping(DeleteRoleMappingPayload {
            principal_id: principal_id.to_string(),
        });
        self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?.into_unit();
        Ok(())
    }

    pub async fn create_download(
        &self,
        tenant_id: &TenantId,
        download_id: DownloadId,
        context: serde_json::Value,
        ttl: Duration,
    ) -> Result<Download, StorageError> {
        let expires_on = self.clock.now()
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(0));
        let body = MessagePayload::CreateDownload(CreateDownloadPayload {
            download_id: download_id.get(),
            context,
            expires_on,
        });
        let outcome = self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?;
        Ok(outcome.into_download())
    }

    pub async fn consume_download(&self, tenant_id: &TenantId, download_id: DownloadId) -> Result<Download, StorageError> {
        let body = MessagePayload::ConsumeDownload(ConsumeDownloadPayload { download_id: download_id.get() });
        let outcome = self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?;
        Ok(outcome.into_download())
    }

    pub async fn set_config_property(
        &self,
        tenant_id: &TenantId,
        property_name: &str,
        property_value: &str,
    ) -> Result<ConfigProperty, StorageError> {
        let body = MessagePayload::SetConfigProperty(SetConfigPropertyPayload {
            property_name: property_name.to_string(),
            property_value: property_value.to_string(),
            modified_on: self.clock.now(),
        });
        let outcome = self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?;
        Ok(outcome.into_config_property())
    }

    pub async fn delete_config_property(&self, tenant_id: &TenantId, property_name: &str) -> Result<(), StorageError> {
        let body = MessagePayload::DeleteConfigProperty(DeleteConfigPropertyPayload {
            property_name: property_name.to_string(),
        });
        self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?.into_unit();
        Ok(())
    }

    /// Only used during import (§4.C). Scans every id table and sets each
    /// counter to `max(existing) + 1`.
    pub async fn reset_id_sequences(&self, tenant_id: &TenantId) -> Result<(), StorageError> {
        let body = MessagePayload::ResetIdSequences(ResetIdSequencesPayload {});
        self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?.into_unit();
        Ok(())
    }

    /// Import's `preserve_global_id = true` reservation protocol (§9 Open
    /// Questions, decided): fails with `Conflict` if `global_id` is already
    /// used or reserved; succeeds idempotently on a re-delivered duplicate
    /// of the same UUID (ordinary Sink idempotence covers that).
    pub async fn reserve_global_id(&self, tenant_id: &TenantId, global_id: i64) -> Result<(), StorageError> {
        let body = MessagePayload::ReserveGlobalId(ReserveGlobalIdPayload { global_id });
        self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?.into_unit();
        Ok(())
    }

    /// The admin operation the node-local advisory lock (§5) exists to keep
    /// from interleaving with a concurrent Sink apply for the same tenant.
    pub async fn delete_all_tenant_data(&self, tenant_id: &TenantId) -> Result<(), StorageError> {
        let body = MessagePayload::DeleteAllTenantData(DeleteAllTenantDataPayload {});
        self.execute(tenant_id, PartitionScope::TenantGlobal, body).await?.into_unit();
        Ok(())
    }
}
