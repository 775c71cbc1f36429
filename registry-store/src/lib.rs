//! The Relational State (§4.B), Content Store (§4.A), and Id Allocator
//! (§4.C) components, all backed by a single Postgres pool. `PgStore` is the
//! thing `registry-core`'s `LocalStore` facade holds onto: reads go straight
//! through it, and its apply-mode methods are what the Sink calls inside one
//! transaction per journal message (§4.D, §4.I).
//!
//! Nothing here knows about the journal, the Coordinator, or rule
//! evaluation; this crate is pure storage.

pub mod admin;
pub mod artifacts;
pub mod comments;
pub mod config;
pub mod content;
pub mod downloads;
pub mod error;
pub mod groups;
pub mod ids;
pub mod roles;
pub mod rules;
pub mod versions;

use chrono::{DateTime, Utc};
use registry_models::{
    Artifact, ArtifactReference, Comment, CommentId, ConfigProperty, Content, ContentId, Download,
    GlobalId, Group, Labels, Properties, ReferenceStrictness, RoleMapping, Rule, SearchQuery,
    SearchResults, StorageError, TenantId, Version, VersionState,
};
use sqlx::PgPool;

pub use ids::SequenceName;

/// Handle bundling the Postgres pool. Cloning is cheap (`PgPool` is an `Arc`
/// internally); every component that needs storage holds one of these
/// instead of reaching for global state (§9 "No global mutable state").
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // ---- reads -----------------------------------------------------------

    pub async fn get_group(&self, tenant_id: &TenantId, group_id: &str) -> Result<Group, StorageError> {
        groups::fetch_group_pool(&self.pool, tenant_id, group_id).await
    }

    pub async fn search_groups(
        &self,
        tenant_id: &TenantId,
        query: &SearchQuery,
    ) -> Result<SearchResults<Group>, StorageError> {
        groups::search_groups(&self.pool, tenant_id, query).await
    }

    pub async fn get_artifact(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Artifact, StorageError> {
        artifacts::fetch_artifact_pool(&self.pool, tenant_id, group_id, artifact_id).await
    }

    pub async fn search_artifacts(
        &self,
        tenant_id: &TenantId,
        query: &SearchQuery,
    ) -> Result<SearchResults<Artifact>, StorageError> {
        artifacts::search_artifacts(&self.pool, tenant_id, query).await
    }

    pub async fn get_version(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> Result<Version, StorageError> {
        versions::fetch_version_pool(&self.pool, tenant_id, group_id, artifact_id, version).await
    }

    pub async fn get_version_by_global_id(
        &self,
        tenant_id: &TenantId,
        global_id: GlobalId,
    ) -> Result<Version, StorageError> {
        versions::get_version_by_global_id(&self.pool, tenant_id, global_id).await
    }

    pub async fn list_versions(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<Version>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        versions::list_versions(&mut conn, tenant_id, group_id, artifact_id).await
    }

    pub async fn count_versions(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<i64, StorageError> {
        let mut conn = self.pool.acquire().await?;
        artifacts::count_versions(&mut conn, tenant_id, group_id, artifact_id).await
    }

    pub async fn search_versions(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        query: &SearchQuery,
    ) -> Result<SearchResults<Version>, StorageError> {
        versions::search_versions(&self.pool, tenant_id, group_id, artifact_id, query).await
    }

    pub async fn get_content_by_id(
        &self,
        tenant_id: &TenantId,
        content_id: ContentId,
    ) -> Result<Content, StorageError> {
        content::get_by_content_id(&self.pool, tenant_id, content_id).await
    }

    pub async fn get_content_by_hash(
        &self,
        tenant_id: &TenantId,
        hash: &str,
    ) -> Result<Content, StorageError> {
        content::get_by_content_hash(&self.pool, tenant_id, hash).await
    }

    pub async fn get_global_rule(&self, tenant_id: &TenantId, rule_type: &str) -> Result<Rule, StorageError> {
        rules::get_global_rule(&self.pool, tenant_id, rule_type).await
    }

    pub async fn list_global_rules(&self, tenant_id: &TenantId) -> Result<Vec<Rule>, StorageError> {
        rules::list_global_rules(&self.pool, tenant_id).await
    }

    pub async fn list_artifact_rules(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<Rule>, StorageError> {
        rules::list_artifact_rules(&self.pool, tenant_id, group_id, artifact_id).await
    }

    pub async fn applicable_rules(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<Rule>, StorageError> {
        rules::applicable_rules(&self.pool, tenant_id, group_id, artifact_id).await
    }

    pub async fn list_comments(
        &self,
        tenant_id: &TenantId,
        global_id: GlobalId,
    ) -> Result<Vec<Comment>, StorageError> {
        comments::list_comments(&self.pool, tenant_id, global_id).await
    }

    pub async fn list_role_mappings(&self, tenant_id: &TenantId) -> Result<Vec<RoleMapping>, StorageError> {
        roles::list_role_mappings(&self.pool, tenant_id).await
    }

    pub async fn get_config_property(
        &self,
        tenant_id: &TenantId,
        property_name: &str,
    ) -> Result<ConfigProperty, StorageError> {
        config::get_config_property(&self.pool, tenant_id, property_name).await
    }

    pub async fn list_config_properties(&self, tenant_id: &TenantId) -> Result<Vec<ConfigProperty>, StorageError> {
        config::list_config_properties(&self.pool, tenant_id).await
    }

    // ---- apply-mode writes (Sink only, §4.D/§4.I) -------------------------

    pub async fn apply_create_group(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        owner: &str,
        description: Option<&str>,
        labels: &Labels,
        now: DateTime<Utc>,
    ) -> Result<Group, StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        let group = groups::apply_create_group(&mut tx, tenant_id, group_id, owner, description, labels, now).await?;
        tx.commit().await?;
        Ok(group)
    }

    pub async fn apply_update_group(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        modified_by: &str,
        description: Option<Option<&str>>,
        labels: Option<&Labels>,
        now: DateTime<Utc>,
    ) -> Result<Group, StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        let group =
            groups::apply_update_group(&mut tx, tenant_id, group_id, modified_by, description, labels, now).await?;
        tx.commit().await?;
        Ok(group)
    }

    pub async fn apply_delete_group(&self, tenant_id: &TenantId, group_id: &str) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;

        let artifact_ids: Vec<String> = sqlx::query_scalar::<_, String>(
            "SELECT artifact_id FROM artifacts WHERE tenant_id = $1 AND group_id = $2",
        )
        .bind(tenant_id.as_str())
        .bind(group_id)
        .fetch_all(&mut *tx)
        .await?;

        for artifact_id in artifact_ids {
            delete_artifact_cascade(&mut tx, tenant_id, group_id, &artifact_id).await?;
        }

        groups::apply_delete_group(&mut tx, tenant_id, group_id).await?;
        tx.commit().await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn apply_create_artifact(
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
        content_references: &[ArtifactReference],
        version_properties: &Properties,
        version_markdown: Option<&str>,
        strictness: ReferenceStrictness,
        now: DateTime<Utc>,
    ) -> Result<(Artifact, Version), StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;

        if artifacts::exists(&mut tx, tenant_id, group_id, artifact_id).await? {
            return Err(StorageError::already_exists(
                registry_models::ErrorKind::Artifact,
                format!("{tenant_id}/{group_id}/{artifact_id}"),
            ));
        }

        groups::ensure_group(&mut tx, tenant_id, group_id, owner, now).await?;

        let labels_json = serde_json::to_value(labels).unwrap_or_default();
        sqlx::query(
            r#"
            INSERT INTO artifacts
                (tenant_id, group_id, artifact_id, artifact_type, owner, name, description, labels,
                 created_on, modified_on, modified_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $5)
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(group_id)
        .bind(artifact_id)
        .bind(artifact_type)
        .bind(owner)
        .bind(name)
        .bind(description)
        .bind(&labels_json)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let (content_id, _was_new) =
            content::put_content(&mut tx, tenant_id, content_bytes, content_references, strictness).await?;
        let global_id = ids::next_global_id(&mut tx, tenant_id).await?;
        let (version_label, ordinal) =
            versions::resolve_version_label(&mut tx, tenant_id, group_id, artifact_id, version).await?;
        let created_version = versions::insert_version(
            &mut tx,
            tenant_id,
            global_id,
            group_id,
            artifact_id,
            &version_label,
            ordinal,
            content_id,
            owner,
            version_properties,
            version_markdown,
            now,
        )
        .await?;

        let artifact = artifacts::get_artifact(&mut tx, tenant_id, group_id, artifact_id).await?;
        tx.commit().await?;
        Ok((artifact, created_version))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn apply_update_artifact_metadata(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        modified_by: &str,
        name: Option<Option<&str>>,
        description: Option<Option<&str>>,
        labels: Option<&Labels>,
        now: DateTime<Utc>,
    ) -> Result<Artifact, StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        let artifact = artifacts::apply_update_artifact_metadata(
            &mut tx, tenant_id, group_id, artifact_id, modified_by, name, description, labels, now,
        )
        .await?;
        tx.commit().await?;
        Ok(artifact)
    }

    pub async fn apply_delete_artifact(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        delete_artifact_cascade(&mut tx, tenant_id, group_id, artifact_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn apply_create_version(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        version: Option<&str>,
        owner: &str,
        content_bytes: &[u8],
        content_references: &[ArtifactReference],
        properties: &Properties,
        markdown: Option<&str>,
        strictness: ReferenceStrictness,
        now: DateTime<Utc>,
    ) -> Result<Version, StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;

        if !artifacts::exists(&mut tx, tenant_id, group_id, artifact_id).await? {
            return Err(StorageError::not_found(
                registry_models::ErrorKind::Artifact,
                format!("{tenant_id}/{group_id}/{artifact_id}"),
            ));
        }

        let (content_id, _was_new) =
            content::put_content(&mut tx, tenant_id, content_bytes, content_references, strictness).await?;
        let global_id = ids::next_global_id(&mut tx, tenant_id).await?;
        let (version_label, ordinal) =
            versions::resolve_version_label(&mut tx, tenant_id, group_id, artifact_id, version).await?;
        let created = versions::insert_version(
            &mut tx, tenant_id, global_id, group_id, artifact_id, &version_label, ordinal, content_id, owner,
            properties, markdown, now,
        )
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    pub async fn apply_update_version_state(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        next_state: VersionState,
    ) -> Result<Version, StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        let updated =
            versions::apply_update_state(&mut tx, tenant_id, group_id, artifact_id, version, next_state).await?;
        tx.commit().await?;
        Ok(updated)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn apply_update_version_metadata(
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
        now: DateTime<Utc>,
    ) -> Result<Version, StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        let updated = versions::apply_update_metadata(
            &mut tx, tenant_id, group_id, artifact_id, version, modified_by, name, description, labels,
            properties, now,
        )
        .await?;
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn apply_delete_version(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;

        let content_id = versions::delete_version_row(&mut tx, tenant_id, group_id, artifact_id, version).await?;
        if !content::is_referenced(&mut tx, tenant_id, content_id).await? {
            content::delete_content(&mut tx, tenant_id, content_id).await?;
        }

        let remaining = artifacts::count_versions(&mut tx, tenant_id, group_id, artifact_id).await?;
        if remaining == 0 {
            artifacts::delete_artifact_row(&mut tx, tenant_id, group_id, artifact_id).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn apply_update_content_canonical_hash(
        &self,
        tenant_id: &TenantId,
        content_id: ContentId,
        expected_content_hash: &str,
        new_canonical_hash: &str,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        content::update_canonical_hash(&mut tx, tenant_id, content_id, expected_content_hash, new_canonical_hash)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn apply_set_global_rule(
        &self,
        tenant_id: &TenantId,
        rule_type: &str,
        config: &str,
    ) -> Result<Rule, StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        let rule = rules::apply_set_global_rule(&mut tx, tenant_id, rule_type, config).await?;
        tx.commit().await?;
        Ok(rule)
    }

    pub async fn apply_delete_global_rule(&self, tenant_id: &TenantId, rule_type: &str) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        rules::apply_delete_global_rule(&mut tx, tenant_id, rule_type).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn apply_delete_all_global_rules(&self, tenant_id: &TenantId) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        rules::apply_delete_all_global_rules(&mut tx, tenant_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn apply_set_artifact_rule(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        rule_type: &str,
        config: &str,
    ) -> Result<Rule, StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        let rule = rules::apply_set_artifact_rule(&mut tx, tenant_id, group_id, artifact_id, rule_type, config)
            .await?;
        tx.commit().await?;
        Ok(rule)
    }

    pub async fn apply_delete_artifact_rule(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
        rule_type: &str,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        rules::apply_delete_artifact_rule(&mut tx, tenant_id, group_id, artifact_id, rule_type).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn apply_delete_all_artifact_rules(
        &self,
        tenant_id: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        rules::apply_delete_all_artifact_rules(&mut tx, tenant_id, group_id, artifact_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn apply_create_comment(
        &self,
        tenant_id: &TenantId,
        global_id: GlobalId,
        owner: &str,
        value: &str,
        created_on: DateTime<Utc>,
    ) -> Result<Comment, StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        let comment = comments::apply_create_comment(&mut tx, tenant_id, global_id, owner, value, created_on).await?;
        tx.commit().await?;
        Ok(comment)
    }

    pub async fn apply_update_comment(
        &self,
        tenant_id: &TenantId,
        comment_id: CommentId,
        value: &str,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        comments::apply_update_comment(&mut tx, tenant_id, comment_id, value).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn apply_delete_comment(&self, tenant_id: &TenantId, comment_id: CommentId) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        comments::apply_delete_comment(&mut tx, tenant_id, comment_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn apply_set_role_mapping(
        &self,
        tenant_id: &TenantId,
        principal_id: &str,
        role: &str,
        principal_name: Option<&str>,
    ) -> Result<RoleMapping, StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        let mapping =
            roles::apply_set_role_mapping(&mut tx, tenant_id, principal_id, role, principal_name).await?;
        tx.commit().await?;
        Ok(mapping)
    }

    pub async fn apply_delete_role_mapping(&self, tenant_id: &TenantId, principal_id: &str) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        roles::apply_delete_role_mapping(&mut tx, tenant_id, principal_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn apply_create_download(
        &self,
        tenant_id: &TenantId,
        download_id: registry_models::DownloadId,
        context: serde_json::Value,
        expires_on: DateTime<Utc>,
    ) -> Result<Download, StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        let download = downloads::apply_create_download(&mut tx, tenant_id, download_id, context, expires_on).await?;
        tx.commit().await?;
        Ok(download)
    }

    pub async fn apply_consume_download(
        &self,
        tenant_id: &TenantId,
        download_id: registry_models::DownloadId,
        now: DateTime<Utc>,
    ) -> Result<Download, StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        let download = downloads::apply_consume_download(&mut tx, tenant_id, download_id, now).await?;
        tx.commit().await?;
        Ok(download)
    }

    pub async fn apply_set_config_property(
        &self,
        tenant_id: &TenantId,
        property_name: &str,
        property_value: &str,
        modified_on: DateTime<Utc>,
    ) -> Result<ConfigProperty, StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        let property =
            config::apply_set_config_property(&mut tx, tenant_id, property_name, property_value, modified_on)
                .await?;
        tx.commit().await?;
        Ok(property)
    }

    pub async fn apply_delete_config_property(&self, tenant_id: &TenantId, property_name: &str) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        config::apply_delete_config_property(&mut tx, tenant_id, property_name).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn apply_reset_id_sequences(&self, tenant_id: &TenantId) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        admin::apply_reset_id_sequences(&mut tx, tenant_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn apply_reserve_global_id(&self, tenant_id: &TenantId, global_id: i64) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        ids::reserve_global_id(&mut tx, tenant_id, global_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn apply_delete_all_tenant_data(&self, tenant_id: &TenantId) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        admin::acquire_tenant_advisory_lock(&mut tx, tenant_id).await?;
        admin::apply_delete_all_tenant_data(&mut tx, tenant_id).await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Deletes every version of an artifact, any content orphaned by that, and
/// finally the artifact row itself (§3 lifecycle). Shared by
/// `apply_delete_artifact` and `apply_delete_group`'s per-artifact loop.
async fn delete_artifact_cascade(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
) -> Result<(), StorageError> {
    let versions_list = versions::list_versions(tx, tenant_id, group_id, artifact_id).await?;
    for v in &versions_list {
        let content_id = versions::delete_version_row(tx, tenant_id, group_id, artifact_id, &v.version).await?;
        if !content::is_referenced(tx, tenant_id, content_id).await? {
            content::delete_content(tx, tenant_id, content_id).await?;
        }
    }
    artifacts::delete_artifact_row(tx, tenant_id, group_id, artifact_id).await
}
