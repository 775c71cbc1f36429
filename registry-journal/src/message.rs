use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use registry_models::{ArtifactReference, Labels, Properties, TenantId, VersionState};

/// The current envelope version written by this node. `JournalPayload::schema_version`
/// carries this so a future node can reject or up-convert an older/newer envelope
/// instead of silently misinterpreting it (§4.E).
pub const SCHEMA_VERSION: u32 = 1;

/// Discriminates the payload carried by a non-Bootstrap journal record. Every
/// variant here must have a matching `MessagePayload` variant with the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    CreateGroup,
    UpdateGroup,
    DeleteGroup,
    CreateArtifact,
    UpdateArtifactMetadata,
    DeleteArtifact,
    CreateVersion,
    UpdateVersionState,
    UpdateVersionMetadata,
    DeleteVersion,
    UpdateContentCanonicalHash,
    SetGlobalRule,
    DeleteGlobalRule,
    DeleteAllGlobalRules,
    SetArtifactRule,
    DeleteArtifactRule,
    DeleteAllArtifactRules,
    CreateComment,
    UpdateComment,
    DeleteComment,
    SetRoleMapping,
    DeleteRoleMapping,
    CreateDownload,
    ConsumeDownload,
    SetConfigProperty,
    DeleteConfigProperty,
    ResetIdSequences,
    ReserveGlobalId,
    DeleteAllTenantData,
}

/// The typed journal record key (§4.E). `Bootstrap` carries only a UUID and no
/// routing fields; every other variant carries the UUID the Coordinator uses
/// to find its waiting slot plus enough routing context to reconstruct the
/// partition key on replay/inspection tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JournalKey {
    Bootstrap { uuid: Uuid },
    Mutation {
        message_type: MessageType,
        uuid: Uuid,
        tenant_id: TenantId,
    },
}

impl JournalKey {
    pub fn uuid(&self) -> Uuid {
        match self {
            JournalKey::Bootstrap { uuid } => *uuid,
            JournalKey::Mutation { uuid, .. } => *uuid,
        }
    }
}

/// The versioned envelope wrapping every non-tombstone, non-Bootstrap value.
///
/// `submitted_at` is stamped by the originating node's clock *before*
/// submission and travels with the record, rather than being recomputed by
/// each consuming node's Sink: every apply that needs a "now" (row
/// timestamps) uses this value, so independently-running nodes that apply
/// the same record converge on byte-identical state (§8 bootstrap property).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalPayload {
    pub schema_version: u32,
    pub submitted_at: DateTime<Utc>,
    pub body: MessagePayload,
}

impl JournalPayload {
    pub fn new(body: MessagePayload, submitted_at: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            submitted_at,
            body,
        }
    }
}

/// One journal record as produced or consumed. A `value` of `None` on a
/// non-Bootstrap key is a tombstone, ignored by the Sink (§4.E).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalRecord {
    pub key: JournalKey,
    pub value: Option<JournalPayload>,
}

impl JournalRecord {
    pub fn bootstrap(uuid: Uuid) -> Self {
        Self {
            key: JournalKey::Bootstrap { uuid },
            value: None,
        }
    }

    pub fn mutation(uuid: Uuid, tenant_id: TenantId, body: MessagePayload, submitted_at: DateTime<Utc>) -> Self {
        let message_type = body.message_type();
        Self {
            key: JournalKey::Mutation {
                message_type,
                uuid,
                tenant_id,
            },
            value: Some(JournalPayload::new(body, submitted_at)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupPayload {
    pub group_id: String,
    pub owner: String,
    pub description: Option<String>,
    pub labels: Labels,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateGroupPayload {
    pub group_id: String,
    pub modified_by: String,
    pub description: Option<String>,
    pub labels: Option<Labels>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteGroupPayload {
    pub group_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArtifactPayload {
    pub group_id: String,
    pub artifact_id: String,
    pub artifact_type: String,
    pub owner: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub labels: Labels,
    /// The first version, created atomically with the artifact (§3: "Artifact
    /// has >=1 versions"). `version` is `None` to request auto-generation.
    pub version: Option<String>,
    pub content_bytes: Vec<u8>,
    pub content_references: Vec<ArtifactReference>,
    pub version_properties: Properties,
    pub version_markdown: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateArtifactMetadataPayload {
    pub group_id: String,
    pub artifact_id: String,
    pub modified_by: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub labels: Option<Labels>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteArtifactPayload {
    pub group_id: String,
    pub artifact_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVersionPayload {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub owner: String,
    pub content_bytes: Vec<u8>,
    pub content_references: Vec<ArtifactReference>,
    pub properties: Properties,
    pub markdown: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateVersionStatePayload {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub next_state: VersionState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateVersionMetadataPayload {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub modified_by: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub labels: Option<Labels>,
    pub properties: Option<Properties>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteVersionPayload {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateContentCanonicalHashPayload {
    pub content_id: i64,
    pub expected_content_hash: String,
    pub new_canonical_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetGlobalRulePayload {
    pub rule_type: String,
    pub config: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteGlobalRulePayload {
    pub rule_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAllGlobalRulesPayload {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetArtifactRulePayload {
    pub group_id: String,
    pub artifact_id: String,
    pub rule_type: String,
    pub config: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteArtifactRulePayload {
    pub group_id: String,
    pub artifact_id: String,
    pub rule_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAllArtifactRulesPayload {
    pub group_id: String,
    pub artifact_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentPayload {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub owner: String,
    pub value: String,
    pub created_on: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCommentPayload {
    pub comment_id: i64,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCommentPayload {
    pub comment_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRoleMappingPayload {
    pub principal_id: String,
    pub role: String,
    pub principal_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRoleMappingPayload {
    pub principal_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDownloadPayload {
    pub download_id: i64,
    pub context: serde_json::Value,
    pub expires_on: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumeDownloadPayload {
    pub download_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetConfigPropertyPayload {
    pub property_name: String,
    pub property_value: String,
    pub modified_on: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteConfigPropertyPayload {
    pub property_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetIdSequencesPayload {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveGlobalIdPayload {
    pub global_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAllTenantDataPayload {}

/// The decoded body of a `JournalPayload`. One variant per `MessageType`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MessagePayload {
    CreateGroup(CreateGroupPayload),
    UpdateGroup(UpdateGroupPayload),
    DeleteGroup(DeleteGroupPayload),
    CreateArtifact(CreateArtifactPayload),
    UpdateArtifactMetadata(UpdateArtifactMetadataPayload),
    DeleteArtifact(DeleteArtifactPayload),
    CreateVersion(CreateVersionPayload),
    UpdateVersionState(UpdateVersionStatePayload),
    UpdateVersionMetadata(UpdateVersionMetadataPayload),
    DeleteVersion(DeleteVersionPayload),
    UpdateContentCanonicalHash(UpdateContentCanonicalHashPayload),
    SetGlobalRule(SetGlobalRulePayload),
    DeleteGlobalRule(DeleteGlobalRulePayload),
    DeleteAllGlobalRules(DeleteAllGlobalRulesPayload),
    SetArtifactRule(SetArtifactRulePayload),
    DeleteArtifactRule(DeleteArtifactRulePayload),
    DeleteAllArtifactRules(DeleteAllArtifactRulesPayload),
    CreateComment(CreateCommentPayload),
    UpdateComment(UpdateCommentPayload),
    DeleteComment(DeleteCommentPayload),
    SetRoleMapping(SetRoleMappingPayload),
    DeleteRoleMapping(DeleteRoleMappingPayload),
    CreateDownload(CreateDownloadPayload),
    ConsumeDownload(ConsumeDownloadPayload),
    SetConfigProperty(SetConfigPropertyPayload),
    DeleteConfigProperty(DeleteConfigPropertyPayload),
    ResetIdSequences(ResetIdSequencesPayload),
    ReserveGlobalId(ReserveGlobalIdPayload),
    DeleteAllTenantData(DeleteAllTenantDataPayload),
}

impl MessagePayload {
    pub fn message_type(&self) -> MessageType {
        match self {
            MessagePayload::CreateGroup(_) => MessageType::CreateGroup,
            MessagePayload::UpdateGroup(_) => MessageType::UpdateGroup,
            MessagePayload::DeleteGroup(_) => MessageType::DeleteGroup,
            MessagePayload::CreateArtifact(_) => MessageType::CreateArtifact,
            MessagePayload::UpdateArtifactMetadata(_) => MessageType::UpdateArtifactMetadata,
            MessagePayload::DeleteArtifact(_) => MessageType::DeleteArtifact,
            MessagePayload::CreateVersion(_) => MessageType::CreateVersion,
            MessagePayload::UpdateVersionState(_) => MessageType::UpdateVersionState,
            MessagePayload::UpdateVersionMetadata(_) => MessageType::UpdateVersionMetadata,
            MessagePayload::DeleteVersion(_) => MessageType::DeleteVersion,
            MessagePayload::UpdateContentCanonicalHash(_) => {
                MessageType::UpdateContentCanonicalHash
            }
            MessagePayload::SetGlobalRule(_) => MessageType::SetGlobalRule,
            MessagePayload::DeleteGlobalRule(_) => MessageType::DeleteGlobalRule,
            MessagePayload::DeleteAllGlobalRules(_) => MessageType::DeleteAllGlobalRules,
            MessagePayload::SetArtifactRule(_) => MessageType::SetArtifactRule,
            MessagePayload::DeleteArtifactRule(_) => MessageType::DeleteArtifactRule,
            MessagePayload::DeleteAllArtifactRules(_) => MessageType::DeleteAllArtifactRules,
            MessagePayload::CreateComment(_) => MessageType::CreateComment,
            MessagePayload::UpdateComment(_) => MessageType::UpdateComment,
            MessagePayload::DeleteComment(_) => MessageType::DeleteComment,
            MessagePayload::SetRoleMapping(_) => MessageType::SetRoleMapping,
            MessagePayload::DeleteRoleMapping(_) => MessageType::DeleteRoleMapping,
            MessagePayload::CreateDownload(_) => MessageType::CreateDownload,
            MessagePayload::ConsumeDownload(_) => MessageType::ConsumeDownload,
            MessagePayload::SetConfigProperty(_) => MessageType::SetConfigProperty,
            MessagePayload::DeleteConfigProperty(_) => MessageType::DeleteConfigProperty,
            MessagePayload::ResetIdSequences(_) => MessageType::ResetIdSequences,
            MessagePayload::ReserveGlobalId(_) => MessageType::ReserveGlobalId,
            MessagePayload::DeleteAllTenantData(_) => MessageType::DeleteAllTenantData,
        }
    }
}

/// Partition routing key (§4.F): per-artifact messages co-partition so that
/// operations against the same coordinates are totally ordered; tenant-wide
/// operations (rules, config, comments, bootstrap-adjacent admin ops) share a
/// single `tenant|global` partition per tenant.
pub fn partition_key(tenant_id: &TenantId, scope: PartitionScope<'_>) -> Vec<u8> {
    let s = match scope {
        PartitionScope::Artifact { group_id, artifact_id } => {
            format!("{}|{}|{}", tenant_id.as_str(), group_id, artifact_id)
        }
        PartitionScope::TenantGlobal => format!("{}|global", tenant_id.as_str()),
    };
    s.into_bytes()
}

pub enum PartitionScope<'a> {
    Artifact {
        group_id: &'a str,
        artifact_id: &'a str,
    },
    TenantGlobal,
}
