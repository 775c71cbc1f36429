use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::labels::Labels;
use crate::tenant::TenantId;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Artifact {
    pub tenant_id: TenantId,
    pub group_id: String,
    pub artifact_id: String,
    /// Opaque type tag (`AVRO`, `PROTOBUF`, `JSON`, `OPENAPI`, `GRAPHQL`, ...).
    /// The core never interprets this beyond passing it to the rule
    /// evaluator and content store.
    pub artifact_type: String,
    pub owner: String,
    pub name: Option<String>,
    pub description: Option<String>,
    #[sqlx(json)]
    pub labels: Labels,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
    pub modified_by: String,
}

impl Artifact {
    pub fn coordinates(&self) -> String {
        format!("{}/{}/{}", self.tenant_id, self.group_id, self.artifact_id)
    }
}
