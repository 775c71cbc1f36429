use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ContentId, GlobalId};
use crate::labels::{Labels, Properties};
use crate::state::VersionState;
use crate::tenant::TenantId;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Version {
    pub tenant_id: TenantId,
    pub global_id: GlobalId,
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    /// Per-artifact ordinal, strictly increasing within `(group_id,
    /// artifact_id)`. Distinct from `version`, which is the caller-facing
    /// label and may not sort the same way (e.g. "1.0.0-rc1" vs "2").
    pub version_ordinal: i64,
    pub content_id: ContentId,
    pub state: VersionState,
    pub owner: String,
    pub name: Option<String>,
    pub description: Option<String>,
    #[sqlx(json)]
    pub labels: Labels,
    #[sqlx(json)]
    pub properties: Properties,
    pub markdown: Option<String>,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
    pub modified_by: String,
}

impl Version {
    pub fn coordinates(&self) -> String {
        format!(
            "{}/{}/{}@{}",
            self.tenant_id, self.group_id, self.artifact_id, self.version
        )
    }
}
