use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::labels::Labels;
use crate::tenant::TenantId;

/// The well-known group id used whenever a caller omits one. Groups are
/// created lazily: there is no row for "default" until something is filed
/// under it.
pub const DEFAULT_GROUP_ID: &str = "default";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub tenant_id: TenantId,
    pub group_id: String,
    pub owner: String,
    pub description: Option<String>,
    #[sqlx(json)]
    pub labels: Labels,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
    pub modified_by: String,
}

impl Group {
    pub fn coordinates(&self) -> String {
        format!("{}/{}", self.tenant_id, self.group_id)
    }
}
