use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CommentId, GlobalId};
use crate::tenant::TenantId;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub tenant_id: TenantId,
    pub comment_id: CommentId,
    pub global_id: GlobalId,
    pub owner: String,
    pub created_on: DateTime<Utc>,
    pub value: String,
}
