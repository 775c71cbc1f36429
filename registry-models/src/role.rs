use serde::{Deserialize, Serialize};

use crate::tenant::TenantId;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoleMapping {
    pub tenant_id: TenantId,
    pub principal_id: String,
    pub role: String,
    pub principal_name: Option<String>,
}
