use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tenant::TenantId;

/// A dynamic, per-tenant key/value setting (e.g. `registry.download.expires.seconds`).
/// `modified_on` lets callers detect staleness against a cached copy without a
/// separate version counter.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConfigProperty {
    pub tenant_id: TenantId,
    pub property_name: String,
    pub property_value: String,
    pub modified_on: DateTime<Utc>,
}
