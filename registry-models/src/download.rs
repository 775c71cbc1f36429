use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::DownloadId;
use crate::tenant::TenantId;

/// What a download token, once redeemed, hands back to the caller. Kept
/// opaque to the core: it is serialized JSON describing the export the
/// REST layer should stream, e.g. `{"artifact": {...}}` or `{"group": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadContext(pub serde_json::Value);

/// A single-use, expiring token. Redeeming one (§4.B) atomically deletes it;
/// a second redemption attempt observes `NotFound`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Download {
    pub tenant_id: TenantId,
    pub download_id: DownloadId,
    #[sqlx(json)]
    pub context: DownloadContext,
    pub expires_on: DateTime<Utc>,
}

impl Download {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_on
    }
}
