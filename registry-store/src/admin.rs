use registry_models::{StorageError, TenantId};
use sqlx::PgConnection;

use crate::ids::{self, SequenceName};

/// `reset_id_sequences` (§4.C): used only during import, sets every counter
/// to `max(existing) + 1` by scanning its backing table.
pub async fn apply_reset_id_sequences(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
) -> Result<(), StorageError> {
    ids::reset_sequence(conn, tenant_id, SequenceName::GlobalId, "versions", "global_id").await?;
    ids::reset_sequence(conn, tenant_id, SequenceName::ContentId, "content", "content_id").await?;
    ids::reset_sequence(conn, tenant_id, SequenceName::CommentId, "comments", "comment_id").await?;
    Ok(())
}

/// `delete_all_tenant_data` (§5 "admin operations such as `deleteAllUserData`"):
/// wipes every row for `tenant_id` in dependency order. Callers hold the
/// node-local advisory lock around this so it can't interleave with a
/// concurrent Sink apply for the same tenant.
pub async fn apply_delete_all_tenant_data(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
) -> Result<(), StorageError> {
    for table in [
        "comments",
        "content_references",
        "versions",
        "content",
        "artifact_rules",
        "global_rules",
        "artifacts",
        "groups",
        "role_mappings",
        "downloads",
        "config",
        "id_sequences",
    ] {
        let sql = format!("DELETE FROM {table} WHERE tenant_id = $1");
        sqlx::query(&sql).bind(tenant_id.as_str()).execute(&mut *conn).await?;
    }
    Ok(())
}

/// Serializes Sink applies against concurrent admin operations for this
/// tenant (§5: "a node-local advisory lock serializes Sink apply over the
/// database"). The lock is released automatically at transaction end.
pub async fn acquire_tenant_advisory_lock(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
) -> Result<(), StorageError> {
    let key = advisory_lock_key(tenant_id);
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(key)
        .execute(conn)
        .await?;
    Ok(())
}

fn advisory_lock_key(tenant_id: &TenantId) -> i64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    tenant_id.as_str().hash(&mut hasher);
    hasher.finish() as i64
}
