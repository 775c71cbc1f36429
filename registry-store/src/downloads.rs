use chrono::{DateTime, Utc};
use registry_models::{Download, DownloadContext, DownloadId, ErrorKind, StorageError, TenantId};
use sqlx::{PgConnection, Row};

pub async fn apply_create_download(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    download_id: DownloadId,
    context: serde_json::Value,
    expires_on: DateTime<Utc>,
) -> Result<Download, StorageError> {
    sqlx::query(
        r#"
        INSERT INTO downloads (tenant_id, download_id, context, expires_on)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(download_id.get())
    .bind(&context)
    .bind(expires_on)
    .execute(conn)
    .await?;

    Ok(Download {
        tenant_id: tenant_id.clone(),
        download_id,
        context: DownloadContext(context),
        expires_on,
    })
}

/// Redeems a download token: fetches and atomically deletes it so a second
/// redemption observes `NotFound` (§3 Download: "ephemeral single-use").
/// Also treats an already-expired token as `NotFound` rather than returning
/// stale context.
pub async fn apply_consume_download(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    download_id: DownloadId,
    now: DateTime<Utc>,
) -> Result<Download, StorageError> {
    let row = sqlx::query(
        "DELETE FROM downloads WHERE tenant_id = $1 AND download_id = $2 RETURNING context, expires_on",
    )
    .bind(tenant_id.as_str())
    .bind(download_id.get())
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| StorageError::not_found(ErrorKind::Download, download_id.to_string()))?;

    let expires_on: DateTime<Utc> = row.get(1);
    if expires_on <= now {
        return Err(StorageError::not_found(ErrorKind::Download, download_id.to_string()));
    }

    Ok(Download {
        tenant_id: tenant_id.clone(),
        download_id,
        context: DownloadContext(row.get(0)),
        expires_on,
    })
}
