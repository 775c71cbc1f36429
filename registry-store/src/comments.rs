use chrono::{DateTime, Utc};
use registry_models::{Comment, CommentId, ErrorKind, GlobalId, StorageError, TenantId};
use sqlx::{PgConnection, PgPool, Row};

use crate::ids;

pub async fn apply_create_comment(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    global_id: GlobalId,
    owner: &str,
    value: &str,
    created_on: DateTime<Utc>,
) -> Result<Comment, StorageError> {
    let comment_id = ids::next_comment_id(conn, tenant_id).await?;

    sqlx::query(
        r#"
        INSERT INTO comments (tenant_id, comment_id, global_id, owner, created_on, value)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(comment_id.get())
    .bind(global_id.get())
    .bind(owner)
    .bind(created_on)
    .bind(value)
    .execute(conn)
    .await?;

    Ok(Comment {
        tenant_id: tenant_id.clone(),
        comment_id,
        global_id,
        owner: owner.to_string(),
        created_on,
        value: value.to_string(),
    })
}

pub async fn apply_update_comment(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    comment_id: CommentId,
    value: &str,
) -> Result<(), StorageError> {
    let result = sqlx::query("UPDATE comments SET value = $3 WHERE tenant_id = $1 AND comment_id = $2")
        .bind(tenant_id.as_str())
        .bind(comment_id.get())
        .bind(value)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(ErrorKind::Comment, comment_id.to_string()));
    }
    Ok(())
}

pub async fn apply_delete_comment(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    comment_id: CommentId,
) -> Result<(), StorageError> {
    let result = sqlx::query("DELETE FROM comments WHERE tenant_id = $1 AND comment_id = $2")
        .bind(tenant_id.as_str())
        .bind(comment_id.get())
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(ErrorKind::Comment, comment_id.to_string()));
    }
    Ok(())
}

pub async fn list_comments(
    pool: &PgPool,
    tenant_id: &TenantId,
    global_id: GlobalId,
) -> Result<Vec<Comment>, StorageError> {
    let rows = sqlx::query(
        "SELECT comment_id, owner, created_on, value FROM comments WHERE tenant_id = $1 AND global_id = $2 ORDER BY created_on ASC",
    )
    .bind(tenant_id.as_str())
    .bind(global_id.get())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Comment {
            tenant_id: tenant_id.clone(),
            comment_id: CommentId::new(row.get(0)),
            global_id,
            owner: row.get(1),
            created_on: row.get(2),
            value: row.get(3),
        })
        .collect())
}
