use registry_models::{CommentId, ContentId, GlobalId, StorageError, TenantId};
use sqlx::{PgConnection, Row};

/// The three monotonic counters of §4.C, each scoped per tenant. Backed by
/// `id_sequences`, a plain `(tenant_id, sequence_name) -> next_value` table
/// rather than a Postgres `SEQUENCE` object, because `reset_*` needs to set
/// an arbitrary next value transactionally alongside the rest of an import's
/// apply, which `ALTER SEQUENCE` cannot do from inside the same transaction
/// without a second round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceName {
    GlobalId,
    ContentId,
    CommentId,
}

impl SequenceName {
    fn as_str(self) -> &'static str {
        match self {
            SequenceName::GlobalId => "global_id",
            SequenceName::ContentId => "content_id",
            SequenceName::CommentId => "comment_id",
        }
    }
}

/// Atomically allocates and returns the next value for `sequence`, creating
/// the row (starting at 1) if this tenant has never used it. Must run inside
/// the caller's apply transaction so allocation order matches applied order
/// (§4.C: "invoked inside the Sink... never by the submitter").
pub async fn next_value(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    sequence: SequenceName,
) -> Result<i64, StorageError> {
    let row = sqlx::query(
        r#"
        INSERT INTO id_sequences (tenant_id, sequence_name, next_value)
        VALUES ($1, $2, 2)
        ON CONFLICT (tenant_id, sequence_name)
        DO UPDATE SET next_value = id_sequences.next_value + 1
        RETURNING next_value - 1
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(sequence.as_str())
    .fetch_one(conn)
    .await?;

    Ok(row.try_get::<i64, _>(0)?)
}

pub async fn next_global_id(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
) -> Result<GlobalId, StorageError> {
    next_value(conn, tenant_id, SequenceName::GlobalId)
        .await
        .map(GlobalId::new)
}

pub async fn next_content_id(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
) -> Result<ContentId, StorageError> {
    next_value(conn, tenant_id, SequenceName::ContentId)
        .await
        .map(ContentId::new)
}

pub async fn next_comment_id(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
) -> Result<CommentId, StorageError> {
    next_value(conn, tenant_id, SequenceName::CommentId)
        .await
        .map(CommentId::new)
}

/// Resets `sequence`'s next value to `max(existing) + 1` by scanning `table`'s
/// `column`, used only during import (§4.C). `1` if the table is empty for
/// this tenant.
pub async fn reset_sequence(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    sequence: SequenceName,
    table: &str,
    column: &str,
) -> Result<(), StorageError> {
    // `table`/`column` are compile-time constants supplied by call sites in
    // this crate, never caller input, so string interpolation here is not an
    // injection risk.
    let query = format!("SELECT COALESCE(MAX({column}), 0) FROM {table} WHERE tenant_id = $1");
    let row = sqlx::query(&query)
        .bind(tenant_id.as_str())
        .fetch_one(&mut *conn)
        .await?;
    let max_existing: i64 = row.try_get(0)?;

    sqlx::query(
        r#"
        INSERT INTO id_sequences (tenant_id, sequence_name, next_value)
        VALUES ($1, $2, $3)
        ON CONFLICT (tenant_id, sequence_name)
        DO UPDATE SET next_value = EXCLUDED.next_value
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(sequence.as_str())
    .bind(max_existing + 1)
    .execute(conn)
    .await?;

    Ok(())
}

/// Reserves `global_id` for explicit use (Open Question decision, SPEC_FULL
/// §9): fails with `Conflict` if the id is at or below the tenant's current
/// next-value, since that means it has already been allocated or reserved.
/// On success, bumps `next_value` to `global_id + 1` so ordinary allocation
/// never collides with it.
pub async fn reserve_global_id(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    global_id: i64,
) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        INSERT INTO id_sequences (tenant_id, sequence_name, next_value)
        VALUES ($1, 'global_id', 1)
        ON CONFLICT (tenant_id, sequence_name) DO NOTHING
        "#,
    )
    .bind(tenant_id.as_str())
    .execute(&mut *conn)
    .await?;

    let current: i64 = sqlx::query(
        "SELECT next_value FROM id_sequences WHERE tenant_id = $1 AND sequence_name = 'global_id'",
    )
    .bind(tenant_id.as_str())
    .fetch_one(&mut *conn)
    .await?
    .try_get(0)?;

    if global_id < current {
        return Err(StorageError::Conflict {
            detail: format!("global id {global_id} already allocated or reserved"),
        });
    }

    sqlx::query(
        r#"
        UPDATE id_sequences SET next_value = $2
        WHERE tenant_id = $1 AND sequence_name = 'global_id'
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(global_id + 1)
    .execute(conn)
    .await?;

    Ok(())
}
