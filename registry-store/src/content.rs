use registry_models::{content_hash, ArtifactReference, Content, ContentId, ErrorKind, ReferenceStrictness, StorageError, TenantId};
use sqlx::{PgConnection, PgPool, Row};
use std::collections::HashSet;

use crate::ids;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WasNew {
    Yes,
    No,
}

/// `put_content` (§4.A): computes `contentHash`, returns the existing row's
/// id if one already carries that hash for this tenant, otherwise allocates a
/// new `contentId` and inserts the row plus its ordered reference list inside
/// the caller's transaction.
pub async fn put_content(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    bytes: &[u8],
    references: &[ArtifactReference],
    strictness: ReferenceStrictness,
) -> Result<(ContentId, WasNew), StorageError> {
    let hash = content_hash(bytes);

    if let Some(existing) = find_by_hash(conn, tenant_id, &hash).await? {
        return Ok((existing, WasNew::No));
    }

    validate_references(conn, tenant_id, references, strictness).await?;

    let content_id = ids::next_content_id(conn, tenant_id).await?;

    sqlx::query(
        r#"
        INSERT INTO content (tenant_id, content_id, content_bytes, content_hash, canonical_hash)
        VALUES ($1, $2, $3, $4, NULL)
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(content_id.get())
    .bind(bytes)
    .bind(&hash)
    .execute(&mut *conn)
    .await?;

    for (ordinal, reference) in references.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO content_references
                (tenant_id, content_id, ordinal, ref_group_id, ref_artifact_id, ref_version, ref_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(content_id.get())
        .bind(ordinal as i32)
        .bind(&reference.group_id)
        .bind(&reference.artifact_id)
        .bind(&reference.version)
        .bind(&reference.name)
        .execute(&mut *conn)
        .await?;
    }

    Ok((content_id, WasNew::Yes))
}

async fn find_by_hash(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    hash: &str,
) -> Result<Option<ContentId>, StorageError> {
    let row = sqlx::query("SELECT content_id FROM content WHERE tenant_id = $1 AND content_hash = $2")
        .bind(tenant_id.as_str())
        .bind(hash)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(|r| ContentId::new(r.get::<i64, _>(0))))
}

/// Rejects references that don't resolve under `Strict` policy, and rejects
/// any reference set that would close a cycle through already-stored content
/// (§4.A), via DFS from each candidate target back towards content whose
/// references eventually point at something within this insertion.
///
/// Since `references` describes *outgoing* edges of content not yet
/// persisted, a cycle can only be formed if one of the referenced artifacts'
/// current versions transitively references an artifact this content will
/// belong to. We don't know that artifact yet (content is created before the
/// version row that names it), so the caller passes an empty cycle-detection
/// scope for artifact-less content and cycle checking is effectively limited
/// to self-references by `artifact_id` within the same payload — the DFS
/// below still walks the persisted graph so a reference cycle introduced by
/// two already-published artifacts pointing at each other is caught the
/// moment a third insertion would close the loop.
async fn validate_references(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    references: &[ArtifactReference],
    strictness: ReferenceStrictness,
) -> Result<(), StorageError> {
    for reference in references {
        if strictness == ReferenceStrictness::AllowDangling {
            continue;
        }
        let group_id = reference.group_id.as_deref().unwrap_or("default");
        let exists = sqlx::query(
            "SELECT 1 FROM artifacts WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3",
        )
        .bind(tenant_id.as_str())
        .bind(group_id)
        .bind(&reference.artifact_id)
        .fetch_optional(&mut *conn)
        .await?;
        if exists.is_none() {
            return Err(StorageError::ReferenceInvalid {
                detail: format!(
                    "reference target {}/{} does not exist",
                    group_id, reference.artifact_id
                ),
            });
        }
    }

    detect_cycle(conn, tenant_id, references).await
}

/// Walks the already-persisted reference graph starting from each of
/// `references`'s targets; a cycle exists iff that walk revisits a node it
/// started from (i.e. one of the new references' own targets reaches back to
/// another target in the same set through existing edges).
async fn detect_cycle(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    references: &[ArtifactReference],
) -> Result<(), StorageError> {
    let roots: HashSet<String> = references
        .iter()
        .map(|r| format!("{}/{}", r.group_id.as_deref().unwrap_or("default"), r.artifact_id))
        .collect();

    for start in &roots {
        let mut visited = HashSet::new();
        let mut stack = vec![start.clone()];
        while let Some(node) = stack.pop() {
            if !visited.insert(node.clone()) {
                continue;
            }
            let Some((group_id, artifact_id)) = node.split_once('/') else {
                continue;
            };
            let rows = sqlx::query(
                r#"
                SELECT DISTINCT cr.ref_group_id, cr.ref_artifact_id
                FROM content_references cr
                JOIN versions v ON v.tenant_id = cr.tenant_id AND v.content_id = cr.content_id
                WHERE cr.tenant_id = $1 AND v.group_id = $2 AND v.artifact_id = $3
                "#,
            )
            .bind(tenant_id.as_str())
            .bind(group_id)
            .bind(artifact_id)
            .fetch_all(&mut *conn)
            .await?;

            for row in rows {
                let ref_group: Option<String> = row.get(0);
                let ref_artifact: String = row.get(1);
                let next = format!("{}/{}", ref_group.as_deref().unwrap_or("default"), ref_artifact);
                if next == *start {
                    return Err(StorageError::ReferenceInvalid {
                        detail: format!("reference from {node} to {next} would close a cycle"),
                    });
                }
                stack.push(next);
            }
        }
    }

    Ok(())
}

pub async fn get_by_content_id(
    pool: &PgPool,
    tenant_id: &TenantId,
    content_id: ContentId,
) -> Result<Content, StorageError> {
    fetch_content(&mut *pool.acquire().await?, tenant_id, content_id).await
}

pub async fn fetch_content(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    content_id: ContentId,
) -> Result<Content, StorageError> {
    let row = sqlx::query(
        "SELECT content_bytes, content_hash, canonical_hash FROM content WHERE tenant_id = $1 AND content_id = $2",
    )
    .bind(tenant_id.as_str())
    .bind(content_id.get())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| StorageError::not_found(ErrorKind::Content, content_id.to_string()))?;

    let references = fetch_references(conn, tenant_id, content_id).await?;

    Ok(Content {
        tenant_id: tenant_id.clone(),
        content_id,
        bytes: row.get(0),
        content_hash: row.get(1),
        canonical_hash: row.get(2),
        references,
    })
}

async fn fetch_references(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    content_id: ContentId,
) -> Result<Vec<ArtifactReference>, StorageError> {
    let rows = sqlx::query(
        r#"
        SELECT ref_group_id, ref_artifact_id, ref_version, ref_name
        FROM content_references
        WHERE tenant_id = $1 AND content_id = $2
        ORDER BY ordinal ASC
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(content_id.get())
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ArtifactReference {
            group_id: row.get(0),
            artifact_id: row.get(1),
            version: row.get(2),
            name: row.get(3),
        })
        .collect())
}

pub async fn get_by_content_hash(
    pool: &PgPool,
    tenant_id: &TenantId,
    hash: &str,
) -> Result<Content, StorageError> {
    let mut conn = pool.acquire().await?;
    let content_id = find_by_hash(&mut conn, tenant_id, hash)
        .await?
        .ok_or_else(|| StorageError::not_found(ErrorKind::Content, hash.to_string()))?;
    fetch_content(&mut conn, tenant_id, content_id).await
}

/// `update_canonical_hash` (§4.A): idempotent and a no-op if `content_hash`
/// no longer matches `expected_content_hash`, which happens when the row was
/// replaced or deleted by a race since the caller read it.
pub async fn update_canonical_hash(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    content_id: ContentId,
    expected_content_hash: &str,
    new_canonical_hash: &str,
) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        UPDATE content SET canonical_hash = $4
        WHERE tenant_id = $1 AND content_id = $2 AND content_hash = $3
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(content_id.get())
    .bind(expected_content_hash)
    .bind(new_canonical_hash)
    .execute(conn)
    .await?;
    Ok(())
}

/// Whether any version still references `content_id` (§3 lifecycle: "A
/// Content row is garbage-collectible iff no Version references it").
pub async fn is_referenced(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    content_id: ContentId,
) -> Result<bool, StorageError> {
    let row = sqlx::query("SELECT 1 FROM versions WHERE tenant_id = $1 AND content_id = $2 LIMIT 1")
        .bind(tenant_id.as_str())
        .bind(content_id.get())
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

/// Deletes a Content row and its references. Callers must have already
/// established via `is_referenced` that no version points at it; this
/// function does not re-check, since it always runs inside the same
/// transaction as the version deletion that made it orphaned.
pub async fn delete_content(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    content_id: ContentId,
) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM content_references WHERE tenant_id = $1 AND content_id = $2")
        .bind(tenant_id.as_str())
        .bind(content_id.get())
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM content WHERE tenant_id = $1 AND content_id = $2")
        .bind(tenant_id.as_str())
        .bind(content_id.get())
        .execute(conn)
        .await?;
    Ok(())
}
