use chrono::{DateTime, Utc};
use registry_models::{ErrorKind, Group, Labels, StorageError, TenantId, DEFAULT_GROUP_ID};
use sqlx::{PgConnection, PgPool, Row};

/// Creates `group_id` if it doesn't already exist, a no-op otherwise. Groups
/// are created lazily on first artifact (§3); this is the one place that
/// lazy-creation happens so every write path that needs a group row can call
/// it unconditionally instead of special-casing "does this group exist yet".
pub async fn ensure_group(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    owner: &str,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        INSERT INTO groups (tenant_id, group_id, owner, description, labels, created_on, modified_on, modified_by)
        VALUES ($1, $2, $3, NULL, '{}', $4, $4, $3)
        ON CONFLICT (tenant_id, group_id) DO NOTHING
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .bind(owner)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn apply_create_group(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    owner: &str,
    description: Option<&str>,
    labels: &Labels,
    now: DateTime<Utc>,
) -> Result<Group, StorageError> {
    let labels_json = serde_json::to_value(labels).unwrap_or_default();
    let result = sqlx::query(
        r#"
        INSERT INTO groups (tenant_id, group_id, owner, description, labels, created_on, modified_on, modified_by)
        VALUES ($1, $2, $3, $4, $5, $6, $6, $3)
        ON CONFLICT (tenant_id, group_id) DO NOTHING
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .bind(owner)
    .bind(description)
    .bind(&labels_json)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::already_exists(
            ErrorKind::Group,
            format!("{}/{}", tenant_id, group_id),
        ));
    }

    get_group(conn, tenant_id, group_id).await
}

pub async fn apply_update_group(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    modified_by: &str,
    description: Option<Option<&str>>,
    labels: Option<&Labels>,
    now: DateTime<Utc>,
) -> Result<Group, StorageError> {
    ensure_exists(&mut *conn, tenant_id, group_id).await?;

    if let Some(description) = description {
        sqlx::query("UPDATE groups SET description = $3 WHERE tenant_id = $1 AND group_id = $2")
            .bind(tenant_id.as_str())
            .bind(group_id)
            .bind(description)
            .execute(&mut *conn)
            .await?;
    }
    if let Some(labels) = labels {
        let labels_json = serde_json::to_value(labels).unwrap_or_default();
        sqlx::query("UPDATE groups SET labels = $3 WHERE tenant_id = $1 AND group_id = $2")
            .bind(tenant_id.as_str())
            .bind(group_id)
            .bind(&labels_json)
            .execute(&mut *conn)
            .await?;
    }
    sqlx::query(
        "UPDATE groups SET modified_on = $3, modified_by = $4 WHERE tenant_id = $1 AND group_id = $2",
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .bind(now)
    .bind(modified_by)
    .execute(&mut *conn)
    .await?;

    get_group(conn, tenant_id, group_id).await
}

/// Deletes `group_id` and, per §3 ("Deleting a group deletes all artifacts
/// within"), every artifact, version, and content row that belongs only to
/// it. Callers (the Sink, via `registry-core`) are expected to call
/// `artifacts::delete_artifact` in a loop beforehand for referential
/// integrity with `rules`/`comments`; this function itself only removes
/// rows that have no remaining dependents, matching how `delete_all_tenant_data`
/// composes the same primitives tenant-wide.
pub async fn apply_delete_group(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
) -> Result<(), StorageError> {
    ensure_exists(&mut *conn, tenant_id, group_id).await?;
    sqlx::query("DELETE FROM artifact_rules WHERE tenant_id = $1 AND group_id = $2")
        .bind(tenant_id.as_str())
        .bind(group_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM groups WHERE tenant_id = $1 AND group_id = $2")
        .bind(tenant_id.as_str())
        .bind(group_id)
        .execute(conn)
        .await?;
    Ok(())
}

async fn ensure_exists(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
) -> Result<(), StorageError> {
    let row = sqlx::query("SELECT 1 FROM groups WHERE tenant_id = $1 AND group_id = $2")
        .bind(tenant_id.as_str())
        .bind(group_id)
        .fetch_optional(conn)
        .await?;
    if row.is_none() {
        return Err(StorageError::not_found(
            ErrorKind::Group,
            format!("{}/{}", tenant_id, group_id),
        ));
    }
    Ok(())
}

pub async fn get_group(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
) -> Result<Group, StorageError> {
    let row = sqlx::query(
        r#"
        SELECT owner, description, labels, created_on, modified_on, modified_by
        FROM groups WHERE tenant_id = $1 AND group_id = $2
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| StorageError::not_found(ErrorKind::Group, format!("{}/{}", tenant_id, group_id)))?;

    let labels: serde_json::Value = row.get(2);
    Ok(Group {
        tenant_id: tenant_id.clone(),
        group_id: group_id.to_string(),
        owner: row.get(0),
        description: row.get(1),
        labels: serde_json::from_value(labels).unwrap_or_default(),
        created_on: row.get(3),
        modified_on: row.get(4),
        modified_by: row.get(5),
    })
}

pub async fn fetch_group_pool(
    pool: &PgPool,
    tenant_id: &TenantId,
    group_id: &str,
) -> Result<Group, StorageError> {
    get_group(&mut *pool.acquire().await?, tenant_id, group_id).await
}

pub fn default_group_id(group_id: Option<&str>) -> &str {
    group_id.unwrap_or(DEFAULT_GROUP_ID)
}

/// `search_groups` (§4.B), same closed filter/order semantics as
/// `search_artifacts`.
pub async fn search_groups(
    pool: &PgPool,
    tenant_id: &TenantId,
    query: &registry_models::SearchQuery,
) -> Result<registry_models::SearchResults<Group>, StorageError> {
    use registry_models::{OrderDirection, SearchField};

    let mut where_clauses = vec!["tenant_id = $1".to_string()];
    let mut binds: Vec<String> = Vec::new();

    for filter in &query.filters {
        let clause = match filter.field {
            SearchField::Description => format!("description ILIKE '%' || ${} || '%'", binds.len() + 2),
            SearchField::Owner => format!("owner ILIKE '%' || ${} || '%'", binds.len() + 2),
            SearchField::Labels => format!("labels::text ILIKE '%' || ${} || '%'", binds.len() + 2),
            SearchField::Group => format!("group_id ILIKE '%' || ${} || '%'", binds.len() + 2),
            other => {
                return Err(StorageError::Fatal {
                    detail: format!("{other:?} filter is not applicable to group search"),
                })
            }
        };
        where_clauses.push(clause);
        binds.push(filter.value.clone());
    }

    let order_column = match query.order_by {
        SearchField::Description => "description",
        SearchField::Owner => "owner",
        _ => "group_id",
    };
    let direction = match query.order_dir {
        OrderDirection::Ascending => "ASC",
        OrderDirection::Descending => "DESC",
    };
    let where_sql = where_clauses.join(" AND ");
    let sql = format!(
        r#"
        SELECT group_id, owner, description, labels, created_on, modified_on, modified_by,
               COUNT(*) OVER() AS total
        FROM groups
        WHERE {where_sql}
        ORDER BY LOWER({order_column}::text) {direction}, group_id ASC
        LIMIT ${limit_idx} OFFSET ${offset_idx}
        "#,
        limit_idx = binds.len() + 2,
        offset_idx = binds.len() + 3,
    );

    let mut q = sqlx::query(&sql).bind(tenant_id.as_str());
    for value in &binds {
        q = q.bind(value);
    }
    q = q.bind(query.limit).bind(query.offset);

    let rows = q.fetch_all(pool).await?;
    let count = rows.first().map(|r| r.get::<i64, _>("total")).unwrap_or(0);
    let items = rows
        .into_iter()
        .map(|row| {
            let labels: serde_json::Value = row.get("labels");
            Group {
                tenant_id: tenant_id.clone(),
                group_id: row.get("group_id"),
                owner: row.get("owner"),
                description: row.get("description"),
                labels: serde_json::from_value(labels).unwrap_or_default(),
                created_on: row.get("created_on"),
                modified_on: row.get("modified_on"),
                modified_by: row.get("modified_by"),
            }
        })
        .collect();

    Ok(registry_models::SearchResults { items, count })
}
