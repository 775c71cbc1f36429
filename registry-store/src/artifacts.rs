use chrono::{DateTime, Utc};
use registry_models::{Artifact, ErrorKind, Labels, SearchField, SearchFilter, SearchQuery, SearchResults, StorageError, TenantId};
use sqlx::{PgConnection, PgPool, Row};

pub async fn get_artifact(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
) -> Result<Artifact, StorageError> {
    let row = sqlx::query(
        r#"
        SELECT artifact_type, owner, name, description, labels, created_on, modified_on, modified_by
        FROM artifacts WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .bind(artifact_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| {
        StorageError::not_found(ErrorKind::Artifact, format!("{tenant_id}/{group_id}/{artifact_id}"))
    })?;

    let labels: serde_json::Value = row.get(4);
    Ok(Artifact {
        tenant_id: tenant_id.clone(),
        group_id: group_id.to_string(),
        artifact_id: artifact_id.to_string(),
        artifact_type: row.get(0),
        owner: row.get(1),
        name: row.get(2),
        description: row.get(3),
        labels: serde_json::from_value(labels).unwrap_or_default(),
        created_on: row.get(5),
        modified_on: row.get(6),
        modified_by: row.get(7),
    })
}

pub async fn fetch_artifact_pool(
    pool: &PgPool,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
) -> Result<Artifact, StorageError> {
    get_artifact(&mut *pool.acquire().await?, tenant_id, group_id, artifact_id).await
}

pub async fn exists(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
) -> Result<bool, StorageError> {
    let row = sqlx::query(
        "SELECT 1 FROM artifacts WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3",
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .bind(artifact_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.is_some())
}

pub async fn apply_update_artifact_metadata(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
    modified_by: &str,
    name: Option<Option<&str>>,
    description: Option<Option<&str>>,
    labels: Option<&Labels>,
    now: DateTime<Utc>,
) -> Result<Artifact, StorageError> {
    if !exists(&mut *conn, tenant_id, group_id, artifact_id).await? {
        return Err(StorageError::not_found(
            ErrorKind::Artifact,
            format!("{tenant_id}/{group_id}/{artifact_id}"),
        ));
    }

    if let Some(name) = name {
        sqlx::query(
            "UPDATE artifacts SET name = $4 WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3",
        )
        .bind(tenant_id.as_str())
        .bind(group_id)
        .bind(artifact_id)
        .bind(name)
        .execute(&mut *conn)
        .await?;
    }
    if let Some(description) = description {
        sqlx::query(
            "UPDATE artifacts SET description = $4 WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3",
        )
        .bind(tenant_id.as_str())
        .bind(group_id)
        .bind(artifact_id)
        .bind(description)
        .execute(&mut *conn)
        .await?;
    }
    if let Some(labels) = labels {
        let labels_json = serde_json::to_value(labels).unwrap_or_default();
        sqlx::query(
            "UPDATE artifacts SET labels = $4 WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3",
        )
        .bind(tenant_id.as_str())
        .bind(group_id)
        .bind(artifact_id)
        .bind(&labels_json)
        .execute(&mut *conn)
        .await?;
    }
    sqlx::query(
        r#"
        UPDATE artifacts SET modified_on = $4, modified_by = $5
        WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .bind(artifact_id)
    .bind(now)
    .bind(modified_by)
    .execute(&mut *conn)
    .await?;

    get_artifact(conn, tenant_id, group_id, artifact_id).await
}

pub async fn count_versions(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
) -> Result<i64, StorageError> {
    let row = sqlx::query(
        "SELECT COUNT(*) FROM versions WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3",
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .bind(artifact_id)
    .fetch_one(conn)
    .await?;
    Ok(row.get(0))
}

/// Deletes the artifact row itself. Callers must have already deleted all of
/// its versions (and any now-orphaned content) and its artifact-scoped
/// rules; `registry-core`'s apply path for `DeleteArtifact` does that before
/// calling this (§3: "deleting the last version deletes the artifact row").
pub async fn delete_artifact_row(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM artifact_rules WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3")
        .bind(tenant_id.as_str())
        .bind(group_id)
        .bind(artifact_id)
        .execute(&mut *conn)
        .await?;
    let result = sqlx::query(
        "DELETE FROM artifacts WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3",
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .bind(artifact_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(
            ErrorKind::Artifact,
            format!("{tenant_id}/{group_id}/{artifact_id}"),
        ));
    }
    Ok(())
}

/// `search_artifacts` (§4.B): filters are a closed set matched by equality or
/// substring per `SearchField::match_mode`; ordering is case-insensitive on
/// the chosen field with `artifact_id` then a stable tiebreak.
pub async fn search_artifacts(
    pool: &PgPool,
    tenant_id: &TenantId,
    query: &SearchQuery,
) -> Result<SearchResults<Artifact>, StorageError> {
    let mut where_clauses = vec!["tenant_id = $1".to_string()];
    let mut binds: Vec<String> = Vec::new();

    for filter in &query.filters {
        let (clause, value) = artifact_filter_clause(filter, binds.len() + 2)?;
        where_clauses.push(clause);
        binds.push(value);
    }

    let order_column = artifact_order_column(query.order_by)?;
    let direction = match query.order_dir {
        registry_models::OrderDirection::Ascending => "ASC",
        registry_models::OrderDirection::Descending => "DESC",
    };

    let where_sql = where_clauses.join(" AND ");
    let sql = format!(
        r#"
        SELECT group_id, artifact_id, artifact_type, owner, name, description, labels,
               created_on, modified_on, modified_by, COUNT(*) OVER() AS total
        FROM artifacts
        WHERE {where_sql}
        ORDER BY LOWER({order_column}::text) {direction}, artifact_id ASC, group_id ASC
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
            Artifact {
                tenant_id: tenant_id.clone(),
                group_id: row.get("group_id"),
                artifact_id: row.get("artifact_id"),
                artifact_type: row.get("artifact_type"),
                owner: row.get("owner"),
                name: row.get("name"),
                description: row.get("description"),
                labels: serde_json::from_value(labels).unwrap_or_default(),
                created_on: row.get("created_on"),
                modified_on: row.get("modified_on"),
                modified_by: row.get("modified_by"),
            }
        })
        .collect();

    Ok(SearchResults { items, count })
}

fn artifact_order_column(field: SearchField) -> Result<&'static str, StorageError> {
    Ok(match field {
        SearchField::Name => "name",
        SearchField::Group => "group_id",
        SearchField::Description => "description",
        SearchField::Owner => "owner",
        SearchField::GlobalId | SearchField::ContentId | SearchField::Labels | SearchField::Properties => {
            "artifact_id"
        }
    })
}

fn artifact_filter_clause(filter: &SearchFilter, bind_idx: usize) -> Result<(String, String), StorageError> {
    let clause = match filter.field {
        SearchField::Name => format!("name ILIKE '%' || ${bind_idx} || '%'"),
        SearchField::Description => format!("description ILIKE '%' || ${bind_idx} || '%'"),
        SearchField::Group => format!("group_id = ${bind_idx}"),
        SearchField::Owner => format!("owner ILIKE '%' || ${bind_idx} || '%'"),
        SearchField::Labels => format!("labels::text ILIKE '%' || ${bind_idx} || '%'"),
        SearchField::Properties => {
            return Err(StorageError::Fatal {
                detail: "properties filter is not applicable to artifact search".to_string(),
            })
        }
        SearchField::GlobalId | SearchField::ContentId => {
            return Err(StorageError::Fatal {
                detail: "globalId/contentId filters are not applicable to artifact search".to_string(),
            })
        }
    };
    Ok((clause, filter.value.clone()))
}
