use chrono::{DateTime, Utc};
use registry_models::{
    ContentId, ErrorKind, GlobalId, Labels, OrderDirection, Properties, SearchField, SearchFilter,
    SearchQuery, SearchResults, StorageError, TenantId, Version, VersionState,
};
use sqlx::{PgConnection, PgPool, Row};

fn row_to_version(tenant_id: &TenantId, row: &sqlx::postgres::PgRow) -> Result<Version, StorageError> {
    let labels: serde_json::Value = row.get("labels");
    let properties: serde_json::Value = row.get("properties");
    Ok(Version {
        tenant_id: tenant_id.clone(),
        global_id: GlobalId::new(row.get("global_id")),
        group_id: row.get("group_id"),
        artifact_id: row.get("artifact_id"),
        version: row.get("version"),
        version_ordinal: row.get("version_ordinal"),
        content_id: ContentId::new(row.get("content_id")),
        state: row.get("state"),
        owner: row.get("owner"),
        name: row.get("name"),
        description: row.get("description"),
        labels: serde_json::from_value(labels).unwrap_or_default(),
        properties: serde_json::from_value(properties).unwrap_or_default(),
        markdown: row.get("markdown"),
        created_on: row.get("created_on"),
        modified_on: row.get("modified_on"),
        modified_by: row.get("modified_by"),
    })
}

const VERSION_COLUMNS: &str = r#"
    global_id, group_id, artifact_id, version, version_ordinal, content_id, state,
    owner, name, description, labels, properties, markdown, created_on, modified_on, modified_by
"#;

pub async fn get_version(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
    version: &str,
) -> Result<Version, StorageError> {
    let sql = format!(
        "SELECT {VERSION_COLUMNS} FROM versions WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3 AND version = $4"
    );
    let row = sqlx::query(&sql)
        .bind(tenant_id.as_str())
        .bind(group_id)
        .bind(artifact_id)
        .bind(version)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| {
            StorageError::not_found(
                ErrorKind::Version,
                format!("{tenant_id}/{group_id}/{artifact_id}@{version}"),
            )
        })?;
    row_to_version(tenant_id, &row)
}

pub async fn fetch_version_pool(
    pool: &PgPool,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
    version: &str,
) -> Result<Version, StorageError> {
    get_version(&mut *pool.acquire().await?, tenant_id, group_id, artifact_id, version).await
}

pub async fn get_version_by_global_id(
    pool: &PgPool,
    tenant_id: &TenantId,
    global_id: GlobalId,
) -> Result<Version, StorageError> {
    let sql = format!("SELECT {VERSION_COLUMNS} FROM versions WHERE tenant_id = $1 AND global_id = $2");
    let row = sqlx::query(&sql)
        .bind(tenant_id.as_str())
        .bind(global_id.get())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| StorageError::not_found(ErrorKind::Version, global_id.to_string()))?;
    row_to_version(tenant_id, &row)
}

pub async fn list_versions(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
) -> Result<Vec<Version>, StorageError> {
    let sql = format!(
        "SELECT {VERSION_COLUMNS} FROM versions WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3 ORDER BY version_ordinal ASC"
    );
    let rows = sqlx::query(&sql)
        .bind(tenant_id.as_str())
        .bind(group_id)
        .bind(artifact_id)
        .fetch_all(conn)
        .await?;
    rows.iter().map(|row| row_to_version(tenant_id, row)).collect()
}

pub async fn next_version_ordinal(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
) -> Result<i64, StorageError> {
    let row = sqlx::query(
        "SELECT COALESCE(MAX(version_ordinal), 0) FROM versions WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3",
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .bind(artifact_id)
    .fetch_one(conn)
    .await?;
    let max: i64 = row.get(0);
    Ok(max + 1)
}

/// Auto-generates a version label when the caller omitted one: the next
/// version ordinal as a decimal string, matching how callers that never pass
/// an explicit `version` still get a stable, monotonically increasing label.
pub async fn resolve_version_label(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
    requested: Option<&str>,
) -> Result<(String, i64), StorageError> {
    let ordinal = next_version_ordinal(conn, tenant_id, group_id, artifact_id).await?;
    let version = match requested {
        Some(v) => v.to_string(),
        None => ordinal.to_string(),
    };
    Ok((version, ordinal))
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_version(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    global_id: GlobalId,
    group_id: &str,
    artifact_id: &str,
    version: &str,
    version_ordinal: i64,
    content_id: ContentId,
    owner: &str,
    properties: &Properties,
    markdown: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Version, StorageError> {
    let existing = sqlx::query(
        "SELECT 1 FROM versions WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3 AND version = $4",
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .bind(artifact_id)
    .bind(version)
    .fetch_optional(&mut *conn)
    .await?;
    if existing.is_some() {
        return Err(StorageError::already_exists(
            ErrorKind::Version,
            format!("{tenant_id}/{group_id}/{artifact_id}@{version}"),
        ));
    }

    let properties_json = serde_json::to_value(properties).unwrap_or_default();
    sqlx::query(
        r#"
        INSERT INTO versions
            (tenant_id, global_id, group_id, artifact_id, version, version_ordinal, content_id,
             state, owner, name, description, labels, properties, markdown,
             created_on, modified_on, modified_by)
        VALUES
            ($1, $2, $3, $4, $5, $6, $7, 'ENABLED', $8, NULL, NULL, '{}', $9, $10, $11, $11, $8)
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(global_id.get())
    .bind(group_id)
    .bind(artifact_id)
    .bind(version)
    .bind(version_ordinal)
    .bind(content_id.get())
    .bind(owner)
    .bind(&properties_json)
    .bind(markdown)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    get_version(conn, tenant_id, group_id, artifact_id, version).await
}

/// Applies a version lifecycle transition (§4.B state machine). Rejects
/// undefined transitions, and rejects transitioning the last `ENABLED`
/// version to a non-enabled state (§3 invariant: at least one version stays
/// `ENABLED` per artifact, short of deleting the artifact outright).
pub async fn apply_update_state(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
    version: &str,
    next_state: VersionState,
) -> Result<Version, StorageError> {
    let current = get_version(&mut *conn, tenant_id, group_id, artifact_id, version).await?;

    if !current.state.can_transition_to(next_state) {
        return Err(StorageError::InvalidStateTransition {
            from: current.state,
            to: next_state,
        });
    }

    if current.state == VersionState::Enabled && next_state != VersionState::Enabled {
        let enabled_count = sqlx::query(
            r#"
            SELECT COUNT(*) FROM versions
            WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3 AND state = 'ENABLED'
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(group_id)
        .bind(artifact_id)
        .fetch_one(&mut *conn)
        .await?
        .get::<i64, _>(0);

        if enabled_count <= 1 {
            return Err(StorageError::InvalidStateTransition {
                from: current.state,
                to: next_state,
            });
        }
    }

    sqlx::query(
        r#"
        UPDATE versions SET state = $5
        WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3 AND version = $4
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .bind(artifact_id)
    .bind(version)
    .bind(next_state)
    .execute(&mut *conn)
    .await?;

    get_version(conn, tenant_id, group_id, artifact_id, version).await
}

#[allow(clippy::too_many_arguments)]
pub async fn apply_update_metadata(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
    version: &str,
    modified_by: &str,
    name: Option<Option<&str>>,
    description: Option<Option<&str>>,
    labels: Option<&Labels>,
    properties: Option<&Properties>,
    now: DateTime<Utc>,
) -> Result<Version, StorageError> {
    get_version(&mut *conn, tenant_id, group_id, artifact_id, version).await?;

    if let Some(name) = name {
        sqlx::query(
            "UPDATE versions SET name = $5 WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3 AND version = $4",
        )
        .bind(tenant_id.as_str())
        .bind(group_id)
        .bind(artifact_id)
        .bind(version)
        .bind(name)
        .execute(&mut *conn)
        .await?;
    }
    if let Some(description) = description {
        sqlx::query(
            "UPDATE versions SET description = $5 WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3 AND version = $4",
        )
        .bind(tenant_id.as_str())
        .bind(group_id)
        .bind(artifact_id)
        .bind(version)
        .bind(description)
        .execute(&mut *conn)
        .await?;
    }
    if let Some(labels) = labels {
        let labels_json = serde_json::to_value(labels).unwrap_or_default();
        sqlx::query(
            "UPDATE versions SET labels = $5 WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3 AND version = $4",
        )
        .bind(tenant_id.as_str())
        .bind(group_id)
        .bind(artifact_id)
        .bind(version)
        .bind(&labels_json)
        .execute(&mut *conn)
        .await?;
    }
    if let Some(properties) = properties {
        let properties_json = serde_json::to_value(properties).unwrap_or_default();
        sqlx::query(
            "UPDATE versions SET properties = $5 WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3 AND version = $4",
        )
        .bind(tenant_id.as_str())
        .bind(group_id)
        .bind(artifact_id)
        .bind(version)
        .bind(&properties_json)
        .execute(&mut *conn)
        .await?;
    }
    sqlx::query(
        r#"
        UPDATE versions SET modified_on = $5, modified_by = $6
        WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3 AND version = $4
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .bind(artifact_id)
    .bind(version)
    .bind(now)
    .bind(modified_by)
    .execute(&mut *conn)
    .await?;

    get_version(conn, tenant_id, group_id, artifact_id, version).await
}

/// Deletes a single version row. Returns its `content_id` so the caller can
/// check whether that Content row is now orphaned, and whether this was the
/// artifact's last version (in which case the caller deletes the artifact
/// too, per §3 lifecycle).
pub async fn delete_version_row(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
    version: &str,
) -> Result<ContentId, StorageError> {
    let existing = get_version(&mut *conn, tenant_id, group_id, artifact_id, version).await?;

    sqlx::query(
        "DELETE FROM comments WHERE tenant_id = $1 AND global_id = $2",
    )
    .bind(tenant_id.as_str())
    .bind(existing.global_id.get())
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "DELETE FROM versions WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3 AND version = $4",
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .bind(artifact_id)
    .bind(version)
    .execute(conn)
    .await?;

    Ok(existing.content_id)
}

/// `search_versions` (§4.B), same closed filter/order semantics as
/// `search_artifacts` but scoped to one artifact's versions plus the
/// `globalId`/`contentId` fields that only make sense at version grain.
pub async fn search_versions(
    pool: &PgPool,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
    query: &SearchQuery,
) -> Result<SearchResults<Version>, StorageError> {
    let mut where_clauses = vec![
        "tenant_id = $1".to_string(),
        "group_id = $2".to_string(),
        "artifact_id = $3".to_string(),
    ];
    let mut binds: Vec<String> = Vec::new();

    for filter in &query.filters {
        let (clause, value) = version_filter_clause(filter, binds.len() + 4)?;
        where_clauses.push(clause);
        binds.push(value);
    }

    let order_column = version_order_column(query.order_by);
    let direction = match query.order_dir {
        OrderDirection::Ascending => "ASC",
        OrderDirection::Descending => "DESC",
    };
    let where_sql = where_clauses.join(" AND ");
    let sql = format!(
        r#"
        SELECT {VERSION_COLUMNS}, COUNT(*) OVER() AS total
        FROM versions
        WHERE {where_sql}
        ORDER BY LOWER({order_column}::text) {direction}, artifact_id ASC, version ASC
        LIMIT ${limit_idx} OFFSET ${offset_idx}
        "#,
        limit_idx = binds.len() + 4,
        offset_idx = binds.len() + 5,
    );

    let mut q = sqlx::query(&sql)
        .bind(tenant_id.as_str())
        .bind(group_id)
        .bind(artifact_id);
    for value in &binds {
        q = q.bind(value);
    }
    q = q.bind(query.limit).bind(query.offset);

    let rows = q.fetch_all(pool).await?;
    let count = rows.first().map(|r| r.get::<i64, _>("total")).unwrap_or(0);
    let items = rows
        .iter()
        .map(|row| row_to_version(tenant_id, row))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SearchResults { items, count })
}

fn version_order_column(field: SearchField) -> &'static str {
    match field {
        SearchField::Name => "name",
        SearchField::Description => "description",
        SearchField::Owner => "owner",
        SearchField::GlobalId => "global_id",
        SearchField::ContentId => "content_id",
        SearchField::Group | SearchField::Labels | SearchField::Properties => "version",
    }
}

fn version_filter_clause(filter: &SearchFilter, bind_idx: usize) -> Result<(String, String), StorageError> {
    let clause = match filter.field {
        SearchField::Name => format!("name ILIKE '%' || ${bind_idx} || '%'"),
        SearchField::Description => format!("description ILIKE '%' || ${bind_idx} || '%'"),
        SearchField::Owner => format!("owner ILIKE '%' || ${bind_idx} || '%'"),
        SearchField::GlobalId => format!("global_id = ${bind_idx}::bigint"),
        SearchField::ContentId => format!("content_id = ${bind_idx}::bigint"),
        SearchField::Labels => format!("labels::text ILIKE '%' || ${bind_idx} || '%'"),
        SearchField::Properties => format!("properties::text ILIKE '%' || ${bind_idx} || '%'"),
        SearchField::Group => {
            return Err(StorageError::Fatal {
                detail: "group filter is not applicable to version search".to_string(),
            })
        }
    };
    Ok((clause, filter.value.clone()))
}
