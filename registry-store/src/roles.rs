use registry_models::{ErrorKind, RoleMapping, StorageError, TenantId};
use sqlx::{PgConnection, PgPool, Row};

pub async fn apply_set_role_mapping(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    principal_id: &str,
    role: &str,
    principal_name: Option<&str>,
) -> Result<RoleMapping, StorageError> {
    sqlx::query(
        r#"
        INSERT INTO role_mappings (tenant_id, principal_id, role, principal_name)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (tenant_id, principal_id)
        DO UPDATE SET role = EXCLUDED.role, principal_name = EXCLUDED.principal_name
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(principal_id)
    .bind(role)
    .bind(principal_name)
    .execute(conn)
    .await?;

    Ok(RoleMapping {
        tenant_id: tenant_id.clone(),
        principal_id: principal_id.to_string(),
        role: role.to_string(),
        principal_name: principal_name.map(str::to_string),
    })
}

pub async fn apply_delete_role_mapping(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    principal_id: &str,
) -> Result<(), StorageError> {
    let result = sqlx::query("DELETE FROM role_mappings WHERE tenant_id = $1 AND principal_id = $2")
        .bind(tenant_id.as_str())
        .bind(principal_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(ErrorKind::RoleMapping, principal_id.to_string()));
    }
    Ok(())
}

pub async fn list_role_mappings(pool: &PgPool, tenant_id: &TenantId) -> Result<Vec<RoleMapping>, StorageError> {
    let rows = sqlx::query("SELECT principal_id, role, principal_name FROM role_mappings WHERE tenant_id = $1")
        .bind(tenant_id.as_str())
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| RoleMapping {
            tenant_id: tenant_id.clone(),
            principal_id: row.get(0),
            role: row.get(1),
            principal_name: row.get(2),
        })
        .collect())
}
