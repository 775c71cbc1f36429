use chrono::{DateTime, Utc};
use registry_models::{ConfigProperty, ErrorKind, StorageError, TenantId};
use sqlx::{PgConnection, PgPool, Row};

pub async fn apply_set_config_property(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    property_name: &str,
    property_value: &str,
    modified_on: DateTime<Utc>,
) -> Result<ConfigProperty, StorageError> {
    sqlx::query(
        r#"
        INSERT INTO config (tenant_id, property_name, property_value, modified_on)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (tenant_id, property_name)
        DO UPDATE SET property_value = EXCLUDED.property_value, modified_on = EXCLUDED.modified_on
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(property_name)
    .bind(property_value)
    .bind(modified_on)
    .execute(conn)
    .await?;

    Ok(ConfigProperty {
        tenant_id: tenant_id.clone(),
        property_name: property_name.to_string(),
        property_value: property_value.to_string(),
        modified_on,
    })
}

pub async fn apply_delete_config_property(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    property_name: &str,
) -> Result<(), StorageError> {
    let result = sqlx::query("DELETE FROM config WHERE tenant_id = $1 AND property_name = $2")
        .bind(tenant_id.as_str())
        .bind(property_name)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(ErrorKind::ConfigProperty, property_name.to_string()));
    }
    Ok(())
}

pub async fn get_config_property(
    pool: &PgPool,
    tenant_id: &TenantId,
    property_name: &str,
) -> Result<ConfigProperty, StorageError> {
    let row = sqlx::query(
        "SELECT property_value, modified_on FROM config WHERE tenant_id = $1 AND property_name = $2",
    )
    .bind(tenant_id.as_str())
    .bind(property_name)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StorageError::not_found(ErrorKind::ConfigProperty, property_name.to_string()))?;

    Ok(ConfigProperty {
        tenant_id: tenant_id.clone(),
        property_name: property_name.to_string(),
        property_value: row.get(0),
        modified_on: row.get(1),
    })
}

pub async fn list_config_properties(pool: &PgPool, tenant_id: &TenantId) -> Result<Vec<ConfigProperty>, StorageError> {
    let rows = sqlx::query("SELECT property_name, property_value, modified_on FROM config WHERE tenant_id = $1")
        .bind(tenant_id.as_str())
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| ConfigProperty {
            tenant_id: tenant_id.clone(),
            property_name: row.get(0),
            property_value: row.get(1),
            modified_on: row.get(2),
        })
        .collect())
}
