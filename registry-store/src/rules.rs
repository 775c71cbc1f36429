use registry_models::{ErrorKind, Rule, StorageError, TenantId};
use sqlx::{PgConnection, PgPool, Row};

pub async fn apply_set_global_rule(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    rule_type: &str,
    config: &str,
) -> Result<Rule, StorageError> {
    sqlx::query(
        r#"
        INSERT INTO global_rules (tenant_id, rule_type, config)
        VALUES ($1, $2, $3)
        ON CONFLICT (tenant_id, rule_type) DO UPDATE SET config = EXCLUDED.config
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(rule_type)
    .bind(config)
    .execute(conn)
    .await?;

    Ok(Rule {
        tenant_id: tenant_id.clone(),
        group_id: None,
        artifact_id: None,
        rule_type: rule_type.to_string(),
        config: config.to_string(),
    })
}

pub async fn apply_delete_global_rule(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    rule_type: &str,
) -> Result<(), StorageError> {
    let result = sqlx::query("DELETE FROM global_rules WHERE tenant_id = $1 AND rule_type = $2")
        .bind(tenant_id.as_str())
        .bind(rule_type)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(ErrorKind::Rule, rule_type.to_string()));
    }
    Ok(())
}

pub async fn apply_delete_all_global_rules(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM global_rules WHERE tenant_id = $1")
        .bind(tenant_id.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn get_global_rule(
    pool: &PgPool,
    tenant_id: &TenantId,
    rule_type: &str,
) -> Result<Rule, StorageError> {
    let row = sqlx::query("SELECT config FROM global_rules WHERE tenant_id = $1 AND rule_type = $2")
        .bind(tenant_id.as_str())
        .bind(rule_type)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| StorageError::not_found(ErrorKind::Rule, rule_type.to_string()))?;
    Ok(Rule {
        tenant_id: tenant_id.clone(),
        group_id: None,
        artifact_id: None,
        rule_type: rule_type.to_string(),
        config: row.get(0),
    })
}

pub async fn list_global_rules(pool: &PgPool, tenant_id: &TenantId) -> Result<Vec<Rule>, StorageError> {
    let rows = sqlx::query("SELECT rule_type, config FROM global_rules WHERE tenant_id = $1")
        .bind(tenant_id.as_str())
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| Rule {
            tenant_id: tenant_id.clone(),
            group_id: None,
            artifact_id: None,
            rule_type: row.get(0),
            config: row.get(1),
        })
        .collect())
}

pub async fn apply_set_artifact_rule(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
    rule_type: &str,
    config: &str,
) -> Result<Rule, StorageError> {
    sqlx::query(
        r#"
        INSERT INTO artifact_rules (tenant_id, group_id, artifact_id, rule_type, config)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (tenant_id, group_id, artifact_id, rule_type) DO UPDATE SET config = EXCLUDED.config
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .bind(artifact_id)
    .bind(rule_type)
    .bind(config)
    .execute(conn)
    .await?;

    Ok(Rule {
        tenant_id: tenant_id.clone(),
        group_id: Some(group_id.to_string()),
        artifact_id: Some(artifact_id.to_string()),
        rule_type: rule_type.to_string(),
        config: config.to_string(),
    })
}

pub async fn apply_delete_artifact_rule(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
    rule_type: &str,
) -> Result<(), StorageError> {
    let result = sqlx::query(
        "DELETE FROM artifact_rules WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3 AND rule_type = $4",
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .bind(artifact_id)
    .bind(rule_type)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(ErrorKind::Rule, rule_type.to_string()));
    }
    Ok(())
}

pub async fn apply_delete_all_artifact_rules(
    conn: &mut PgConnection,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM artifact_rules WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3")
        .bind(tenant_id.as_str())
        .bind(group_id)
        .bind(artifact_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn list_artifact_rules(
    pool: &PgPool,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
) -> Result<Vec<Rule>, StorageError> {
    let rows = sqlx::query(
        "SELECT rule_type, config FROM artifact_rules WHERE tenant_id = $1 AND group_id = $2 AND artifact_id = $3",
    )
    .bind(tenant_id.as_str())
    .bind(group_id)
    .bind(artifact_id)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|row| Rule {
            tenant_id: tenant_id.clone(),
            group_id: Some(group_id.to_string()),
            artifact_id: Some(artifact_id.to_string()),
            rule_type: row.get(0),
            config: row.get(1),
        })
        .collect())
}

/// All rules applicable to `(group_id, artifact_id)` writes: every global
/// rule plus any artifact-scoped rule for this artifact (§4.K: D loads these
/// before invoking the rule evaluator).
pub async fn applicable_rules(
    pool: &PgPool,
    tenant_id: &TenantId,
    group_id: &str,
    artifact_id: &str,
) -> Result<Vec<Rule>, StorageError> {
    let mut rules = list_global_rules(pool, tenant_id).await?;
    rules.extend(list_artifact_rules(pool, tenant_id, group_id, artifact_id).await?);
    Ok(rules)
}
