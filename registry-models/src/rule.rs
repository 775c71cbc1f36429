use serde::{Deserialize, Serialize};

use crate::tenant::TenantId;

/// Whether a `Rule` applies to every artifact in a tenant or only to one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RuleScope {
    Global,
    Artifact { group_id: String, artifact_id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rule {
    pub tenant_id: TenantId,
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub rule_type: String,
    pub config: String,
}

impl Rule {
    pub fn scope(&self) -> RuleScope {
        match (&self.group_id, &self.artifact_id) {
            (Some(g), Some(a)) => RuleScope::Artifact {
                group_id: g.clone(),
                artifact_id: a.clone(),
            },
            _ => RuleScope::Global,
        }
    }
}
