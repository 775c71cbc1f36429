use registry_models::StorageError;

/// Trait boundary the Local Store Facade calls synchronously, before
/// submission, for create/update operations that have applicable rules
/// loaded from Relational State (§4.K). Content-type-aware validation itself
/// is out of scope for this crate; only the boundary is owned here.
pub trait RuleEvaluator: Send + Sync {
    fn evaluate(
        &self,
        rule_type: &str,
        config: &str,
        content: &[u8],
        declared_type: &str,
    ) -> Result<(), StorageError>;
}

/// Always accepts. The default for embeddings that haven't wired a real
/// evaluator (§4.K).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRuleEvaluator;

impl RuleEvaluator for NoopRuleEvaluator {
    fn evaluate(&self, _rule_type: &str, _config: &str, _content: &[u8], _declared_type: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

/// An in-memory evaluator keyed by `rule_type`, for exercising S3 without a
/// real content-validation engine. `reject_rule_types` lists rule types that
/// always fail with `RuleViolation`; anything else passes.
#[derive(Debug, Clone, Default)]
pub struct FakeRuleEvaluator {
    reject_rule_types: std::collections::HashSet<String>,
}

impl FakeRuleEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(mut self, rule_type: impl Into<String>) -> Self {
        self.reject_rule_types.insert(rule_type.into());
        self
    }
}

impl RuleEvaluator for FakeRuleEvaluator {
    fn evaluate(&self, rule_type: &str, config: &str, content: &[u8], _declared_type: &str) -> Result<(), StorageError> {
        if self.reject_rule_types.contains(rule_type) {
            return Err(StorageError::RuleViolation {
                rule_type: rule_type.to_string(),
                detail: format!("content rejected by fake rule (config={config}, {} bytes)", content.len()),
            });
        }
        Ok(())
    }
}
