use registry_models::TenantId;

/// Resolves which tenant a request belongs to. Tenancy resolution itself
/// (header parsing, JWT claims, whatever) lives outside this crate; the core
/// only consumes the resolved id (§6 "Consumed from collaborators").
pub trait TenantContext: Send + Sync {
    fn tenant_id(&self) -> TenantId;
}

/// A context that always resolves to the same tenant, for single-tenant
/// embeddings and tests.
#[derive(Debug, Clone)]
pub struct FixedTenantContext(pub TenantId);

impl TenantContext for FixedTenantContext {
    fn tenant_id(&self) -> TenantId {
        self.0.clone()
    }
}
