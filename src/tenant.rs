/// Tenant and user context for core operations
///
/// Every entity is scoped to exactly one tenant id, and the engine never
/// infers the tenant or acting user from anything other than this explicit
/// parameter. Operations that mutate state on behalf of a user (starting an
/// instance, completing a task, creating a form) take the full context;
/// pure reads take the tenant id alone.

#[derive(Debug, Clone)]
pub struct TenantContext {
    /// Isolation boundary all lookups and writes are scoped to
    pub tenant_id: String,
    /// The user performing the operation
    pub user_id: String,
}

impl TenantContext {
    pub fn new(tenant_id: String, user_id: String) -> Self {
        Self { tenant_id, user_id }
    }
}
