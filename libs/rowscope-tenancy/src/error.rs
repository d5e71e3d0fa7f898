/// A tenant-scoped operation ran with no current tenant bound.
///
/// Returned by [`current_tenant_id`](crate::current_tenant_id) and by
/// anything downstream that builds a tenant predicate. The binding is
/// per execution unit, so "no tenant" here means no tenant was installed
/// on *this* thread or propagated into *this* future — not that the
/// process as a whole never saw one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no current tenant is bound to this execution context")]
pub struct NoTenantSet;
