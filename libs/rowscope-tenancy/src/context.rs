//! Thread-bound tenant state and the guard that keeps it balanced.
//!
//! The binding lives in a thread-local cell. Synchronous code installs it
//! with [`bind_tenant`] (RAII restore) or the lower-level
//! [`set_current_tenant_id`] / [`clear_current_tenant_id`] pair, both of
//! which hand back the previous value so nesting composes. Async code must
//! not touch the cell directly across `.await` points; it wraps futures with
//! [`TenantFutureExt`](crate::TenantFutureExt) instead, which swaps the
//! binding in and out around every poll.

use std::cell::Cell;
use std::marker::PhantomData;

use uuid::Uuid;

use crate::error::NoTenantSet;

thread_local! {
    static CURRENT_TENANT: Cell<Option<Uuid>> = const { Cell::new(None) };
}

/// Install `id` as the current tenant for this execution unit.
///
/// Returns the previous binding (which may be `None`) so the caller can
/// restore it. Prefer [`bind_tenant`], which does the restore for you.
#[must_use = "restore the returned previous binding when done"]
pub fn set_current_tenant_id(id: Uuid) -> Option<Uuid> {
    CURRENT_TENANT.with(|cell| cell.replace(Some(id)))
}

/// Read the current tenant binding without failing.
#[must_use]
pub fn try_current_tenant_id() -> Option<Uuid> {
    CURRENT_TENANT.with(Cell::get)
}

/// Read the current tenant binding.
///
/// # Errors
///
/// Returns [`NoTenantSet`] if no tenant is bound to this execution unit.
pub fn current_tenant_id() -> Result<Uuid, NoTenantSet> {
    try_current_tenant_id().ok_or(NoTenantSet)
}

/// Unset the current tenant binding, returning the previous value.
#[must_use = "restore the returned previous binding when done"]
pub fn clear_current_tenant_id() -> Option<Uuid> {
    CURRENT_TENANT.with(Cell::take)
}

// Used by the future combinator: swap an arbitrary binding (possibly None)
// into the cell and hand the displaced one back.
pub(crate) fn swap_binding(binding: Option<Uuid>) -> Option<Uuid> {
    CURRENT_TENANT.with(|cell| cell.replace(binding))
}

/// RAII guard restoring the previous tenant binding on drop.
///
/// Created by [`bind_tenant`]. The restore runs on every exit path,
/// including unwinding, so a failed action never leaves its tenant visible
/// to later code reusing the same thread.
///
/// The guard is `!Send`: it must be dropped on the thread whose binding it
/// holds. Holding one across an `.await` is therefore rejected at compile
/// time for `Send` futures; use the future combinator for async scopes.
#[must_use = "the previous binding is restored when the guard is dropped"]
pub struct TenantGuard {
    previous: Option<Uuid>,
    _not_send: PhantomData<*const ()>,
}

impl std::fmt::Debug for TenantGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantGuard")
            .field("previous", &self.previous)
            .finish_non_exhaustive()
    }
}

impl Drop for TenantGuard {
    fn drop(&mut self) {
        CURRENT_TENANT.with(|cell| cell.set(self.previous));
        tracing::trace!(restored = ?self.previous, "Tenant binding restored");
    }
}

/// Install `id` as the current tenant until the returned guard drops.
///
/// Nested binds restore the outer value on exit, not clear it.
pub fn bind_tenant(id: Uuid) -> TenantGuard {
    let previous = set_current_tenant_id(id);
    tracing::trace!(tenant = %id, "Tenant binding installed");
    TenantGuard {
        previous,
        _not_send: PhantomData,
    }
}

/// Run `f` with `id` as the current tenant, restoring the previous binding
/// afterwards — also when `f` panics.
pub fn with_tenant<T>(id: Uuid, f: impl FnOnce() -> T) -> T {
    let _guard = bind_tenant(id);
    f()
}
