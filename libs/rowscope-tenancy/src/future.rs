//! Tenant propagation across suspension points.
//!
//! A wrapped future owns a captured tenant binding. Every time it is polled
//! the binding is swapped into the polling thread's cell, and swapped back
//! out when the poll returns — so the binding travels with the future across
//! worker threads, and whatever the executor thread had bound before is
//! visible again the instant the future suspends. Sibling futures multiplexed
//! onto the same thread never observe each other's tenant.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use pin_project_lite::pin_project;
use uuid::Uuid;

use crate::context;

pin_project! {
    /// Future wrapper carrying a tenant binding across polls.
    ///
    /// Created by [`TenantFutureExt::in_tenant_scope`] or
    /// [`TenantFutureExt::with_current_tenant`]. The wrapper also keeps any
    /// binding the inner future installs imperatively: a value left in the
    /// cell when the future suspends is carried to its next poll instead of
    /// leaking to the worker thread.
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct TenantScoped<F> {
        #[pin]
        inner: F,
        binding: Option<Uuid>,
    }
}

impl<F> TenantScoped<F> {
    fn new(inner: F, binding: Option<Uuid>) -> Self {
        Self { inner, binding }
    }
}

// Swaps a binding into the thread cell on construction and back out on drop,
// so the restore also runs when the inner poll unwinds.
struct BindingSwap<'a> {
    slot: &'a mut Option<Uuid>,
    displaced: Option<Uuid>,
}

impl<'a> BindingSwap<'a> {
    fn enter(slot: &'a mut Option<Uuid>) -> Self {
        let displaced = context::swap_binding(*slot);
        Self { slot, displaced }
    }
}

impl Drop for BindingSwap<'_> {
    fn drop(&mut self) {
        *self.slot = context::swap_binding(self.displaced);
    }
}

impl<F: Future> Future for TenantScoped<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _swap = BindingSwap::enter(this.binding);
        this.inner.poll(cx)
    }
}

/// Extension trait attaching a tenant binding to any future.
pub trait TenantFutureExt: Sized {
    /// Run this future with `tenant` bound for the duration of every poll.
    fn in_tenant_scope(self, tenant: Uuid) -> TenantScoped<Self>;

    /// Capture the caller's current binding (possibly unset) and reattach it
    /// on whatever thread polls this future.
    ///
    /// This is the hand-off primitive: call it *before* moving the future to
    /// a spawn or a join set, while the originating binding is still in
    /// place.
    fn with_current_tenant(self) -> TenantScoped<Self>;
}

impl<F: Future> TenantFutureExt for F {
    fn in_tenant_scope(self, tenant: Uuid) -> TenantScoped<Self> {
        TenantScoped::new(self, Some(tenant))
    }

    fn with_current_tenant(self) -> TenantScoped<Self> {
        TenantScoped::new(self, context::try_current_tenant_id())
    }
}
