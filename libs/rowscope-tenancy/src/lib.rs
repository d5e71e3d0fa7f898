#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Per-execution-unit tenant context.
//!
//! Holds the identity of the "current tenant" for the duration of a logical
//! operation, so data-access code arbitrarily deep in a call chain can ask
//! who it is working for without threading an argument through every
//! signature. The binding is per thread and per future — never a process
//! global — and every install is paired with a restore that runs on normal
//! return, panic and cancellation alike.
//!
//! # Synchronous scopes
//!
//! ```
//! use rowscope_tenancy::{bind_tenant, current_tenant_id, try_current_tenant_id};
//! use uuid::Uuid;
//!
//! let tenant = Uuid::new_v4();
//! {
//!     let _guard = bind_tenant(tenant);
//!     assert_eq!(current_tenant_id(), Ok(tenant));
//! }
//! assert_eq!(try_current_tenant_id(), None);
//! ```
//!
//! # Async scopes
//!
//! Futures carry the binding themselves instead of trusting the worker
//! thread they happen to resume on:
//!
//! ```
//! use rowscope_tenancy::{bind_tenant, TenantFutureExt, try_current_tenant_id};
//! use uuid::Uuid;
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let tenant = Uuid::new_v4();
//! let work = async { try_current_tenant_id() }.in_tenant_scope(tenant);
//! assert_eq!(work.await, Some(tenant));
//! # });
//! ```
//!
//! When handing work to a spawn, capture the caller's binding first with
//! [`TenantFutureExt::with_current_tenant`].

mod context;
mod error;
mod future;

pub use context::{
    TenantGuard, bind_tenant, clear_current_tenant_id, current_tenant_id, set_current_tenant_id,
    try_current_tenant_id, with_tenant,
};
pub use error::NoTenantSet;
pub use future::{TenantFutureExt, TenantScoped};
