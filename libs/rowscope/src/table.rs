//! Base table handles and the named views derived from them.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::engine::StorageEngine;
use crate::error::Result;
use crate::filter::Filter;
use crate::record::{Record, SoftDeletable, TenantOwned};
use crate::scope::{Scope, SoftDeleteVisibility, TenantVisibility};
use crate::value::Value;
use crate::view::View;

/// The base handle on `T`'s table.
///
/// A table is a [`View`] factory: [`view`] yields the default scope (live
/// rows of the current tenant), the named constructors widen one axis or
/// the other, and [`unscoped`] strips scoping entirely. Every view shares
/// this table's column spec and mapping through `T` itself; nothing is
/// redefined per view.
///
/// The CRUD surface is also available directly on the table and forwards
/// to the default view.
///
/// [`view`]: Table::view
/// [`unscoped`]: Table::unscoped
pub struct Table<T: Record> {
    engine: Arc<dyn StorageEngine>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Table<T> {
    /// A handle on `T`'s table stored in `engine`.
    #[must_use]
    pub fn new(engine: Arc<dyn StorageEngine>) -> Self {
        Self {
            engine,
            _record: PhantomData,
        }
    }

    /// Create the underlying table on the engine if it is not there yet.
    ///
    /// # Errors
    ///
    /// Fails when the engine cannot satisfy the table shape.
    pub async fn ensure_created(&self) -> Result<()> {
        debug!(table = T::spec().name(), "Ensuring table exists");
        Ok(self.engine.ensure_table(T::spec()).await?)
    }

    fn view_with(&self, scope: Scope) -> View<T> {
        View::new(Arc::clone(&self.engine), scope)
    }

    /// The default view: live rows of the current tenant.
    #[must_use]
    pub fn view(&self) -> View<T> {
        self.view_with(Scope::default())
    }

    /// Everything, scope stripped. Maintenance and test use; not the
    /// ordinary read path.
    #[must_use]
    pub fn unscoped(&self) -> View<T> {
        self.view_with(Scope::everything())
    }

    /// Forwards to the default view; see [`View::all`].
    ///
    /// # Errors
    ///
    /// See [`View::all`].
    pub async fn all(&self) -> Result<Vec<T>> {
        self.view().all().await
    }

    /// Forwards to the default view; see [`View::query`].
    ///
    /// # Errors
    ///
    /// See [`View::query`].
    pub async fn query(&self, filter: Filter) -> Result<Vec<T>> {
        self.view().query(filter).await
    }

    /// Forwards to the default view; see [`View::find`].
    ///
    /// # Errors
    ///
    /// See [`View::find`].
    pub async fn find(&self, id: impl Into<Value> + Send) -> Result<Option<T>> {
        self.view().find(id).await
    }

    /// Forwards to the default view; see [`View::count`].
    ///
    /// # Errors
    ///
    /// See [`View::count`].
    pub async fn count(&self) -> Result<usize> {
        self.view().count().await
    }

    /// Forwards to the default view; see [`View::insert`].
    ///
    /// # Errors
    ///
    /// See [`View::insert`].
    pub async fn insert(&self, record: &T) -> Result<T> {
        self.view().insert(record).await
    }

    /// Forwards to the default view; see [`View::update`].
    ///
    /// # Errors
    ///
    /// See [`View::update`].
    pub async fn update(&self, record: &T) -> Result<T> {
        self.view().update(record).await
    }

    /// Forwards to the default view; see [`View::destroy`].
    ///
    /// # Errors
    ///
    /// See [`View::destroy`].
    pub async fn destroy(&self, record: &T) -> Result<()> {
        self.view().destroy(record).await
    }
}

impl<T: SoftDeletable> Table<T> {
    /// Only soft-deleted rows of the current tenant.
    #[must_use]
    pub fn soft_deleted(&self) -> View<T> {
        self.view_with(Scope::new(
            SoftDeleteVisibility::SoftDeleted,
            TenantVisibility::CurrentTenant,
        ))
    }

    /// Live and soft-deleted rows of the current tenant.
    #[must_use]
    pub fn with_soft_deleted(&self) -> View<T> {
        self.view_with(Scope::new(
            SoftDeleteVisibility::All,
            TenantVisibility::CurrentTenant,
        ))
    }

    /// Forwards to the default view; see [`View::soft_delete`].
    ///
    /// # Errors
    ///
    /// See [`View::soft_delete`].
    pub async fn soft_delete(&self, record: &T) -> Result<T> {
        self.view().soft_delete(record).await
    }
}

impl<T: TenantOwned> Table<T> {
    /// Live rows across every tenant.
    #[must_use]
    pub fn all_tenants(&self) -> View<T> {
        self.view_with(Scope::new(
            SoftDeleteVisibility::Live,
            TenantVisibility::AllTenants,
        ))
    }
}

impl<T: SoftDeletable + TenantOwned> Table<T> {
    /// Only soft-deleted rows, across every tenant.
    #[must_use]
    pub fn soft_deleted_all_tenants(&self) -> View<T> {
        self.view_with(Scope::new(
            SoftDeleteVisibility::SoftDeleted,
            TenantVisibility::AllTenants,
        ))
    }

    /// Live and soft-deleted rows, across every tenant.
    #[must_use]
    pub fn with_soft_deleted_all_tenants(&self) -> View<T> {
        self.view_with(Scope::new(
            SoftDeleteVisibility::All,
            TenantVisibility::AllTenants,
        ))
    }
}

impl<T: Record> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            _record: PhantomData,
        }
    }
}

impl<T: Record> fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("table", &T::spec().name())
            .finish_non_exhaustive()
    }
}
