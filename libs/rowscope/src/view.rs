//! Scoped table handles.
//!
//! A [`View`] is a table handle plus a [`Scope`]. Every operation rebuilds
//! the scope predicate at call time, conjoins whatever the operation itself
//! needs (an id match, a caller condition), and only then talks to the
//! engine. Reads and writes alike are narrowed this way; a view can only
//! mutate what it can see.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, trace};

use crate::column::{CREATED_AT_IDX, ID, ID_IDX, SOFT_DELETED_AT, UPDATED_AT_IDX};
use crate::engine::StorageEngine;
use crate::error::{Result, StoreError};
use crate::filter::Filter;
use crate::mapping::{self, MappingError};
use crate::record::{Record, SoftDeletable};
use crate::scope::{Scope, TenantVisibility};
use crate::value::{Row, Value};

/// A handle on `T`'s table with a fixed visibility scope.
///
/// Views are cheap to clone and share one engine handle; they carry no
/// cached predicate and no per-record state.
pub struct View<T: Record> {
    engine: Arc<dyn StorageEngine>,
    scope: Scope,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> View<T> {
    pub(crate) fn new(engine: Arc<dyn StorageEngine>, scope: Scope) -> Self {
        Self {
            engine,
            scope,
            _record: PhantomData,
        }
    }

    /// The scope this view applies to every operation.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    fn scope_filter(&self) -> Result<Filter> {
        Ok(self.scope.filter(T::spec())?)
    }

    /// All rows this view admits, in insertion order.
    ///
    /// # Errors
    ///
    /// See [`StoreError`]; notably [`StoreError::NoTenantSet`] on
    /// tenant-scoped views when no tenant is bound.
    pub async fn all(&self) -> Result<Vec<T>> {
        self.fetch(Filter::All).await
    }

    /// Rows this view admits that also match `filter`.
    ///
    /// # Errors
    ///
    /// See [`StoreError`].
    pub async fn query(&self, filter: Filter) -> Result<Vec<T>> {
        self.fetch(filter).await
    }

    /// The row with the given id, if this view admits it.
    ///
    /// A missing row is `Ok(None)`, not an error: absence within a scope is
    /// an ordinary answer.
    ///
    /// # Errors
    ///
    /// See [`StoreError`].
    pub async fn find(&self, id: impl Into<Value> + Send) -> Result<Option<T>> {
        let spec = T::spec();
        let filter = self.scope_filter()?.and(Filter::eq(ID, id));
        let rows = self.engine.select(spec, &filter).await?;
        rows.into_iter().next().map(decode_one).transpose()
    }

    /// How many rows this view admits.
    ///
    /// # Errors
    ///
    /// See [`StoreError`].
    pub async fn count(&self) -> Result<usize> {
        let spec = T::spec();
        let filter = self.scope_filter()?;
        Ok(self.engine.select(spec, &filter).await?.len())
    }

    /// Insert `record` as a new row and return it as persisted.
    ///
    /// Identity and both timestamps are always assigned here; whatever the
    /// caller put in those fields is discarded. On a tenant-scoped view the
    /// tenant column is filled from the current binding when unset, and a
    /// conflicting value is refused rather than overwritten.
    ///
    /// # Errors
    ///
    /// [`StoreError::TenantMismatch`] when the record names another tenant,
    /// plus the mapping and engine failures any write can produce.
    pub async fn insert(&self, record: &T) -> Result<T> {
        let spec = T::spec();
        let mut row = record.to_row();

        let now = Utc::now();
        if let Some(slot) = row.values.get_mut(ID_IDX) {
            *slot = Value::Null;
        }
        if let Some(slot) = row.values.get_mut(CREATED_AT_IDX) {
            *slot = Value::Timestamp(now);
        }
        if let Some(slot) = row.values.get_mut(UPDATED_AT_IDX) {
            *slot = Value::Timestamp(now);
        }
        self.stamp_tenant(&mut row, TenantFill::FillWhenUnset)?;

        let encoded = mapping::encode(spec, row)?;
        debug!(table = spec.name(), scope = %self.scope, "Inserting row");
        let stored = self.engine.insert(spec, encoded).await?;
        decode_one(stored)
    }

    /// Persist the current state of an already-inserted `record`, returning
    /// it with a refreshed `updated_at`.
    ///
    /// The write is narrowed by this view's scope as well as the record id,
    /// so a row the view cannot see cannot be updated through it.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnpersistedUpdate`] when the record has no id (no
    /// storage call is made), [`StoreError::RecordNotFound`] when the
    /// scoped write matched nothing.
    pub async fn update(&self, record: &T) -> Result<T> {
        self.persist(record.to_row()).await
    }

    /// Delete the row for `record`, for real.
    ///
    /// Narrowed by scope and id like [`update`]. On a tenant-scoped view a
    /// record naming another tenant is refused before the statement is even
    /// issued; deletion is not a path to probe for foreign rows. On
    /// soft-deleting tables prefer [`soft_delete`] unless the row must
    /// actually go away.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnpersistedUpdate`] when the record has no id,
    /// [`StoreError::TenantMismatch`] when it names another tenant,
    /// [`StoreError::RecordNotFound`] when the scoped delete matched
    /// nothing.
    ///
    /// [`update`]: View::update
    /// [`soft_delete`]: View::soft_delete
    pub async fn destroy(&self, record: &T) -> Result<()> {
        let spec = T::spec();
        let mut row = record.to_row();
        let Some(id) = row.get(ID_IDX).filter(|v| !v.is_null()).cloned() else {
            return Err(StoreError::UnpersistedUpdate {
                table: spec.name(),
                row,
            });
        };
        self.stamp_tenant(&mut row, TenantFill::RejectForeign)?;

        let filter = self.scope_filter()?.and(Filter::eq(ID, id));
        debug!(table = spec.name(), scope = %self.scope, "Deleting row");
        let removed = self.engine.delete(spec, &filter).await?;
        if removed == 0 {
            return Err(StoreError::RecordNotFound { table: spec.name() });
        }
        Ok(())
    }

    /// Mark the row for `record` as soft-deleted and return the marked
    /// record.
    ///
    /// Goes through the same scoped write path as [`update`], so the row
    /// must be visible to this view; afterwards it no longer is, on
    /// live-scoped views. An already-marked record keeps its original
    /// deletion time.
    ///
    /// # Errors
    ///
    /// Same surface as [`update`].
    ///
    /// [`update`]: View::update
    pub async fn soft_delete(&self, record: &T) -> Result<T>
    where
        T: SoftDeletable,
    {
        let mut row = record.to_row();
        let idx = marker_index::<T>(&row)?;
        if let Some(slot) = row.values.get_mut(idx).filter(|slot| slot.is_null()) {
            *slot = Value::Timestamp(Utc::now());
        }
        self.persist(row).await
    }

    /// Clear the soft-delete marker on `record` and return the restored
    /// record.
    ///
    /// The row must be visible to this view, so restoration happens through
    /// a view that admits soft-deleted rows, not through the default one.
    ///
    /// # Errors
    ///
    /// Same surface as [`update`].
    ///
    /// [`update`]: View::update
    pub async fn restore(&self, record: &T) -> Result<T>
    where
        T: SoftDeletable,
    {
        let mut row = record.to_row();
        let idx = marker_index::<T>(&row)?;
        if let Some(slot) = row.values.get_mut(idx) {
            *slot = Value::Null;
        }
        self.persist(row).await
    }

    async fn fetch(&self, extra: Filter) -> Result<Vec<T>> {
        let spec = T::spec();
        let filter = self.scope_filter()?.and(extra);
        trace!(table = spec.name(), filter = %filter, "Selecting rows");
        let rows = self.engine.select(spec, &filter).await?;
        rows.into_iter().map(decode_one).collect()
    }

    async fn persist(&self, mut row: Row) -> Result<T> {
        let spec = T::spec();
        if !row.get(ID_IDX).is_some_and(|id| !id.is_null()) {
            return Err(StoreError::UnpersistedUpdate {
                table: spec.name(),
                row,
            });
        }

        self.stamp_tenant(&mut row, TenantFill::RequireMatch)?;
        if let Some(slot) = row.values.get_mut(UPDATED_AT_IDX) {
            *slot = Value::Timestamp(Utc::now());
        }

        let encoded = mapping::encode(spec, row)?;
        let id = encoded.get(ID_IDX).cloned().unwrap_or(Value::Null);
        let filter = self.scope_filter()?.and(Filter::eq(ID, id));
        debug!(table = spec.name(), scope = %self.scope, "Updating row");
        let matched = self.engine.update(spec, &filter, encoded.clone()).await?;
        if matched == 0 {
            return Err(StoreError::RecordNotFound { table: spec.name() });
        }
        decode_one(encoded)
    }

    /// On tenant-scoped views, reconcile the row's tenant column with the
    /// current binding. Cross-tenant views store whatever the row says.
    fn stamp_tenant(&self, row: &mut Row, fill: TenantFill) -> Result<()> {
        let Some(idx) = T::spec().tenant_index() else {
            return Ok(());
        };
        if self.scope.tenant() != TenantVisibility::CurrentTenant {
            return Ok(());
        }

        let current = rowscope_tenancy::current_tenant_id()?;
        match row.values.get_mut(idx) {
            Some(slot) if slot.is_null() => match fill {
                TenantFill::FillWhenUnset => {
                    *slot = Value::Uuid(current);
                    Ok(())
                }
                TenantFill::RequireMatch => Err(StoreError::TenantMismatch {
                    current,
                    record: None,
                }),
                // A record that never named a tenant is not a mismatch; the
                // scoped filter decides whether a row is reachable.
                TenantFill::RejectForeign => Ok(()),
            },
            Some(Value::Uuid(tenant)) => {
                if *tenant == current {
                    Ok(())
                } else {
                    Err(StoreError::TenantMismatch {
                        current,
                        record: Some(*tenant),
                    })
                }
            }
            // Wrong value kinds and short rows are reported by the encode
            // pass with full context.
            _ => Ok(()),
        }
    }
}

/// How [`View::stamp_tenant`] treats the row's tenant slot: inserts fill an
/// unset tenant, updates insist on one, destroys only refuse a foreign one.
#[derive(Debug, Clone, Copy)]
enum TenantFill {
    FillWhenUnset,
    RequireMatch,
    RejectForeign,
}

impl<T: Record> Clone for View<T> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            scope: self.scope,
            _record: PhantomData,
        }
    }
}

impl<T: Record> fmt::Debug for View<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("table", &T::spec().name())
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

fn decode_one<T: Record>(row: Row) -> Result<T> {
    let decoded = mapping::decode(T::spec(), row)?;
    T::from_row(&decoded).map_err(|source| StoreError::RowMapping {
        row: decoded,
        source,
    })
}

// A `SoftDeletable` type whose spec omits the marker column is a mismatched
// trait implementation; surface it as a shape error instead of panicking.
fn marker_index<T: SoftDeletable>(row: &Row) -> Result<usize> {
    T::spec()
        .soft_delete_index()
        .ok_or_else(|| StoreError::RowMapping {
            row: row.clone(),
            source: MappingError::MissingColumn {
                column: SOFT_DELETED_AT,
            },
        })
}
