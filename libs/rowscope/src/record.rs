//! The contract between application record types and stored rows.
//!
//! A record type declares its [`TableSpec`] once and converts itself to and
//! from positional [`Row`]s. The capability traits add the accessors the
//! scoping layer reads; everything else (identity assignment, timestamps,
//! tenant stamping) is handled on top of these functions.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use rowscope_tenancy::{NoTenantSet, TenantFutureExt, TenantScoped};

use crate::column::{ID_IDX, TableSpec};
use crate::mapping::MappingError;
use crate::value::Row;

/// A struct stored in one table, one instance per row.
///
/// Layer-managed fields (`id`, `created_at`, `updated_at`, and the capability
/// columns the table declares) must round-trip through [`to_row`] and
/// [`from_row`] like any other field; a record that has not been persisted
/// yet encodes them as [`Value::Null`].
///
/// [`to_row`]: Record::to_row
/// [`from_row`]: Record::from_row
/// [`Value::Null`]: crate::value::Value::Null
pub trait Record: Sized + Send + Sync + 'static {
    /// The table this record type lives in. Implementations typically back
    /// this with a `std::sync::LazyLock<TableSpec>`.
    fn spec() -> &'static TableSpec;

    /// Dump this record as a row, positional over [`spec`]'s columns.
    ///
    /// [`spec`]: Record::spec
    fn to_row(&self) -> Row;

    /// Rebuild a record from a row produced by [`to_row`] or read back from
    /// storage. Takes a borrow so callers can report the offending row when
    /// conversion fails.
    ///
    /// # Errors
    ///
    /// Returns a [`MappingError`] when the row's shape or value types do not
    /// match what this record type expects.
    ///
    /// [`to_row`]: Record::to_row
    fn from_row(row: &Row) -> Result<Self, MappingError>;

    /// Whether this record has been written to storage. A persisted record
    /// carries a non-null id; one that was never inserted does not.
    #[must_use]
    fn is_persisted(&self) -> bool {
        self.to_row().get(ID_IDX).is_some_and(|id| !id.is_null())
    }
}

/// Contract for record types whose table declares the soft-delete column.
///
/// The accessors must read and write the same field [`Record::to_row`] puts
/// in the marker position. Implementing this trait also unlocks the view
/// constructors that widen visibility along the soft-delete axis; a table
/// that destroys rows for real has nothing to widen into.
pub trait SoftDeletable: Record {
    /// When this record was soft-deleted, if it currently is.
    fn soft_deleted_at(&self) -> Option<DateTime<Utc>>;

    /// Overwrite the marker. [`mark_as_soft_deleted`] and [`mark_as_live`]
    /// are the usual entry points.
    ///
    /// [`mark_as_soft_deleted`]: SoftDeletable::mark_as_soft_deleted
    /// [`mark_as_live`]: SoftDeletable::mark_as_live
    fn set_soft_deleted_at(&mut self, at: Option<DateTime<Utc>>);

    /// Whether this record currently carries the soft-delete marker.
    #[must_use]
    fn is_soft_deleted(&self) -> bool {
        self.soft_deleted_at().is_some()
    }

    /// Stamp the marker with the current time. A record that is already
    /// marked keeps its original deletion time, so repeating the call
    /// changes nothing.
    fn mark_as_soft_deleted(&mut self) {
        if self.soft_deleted_at().is_none() {
            self.set_soft_deleted_at(Some(Utc::now()));
        }
    }

    /// Clear the marker. Idempotent like its counterpart.
    fn mark_as_live(&mut self) {
        self.set_soft_deleted_at(None);
    }
}

/// Contract for record types whose table declares the tenant column.
///
/// The accessor must agree with the tenant position of [`Record::to_row`].
/// Implementing this trait also unlocks the cross-tenant view constructors;
/// tables without a tenant column are never tenant-filtered and need no
/// escape from it.
pub trait TenantOwned: Record {
    /// The tenant that owns this record. `None` until the record is stamped
    /// on insert through a tenant-scoped view, or set by the caller.
    fn tenant_id(&self) -> Option<Uuid>;
}

/// Run `action` bound to the tenant that owns `record`.
///
/// The owning tenant becomes the current binding on every poll of the
/// returned future, and the previous binding is restored after each poll;
/// whether `action` completes, fails, or panics, the caller's context comes
/// back intact and failures propagate unchanged.
///
/// # Errors
///
/// Returns [`NoTenantSet`] when the record's tenant column is unset.
pub fn as_tenant<T, F>(record: &T, action: F) -> Result<TenantScoped<F>, NoTenantSet>
where
    T: TenantOwned,
    F: Future,
{
    let tenant = record.tenant_id().ok_or(NoTenantSet)?;
    Ok(action.in_tenant_scope(tenant))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crate::mapping;
    use crate::value::ColumnType;

    #[derive(Debug, Clone, PartialEq)]
    struct Ticket {
        id: Option<i64>,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
        soft_deleted_at: Option<DateTime<Utc>>,
        tenant_id: Option<Uuid>,
        subject: String,
    }

    static TICKET_SPEC: LazyLock<TableSpec> = LazyLock::new(|| {
        TableSpec::builder("tickets")
            .soft_delete()
            .tenant()
            .column("subject", ColumnType::Text)
            .build()
    });

    impl Record for Ticket {
        fn spec() -> &'static TableSpec {
            &TICKET_SPEC
        }

        fn to_row(&self) -> Row {
            Row::new(vec![
                self.id.into(),
                self.created_at.into(),
                self.updated_at.into(),
                self.soft_deleted_at.into(),
                self.tenant_id.into(),
                self.subject.clone().into(),
            ])
        }

        fn from_row(row: &Row) -> Result<Self, MappingError> {
            let spec = Self::spec();
            Ok(Self {
                id: mapping::integer_field(spec, row, "id")?,
                created_at: mapping::timestamp_field(spec, row, "created_at")?,
                updated_at: mapping::timestamp_field(spec, row, "updated_at")?,
                soft_deleted_at: mapping::timestamp_field(spec, row, "soft_deleted_at")?,
                tenant_id: mapping::uuid_field(spec, row, "tenant_id")?,
                subject: mapping::text_field(spec, row, "subject")?.unwrap_or_default(),
            })
        }
    }

    impl SoftDeletable for Ticket {
        fn soft_deleted_at(&self) -> Option<DateTime<Utc>> {
            self.soft_deleted_at
        }

        fn set_soft_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
            self.soft_deleted_at = at;
        }
    }

    impl TenantOwned for Ticket {
        fn tenant_id(&self) -> Option<Uuid> {
            self.tenant_id
        }
    }

    fn ticket() -> Ticket {
        Ticket {
            id: None,
            created_at: None,
            updated_at: None,
            soft_deleted_at: None,
            tenant_id: None,
            subject: "hinge squeaks".to_owned(),
        }
    }

    #[test]
    fn persistence_follows_the_id() {
        let mut record = ticket();
        assert!(!record.is_persisted());
        record.id = Some(12);
        assert!(record.is_persisted());
        record.id = None;
        assert!(!record.is_persisted());
    }

    #[test]
    fn marking_is_idempotent() {
        let mut record = ticket();
        assert!(!record.is_soft_deleted());

        record.mark_as_soft_deleted();
        assert!(record.is_soft_deleted());
        let stamped = record.soft_deleted_at;
        assert!(stamped.is_some());

        record.mark_as_soft_deleted();
        assert_eq!(record.soft_deleted_at, stamped);

        record.mark_as_live();
        assert!(!record.is_soft_deleted());
        record.mark_as_live();
        assert_eq!(record.soft_deleted_at, None);
    }

    #[test]
    fn as_tenant_needs_a_stamped_record() {
        assert_eq!(as_tenant(&ticket(), async {}).err(), Some(NoTenantSet));
    }

    #[tokio::test]
    async fn as_tenant_binds_the_records_owner() {
        let mut record = ticket();
        record.tenant_id = Some(Uuid::from_u128(77));

        let seen = as_tenant(&record, async { rowscope_tenancy::try_current_tenant_id() })
            .expect("tenant is stamped")
            .await;
        assert_eq!(seen, Some(Uuid::from_u128(77)));
        assert_eq!(rowscope_tenancy::try_current_tenant_id(), None);
    }
}
