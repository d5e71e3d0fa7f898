//! The error surface of the scoping layer.
//!
//! One tagged enum, matched exhaustively by callers. Module-local failures
//! ([`MappingError`], [`CodecError`], [`EngineError`], tenancy's
//! [`NoTenantSet`]) fold into [`StoreError`] at the operation boundary.

use uuid::Uuid;

use rowscope_tenancy::NoTenantSet;

use crate::column::CodecError;
use crate::engine::EngineError;
use crate::mapping::MappingError;
use crate::value::{ColumnType, Row, Value, ValueKind};

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Everything a table or view operation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A tenant-scoped operation ran with no current tenant bound.
    #[error(transparent)]
    NoTenantSet(#[from] NoTenantSet),

    /// Update or destroy was attempted on a record that was never inserted.
    /// No storage call is made.
    #[error("cannot mutate an unpersisted `{table}` record: no id assigned")]
    UnpersistedUpdate { table: &'static str, row: Row },

    /// A field value cannot be represented by its column's storage type.
    #[error("{value_kind} value {value} cannot be stored in column `{column}` of type {db_type}")]
    FieldToDbMapping {
        column: &'static str,
        value: Value,
        db_type: ColumnType,
        value_kind: ValueKind,
    },

    /// A row could not be converted to or from the record shape.
    #[error("row does not fit the record shape")]
    RowMapping {
        row: Row,
        #[source]
        source: MappingError,
    },

    /// A caller-supplied column codec refused a value.
    #[error("codec failed for column `{column}`")]
    Codec {
        column: &'static str,
        #[source]
        source: CodecError,
    },

    /// The record targeted by a tenant-scoped mutation belongs to a
    /// different tenant than the current one.
    #[error("record tenant does not match current tenant {current}")]
    TenantMismatch {
        current: Uuid,
        record: Option<Uuid>,
    },

    /// A mutation matched no stored row: unknown id, another tenant's row,
    /// or a row outside the view's visibility.
    #[error("`{table}` row to mutate was not found")]
    RecordNotFound { table: &'static str },

    /// The storage engine itself failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
