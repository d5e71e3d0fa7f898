//! Conversion passes between record-shaped rows and storage-shaped rows.
//!
//! [`encode`] runs on the way in (codecs forward, then type admission),
//! [`decode`] on the way out (codecs backward). Neither pass interprets user
//! values beyond the declared column types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::column::{CodecError, TableSpec};
use crate::error::StoreError;
use crate::value::{ColumnType, Row, Value, ValueKind};

/// Why a row and a record shape do not line up.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// The row's length does not match the table's declared column count.
    #[error("row carries {actual} values, table `{table}` declares {expected} columns")]
    Arity {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A column the record requires is not present in the row.
    #[error("column `{column}` is missing from the row")]
    MissingColumn { column: &'static str },

    /// A column held a value of the wrong kind.
    #[error("column `{column}` holds a {actual} value, expected {expected}")]
    TypeMismatch {
        column: &'static str,
        expected: ColumnType,
        actual: ValueKind,
    },

    /// A caller-supplied codec refused the value.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Fetch `column` from `row`, positionally against `spec`.
///
/// Convenience for [`Record::from_row`] implementations.
///
/// # Errors
///
/// Returns [`MappingError::MissingColumn`] when the column is not declared
/// or the row is too short to hold it.
///
/// [`Record::from_row`]: crate::record::Record::from_row
pub fn field<'a>(
    spec: &TableSpec,
    row: &'a Row,
    column: &'static str,
) -> Result<&'a Value, MappingError> {
    spec.column_index(column)
        .and_then(|i| row.get(i))
        .ok_or(MappingError::MissingColumn { column })
}

/// Typed fetch of a boolean column; `None` when the stored value is NULL.
///
/// # Errors
///
/// [`MappingError::MissingColumn`] or [`MappingError::TypeMismatch`].
pub fn boolean_field(
    spec: &TableSpec,
    row: &Row,
    column: &'static str,
) -> Result<Option<bool>, MappingError> {
    match field(spec, row, column)? {
        Value::Boolean(v) => Ok(Some(*v)),
        Value::Null => Ok(None),
        other => Err(mismatch(column, ColumnType::Boolean, other)),
    }
}

/// Typed fetch of an integer column; `None` when the stored value is NULL.
///
/// # Errors
///
/// [`MappingError::MissingColumn`] or [`MappingError::TypeMismatch`].
pub fn integer_field(
    spec: &TableSpec,
    row: &Row,
    column: &'static str,
) -> Result<Option<i64>, MappingError> {
    match field(spec, row, column)? {
        Value::Integer(v) => Ok(Some(*v)),
        Value::Null => Ok(None),
        other => Err(mismatch(column, ColumnType::Integer, other)),
    }
}

/// Typed fetch of a float column; `None` when the stored value is NULL.
///
/// # Errors
///
/// [`MappingError::MissingColumn`] or [`MappingError::TypeMismatch`].
pub fn float_field(
    spec: &TableSpec,
    row: &Row,
    column: &'static str,
) -> Result<Option<f64>, MappingError> {
    match field(spec, row, column)? {
        Value::Float(v) => Ok(Some(*v)),
        Value::Null => Ok(None),
        other => Err(mismatch(column, ColumnType::Float, other)),
    }
}

/// Typed fetch of a text column; `None` when the stored value is NULL.
///
/// # Errors
///
/// [`MappingError::MissingColumn`] or [`MappingError::TypeMismatch`].
pub fn text_field(
    spec: &TableSpec,
    row: &Row,
    column: &'static str,
) -> Result<Option<String>, MappingError> {
    match field(spec, row, column)? {
        Value::Text(v) => Ok(Some(v.clone())),
        Value::Null => Ok(None),
        other => Err(mismatch(column, ColumnType::Text, other)),
    }
}

/// Typed fetch of a uuid column; `None` when the stored value is NULL.
///
/// # Errors
///
/// [`MappingError::MissingColumn`] or [`MappingError::TypeMismatch`].
pub fn uuid_field(
    spec: &TableSpec,
    row: &Row,
    column: &'static str,
) -> Result<Option<Uuid>, MappingError> {
    match field(spec, row, column)? {
        Value::Uuid(v) => Ok(Some(*v)),
        Value::Null => Ok(None),
        other => Err(mismatch(column, ColumnType::Uuid, other)),
    }
}

/// Typed fetch of a timestamp column; `None` when the stored value is NULL.
///
/// # Errors
///
/// [`MappingError::MissingColumn`] or [`MappingError::TypeMismatch`].
pub fn timestamp_field(
    spec: &TableSpec,
    row: &Row,
    column: &'static str,
) -> Result<Option<DateTime<Utc>>, MappingError> {
    match field(spec, row, column)? {
        Value::Timestamp(v) => Ok(Some(*v)),
        Value::Null => Ok(None),
        other => Err(mismatch(column, ColumnType::Timestamp, other)),
    }
}

/// Typed fetch of a JSON column; `None` when the stored value is NULL.
///
/// # Errors
///
/// [`MappingError::MissingColumn`] or [`MappingError::TypeMismatch`].
pub fn json_field(
    spec: &TableSpec,
    row: &Row,
    column: &'static str,
) -> Result<Option<serde_json::Value>, MappingError> {
    match field(spec, row, column)? {
        Value::Json(v) => Ok(Some(v.clone())),
        Value::Null => Ok(None),
        other => Err(mismatch(column, ColumnType::Json, other)),
    }
}

fn mismatch(column: &'static str, expected: ColumnType, actual: &Value) -> MappingError {
    MappingError::TypeMismatch {
        column,
        expected,
        actual: actual.kind(),
    }
}

fn check_arity(spec: &TableSpec, row: &Row) -> Result<(), MappingError> {
    let expected = spec.columns().len();
    if row.len() == expected {
        Ok(())
    } else {
        Err(MappingError::Arity {
            table: spec.name(),
            expected,
            actual: row.len(),
        })
    }
}

/// Turn a record-produced row into its storage representation.
///
/// Codec columns are encoded first, then every non-null value is checked
/// against its column's declared type. Null is always admitted here; whether
/// a column may *store* null is the engine's concern.
pub(crate) fn encode(spec: &TableSpec, row: Row) -> Result<Row, StoreError> {
    if let Err(source) = check_arity(spec, &row) {
        return Err(StoreError::RowMapping { row, source });
    }

    let mut values = Vec::with_capacity(row.len());
    for (column, value) in spec.columns().iter().zip(row.values) {
        let value = match &column.codec {
            Some(codec) => (codec.encode)(&value).map_err(|source| StoreError::Codec {
                column: column.name,
                source,
            })?,
            None => value,
        };
        if !value.is_null() && !column.ty.admits(&value) {
            let value_kind = value.kind();
            return Err(StoreError::FieldToDbMapping {
                column: column.name,
                value,
                db_type: column.ty,
                value_kind,
            });
        }
        values.push(value);
    }
    Ok(Row::new(values))
}

/// Turn a storage row back into its record representation.
pub(crate) fn decode(spec: &TableSpec, row: Row) -> Result<Row, StoreError> {
    if let Err(source) = check_arity(spec, &row) {
        return Err(StoreError::RowMapping { row, source });
    }

    let mut values = Vec::with_capacity(row.len());
    for (column, value) in spec.columns().iter().zip(row.values) {
        let value = match &column.codec {
            Some(codec) => (codec.decode)(&value).map_err(|source| StoreError::Codec {
                column: column.name,
                source,
            })?,
            None => value,
        };
        values.push(value);
    }
    Ok(Row::new(values))
}
