//! Column declarations and table specifications.
//!
//! A [`TableSpec`] is the single description of a logical table: physical
//! name, ordered columns, and which of the two capability columns
//! (soft-delete marker, tenant marker) the table carries. Base tables and
//! every view derived from them share one spec by reference — column and
//! codec definitions are never duplicated.

use crate::value::{ColumnType, Value};

/// Physical name of the identity column. Present on every table.
pub const ID: &str = "id";
/// Physical name of the creation timestamp column. Present on every table.
pub const CREATED_AT: &str = "created_at";
/// Physical name of the update timestamp column. Present on every table.
pub const UPDATED_AT: &str = "updated_at";
/// Physical name of the soft-delete marker column, when declared.
pub const SOFT_DELETED_AT: &str = "soft_deleted_at";
/// Physical name of the tenant column, when declared.
pub const TENANT_ID: &str = "tenant_id";

const RESERVED: [&str; 5] = [ID, CREATED_AT, UPDATED_AT, SOFT_DELETED_AT, TENANT_ID];

/// Fixed positions of the three always-present columns.
pub(crate) const ID_IDX: usize = 0;
pub(crate) const CREATED_AT_IDX: usize = 1;
pub(crate) const UPDATED_AT_IDX: usize = 2;

/// Failure inside a caller-supplied column codec.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct CodecError(String);

impl CodecError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Paired serialize/deserialize functions for a column whose domain
/// representation differs from its storage representation (arrays, JSON,
/// timestamps with offsets, ...).
///
/// The scoping layer never interprets such values itself; it runs `encode`
/// on the way to storage and `decode` on the way back, and surfaces codec
/// failures as mapping errors.
#[derive(Debug, Clone, Copy)]
pub struct ColumnCodec {
    pub encode: fn(&Value) -> Result<Value, CodecError>,
    pub decode: fn(&Value) -> Result<Value, CodecError>,
}

/// A single column declaration.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    pub codec: Option<ColumnCodec>,
}

/// Named, ordered description of a logical table.
///
/// Column order is fixed: `id`, `created_at`, `updated_at`, then
/// `soft_deleted_at` and `tenant_id` when declared, then user columns in
/// declaration order. Rows exchanged with the storage engine are positional
/// against this order.
#[derive(Debug, Clone)]
pub struct TableSpec {
    name: &'static str,
    columns: Vec<ColumnDef>,
    id_type: ColumnType,
    soft_delete_idx: Option<usize>,
    tenant_idx: Option<usize>,
}

impl TableSpec {
    /// Start building a spec for the table with the given physical name.
    #[must_use]
    pub fn builder(name: &'static str) -> TableSpecBuilder {
        TableSpecBuilder {
            name,
            id_type: ColumnType::Integer,
            soft_delete: false,
            tenant: false,
            user_columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Declared type of the identity column.
    #[must_use]
    pub fn id_type(&self) -> ColumnType {
        self.id_type
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of `name` in the column order, if declared.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// The soft-delete marker column, if this table soft-deletes.
    #[must_use]
    pub fn soft_delete_col(&self) -> Option<&ColumnDef> {
        self.soft_delete_idx.and_then(|i| self.columns.get(i))
    }

    /// Position of the soft-delete marker column, if declared.
    #[must_use]
    pub fn soft_delete_index(&self) -> Option<usize> {
        self.soft_delete_idx
    }

    /// The tenant column, if this table is tenant-owned.
    #[must_use]
    pub fn tenant_col(&self) -> Option<&ColumnDef> {
        self.tenant_idx.and_then(|i| self.columns.get(i))
    }

    /// Position of the tenant column, if declared.
    #[must_use]
    pub fn tenant_index(&self) -> Option<usize> {
        self.tenant_idx
    }
}

/// Builder for [`TableSpec`]. Capability columns are declared by flag, never
/// by name, so their physical names and types cannot be misdeclared.
#[derive(Debug)]
pub struct TableSpecBuilder {
    name: &'static str,
    id_type: ColumnType,
    soft_delete: bool,
    tenant: bool,
    user_columns: Vec<ColumnDef>,
}

impl TableSpecBuilder {
    /// Declare the identity column type. Defaults to [`ColumnType::Integer`].
    #[must_use]
    pub fn id(mut self, ty: ColumnType) -> Self {
        self.id_type = ty;
        self
    }

    /// Declare the `soft_deleted_at` marker column.
    #[must_use]
    pub fn soft_delete(mut self) -> Self {
        self.soft_delete = true;
        self
    }

    /// Declare the `tenant_id` column.
    #[must_use]
    pub fn tenant(mut self) -> Self {
        self.tenant = true;
        self
    }

    /// Declare a non-nullable user column.
    #[must_use]
    pub fn column(self, name: &'static str, ty: ColumnType) -> Self {
        self.push(ColumnDef {
            name,
            ty,
            nullable: false,
            codec: None,
        })
    }

    /// Declare a nullable user column.
    #[must_use]
    pub fn nullable_column(self, name: &'static str, ty: ColumnType) -> Self {
        self.push(ColumnDef {
            name,
            ty,
            nullable: true,
            codec: None,
        })
    }

    /// Declare a non-nullable user column with a caller-supplied codec.
    #[must_use]
    pub fn column_with_codec(self, name: &'static str, ty: ColumnType, codec: ColumnCodec) -> Self {
        self.push(ColumnDef {
            name,
            ty,
            nullable: false,
            codec: Some(codec),
        })
    }

    fn push(mut self, column: ColumnDef) -> Self {
        self.user_columns.push(column);
        self
    }

    /// Assemble the spec.
    ///
    /// # Panics
    ///
    /// Panics on a malformed declaration: an identity type that is not
    /// comparable/orderable (`Integer`, `Uuid` or `Text`), a user column
    /// reusing a reserved capability name, or a duplicate user column name.
    /// Specs describe static schema; these are programming errors, not
    /// runtime conditions.
    #[must_use]
    pub fn build(self) -> TableSpec {
        let TableSpecBuilder {
            name,
            id_type,
            soft_delete,
            tenant,
            user_columns,
        } = self;

        assert!(
            matches!(
                id_type,
                ColumnType::Integer | ColumnType::Uuid | ColumnType::Text
            ),
            "table {name}: id column must be integer, uuid or text, got {id_type}",
        );

        let mut columns = vec![
            ColumnDef {
                name: ID,
                ty: id_type,
                nullable: false,
                codec: None,
            },
            ColumnDef {
                name: CREATED_AT,
                ty: ColumnType::Timestamp,
                nullable: false,
                codec: None,
            },
            ColumnDef {
                name: UPDATED_AT,
                ty: ColumnType::Timestamp,
                nullable: false,
                codec: None,
            },
        ];
        let soft_delete_idx = soft_delete.then(|| {
            columns.push(ColumnDef {
                name: SOFT_DELETED_AT,
                ty: ColumnType::Timestamp,
                nullable: true,
                codec: None,
            });
            columns.len() - 1
        });
        let tenant_idx = tenant.then(|| {
            columns.push(ColumnDef {
                name: TENANT_ID,
                ty: ColumnType::Uuid,
                nullable: true,
                codec: None,
            });
            columns.len() - 1
        });

        for column in user_columns {
            assert!(
                !RESERVED.contains(&column.name),
                "table {name}: column name {} is reserved",
                column.name,
            );
            assert!(
                columns.iter().all(|c| c.name != column.name),
                "table {name}: duplicate column {}",
                column.name,
            );
            columns.push(column);
        }

        TableSpec {
            name,
            columns,
            id_type,
            soft_delete_idx,
            tenant_idx,
        }
    }
}
