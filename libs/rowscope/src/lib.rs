#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Scoped access to row storage.
//!
//! This crate sits between application record types and a row-oriented
//! storage engine and applies three concerns on every operation:
//!
//! - **soft-delete filtering** — rows are marked deleted, not removed, and
//!   the default read path only sees live ones;
//! - **tenant isolation** — rows carry an owning tenant and the default
//!   read path only sees the current tenant's, as established by
//!   [`rowscope_tenancy`];
//! - **lifecycle guarding** — mutations are validated (no update before
//!   insert, no cross-tenant writes, engine-assigned identity and
//!   timestamps) and failures surface as one typed [`StoreError`].
//!
//! A [`Table`] is the base handle for a [`Record`] type. Named view
//! constructors ([`Table::soft_deleted`], [`Table::all_tenants`], and
//! friends) widen visibility one axis at a time, and [`Table::unscoped`]
//! strips scoping for maintenance work. Every view shares the table's single
//! [`TableSpec`]; predicates are rebuilt from the current tenant binding on
//! every call.
//!
//! ```rust
//! use std::sync::{Arc, LazyLock};
//!
//! use rowscope::{
//!     ColumnType, MappingError, MemoryEngine, Record, Row, SoftDeletable, Table, TableSpec,
//!     TenantOwned, mapping,
//! };
//! use uuid::Uuid;
//!
//! #[derive(Debug, Clone)]
//! struct Project {
//!     id: Option<Uuid>,
//!     created_at: Option<chrono::DateTime<chrono::Utc>>,
//!     updated_at: Option<chrono::DateTime<chrono::Utc>>,
//!     soft_deleted_at: Option<chrono::DateTime<chrono::Utc>>,
//!     tenant_id: Option<Uuid>,
//!     title: String,
//! }
//!
//! static SPEC: LazyLock<TableSpec> = LazyLock::new(|| {
//!     TableSpec::builder("projects")
//!         .id(ColumnType::Uuid)
//!         .soft_delete()
//!         .tenant()
//!         .column("title", ColumnType::Text)
//!         .build()
//! });
//!
//! impl Record for Project {
//!     fn spec() -> &'static TableSpec {
//!         &SPEC
//!     }
//!
//!     fn to_row(&self) -> Row {
//!         Row::new(vec![
//!             self.id.into(),
//!             self.created_at.into(),
//!             self.updated_at.into(),
//!             self.soft_deleted_at.into(),
//!             self.tenant_id.into(),
//!             self.title.clone().into(),
//!         ])
//!     }
//!
//!     fn from_row(row: &Row) -> Result<Self, MappingError> {
//!         let spec = Self::spec();
//!         Ok(Self {
//!             id: mapping::uuid_field(spec, row, "id")?,
//!             created_at: mapping::timestamp_field(spec, row, "created_at")?,
//!             updated_at: mapping::timestamp_field(spec, row, "updated_at")?,
//!             soft_deleted_at: mapping::timestamp_field(spec, row, "soft_deleted_at")?,
//!             tenant_id: mapping::uuid_field(spec, row, "tenant_id")?,
//!             title: mapping::text_field(spec, row, "title")?.unwrap_or_default(),
//!         })
//!     }
//! }
//!
//! impl SoftDeletable for Project {
//!     fn soft_deleted_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
//!         self.soft_deleted_at
//!     }
//!
//!     fn set_soft_deleted_at(&mut self, at: Option<chrono::DateTime<chrono::Utc>>) {
//!         self.soft_deleted_at = at;
//!     }
//! }
//!
//! impl TenantOwned for Project {
//!     fn tenant_id(&self) -> Option<Uuid> {
//!         self.tenant_id
//!     }
//! }
//!
//! # async fn demo() -> anyhow::Result<()> {
//! use rowscope::tenancy::TenantFutureExt;
//!
//! let engine = Arc::new(MemoryEngine::new());
//! let projects = Table::<Project>::new(engine);
//! projects.ensure_created().await?;
//!
//! let tenant = Uuid::new_v4();
//! async {
//!     let draft = Project {
//!         id: None,
//!         created_at: None,
//!         updated_at: None,
//!         soft_deleted_at: None,
//!         tenant_id: None,
//!         title: "atlas".into(),
//!     };
//!     let stored = projects.insert(&draft).await?;
//!     assert_eq!(projects.count().await?, 1);
//!
//!     // Soft deletion hides the row from the default view only.
//!     let gone = projects.soft_delete(&stored).await?;
//!     assert!(projects.find(gone.id).await?.is_none());
//!     assert_eq!(projects.soft_deleted().count().await?, 1);
//!     rowscope::Result::Ok(())
//! }
//! .in_tenant_scope(tenant)
//! .await?;
//! # Ok(()) }
//! # fn main() {
//! #     tokio::runtime::Builder::new_current_thread()
//! #         .enable_all()
//! #         .build()
//! #         .unwrap()
//! #         .block_on(demo())
//! #         .unwrap();
//! # }
//! ```

pub mod column;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod mapping;
pub mod record;
pub mod scope;
pub mod table;
pub mod value;
pub mod view;

/// Tenant context propagation, re-exported for one-stop imports.
pub use rowscope_tenancy as tenancy;

#[cfg(feature = "memory")]
pub use engine::MemoryEngine;

pub use column::{
    CREATED_AT, CodecError, ColumnCodec, ColumnDef, ID, SOFT_DELETED_AT, TENANT_ID, TableSpec,
    TableSpecBuilder, UPDATED_AT,
};
pub use config::{ConfigError, StoreConfig};
pub use engine::{EngineError, StorageEngine};
pub use error::{Result, StoreError};
pub use filter::Filter;
pub use mapping::MappingError;
pub use record::{Record, SoftDeletable, TenantOwned, as_tenant};
pub use scope::{Scope, SoftDeleteVisibility, TenantVisibility};
pub use table::Table;
pub use value::{ColumnType, Row, Value, ValueKind};
pub use view::View;
