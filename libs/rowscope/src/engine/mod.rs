//! The seam between the scoping layer and row storage.
//!
//! Engines are deliberately unaware of tenants and soft deletion. They see
//! a table shape, positional rows, and whatever [`Filter`] the layer built;
//! every scoping decision has already happened by the time a call lands
//! here.

use async_trait::async_trait;

use crate::column::TableSpec;
use crate::filter::Filter;
use crate::value::Row;

#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "memory")]
pub use memory::MemoryEngine;

/// Failure inside a storage engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The addressed table was never created on this engine.
    #[error("table `{0}` does not exist")]
    NoSuchTable(String),

    /// The engine cannot provide something the table shape requires.
    #[error("{0}")]
    Unsupported(&'static str),

    /// An engine-specific failure, flattened to text.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Row-oriented storage.
///
/// The one behavioral obligation beyond plain CRUD is identity assignment:
/// [`insert`] must fill the id column according to the spec's declared id
/// type and return the row as stored.
///
/// [`insert`]: StorageEngine::insert
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Create the table described by `spec` if it does not exist yet.
    async fn ensure_table(&self, spec: &TableSpec) -> Result<(), EngineError>;

    /// Rows matching `filter`, in insertion order.
    async fn select(&self, spec: &TableSpec, filter: &Filter) -> Result<Vec<Row>, EngineError>;

    /// Store a new row, assigning its id, and return it as stored. The id
    /// position of the incoming row is ignored.
    async fn insert(&self, spec: &TableSpec, row: Row) -> Result<Row, EngineError>;

    /// Overwrite every column except the id on rows matching `filter`.
    /// Returns the number of rows that matched.
    async fn update(
        &self,
        spec: &TableSpec,
        filter: &Filter,
        row: Row,
    ) -> Result<u64, EngineError>;

    /// Remove rows matching `filter`. Returns the number removed.
    async fn delete(&self, spec: &TableSpec, filter: &Filter) -> Result<u64, EngineError>;
}
