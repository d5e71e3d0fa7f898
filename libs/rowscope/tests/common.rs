#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

//! Record types and engine wrappers shared by the integration tests.

use std::sync::LazyLock;
#[cfg(feature = "memory")]
use std::sync::Arc;
#[cfg(feature = "memory")]
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "memory")]
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg(feature = "memory")]
use rowscope::{EngineError, Filter, MemoryEngine, StorageEngine, Table};
use rowscope::{
    CodecError, ColumnCodec, ColumnType, MappingError, Record, Row, SoftDeletable, TableSpec,
    TenantOwned, Value, mapping,
};

pub fn tenant(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

/// A record with the full capability set: uuid identity, soft deletion,
/// tenant ownership, and a codec-backed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub soft_deleted_at: Option<DateTime<Utc>>,
    pub tenant_id: Option<Uuid>,
    pub title: String,
    pub labels: serde_json::Value,
}

fn labels_encode(value: &Value) -> Result<Value, CodecError> {
    match value {
        Value::Json(labels @ serde_json::Value::Array(_)) => Ok(Value::Text(labels.to_string())),
        Value::Json(_) => Err(CodecError::new("labels must be a json array")),
        Value::Null => Ok(Value::Null),
        other => Err(CodecError::new(format!(
            "labels must be json, got {}",
            other.kind()
        ))),
    }
}

fn labels_decode(value: &Value) -> Result<Value, CodecError> {
    match value {
        Value::Text(stored) => serde_json::from_str(stored)
            .map(Value::Json)
            .map_err(|e| CodecError::new(e.to_string())),
        Value::Null => Ok(Value::Null),
        other => Err(CodecError::new(format!(
            "stored labels must be text, got {}",
            other.kind()
        ))),
    }
}

static PROJECT_SPEC: LazyLock<TableSpec> = LazyLock::new(|| {
    TableSpec::builder("projects")
        .id(ColumnType::Uuid)
        .soft_delete()
        .tenant()
        .column("title", ColumnType::Text)
        .column_with_codec(
            "labels",
            ColumnType::Text,
            ColumnCodec {
                encode: labels_encode,
                decode: labels_decode,
            },
        )
        .build()
});

impl Record for Project {
    fn spec() -> &'static TableSpec {
        &PROJECT_SPEC
    }

    fn to_row(&self) -> Row {
        Row::new(vec![
            self.id.into(),
            self.created_at.into(),
            self.updated_at.into(),
            self.soft_deleted_at.into(),
            self.tenant_id.into(),
            self.title.clone().into(),
            self.labels.clone().into(),
        ])
    }

    fn from_row(row: &Row) -> Result<Self, MappingError> {
        let spec = Self::spec();
        Ok(Self {
            id: mapping::uuid_field(spec, row, "id")?,
            created_at: mapping::timestamp_field(spec, row, "created_at")?,
            updated_at: mapping::timestamp_field(spec, row, "updated_at")?,
            soft_deleted_at: mapping::timestamp_field(spec, row, "soft_deleted_at")?,
            tenant_id: mapping::uuid_field(spec, row, "tenant_id")?,
            title: mapping::text_field(spec, row, "title")?.unwrap_or_default(),
            labels: mapping::json_field(spec, row, "labels")?.unwrap_or_default(),
        })
    }
}

impl SoftDeletable for Project {
    fn soft_deleted_at(&self) -> Option<DateTime<Utc>> {
        self.soft_deleted_at
    }

    fn set_soft_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.soft_deleted_at = at;
    }
}

impl TenantOwned for Project {
    fn tenant_id(&self) -> Option<Uuid> {
        self.tenant_id
    }
}

pub fn draft_project(title: &str) -> Project {
    Project {
        id: None,
        created_at: None,
        updated_at: None,
        soft_deleted_at: None,
        tenant_id: None,
        title: title.to_owned(),
        labels: serde_json::json!([]),
    }
}

/// A record that soft-deletes but is not tenant-owned, with integer ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub soft_deleted_at: Option<DateTime<Utc>>,
    pub title: String,
}

static TASK_SPEC: LazyLock<TableSpec> = LazyLock::new(|| {
    TableSpec::builder("tasks")
        .id(ColumnType::Integer)
        .soft_delete()
        .column("title", ColumnType::Text)
        .build()
});

impl Record for Task {
    fn spec() -> &'static TableSpec {
        &TASK_SPEC
    }

    fn to_row(&self) -> Row {
        Row::new(vec![
            self.id.into(),
            self.created_at.into(),
            self.updated_at.into(),
            self.soft_deleted_at.into(),
            self.title.clone().into(),
        ])
    }

    fn from_row(row: &Row) -> Result<Self, MappingError> {
        let spec = Self::spec();
        Ok(Self {
            id: mapping::integer_field(spec, row, "id")?,
            created_at: mapping::timestamp_field(spec, row, "created_at")?,
            updated_at: mapping::timestamp_field(spec, row, "updated_at")?,
            soft_deleted_at: mapping::timestamp_field(spec, row, "soft_deleted_at")?,
            title: mapping::text_field(spec, row, "title")?.unwrap_or_default(),
        })
    }
}

impl SoftDeletable for Task {
    fn soft_deleted_at(&self) -> Option<DateTime<Utc>> {
        self.soft_deleted_at
    }

    fn set_soft_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.soft_deleted_at = at;
    }
}

pub fn draft_task(title: &str) -> Task {
    Task {
        id: None,
        created_at: None,
        updated_at: None,
        soft_deleted_at: None,
        title: title.to_owned(),
    }
}

/// A record with no capability columns at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub body: String,
}

static NOTE_SPEC: LazyLock<TableSpec> = LazyLock::new(|| {
    TableSpec::builder("notes")
        .column("body", ColumnType::Text)
        .build()
});

impl Record for Note {
    fn spec() -> &'static TableSpec {
        &NOTE_SPEC
    }

    fn to_row(&self) -> Row {
        Row::new(vec![
            self.id.into(),
            self.created_at.into(),
            self.updated_at.into(),
            self.body.clone().into(),
        ])
    }

    fn from_row(row: &Row) -> Result<Self, MappingError> {
        let spec = Self::spec();
        Ok(Self {
            id: mapping::integer_field(spec, row, "id")?,
            created_at: mapping::timestamp_field(spec, row, "created_at")?,
            updated_at: mapping::timestamp_field(spec, row, "updated_at")?,
            body: mapping::text_field(spec, row, "body")?.unwrap_or_default(),
        })
    }
}

pub fn draft_note(body: &str) -> Note {
    Note {
        id: None,
        created_at: None,
        updated_at: None,
        body: body.to_owned(),
    }
}

#[cfg(feature = "memory")]
pub fn project_table() -> Table<Project> {
    Table::new(Arc::new(MemoryEngine::new()))
}

#[cfg(feature = "memory")]
pub fn project_table_with_engine() -> (Table<Project>, Arc<MemoryEngine>) {
    let engine = Arc::new(MemoryEngine::new());
    (Table::new(engine.clone()), engine)
}

#[cfg(feature = "memory")]
pub fn task_table() -> Table<Task> {
    Table::new(Arc::new(MemoryEngine::new()))
}

#[cfg(feature = "memory")]
pub fn note_table() -> Table<Note> {
    Table::new(Arc::new(MemoryEngine::new()))
}

/// Engine wrapper that counts how many calls reach storage.
#[cfg(feature = "memory")]
#[derive(Debug, Default)]
pub struct CountingEngine {
    inner: MemoryEngine,
    ops: AtomicUsize,
}

#[cfg(feature = "memory")]
impl CountingEngine {
    pub fn ops(&self) -> usize {
        self.ops.load(Ordering::SeqCst)
    }
}

#[cfg(feature = "memory")]
#[async_trait]
impl StorageEngine for CountingEngine {
    async fn ensure_table(&self, spec: &TableSpec) -> Result<(), EngineError> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        self.inner.ensure_table(spec).await
    }

    async fn select(&self, spec: &TableSpec, filter: &Filter) -> Result<Vec<Row>, EngineError> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        self.inner.select(spec, filter).await
    }

    async fn insert(&self, spec: &TableSpec, row: Row) -> Result<Row, EngineError> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(spec, row).await
    }

    async fn update(
        &self,
        spec: &TableSpec,
        filter: &Filter,
        row: Row,
    ) -> Result<u64, EngineError> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        self.inner.update(spec, filter, row).await
    }

    async fn delete(&self, spec: &TableSpec, filter: &Filter) -> Result<u64, EngineError> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(spec, filter).await
    }
}

#[cfg(feature = "memory")]
pub fn counting_project_table() -> (Table<Project>, Arc<CountingEngine>) {
    let engine = Arc::new(CountingEngine::default());
    (Table::new(engine.clone()), engine)
}

/// Ids of the given projects, sorted for order-free comparison.
pub fn project_ids(rows: &[Project]) -> Vec<Uuid> {
    sorted_ids(rows.iter().map(|p| p.id))
}

/// Sorted, de-optioned ids for set-style assertions.
pub fn sorted_ids(ids: impl IntoIterator<Item = Option<Uuid>>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = ids.into_iter().flatten().collect();
    ids.sort_unstable();
    ids
}
