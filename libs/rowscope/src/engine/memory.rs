//! In-process storage engine backed by plain vectors.
//!
//! The bundled default: good for tests, tools, and single-process services.
//! One [`DashMap`] entry per table, each guarding its rows and id sequence
//! with a [`Mutex`] so a row scan and its matching mutation stay atomic.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::column::{ID_IDX, TableSpec};
use crate::filter::Filter;
use crate::value::{ColumnType, Row, Value};

use super::{EngineError, StorageEngine};

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<Row>,
    next_id: i64,
}

/// Storage engine holding every table in process memory.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    tables: DashMap<&'static str, Mutex<TableState>>,
}

impl MemoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_table<T>(
        &self,
        spec: &TableSpec,
        f: impl FnOnce(&mut TableState) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let entry = self
            .tables
            .get(spec.name())
            .ok_or_else(|| EngineError::NoSuchTable(spec.name().to_owned()))?;
        let mut state = entry.lock();
        f(&mut state)
    }

    fn id_support(spec: &TableSpec) -> Result<(), EngineError> {
        match spec.id_type() {
            ColumnType::Integer | ColumnType::Uuid => Ok(()),
            _ => Err(EngineError::Unsupported(
                "memory engine assigns integer and uuid ids only",
            )),
        }
    }

    fn assign_id(spec: &TableSpec, state: &mut TableState) -> Result<Value, EngineError> {
        Self::id_support(spec)?;
        if spec.id_type() == ColumnType::Integer {
            state.next_id += 1;
            Ok(Value::Integer(state.next_id))
        } else {
            Ok(Value::Uuid(Uuid::new_v4()))
        }
    }
}

#[async_trait]
impl StorageEngine for MemoryEngine {
    async fn ensure_table(&self, spec: &TableSpec) -> Result<(), EngineError> {
        Self::id_support(spec)?;
        self.tables.entry(spec.name()).or_default();
        Ok(())
    }

    async fn select(&self, spec: &TableSpec, filter: &Filter) -> Result<Vec<Row>, EngineError> {
        self.with_table(spec, |state| {
            Ok(state
                .rows
                .iter()
                .filter(|row| filter.matches(spec, row))
                .cloned()
                .collect())
        })
    }

    async fn insert(&self, spec: &TableSpec, mut row: Row) -> Result<Row, EngineError> {
        self.with_table(spec, |state| {
            let id = Self::assign_id(spec, state)?;
            if let Some(slot) = row.values.get_mut(ID_IDX) {
                *slot = id;
            }
            state.rows.push(row.clone());
            Ok(row)
        })
    }

    async fn update(
        &self,
        spec: &TableSpec,
        filter: &Filter,
        row: Row,
    ) -> Result<u64, EngineError> {
        self.with_table(spec, |state| {
            let mut matched = 0u64;
            for stored in &mut state.rows {
                if !filter.matches(spec, stored) {
                    continue;
                }
                matched += 1;
                for (idx, value) in row.values.iter().enumerate() {
                    if idx == ID_IDX {
                        continue;
                    }
                    if let Some(slot) = stored.values.get_mut(idx) {
                        *slot = value.clone();
                    }
                }
            }
            Ok(matched)
        })
    }

    async fn delete(&self, spec: &TableSpec, filter: &Filter) -> Result<u64, EngineError> {
        self.with_table(spec, |state| {
            let mut removed = 0u64;
            state.rows.retain(|row| {
                let hit = filter.matches(spec, row);
                if hit {
                    removed += 1;
                }
                !hit
            });
            Ok(removed)
        })
    }
}
