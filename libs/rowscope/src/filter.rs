//! Predicate expressions handed to the storage engine.
//!
//! Scopes and per-call conditions are both expressed as [`Filter`] values
//! and combined with [`Filter::and`]; the engine is the only interpreter.

use crate::column::TableSpec;
use crate::value::{Row, Value};

/// A boolean predicate over one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every row.
    All,
    /// Column equals the given value.
    Eq(&'static str, Value),
    /// Column is NULL.
    IsNull(&'static str),
    /// Column is not NULL.
    IsNotNull(&'static str),
    /// Both operands match.
    And(Box<Filter>, Box<Filter>),
}

impl Filter {
    #[must_use]
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Filter::Eq(column, value.into())
    }

    #[must_use]
    pub fn is_null(column: &'static str) -> Self {
        Filter::IsNull(column)
    }

    #[must_use]
    pub fn is_not_null(column: &'static str) -> Self {
        Filter::IsNotNull(column)
    }

    /// Conjoin with another predicate. [`Filter::All`] is the identity, so
    /// scope axes that contribute nothing collapse away instead of
    /// accumulating tautologies.
    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (a, b) => Filter::And(Box::new(a), Box::new(b)),
        }
    }

    /// Evaluate this predicate against one row, positionally over `spec`.
    ///
    /// Follows SQL comparison semantics: equality against NULL never
    /// matches, on either side. Undeclared columns match nothing.
    #[must_use]
    pub fn matches(&self, spec: &TableSpec, row: &Row) -> bool {
        let cell = |column: &str| spec.column_index(column).and_then(|i| row.get(i));
        match self {
            Filter::All => true,
            Filter::Eq(column, value) => {
                !value.is_null() && cell(column).is_some_and(|v| !v.is_null() && v == value)
            }
            Filter::IsNull(column) => cell(column).is_some_and(Value::is_null),
            Filter::IsNotNull(column) => cell(column).is_some_and(|v| !v.is_null()),
            Filter::And(a, b) => a.matches(spec, row) && b.matches(spec, row),
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::All => f.write_str("TRUE"),
            Filter::Eq(column, value) => write!(f, "{column} = {value}"),
            Filter::IsNull(column) => write!(f, "{column} IS NULL"),
            Filter::IsNotNull(column) => write!(f, "{column} IS NOT NULL"),
            Filter::And(a, b) => write!(f, "{a} AND {b}"),
        }
    }
}
