//! Relational store adapter.
//!
//! The dispatch core talks to the database only through [`RelationalStore`].
//! The production implementation is [`PostgresStore`], backed by a `sqlx`
//! connection pool.

mod postgres;

use serde::Serialize;
use serde_json::Value;

use super::error::{BackendError, BackendResult};

pub use postgres::PostgresStore;

/// A single result row, columns in select-list order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Column description returned by [`RelationalStore::describe_table`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub column: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

/// A positional statement parameter, typed by its JSON kind.
///
/// Strings bind as `text`, integers as `int8`, other numbers as `float8`.
/// Placeholders compared against other column types need a cast in SQL
/// (`$1::date`).
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlParam {
    /// Convert one JSON value. Arrays and objects are rejected.
    pub fn from_json(value: &Value) -> BackendResult<Self> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Self::Int(i)),
                None => n.as_f64().map(Self::Float).ok_or_else(|| {
                    BackendError::invalid_input(format!("Parameter {} is out of range", n))
                }),
            },
            Value::String(text) => Ok(Self::Text(text.clone())),
            other => Err(BackendError::invalid_input(format!(
                "Parameters must be scalars, got {}",
                other
            ))),
        }
    }

    pub fn from_json_list(values: &[Value]) -> BackendResult<Vec<Self>> {
        values.iter().map(Self::from_json).collect()
    }
}

impl From<&str> for SqlParam {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Operations the dispatch core needs from a relational database.
///
/// Implementations must be safe for concurrent use: every call either takes
/// its own connection from a pool or otherwise avoids sharing a cursor.
#[async_trait::async_trait]
pub trait RelationalStore: Send + Sync {
    /// Run a row-returning statement.
    async fn query(&self, sql: &str, params: &[SqlParam]) -> BackendResult<Vec<Row>>;

    /// Run a statement and report the number of affected rows.
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> BackendResult<u64>;

    /// Names of the base tables in the public schema, sorted.
    async fn list_tables(&self) -> BackendResult<Vec<String>>;

    /// Columns of a table in ordinal order.
    async fn describe_table(&self, table: &str) -> BackendResult<Vec<ColumnInfo>>;
}
