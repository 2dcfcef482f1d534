//! Record store boundary.
//!
//! All persistence goes through [`RecordStore`], a small table/row interface
//! shaped after what a hosted REST database offers: ordered selects with one
//! equality filter, single-row insert/update, filtered delete and counts.

mod rest;
mod sqlite;

pub use rest::RestStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// A single row as exchanged with the store, keyed by snake_case column name.
pub type Row = Map<String, Value>;

/// Logical tables known to the rulebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    RuleSections,
    Rules,
    BackupMeta,
    BackupData,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::RuleSections => "rule_sections",
            Table::Rules => "rules",
            Table::BackupMeta => "backup_meta",
            Table::BackupData => "backup_data",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Equality filter on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

/// Sort order for a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub fn desc(column: &'static str) -> Self {
        Self {
            column,
            ascending: false,
        }
    }
}

/// A select over one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: Table,
    pub filter: Option<Filter>,
    pub order: Option<Order>,
}

impl Select {
    pub fn all(table: Table) -> Self {
        Self {
            table,
            filter: None,
            order: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }
}

/// Failures signalled by the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned {status}: {message}")]
    Service {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("no row in {table} with id {id}")]
    NotFound { table: Table, id: String },

    #[error("unknown column {column} for table {table}")]
    UnknownColumn { table: Table, column: String },

    #[error("malformed row from {table}: {message}")]
    Decode { table: Table, message: String },
}

/// Typed access to the external record store.
///
/// Implementations perform no retries; every failure is returned to the caller
/// as-is.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch all rows matching `query`, in the requested order.
    async fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError>;

    /// Insert one row and return it as stored, with column defaults filled in.
    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError>;

    /// Update the row whose `id` matches and return it as stored.
    ///
    /// Fails with [`StoreError::NotFound`] when no row matched.
    async fn update(&self, table: Table, id: &str, changes: Row) -> Result<Row, StoreError>;

    /// Delete every row matching `filter`. Matching nothing is not an error.
    async fn delete(&self, table: Table, filter: &Filter) -> Result<(), StoreError>;

    /// Count all rows in `table`.
    async fn count(&self, table: Table) -> Result<u64, StoreError>;
}
