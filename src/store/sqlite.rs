//! SQLite-backed record store.
//!
//! Column defaults stand in for what a hosted database fills in server-side:
//! random ids and UTC timestamps. Every table column is declared in
//! [`columns`], and row keys outside that list are rejected before any SQL is
//! built.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row as _;

use super::{Filter, RecordStore, Row, Select, StoreError, Table};

/// How a column is stored and decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Text,
    Integer,
    /// JSON document stored as TEXT.
    Json,
}

fn columns(table: Table) -> &'static [(&'static str, ColumnKind)] {
    use ColumnKind::*;
    match table {
        Table::RuleSections => &[
            ("id", Text),
            ("title", Text),
            ("description", Text),
            ("icon", Text),
            ("order_index", Integer),
            ("created_at", Text),
            ("updated_at", Text),
        ],
        Table::Rules => &[
            ("id", Text),
            ("section_id", Text),
            ("title", Text),
            ("content", Text),
            ("order_index", Integer),
            ("created_by", Text),
            ("created_at", Text),
            ("updated_at", Text),
        ],
        Table::BackupMeta => &[
            ("id", Text),
            ("name", Text),
            ("type", Text),
            ("status", Text),
            ("created_at", Text),
        ],
        Table::BackupData => &[
            ("id", Text),
            ("backup_id", Text),
            ("data", Json),
            ("created_at", Text),
        ],
    }
}

fn column_kind(table: Table, column: &str) -> Result<ColumnKind, StoreError> {
    columns(table)
        .iter()
        .find(|(name, _)| *name == column)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| StoreError::UnknownColumn {
            table,
            column: column.to_string(),
        })
}

fn column_list(table: Table) -> String {
    columns(table)
        .iter()
        .map(|(name, _)| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Record store over a local SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await.ok();
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let options = SqliteConnectOptions::from_str(&db_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::new(pool).await
    }

    /// Wrap an existing pool, creating tables if needed.
    pub async fn new(pool: SqlitePool) -> Result<Self, StoreError> {
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rule_sections (
            id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
            title TEXT NOT NULL,
            description TEXT,
            icon TEXT,
            order_index INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE TABLE IF NOT EXISTS rules (
            id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
            section_id TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            order_index INTEGER NOT NULL DEFAULT 0,
            created_by TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE TABLE IF NOT EXISTS backup_meta (
            id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE TABLE IF NOT EXISTS backup_data (
            id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
            backup_id TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_rules_section_id ON rules(section_id);
        CREATE INDEX IF NOT EXISTS idx_rules_order_index ON rules(order_index);
        CREATE INDEX IF NOT EXISTS idx_rule_sections_order_index ON rule_sections(order_index);
        CREATE INDEX IF NOT EXISTS idx_backup_meta_created_at ON backup_meta(created_at);
        CREATE INDEX IF NOT EXISTS idx_backup_data_backup_id ON backup_data(backup_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    kind: ColumnKind,
    value: &Value,
) -> Result<Query<'q, Sqlite, SqliteArguments<'q>>, serde_json::Error> {
    if value.is_null() {
        return Ok(query.bind(None::<String>));
    }
    let query = match (kind, value) {
        (ColumnKind::Json, v) => query.bind(serde_json::to_string(v)?),
        (_, Value::Bool(b)) => query.bind(*b),
        (_, Value::Number(n)) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        (_, Value::String(s)) => query.bind(s.clone()),
        (_, v) => query.bind(v.to_string()),
    };
    Ok(query)
}

fn decode_row(table: Table, row: &SqliteRow) -> Result<Row, StoreError> {
    let mut out = Row::new();
    for (name, kind) in columns(table) {
        let value = match kind {
            ColumnKind::Text => row
                .try_get::<Option<String>, _>(*name)?
                .map(Value::String)
                .unwrap_or(Value::Null),
            ColumnKind::Integer => row
                .try_get::<Option<i64>, _>(*name)?
                .map(Value::from)
                .unwrap_or(Value::Null),
            ColumnKind::Json => match row.try_get::<Option<String>, _>(*name)? {
                Some(text) => serde_json::from_str(&text).map_err(|e| StoreError::Decode {
                    table,
                    message: format!("column {}: {}", name, e),
                })?,
                None => Value::Null,
            },
        };
        out.insert((*name).to_string(), value);
    }
    Ok(out)
}

fn encode_error(table: Table, err: serde_json::Error) -> StoreError {
    StoreError::Decode {
        table,
        message: format!("failed to encode value: {}", err),
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError> {
        let table = query.table;
        let mut sql = format!("SELECT {} FROM {}", column_list(table), table.name());

        let filter_kind = match &query.filter {
            Some(filter) => {
                let kind = column_kind(table, filter.column)?;
                sql.push_str(&format!(" WHERE \"{}\" = ?", filter.column));
                Some(kind)
            }
            None => None,
        };

        if let Some(order) = &query.order {
            column_kind(table, order.column)?;
            let direction = if order.ascending { "ASC" } else { "DESC" };
            // rowid keeps ties in insertion order
            sql.push_str(&format!(
                " ORDER BY \"{}\" {dir}, rowid {dir}",
                order.column,
                dir = direction
            ));
        }

        let mut q = sqlx::query(&sql);
        if let (Some(filter), Some(kind)) = (&query.filter, filter_kind) {
            q = bind_value(q, kind, &filter.value).map_err(|e| encode_error(table, e))?;
        }

        let rows = q.fetch_all(&self.pool).await?;
        tracing::debug!(table = %table, rows = rows.len(), "select");

        rows.iter().map(|row| decode_row(table, row)).collect()
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
        let mut kinds = Vec::with_capacity(row.len());
        for column in row.keys() {
            kinds.push(column_kind(table, column)?);
        }

        let sql = if row.is_empty() {
            format!(
                "INSERT INTO {} DEFAULT VALUES RETURNING {}",
                table.name(),
                column_list(table)
            )
        } else {
            let names = row
                .keys()
                .map(|c| format!("\"{}\"", c))
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = vec!["?"; row.len()].join(", ");
            format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                table.name(),
                names,
                placeholders,
                column_list(table)
            )
        };

        let mut q = sqlx::query(&sql);
        for (value, kind) in row.values().zip(kinds) {
            q = bind_value(q, kind, value).map_err(|e| encode_error(table, e))?;
        }

        let stored = q.fetch_one(&self.pool).await?;
        tracing::debug!(table = %table, "insert");
        decode_row(table, &stored)
    }

    async fn update(&self, table: Table, id: &str, changes: Row) -> Result<Row, StoreError> {
        let not_found = || StoreError::NotFound {
            table,
            id: id.to_string(),
        };

        if changes.is_empty() {
            let sql = format!(
                "SELECT {} FROM {} WHERE id = ?",
                column_list(table),
                table.name()
            );
            let row = sqlx::query(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(not_found)?;
            return decode_row(table, &row);
        }

        let mut kinds = Vec::with_capacity(changes.len());
        for column in changes.keys() {
            kinds.push(column_kind(table, column)?);
        }

        let assignments = changes
            .keys()
            .map(|c| format!("\"{}\" = ?", c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ? RETURNING {}",
            table.name(),
            assignments,
            column_list(table)
        );

        let mut q = sqlx::query(&sql);
        for (value, kind) in changes.values().zip(kinds) {
            q = bind_value(q, kind, value).map_err(|e| encode_error(table, e))?;
        }
        q = q.bind(id);

        let row = q.fetch_optional(&self.pool).await?.ok_or_else(not_found)?;
        tracing::debug!(table = %table, id = %id, "update");
        decode_row(table, &row)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<(), StoreError> {
        let kind = column_kind(table, filter.column)?;
        let sql = format!("DELETE FROM {} WHERE \"{}\" = ?", table.name(), filter.column);

        let q = bind_value(sqlx::query(&sql), kind, &filter.value)
            .map_err(|e| encode_error(table, e))?;
        let result = q.execute(&self.pool).await?;

        tracing::debug!(
            table = %table,
            column = filter.column,
            removed = result.rows_affected(),
            "delete"
        );
        Ok(())
    }

    async fn count(&self, table: Table) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) AS n FROM {}", table.name());
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        let n: i64 = row.try_get("n")?;
        Ok(n.max(0) as u64)
    }
}
