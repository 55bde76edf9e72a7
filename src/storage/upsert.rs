//! Row persistence: the [`Sink`] seam and its SQLite and dry-run implementations

use std::collections::BTreeMap;
use std::sync::Mutex;

use rusqlite::{params_from_iter, types::Value as SqlValue};
use serde_json::Value;
use tracing::debug;

use super::schema::{quote, quoted_list, LeagueDatabase};
use crate::error::{Result, SyncError};
use crate::transform::{
    schema::{Column, ColumnType, TableSchema},
    Row, Table,
};

/// Destination for transformed rows.
///
/// Implementations block; the orchestrator calls them from tokio's blocking
/// pool.
pub trait Sink: Send + Sync + 'static {
    /// Insert or overwrite `rows` by the table's natural key and return how
    /// many rows were written. An empty batch is a no-op.
    fn upsert(&self, table: Table, rows: &[Row]) -> Result<usize>;
}

impl Sink for LeagueDatabase {
    fn upsert(&self, table: Table, rows: &[Row]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        check_rows(table, rows)?;

        let schema = table.schema();
        let persistence = |source| SyncError::Persistence {
            table: schema.name,
            source,
        };

        let mut conn = self.lane(table)?;
        let tx = conn.transaction().map_err(persistence)?;
        {
            if schema.key.is_empty() {
                // Keyless snapshots are replaced wholesale
                tx.execute(&format!("DELETE FROM {}", quote(schema.name)), [])
                    .map_err(persistence)?;
            }

            let mut statement = tx.prepare_cached(&upsert_sql(schema)).map_err(persistence)?;
            for row in rows {
                let values = schema
                    .columns()
                    .zip(row.values())
                    .map(|(column, value)| to_sql(column, value));
                statement
                    .execute(params_from_iter(values))
                    .map_err(persistence)?;
            }
        }
        tx.commit().map_err(persistence)?;

        debug!(table = schema.name, rows = rows.len(), "upserted rows");
        Ok(rows.len())
    }
}

fn check_rows(table: Table, rows: &[Row]) -> Result<()> {
    match rows.iter().find(|row| row.table() != table) {
        Some(row) => Err(SyncError::schema_mismatch(
            table.name(),
            format!("rows for {table}"),
            format!("a row for {}", row.table()),
        )),
        None => Ok(()),
    }
}

/// `INSERT ... ON CONFLICT (key) DO UPDATE` for keyed tables, a plain insert
/// for keyless ones.
pub(crate) fn upsert_sql(schema: &TableSchema) -> String {
    let names: Vec<&str> = schema.columns().map(|c| c.name).collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();

    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote(schema.name),
        quoted_list(names.iter().copied()),
        placeholders.join(", ")
    );

    if !schema.key.is_empty() {
        let updates: Vec<String> = names
            .iter()
            .filter(|name| !schema.is_key(name))
            .map(|name| format!("{0} = excluded.{0}", quote(name)))
            .collect();

        sql.push_str(&format!(
            " ON CONFLICT ({}) ",
            quoted_list(schema.key.iter().copied())
        ));
        if updates.is_empty() {
            sql.push_str("DO NOTHING");
        } else {
            sql.push_str(&format!("DO UPDATE SET {}", updates.join(", ")));
        }
    }

    sql
}

/// Convert one JSON value to its stored form.
pub(crate) fn to_sql(column: &Column, value: &Value) -> SqlValue {
    match (column.column_type, value) {
        (_, Value::Null) => SqlValue::Null,
        // serde_json maps are ordered, so this text is canonical
        (ColumnType::Json, value) => SqlValue::Text(value.to_string()),
        (_, Value::Bool(flag)) => SqlValue::Integer(i64::from(*flag)),
        (_, Value::Number(number)) => match number.as_i64() {
            Some(integer) => SqlValue::Integer(integer),
            None => number
                .as_f64()
                .map(SqlValue::Real)
                .unwrap_or(SqlValue::Null),
        },
        (_, Value::String(text)) => SqlValue::Text(text.clone()),
        (_, nested) => SqlValue::Text(nested.to_string()),
    }
}

/// Sink that counts rows without persisting them.
#[derive(Debug, Default)]
pub struct DryRun {
    counts: Mutex<BTreeMap<Table, usize>>,
}

impl DryRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows accepted so far, per table.
    pub fn counts(&self) -> BTreeMap<Table, usize> {
        match self.counts.lock() {
            Ok(counts) => counts.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Sink for DryRun {
    fn upsert(&self, table: Table, rows: &[Row]) -> Result<usize> {
        check_rows(table, rows)?;
        let mut counts = self
            .counts
            .lock()
            .map_err(|_| SyncError::StorePoisoned {
                table: table.name(),
            })?;
        *counts.entry(table).or_default() += rows.len();
        Ok(rows.len())
    }
}
