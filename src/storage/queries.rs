//! Read-back queries over the synchronized tables

use rusqlite::types::ValueRef;
use serde_json::{Map, Number, Value};

use super::schema::{quote, quoted_list, LeagueDatabase};
use crate::error::Result;
use crate::transform::{
    schema::{Column, ColumnType},
    Table,
};

impl LeagueDatabase {
    /// All persisted rows of `table` as JSON objects, ordered by natural key
    /// (insertion order for keyless tables).
    pub fn fetch_rows(&self, table: Table) -> Result<Vec<Value>> {
        let schema = table.schema();
        let columns: Vec<&Column> = schema.columns().collect();
        let order = if schema.key.is_empty() {
            "rowid".to_string()
        } else {
            quoted_list(schema.key.iter().copied())
        };
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {order}",
            quoted_list(columns.iter().map(|c| c.name)),
            quote(schema.name)
        );

        let conn = self.lane(table)?;
        let mut statement = conn.prepare(&sql)?;
        let rows = statement.query_map([], |row| {
            let mut object = Map::with_capacity(columns.len());
            for (index, column) in columns.iter().enumerate() {
                object.insert(column.name.to_string(), from_sql(column, row.get_ref(index)?));
            }
            Ok(Value::Object(object))
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn row_count(&self, table: Table) -> Result<usize> {
        let conn = self.lane(table)?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote(table.name())),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Row counts for every table, in job order.
    pub fn row_counts(&self) -> Result<Vec<(Table, usize)>> {
        Table::ALL
            .into_iter()
            .map(|table| Ok((table, self.row_count(table)?)))
            .collect()
    }
}

/// Convert a stored value back to JSON using the column's declared type.
fn from_sql(column: &Column, value: ValueRef<'_>) -> Value {
    match (column.column_type, value) {
        (_, ValueRef::Null) => Value::Null,
        (ColumnType::Json, ValueRef::Text(text)) => {
            let text = String::from_utf8_lossy(text);
            serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.into_owned()))
        }
        (ColumnType::Boolean, ValueRef::Integer(flag)) => Value::Bool(flag != 0),
        (_, ValueRef::Integer(integer)) => Value::from(integer),
        (_, ValueRef::Real(real)) => Number::from_f64(real).map_or(Value::Null, Value::Number),
        (_, ValueRef::Text(text)) => Value::String(String::from_utf8_lossy(text).into_owned()),
        (_, ValueRef::Blob(bytes)) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}
