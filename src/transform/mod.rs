//! Payload to row transformation
//!
//! Each destination table is declared once in [`tables`] using the types in
//! [`schema`]. [`transform`] walks a payload according to the table's
//! declared shape and produces one [`Row`] per record, with exactly one value
//! per declared column. Missing fields become the column's empty default, so
//! rows never lose columns.
//!
//! Transformation is pure: it performs no I/O and only fails when the payload
//! is not the JSON shape the endpoint is expected to return.

pub mod schema;
pub mod tables;


use rayon::prelude::*;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::{
    cli::types::{LeagueId, Season, Week},
    error::{Result, SyncError},
};
use schema::{Column, ContextField, Fallback, PayloadShape, TableSchema, ValueSource};

/// Keyed payloads at least this large are mapped on the rayon pool.
const PARALLEL_THRESHOLD: usize = 512;

/// Destination tables written by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    LeagueInformation,
    LeagueState,
    LeagueRosters,
    LeagueUsers,
    Players,
    TrendingPlayers,
    PlayerStatistics,
    WeeklyPlayerStatistics,
    Matchups,
}

impl Table {
    pub const ALL: [Table; 9] = [
        Table::LeagueInformation,
        Table::LeagueState,
        Table::LeagueRosters,
        Table::LeagueUsers,
        Table::Players,
        Table::TrendingPlayers,
        Table::PlayerStatistics,
        Table::WeeklyPlayerStatistics,
        Table::Matchups,
    ];

    pub fn schema(&self) -> &'static TableSchema {
        match self {
            Table::LeagueInformation => &tables::LEAGUE_INFORMATION,
            Table::LeagueState => &tables::LEAGUE_STATE,
            Table::LeagueRosters => &tables::LEAGUE_ROSTERS,
            Table::LeagueUsers => &tables::LEAGUE_USERS,
            Table::Players => &tables::PLAYERS,
            Table::TrendingPlayers => &tables::TRENDING_PLAYERS,
            Table::PlayerStatistics => &tables::PLAYER_STATISTICS,
            Table::WeeklyPlayerStatistics => &tables::WEEKLY_PLAYER_STATISTICS,
            Table::Matchups => &tables::MATCHUPS,
        }
    }

    pub fn name(&self) -> &'static str {
        self.schema().name
    }

    /// Map one payload of this table's endpoint into rows.
    pub fn transform(&self, payload: &Value, context: &TransformContext) -> Result<Vec<Row>> {
        transform(*self, payload, context)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values a job knows that the payload does not carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformContext {
    pub league_id: Option<LeagueId>,
    pub season: Option<Season>,
    pub week: Option<Week>,
}

impl TransformContext {
    pub fn for_league(league_id: LeagueId) -> Self {
        Self {
            league_id: Some(league_id),
            ..Self::default()
        }
    }

    pub fn with_period(mut self, season: Season, week: Week) -> Self {
        self.season = Some(season);
        self.week = Some(week);
        self
    }

    fn value(&self, field: ContextField) -> Option<Value> {
        match field {
            ContextField::LeagueId => self
                .league_id
                .as_ref()
                .map(|id| Value::String(id.as_str().to_string())),
            // Seasons are text everywhere else in the store ("2024")
            ContextField::Season => self.season.map(|s| Value::String(s.to_string())),
            ContextField::Week => self.week.map(|w| Value::from(w.as_u16())),
        }
    }
}

/// One flat record for a destination table, one value per declared column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    table: Table,
    values: Vec<Value>,
}

impl Row {
    pub fn table(&self) -> Table {
        self.table
    }

    /// Values in declared column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.table
            .schema()
            .position(column)
            .map(|index| &self.values[index])
    }

    pub fn to_json(&self) -> Value {
        let object: Map<String, Value> = self
            .table
            .schema()
            .columns()
            .zip(&self.values)
            .map(|(column, value)| (column.name.to_string(), value.clone()))
            .collect();
        Value::Object(object)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.table.schema().columns().zip(&self.values) {
            map.serialize_entry(column.name, value)?;
        }
        map.end()
    }
}

/// Map a payload into rows for `table`.
///
/// Fails with [`SyncError::SchemaMismatch`] when the payload (or one of its
/// records) is not the JSON shape the table's endpoint returns.
pub fn transform(table: Table, payload: &Value, context: &TransformContext) -> Result<Vec<Row>> {
    let schema = table.schema();

    match schema.shape {
        PayloadShape::Single => {
            let record = payload.as_object().ok_or_else(|| shape_error(schema, payload))?;
            Ok(vec![build_row(table, Some(record), None, context)])
        }
        PayloadShape::List => {
            let items = payload.as_array().ok_or_else(|| shape_error(schema, payload))?;
            items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let record = item.as_object().ok_or_else(|| {
                        SyncError::schema_mismatch(
                            schema.name,
                            format!("an object at index {index}"),
                            describe(item),
                        )
                    })?;
                    Ok(build_row(table, Some(record), None, context))
                })
                .collect()
        }
        PayloadShape::Keyed => {
            let entries: Vec<(&String, &Value)> = payload
                .as_object()
                .ok_or_else(|| shape_error(schema, payload))?
                .iter()
                .collect();

            let keyed_row = |(key, entry): &(&String, &Value)| -> Result<Row> {
                let record = match entry {
                    Value::Object(record) => Some(record),
                    Value::Null => None,
                    other => {
                        return Err(SyncError::schema_mismatch(
                            schema.name,
                            format!("an object for key {key:?}"),
                            describe(other),
                        ))
                    }
                };
                Ok(build_row(table, record, Some(key.as_str()), context))
            };

            if entries.len() >= PARALLEL_THRESHOLD {
                entries.par_iter().map(keyed_row).collect()
            } else {
                entries.iter().map(keyed_row).collect()
            }
        }
    }
}

fn build_row(
    table: Table,
    record: Option<&Map<String, Value>>,
    key: Option<&str>,
    context: &TransformContext,
) -> Row {
    let values = table
        .schema()
        .columns()
        .map(|column| resolve(column, record, key, context))
        .collect();
    Row { table, values }
}

fn resolve(
    column: &Column,
    record: Option<&Map<String, Value>>,
    key: Option<&str>,
    context: &TransformContext,
) -> Value {
    let raw = |name: &str| record.and_then(|r| r.get(name));
    let field = |name: &str| raw(name).filter(|v| !v.is_null()).cloned();
    let entry_key = || key.map(|k| Value::String(k.to_string()));

    let value = match column.source {
        ValueSource::Field(name) => field(name),
        ValueSource::Nested(parent, name) => raw(parent)
            .and_then(Value::as_object)
            .and_then(|nested| nested.get(name))
            .filter(|v| !v.is_null())
            .cloned(),
        ValueSource::TrimmedText(name) => match field(name) {
            Some(Value::String(text)) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| Value::String(trimmed.to_string()))
            }
            other => other,
        },
        ValueSource::FirstOf(name) => raw(name)
            .and_then(Value::as_array)
            .and_then(|list| list.first())
            .filter(|v| !v.is_null())
            .cloned(),
        ValueSource::EntryKey => entry_key(),
        ValueSource::FieldOrKey(name) => field(name)
            .filter(|v| v.as_str() != Some(""))
            .or_else(entry_key),
        ValueSource::FieldOrContext(name, context_field) => {
            field(name).or_else(|| context.value(context_field))
        }
        ValueSource::Context(context_field) => context.value(context_field),
        ValueSource::Truthy(name) => Some(Value::Bool(raw(name).is_some_and(is_truthy))),
    };

    value.unwrap_or_else(|| match column.fallback {
        Fallback::Null => Value::Null,
        Fallback::EmptyObject => Value::Object(Map::new()),
        Fallback::EmptyList => Value::Array(Vec::new()),
    })
}

/// Truthiness as the Sleeper payloads use it: empty and zero values are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn shape_error(schema: &TableSchema, payload: &Value) -> SyncError {
    SyncError::schema_mismatch(schema.name, schema.shape.describe(), describe(payload))
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
