//! Declarative table schema types.
//!
//! Every destination table is described once as data: the payload shape its
//! endpoint returns, its natural key and its columns. Each column names where
//! its value comes from and what an absent value becomes, so the mapping
//! engine in [`super`] stays generic.

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Boolean,
    /// Nested object or list, stored as canonical JSON text.
    Json,
}

impl ColumnType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Text | ColumnType::Json => "TEXT",
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
            ColumnType::Real => "REAL",
        }
    }
}

/// Values injected by the enclosing job rather than read from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextField {
    LeagueId,
    Season,
    Week,
}

/// Where a column's value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// A top-level field of the record.
    Field(&'static str),
    /// `record[parent][field]`, null when the parent is not an object.
    Nested(&'static str, &'static str),
    /// A string field with surrounding whitespace removed; blank becomes null.
    TrimmedText(&'static str),
    /// First element of a list field.
    FirstOf(&'static str),
    /// The dictionary key of a keyed payload entry.
    EntryKey,
    /// A field, falling back to the dictionary key when absent or null.
    FieldOrKey(&'static str),
    /// A field, falling back to a context value when absent or null.
    FieldOrContext(&'static str, ContextField),
    /// A value supplied by the job.
    Context(ContextField),
    /// Truthiness of a field; absent is `false`.
    Truthy(&'static str),
}

/// What an absent (or null) source value becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Null,
    EmptyObject,
    EmptyList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub source: ValueSource,
    pub fallback: Fallback,
}

impl Column {
    /// A column read from the payload field of the same name.
    pub const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            source: ValueSource::Field(name),
            fallback: Fallback::Null,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub const fn real(name: &'static str) -> Self {
        Self::new(name, ColumnType::Real)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, ColumnType::Boolean)
    }

    /// A nested object kept whole; absent becomes `{}`.
    pub const fn object(name: &'static str) -> Self {
        Self::new(name, ColumnType::Json).or(Fallback::EmptyObject)
    }

    /// An ordered list kept whole; absent becomes `[]`.
    pub const fn list(name: &'static str) -> Self {
        Self::new(name, ColumnType::Json).or(Fallback::EmptyList)
    }

    pub const fn from(self, source: ValueSource) -> Self {
        Self { source, ..self }
    }

    pub const fn or(self, fallback: Fallback) -> Self {
        Self { fallback, ..self }
    }
}

/// JSON shape an endpoint returns for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// One object, one row.
    Single,
    /// An array of objects, one row per element.
    List,
    /// An object keyed by entity id, one row per entry.
    Keyed,
}

impl PayloadShape {
    pub fn describe(&self) -> &'static str {
        match self {
            PayloadShape::Single | PayloadShape::Keyed => "an object",
            PayloadShape::List => "an array",
        }
    }
}

#[derive(Debug)]
pub struct TableSchema {
    pub name: &'static str,
    pub shape: PayloadShape,
    /// Natural key columns; empty for single-snapshot tables.
    pub key: &'static [&'static str],
    /// Column groups, concatenated in order.
    pub column_groups: &'static [&'static [Column]],
}

impl TableSchema {
    pub fn columns(&self) -> impl Iterator<Item = &'static Column> + '_ {
        self.column_groups.iter().flat_map(|group| group.iter())
    }

    pub fn column_count(&self) -> usize {
        self.column_groups.iter().map(|group| group.len()).sum()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns().position(|c| c.name == column)
    }

    pub fn is_key(&self, column: &str) -> bool {
        self.key.contains(&column)
    }
}
