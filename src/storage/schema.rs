//! Database schema and connection management

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::transform::{schema::TableSchema, Table};

/// How long a connection waits on another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite store for the synchronized Sleeper tables.
///
/// A file-backed store keeps one connection per table, so writes to different
/// tables never queue behind the same lock. An in-memory store cannot be
/// shared between connections and uses a single connection for every table.
#[derive(Debug)]
pub struct LeagueDatabase {
    lanes: HashMap<Table, Arc<Mutex<Connection>>>,
    path: Option<PathBuf>,
}

impl LeagueDatabase {
    /// Open (or create) the store at `path` and ensure all tables exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure the parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                SyncError::configuration(format!(
                    "cannot create store directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let first = connect(path)?;
        initialize_schema(&first).map_err(|e| open_error(path, e))?;

        let mut first = Some(first);
        let mut lanes = HashMap::with_capacity(Table::ALL.len());
        for table in Table::ALL {
            let conn = match first.take() {
                Some(conn) => conn,
                None => connect(path)?,
            };
            lanes.insert(table, Arc::new(Mutex::new(conn)));
        }

        debug!(path = %path.display(), "opened store");
        Ok(Self {
            lanes,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory store, mainly for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SyncError::configuration(format!("cannot open in-memory store: {e}")))?;
        initialize_schema(&conn)
            .map_err(|e| SyncError::configuration(format!("cannot initialize store: {e}")))?;

        let shared = Arc::new(Mutex::new(conn));
        let lanes = Table::ALL
            .into_iter()
            .map(|table| (table, Arc::clone(&shared)))
            .collect();

        Ok(Self { lanes, path: None })
    }

    /// Open an existing store read-only, for inspection.
    ///
    /// Unlike [`open`](Self::open) this never creates the file, runs no DDL
    /// and leaves the journal mode alone. All tables share one connection.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|e| open_error(path, e))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| open_error(path, e))?;

        let shared = Arc::new(Mutex::new(conn));
        let lanes = Table::ALL
            .into_iter()
            .map(|table| (table, Arc::clone(&shared)))
            .collect();

        debug!(path = %path.display(), "opened store read-only");
        Ok(Self {
            lanes,
            path: Some(path.to_path_buf()),
        })
    }

    /// Location of the database file, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Lock the connection that serves `table`.
    pub(crate) fn lane(&self, table: Table) -> Result<MutexGuard<'_, Connection>> {
        self.lanes
            .get(&table)
            .ok_or(SyncError::MissingLane {
                table: table.name(),
            })?
            .lock()
            .map_err(|_| SyncError::StorePoisoned {
                table: table.name(),
            })
    }
}

fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).map_err(|e| open_error(path, e))?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| open_error(path, e))?;
    let mode: String = conn
        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
        .map_err(|e| open_error(path, e))?;
    debug!(journal_mode = %mode, "connection ready");
    Ok(conn)
}

fn open_error(path: &Path, error: rusqlite::Error) -> SyncError {
    SyncError::configuration(format!("cannot open store {}: {error}", path.display()))
}

/// Create every table that does not exist yet.
pub(crate) fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    let ddl: Vec<String> = Table::ALL
        .iter()
        .map(|table| create_table_sql(table.schema()))
        .collect();
    conn.execute_batch(&ddl.join(";\n"))
}

/// `CREATE TABLE` statement for a declared schema. Natural key columns are
/// `NOT NULL` and form the primary key.
pub fn create_table_sql(schema: &TableSchema) -> String {
    let mut definitions: Vec<String> = schema
        .columns()
        .map(|column| {
            let not_null = if schema.is_key(column.name) {
                " NOT NULL"
            } else {
                ""
            };
            format!(
                "    {} {}{not_null}",
                quote(column.name),
                column.column_type.sql_type()
            )
        })
        .collect();

    if !schema.key.is_empty() {
        definitions.push(format!("    PRIMARY KEY ({})", quoted_list(schema.key.iter().copied())));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
        quote(schema.name),
        definitions.join(",\n")
    )
}

pub(crate) fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

pub(crate) fn quoted_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.map(quote).collect::<Vec<_>>().join(", ")
}
