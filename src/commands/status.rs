//! The `status` command: row counts of the local store.

use std::path::PathBuf;

use crate::{config::resolve_database_path, storage::LeagueDatabase, transform::Table, Result};

/// Handle the status command
pub fn handle_status(database: Option<PathBuf>) -> Result<()> {
    let path = resolve_database_path(database)?;
    if !path.exists() {
        println!("No database at {} (run `sleeper-sync sync` first)", path.display());
        return Ok(());
    }

    let db = LeagueDatabase::open_existing(&path)?;
    println!("Database: {}", path.display());
    for line in status_lines(&db.row_counts()?) {
        println!("{line}");
    }
    Ok(())
}

pub fn status_lines(counts: &[(Table, usize)]) -> Vec<String> {
    counts
        .iter()
        .map(|(table, count)| format!("{:<30} {count:>8}", table.name()))
        .collect()
}
