//! Storage layer for synchronized Sleeper data
//!
//! This module owns the SQLite store the pipeline writes into:
//! - `schema`: Connection management and table creation from the declared schemas
//! - `upsert`: The [`Sink`] trait, keyed upserts and the dry-run sink
//! - `queries`: Read-back of persisted rows and row counts

pub mod queries;
pub mod schema;
pub mod upsert;


pub use schema::LeagueDatabase;
pub use upsert::{DryRun, Sink};
