//! Database module
//!
//! Handles SQLite connection and migrations.

pub mod connection;
pub mod migrations;

pub use connection::{Database, DbError, DbResult};

/// Open (creating if needed) and migrate a database file
pub fn open<P: AsRef<std::path::Path>>(path: P) -> DbResult<Database> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let database = Database::new(path)?;
    database.with_conn(migrations::run_migrations)?;
    Ok(database)
}

/// In-memory migrated database
pub fn open_in_memory() -> DbResult<Database> {
    let database = Database::in_memory()?;
    database.with_conn(migrations::run_migrations)?;
    Ok(database)
}
