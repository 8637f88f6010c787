//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!("Applied schema migration v1");
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- FOODS
        -- Catalog entries, nutrients per 100g or per serving
        -- ============================================
        CREATE TABLE foods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            brand TEXT,
            category TEXT NOT NULL DEFAULT 'other',
            unit TEXT NOT NULL CHECK(unit IN ('per100g', 'perServing')),
            serving_size REAL,                   -- grams in one serving, perServing only

            kcal REAL NOT NULL DEFAULT 0,
            fat REAL NOT NULL DEFAULT 0,         -- grams
            carbs REAL NOT NULL DEFAULT 0,       -- grams
            protein REAL NOT NULL DEFAULT 0,     -- grams

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_foods_name ON foods(name);
        CREATE INDEX idx_foods_category ON foods(category);

        -- ============================================
        -- ENTRIES
        -- One logged consumption event. food_id is not a
        -- foreign key: deleting a food leaves its entries dangling.
        -- ============================================
        CREATE TABLE entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,                  -- ISO date: "2025-01-09"
            food_id INTEGER NOT NULL,
            food_label TEXT NOT NULL DEFAULT '', -- name snapshot for dangling references
            quantity REAL NOT NULL CHECK(quantity > 0),
            meal TEXT NOT NULL CHECK(meal IN ('breakfast', 'lunch', 'dinner', 'snack', 'other')),

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_entries_date ON entries(date);
        CREATE INDEX idx_entries_food ON entries(food_id);

        -- ============================================
        -- GOALS
        -- Single row daily budget
        -- ============================================
        CREATE TABLE goals (
            id INTEGER PRIMARY KEY CHECK(id = 1),
            kcal REAL NOT NULL,
            fat REAL NOT NULL,
            carbs REAL NOT NULL,
            protein REAL NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- BODY PROFILE
        -- Informational only
        -- ============================================
        CREATE TABLE body_profile (
            id INTEGER PRIMARY KEY CHECK(id = 1),
            age INTEGER,
            sex TEXT,
            height_cm REAL,
            weight_kg REAL,
            body_fat_pct REAL,
            activity TEXT,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }

    #[test]
    fn test_entries_reject_non_positive_quantity() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO entries (date, food_id, quantity, meal) VALUES ('2025-01-01', 1, 0, 'lunch')",
            [],
        );
        assert!(result.is_err());
    }
}
