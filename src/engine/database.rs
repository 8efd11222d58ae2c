//! Roster Database Module
//! SQLite adapter with connection pooling

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use thiserror::Error;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to create database pool: {0}")]
    PoolError(#[from] r2d2::Error),
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Database file not found: {0}")]
    NotFound(String),
}

#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open or create the registration database at `db_path`.
    pub fn new(db_path: &Path) -> Result<Self, DatabaseError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an existing database; fails if the file is absent. The sync job
    /// uses this so a missing table reads as an error, not an empty roster.
    pub fn open_existing(db_path: &Path) -> Result<Self, DatabaseError> {
        if !db_path.exists() {
            return Err(DatabaseError::NotFound(db_path.display().to_string()));
        }
        Self::new(db_path)
    }

    pub fn in_memory() -> Result<Self, DatabaseError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.pool.get()?;

        // Registration rows are append-only; uniqueness of matricule/email is
        // enforced by the registry's normalized scan, not a SQL constraint.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS registrations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                name TEXT NOT NULL,
                matricule TEXT NOT NULL,
                email TEXT NOT NULL,
                github_username TEXT NOT NULL,
                topic TEXT NOT NULL,
                team_number INTEGER NOT NULL,
                sub_project TEXT NOT NULL
            )",
            [],
        )?;

        // Derived team summaries, recomputed incrementally on append
        conn.execute(
            "CREATE TABLE IF NOT EXISTS teams (
                topic TEXT NOT NULL,
                team_number INTEGER NOT NULL,
                member_count INTEGER NOT NULL,
                sub_projects_assigned TEXT NOT NULL,
                PRIMARY KEY (topic, team_number)
            )",
            [],
        )?;

        // Enable WAL mode for better concurrency (PRAGMA returns result, use query)
        let _: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.execute_batch("PRAGMA foreign_keys=ON")?;

        Ok(())
    }

    pub fn get_connection(&self) -> Result<DbConnection, DatabaseError> {
        Ok(self.pool.get()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_new_creates_schema() {
        let dir = tempdir().unwrap();
        let db = Database::new(&dir.path().join("data").join("roster.db")).unwrap();
        let conn = db.get_connection().unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM registrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_open_existing_missing_file() {
        let dir = tempdir().unwrap();
        let result = Database::open_existing(&dir.path().join("absent.db"));
        assert!(matches!(result, Err(DatabaseError::NotFound(_))));
    }

    #[test]
    fn test_open_existing_after_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.db");
        drop(Database::new(&path).unwrap());
        assert!(Database::open_existing(&path).is_ok());
    }
}
