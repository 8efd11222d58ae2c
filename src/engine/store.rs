//! Registration Storage
//! Append-only registration rows plus the derived team summary table

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::Serialize;
use thiserror::Error;

use crate::engine::database::{Database, DatabaseError};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// One accepted registration. Rows are appended in submission order and
/// never mutated or deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub matricule: String,
    pub email: String,
    pub github_username: String,
    pub topic: String,
    pub team_number: u32,
    pub sub_project: String,
}

/// Cached per-team summary, maintained incrementally as rows are appended.
/// Derived data only; the registrations table stays authoritative.
#[derive(Debug, Clone, Serialize)]
pub struct TeamSummary {
    pub topic: String,
    pub team_number: u32,
    pub member_count: u32,
    pub sub_projects_assigned: String,
}

/// Storage abstraction over the registration table. Implementations must
/// preserve insertion order on scan.
pub trait RegistrationStore: Send + Sync {
    /// Append one row.
    fn append(&self, row: &Registration) -> Result<(), StoreError>;

    /// All rows, in insertion order.
    fn scan(&self) -> Result<Vec<Registration>, StoreError>;

    /// Insert-or-increment the (topic, team) summary row.
    fn upsert_team_summary(
        &self,
        topic: &str,
        team_number: u32,
        sub_projects: &str,
    ) -> Result<(), StoreError>;

    /// All team summaries, ordered by topic then team number.
    fn team_summaries(&self) -> Result<Vec<TeamSummary>, StoreError>;
}

pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(Database::in_memory()?))
    }
}

impl RegistrationStore for SqliteStore {
    fn append(&self, row: &Registration) -> Result<(), StoreError> {
        let conn = self.db.get_connection()?;
        conn.execute(
            "INSERT INTO registrations
                (timestamp, name, matricule, email, github_username, topic, team_number, sub_project)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.timestamp.to_rfc3339(),
                row.name,
                row.matricule,
                row.email,
                row.github_username,
                row.topic,
                row.team_number,
                row.sub_project,
            ],
        )?;
        Ok(())
    }

    fn scan(&self) -> Result<Vec<Registration>, StoreError> {
        let conn = self.db.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT timestamp, name, matricule, email, github_username, topic, team_number, sub_project
             FROM registrations ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let ts: String = row.get(0)?;
                let timestamp = DateTime::parse_from_rfc3339(&ts)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            0,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                Ok(Registration {
                    timestamp,
                    name: row.get(1)?,
                    matricule: row.get(2)?,
                    email: row.get(3)?,
                    github_username: row.get(4)?,
                    topic: row.get(5)?,
                    team_number: row.get(6)?,
                    sub_project: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<Registration>, _>>()?;
        Ok(rows)
    }

    fn upsert_team_summary(
        &self,
        topic: &str,
        team_number: u32,
        sub_projects: &str,
    ) -> Result<(), StoreError> {
        let conn = self.db.get_connection()?;
        conn.execute(
            "INSERT INTO teams (topic, team_number, member_count, sub_projects_assigned)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT (topic, team_number)
             DO UPDATE SET member_count = member_count + 1",
            params![topic, team_number, sub_projects],
        )?;
        Ok(())
    }

    fn team_summaries(&self) -> Result<Vec<TeamSummary>, StoreError> {
        let conn = self.db.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT topic, team_number, member_count, sub_projects_assigned
             FROM teams ORDER BY topic, team_number",
        )?;
        let summaries = stmt
            .query_map([], |row| {
                Ok(TeamSummary {
                    topic: row.get(0)?,
                    team_number: row.get(1)?,
                    member_count: row.get(2)?,
                    sub_projects_assigned: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<TeamSummary>, _>>()?;
        Ok(summaries)
    }
}
