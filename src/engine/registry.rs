//! Registration Rules
//! Balanced topic admission, duplicate detection, and team slotting

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::engine::catalog::{self, TEAM_SIZE};
use crate::engine::store::{Registration, RegistrationStore, StoreError};

/// Bounded wait for the registration critical section.
const LOCK_WAIT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("This Matricule is already registered. You cannot register twice.")]
    DuplicateMatricule,
    #[error("This Email is already registered. You cannot register twice.")]
    DuplicateEmail,
    #[error("This topic is temporarily locked. Please choose another topic to balance the groups.")]
    TopicLocked,
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Registration is busy right now. Please try again in a moment.")]
    Busy,
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// A registration submission, as received from the form.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub selected_topic: String,
    pub matricule: String,
    pub email: String,
    pub full_name: String,
    pub github_username: String,
}

/// The computed assignment returned on success.
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub topic: String,
    pub team_number: u32,
    pub sub_project: String,
}

/// Result of a status lookup by matricule.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStatus {
    pub registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_project: Option<String>,
}

impl StudentStatus {
    fn not_registered() -> Self {
        Self {
            registered: false,
            name: None,
            topic: None,
            team: None,
            sub_project: None,
        }
    }

    fn registered(row: Registration) -> Self {
        Self {
            registered: true,
            name: Some(row.name),
            topic: Some(row.topic),
            team: Some(row.team_number),
            sub_project: Some(row.sub_project),
        }
    }
}

/// Registration rules over a shared store. A single process-wide mutex
/// serializes the read-check-append sequence so concurrent submissions can
/// never compute the same team slot or race past each other's duplicate
/// check. The guard is dropped on every exit path.
pub struct Registry {
    store: Arc<dyn RegistrationStore>,
    write_lock: Mutex<()>,
}

impl Registry {
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Per-topic openness under the balanced-selection rule: a topic is open
    /// iff its count is at the current minimum across all topics. With zero
    /// registrations every topic is open. Rows with a topic outside the
    /// catalog are ignored.
    pub fn availability(&self) -> Result<BTreeMap<&'static str, bool>, RegistryError> {
        let rows = self.store.scan()?;
        Ok(Self::availability_of(&rows))
    }

    fn availability_of(rows: &[Registration]) -> BTreeMap<&'static str, bool> {
        let mut counts: BTreeMap<&'static str, usize> =
            catalog::names().map(|name| (name, 0)).collect();
        for row in rows {
            if let Some(count) = counts.get_mut(row.topic.as_str()) {
                *count += 1;
            }
        }

        let min = counts.values().copied().min().unwrap_or(0);
        counts
            .into_iter()
            .map(|(name, count)| (name, count <= min))
            .collect()
    }

    /// Validate and accept a submission, returning the computed assignment.
    ///
    /// The whole sequence runs under the write lock with a 30s bounded wait;
    /// a timeout surfaces as [`RegistryError::Busy`].
    pub async fn register(&self, req: RegistrationRequest) -> Result<Assignment, RegistryError> {
        let _guard = tokio::time::timeout(LOCK_WAIT, self.write_lock.lock())
            .await
            .map_err(|_| RegistryError::Busy)?;

        let matricule = req.matricule.trim().to_uppercase();
        let email = req.email.trim().to_lowercase();
        let full_name = req.full_name.trim().to_string();
        let github_username = req.github_username.trim().to_string();

        if matricule.is_empty() {
            return Err(RegistryError::MissingField("matricule"));
        }
        if email.is_empty() {
            return Err(RegistryError::MissingField("email"));
        }
        if full_name.is_empty() {
            return Err(RegistryError::MissingField("fullName"));
        }
        if github_username.is_empty() {
            return Err(RegistryError::MissingField("githubUsername"));
        }

        let topic = catalog::find(req.selected_topic.trim())
            .ok_or_else(|| RegistryError::UnknownTopic(req.selected_topic.trim().to_string()))?;

        let rows = self.store.scan()?;
        for row in &rows {
            if row.matricule.trim().to_uppercase() == matricule {
                return Err(RegistryError::DuplicateMatricule);
            }
            if row.email.trim().to_lowercase() == email {
                return Err(RegistryError::DuplicateEmail);
            }
        }

        let availability = Self::availability_of(&rows);
        if !availability.get(topic.name).copied().unwrap_or(true) {
            return Err(RegistryError::TopicLocked);
        }

        // Team number is 1-based: first 3 students form Team 1, next 3 Team 2.
        // Position within the team selects the sub-project.
        let topic_count = rows.iter().filter(|r| r.topic == topic.name).count();
        let team_number = (topic_count / TEAM_SIZE) as u32 + 1;
        let position = topic_count % TEAM_SIZE;
        let sub_project = topic.sub_projects[position];

        let row = Registration {
            timestamp: Utc::now(),
            name: full_name,
            matricule,
            email,
            github_username,
            topic: topic.name.to_string(),
            team_number,
            sub_project: sub_project.to_string(),
        };
        self.store.append(&row)?;
        self.store
            .upsert_team_summary(topic.name, team_number, &topic.sub_projects.join(", "))?;

        info!(
            topic = topic.name,
            team = team_number,
            sub_project, "registration accepted"
        );

        Ok(Assignment {
            topic: topic.name.to_string(),
            team_number,
            sub_project: sub_project.to_string(),
        })
    }

    /// Look up a student by matricule, case-insensitively.
    pub fn status(&self, matricule: &str) -> Result<StudentStatus, RegistryError> {
        let needle = matricule.trim().to_uppercase();
        for row in self.store.scan()? {
            if row.matricule.trim().to_uppercase() == needle {
                return Ok(StudentStatus::registered(row));
            }
        }
        Ok(StudentStatus::not_registered())
    }
}
