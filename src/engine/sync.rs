//! Team Sync Module
//! Reconciles the registration roster with GitHub org teams

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::engine::catalog;
use crate::engine::github::{GithubError, TeamDirectory};
use crate::engine::store::{Registration, RegistrationStore, StoreError};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
enum TeamSyncError {
    #[error("No repository mapped for topic {0}")]
    UnmappedTopic(String),
    #[error(transparent)]
    Github(#[from] GithubError),
}

/// One team's roster, grouped from the registration table.
#[derive(Debug, Clone)]
pub struct TeamRoster {
    pub topic: String,
    pub team_number: u32,
    pub sub_project: String,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub github_username: String,
    pub email: String,
}

/// Outcome for a single team. A failed repository grant fails the team; a
/// failed member invite does not.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TeamOutcome {
    Synced {
        team: String,
        slug: String,
        invited: usize,
        invite_failures: Vec<String>,
    },
    Failed {
        team: String,
        error: String,
    },
}

impl TeamOutcome {
    pub fn team(&self) -> &str {
        match self {
            TeamOutcome::Synced { team, .. } => team,
            TeamOutcome::Failed { team, .. } => team,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct SyncSummary {
    pub processed: usize,
    pub failed: usize,
    pub outcomes: Vec<TeamOutcome>,
}

/// External team name: `Team-{n}-{sub-project}` with the student prefix
/// stripped and underscores dashed.
pub fn team_name(team_number: u32, sub_project: &str) -> String {
    format!(
        "Team-{}-{}",
        team_number,
        sub_project.replace("Student_", "").replace('_', "-")
    )
}

/// Group rows by (topic, team number), preserving member insertion order
/// within each team.
pub fn group_by_team(rows: &[Registration]) -> Vec<TeamRoster> {
    let mut teams: BTreeMap<(String, u32), TeamRoster> = BTreeMap::new();

    for row in rows {
        let key = (row.topic.clone(), row.team_number);
        let roster = teams.entry(key).or_insert_with(|| TeamRoster {
            topic: row.topic.clone(),
            team_number: row.team_number,
            sub_project: row.sub_project.clone(),
            members: Vec::new(),
        });
        roster.members.push(Member {
            name: row.name.clone(),
            github_username: row.github_username.clone(),
            email: row.email.clone(),
        });
    }

    teams.into_values().collect()
}

/// Run the sync job: create or resolve one org team per (topic, team),
/// invite its members, and grant it access to the topic's repository.
///
/// Teams are processed sequentially and independently; one team's failure
/// never blocks the rest. Not safe to run concurrently with itself; callers
/// must serialize runs.
pub async fn sync_teams(
    store: &dyn RegistrationStore,
    directory: &dyn TeamDirectory,
) -> Result<SyncSummary, SyncError> {
    let rows = store.scan()?;
    let teams = group_by_team(&rows);
    info!(teams = teams.len(), "starting team sync");

    let mut summary = SyncSummary::default();
    for team in &teams {
        let name = team_name(team.team_number, &team.sub_project);
        match sync_one_team(directory, team, &name).await {
            Ok(outcome) => {
                info!(team = %name, "team synced");
                summary.processed += 1;
                summary.outcomes.push(outcome);
            }
            Err(e) => {
                warn!(team = %name, error = %e, "team sync failed");
                summary.failed += 1;
                summary.outcomes.push(TeamOutcome::Failed {
                    team: name,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        processed = summary.processed,
        failed = summary.failed,
        "team sync finished"
    );
    Ok(summary)
}

async fn sync_one_team(
    directory: &dyn TeamDirectory,
    team: &TeamRoster,
    name: &str,
) -> Result<TeamOutcome, TeamSyncError> {
    let repo = catalog::find(&team.topic)
        .map(|t| t.repo)
        .ok_or_else(|| TeamSyncError::UnmappedTopic(team.topic.clone()))?;

    let description = format!("Students working on {}", team.sub_project);
    let handle = directory.create_team(name, &description).await?;
    if handle.already_existed {
        info!(team = %name, slug = %handle.slug, "team already exists, reusing");
    }

    // Invites are best-effort: a nonexistent username must not abort the team
    let mut invite_failures = Vec::new();
    for member in &team.members {
        if let Err(e) = directory
            .add_team_member(&handle.slug, &member.github_username)
            .await
        {
            warn!(
                username = %member.github_username,
                error = %e,
                "could not invite member (may not exist or already invited)"
            );
            invite_failures.push(member.github_username.clone());
        }
    }

    directory.grant_repo_access(&handle.slug, repo).await?;

    Ok(TeamOutcome::Synced {
        team: name.to_string(),
        slug: handle.slug,
        invited: team.members.len() - invite_failures.len(),
        invite_failures,
    })
}
