use async_trait::async_trait;
use chrono::Utc;
use roster_lib::engine::github::{GithubError, TeamDirectory, TeamHandle};
use roster_lib::engine::store::{Registration, RegistrationStore, SqliteStore};
use roster_lib::engine::sync::{self, TeamOutcome};
use std::collections::HashSet;
use std::sync::Mutex;

/// Recording fake for the org directory. Create-team behaves like the real
/// API: a second create with the same name reports a conflict resolved to the
/// existing team.
#[derive(Default)]
struct FakeDirectory {
    created: Mutex<Vec<(String, String)>>,
    members: Mutex<Vec<(String, String)>>,
    grants: Mutex<Vec<(String, String)>>,
    fail_invites: HashSet<String>,
    fail_grants: HashSet<String>,
}

fn slug_of(name: &str) -> String {
    name.to_lowercase()
}

#[async_trait]
impl TeamDirectory for FakeDirectory {
    async fn create_team(&self, name: &str, description: &str) -> Result<TeamHandle, GithubError> {
        let mut created = self.created.lock().unwrap();
        if created.iter().any(|(n, _)| n == name) {
            return Ok(TeamHandle {
                slug: slug_of(name),
                already_existed: true,
            });
        }
        created.push((name.to_string(), description.to_string()));
        Ok(TeamHandle {
            slug: slug_of(name),
            already_existed: false,
        })
    }

    async fn add_team_member(&self, team_slug: &str, username: &str) -> Result<(), GithubError> {
        if self.fail_invites.contains(username) {
            return Err(GithubError::ApiError(format!("Could not add {}: 404", username)));
        }
        self.members
            .lock()
            .unwrap()
            .push((team_slug.to_string(), username.to_string()));
        Ok(())
    }

    async fn grant_repo_access(&self, team_slug: &str, repo: &str) -> Result<(), GithubError> {
        if self.fail_grants.contains(repo) {
            return Err(GithubError::ApiError(format!(
                "Failed to grant access to {}: 403",
                repo
            )));
        }
        self.grants
            .lock()
            .unwrap()
            .push((team_slug.to_string(), repo.to_string()));
        Ok(())
    }
}

fn row(matricule: &str, topic: &str, team_number: u32, sub_project: &str) -> Registration {
    Registration {
        timestamp: Utc::now(),
        name: format!("Student {}", matricule),
        matricule: matricule.to_string(),
        email: format!("{}@univ-dschang.example", matricule.to_lowercase()),
        github_username: format!("gh-{}", matricule.to_lowercase()),
        topic: topic.to_string(),
        team_number,
        sub_project: sub_project.to_string(),
    }
}

/// Two complete teams in two topics.
fn seeded_store() -> SqliteStore {
    let store = SqliteStore::in_memory().unwrap();
    for (i, sub) in [
        "Student_A_Pothole_Detector",
        "Student_B_Cocoa_Pod_Counter",
        "Student_C_Cassava_Disease_Classifier",
    ]
    .iter()
    .enumerate()
    {
        store
            .append(&row(&format!("CV{}", i), "Group_01_Computer_Vision", 1, sub))
            .unwrap();
    }
    for (i, sub) in [
        "Student_A_Pidgin_Translator",
        "Student_B_Yemba_Autocorrect",
        "Student_C_Dschang_Chatbot",
    ]
    .iter()
    .enumerate()
    {
        store
            .append(&row(&format!("NLP{}", i), "Group_02_NLP", 1, sub))
            .unwrap();
    }
    store
}

#[tokio::test]
async fn test_sync_provisions_teams_members_and_grants() {
    let store = seeded_store();
    let directory = FakeDirectory::default();

    let summary = sync::sync_teams(&store, &directory).await.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 0);

    let created = directory.created.lock().unwrap();
    let names: Vec<&str> = created.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["Team-1-A-Pothole-Detector", "Team-1-A-Pidgin-Translator"]);
    assert_eq!(
        created[0].1,
        "Students working on Student_A_Pothole_Detector"
    );

    let members = directory.members.lock().unwrap();
    assert_eq!(members.len(), 6);
    assert!(members.contains(&(
        "team-1-a-pothole-detector".to_string(),
        "gh-cv0".to_string()
    )));

    let grants = directory.grants.lock().unwrap();
    assert_eq!(grants.len(), 2);
    assert!(grants.contains(&(
        "team-1-a-pothole-detector".to_string(),
        "M2-IA-Group_01_Computer_Vision".to_string()
    )));
    assert!(grants.contains(&(
        "team-1-a-pidgin-translator".to_string(),
        "M2-IA-Group_02_NLP".to_string()
    )));
}

#[tokio::test]
async fn test_sync_rerun_is_idempotent() {
    let store = seeded_store();
    let directory = FakeDirectory::default();

    sync::sync_teams(&store, &directory).await.unwrap();
    let teams_after_first = directory.created.lock().unwrap().len();

    // Second run with no new registrations: the name conflict resolves to the
    // existing teams instead of duplicating them, and both teams still succeed
    let summary = sync::sync_teams(&store, &directory).await.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(directory.created.lock().unwrap().len(), teams_after_first);

    // Grants are PUTs against the same (team, repo) pairs
    let grants = directory.grants.lock().unwrap();
    let unique: HashSet<_> = grants.iter().collect();
    assert_eq!(unique.len(), 2);
}

#[tokio::test]
async fn test_invite_failure_is_not_fatal() {
    let store = seeded_store();
    let directory = FakeDirectory {
        fail_invites: HashSet::from(["gh-cv1".to_string()]),
        ..Default::default()
    };

    let summary = sync::sync_teams(&store, &directory).await.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 0);

    let cv_outcome = summary
        .outcomes
        .iter()
        .find(|o| o.team() == "Team-1-A-Pothole-Detector")
        .unwrap();
    match cv_outcome {
        TeamOutcome::Synced {
            invited,
            invite_failures,
            ..
        } => {
            assert_eq!(*invited, 2);
            assert_eq!(invite_failures, &["gh-cv1".to_string()]);
        }
        TeamOutcome::Failed { .. } => panic!("invite failure must not fail the team"),
    }

    // The repository grant still went through for the affected team
    let grants = directory.grants.lock().unwrap();
    assert!(grants.contains(&(
        "team-1-a-pothole-detector".to_string(),
        "M2-IA-Group_01_Computer_Vision".to_string()
    )));
}

#[tokio::test]
async fn test_grant_failure_fails_that_team_only() {
    let store = seeded_store();
    let directory = FakeDirectory {
        fail_grants: HashSet::from(["M2-IA-Group_01_Computer_Vision".to_string()]),
        ..Default::default()
    };

    let summary = sync::sync_teams(&store, &directory).await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 1);

    let failed = summary
        .outcomes
        .iter()
        .find(|o| matches!(o, TeamOutcome::Failed { .. }))
        .unwrap();
    assert_eq!(failed.team(), "Team-1-A-Pothole-Detector");

    // The other team was fully processed
    let grants = directory.grants.lock().unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].1, "M2-IA-Group_02_NLP");
}

#[tokio::test]
async fn test_unmapped_topic_fails_that_team() {
    let store = seeded_store();
    store
        .append(&row("X0", "Group_99_Quantum", 1, "Student_A_Qubit_Counter"))
        .unwrap();
    let directory = FakeDirectory::default();

    let summary = sync::sync_teams(&store, &directory).await.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 1);

    let failed = summary
        .outcomes
        .iter()
        .find(|o| matches!(o, TeamOutcome::Failed { .. }))
        .unwrap();
    match failed {
        TeamOutcome::Failed { error, .. } => {
            assert!(error.contains("No repository mapped"));
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_empty_roster_syncs_nothing() {
    let store = SqliteStore::in_memory().unwrap();
    let directory = FakeDirectory::default();

    let summary = sync::sync_teams(&store, &directory).await.unwrap();
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.failed, 0);
    assert!(directory.created.lock().unwrap().is_empty());
}
