//! Roster GitHub Integration Module
//! Org team management over the GitHub REST API

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::config::GithubConfig;

const GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Error, Debug)]
pub enum GithubError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Team not found: {0}")]
    TeamNotFound(String),
}

/// Handle to an org team, resolved either by creating it or by looking up an
/// existing team with the same name.
#[derive(Debug, Clone)]
pub struct TeamHandle {
    pub slug: String,
    pub already_existed: bool,
}

/// The three org operations the sync job needs. Behind a trait so tests can
/// run the job against a recording fake.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    /// Create the team, or resolve the existing one on a name conflict.
    async fn create_team(&self, name: &str, description: &str) -> Result<TeamHandle, GithubError>;

    /// Invite a user to the team. Callers treat a failure as non-fatal.
    async fn add_team_member(&self, team_slug: &str, username: &str) -> Result<(), GithubError>;

    /// Grant the team access to an org repository.
    async fn grant_repo_access(&self, team_slug: &str, repo: &str) -> Result<(), GithubError>;
}

#[derive(Debug, Serialize)]
struct CreateTeamRequest {
    name: String,
    description: String,
    privacy: String,
}

#[derive(Debug, Serialize)]
struct TeamMembershipRequest {
    role: String,
}

#[derive(Debug, Serialize)]
struct RepoPermissionRequest {
    permission: String,
}

#[derive(Debug, Deserialize)]
struct TeamResponse {
    name: String,
    slug: String,
}

pub struct GithubClient {
    token: String,
    org: String,
    team_privacy: String,
    repo_permission: String,
    http_client: reqwest::Client,
}

impl GithubClient {
    pub fn new(org: &str, token: &str) -> Self {
        Self {
            token: token.to_string(),
            org: org.to_string(),
            team_privacy: "closed".to_string(),
            repo_permission: "push".to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &GithubConfig, token: &str) -> Self {
        Self {
            token: token.to_string(),
            org: config.org.clone(),
            team_privacy: config.team_privacy.clone(),
            repo_permission: config.repo_permission.clone(),
            http_client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(USER_AGENT, "roster")
            .header(ACCEPT, "application/vnd.github+json")
    }

    /// Resolve the slug of an existing team by its display name.
    async fn find_team_slug(&self, team_name: &str) -> Result<String, GithubError> {
        let response = self
            .request(
                reqwest::Method::GET,
                format!("{}/orgs/{}/teams", GITHUB_API_URL, self.org),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GithubError::ApiError(format!(
                "Failed to list teams: {}",
                response.status()
            )));
        }

        let teams: Vec<TeamResponse> = response.json().await?;
        teams
            .into_iter()
            .find(|t| t.name == team_name)
            .map(|t| t.slug)
            .ok_or_else(|| GithubError::TeamNotFound(team_name.to_string()))
    }
}

#[async_trait]
impl TeamDirectory for GithubClient {
    async fn create_team(&self, name: &str, description: &str) -> Result<TeamHandle, GithubError> {
        let request = CreateTeamRequest {
            name: name.to_string(),
            description: description.to_string(),
            privacy: self.team_privacy.clone(),
        };

        let response = self
            .request(
                reqwest::Method::POST,
                format!("{}/orgs/{}/teams", GITHUB_API_URL, self.org),
            )
            .json(&request)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => {
                let team: TeamResponse = response.json().await?;
                Ok(TeamHandle {
                    slug: team.slug,
                    already_existed: false,
                })
            }
            // Name collision: the team exists, resolve its slug instead
            StatusCode::UNPROCESSABLE_ENTITY => {
                let slug = self.find_team_slug(name).await?;
                Ok(TeamHandle {
                    slug,
                    already_existed: true,
                })
            }
            _ => {
                let error_text = response.text().await.unwrap_or_default();
                Err(GithubError::ApiError(format!(
                    "Failed to create team {}: {}",
                    name, error_text
                )))
            }
        }
    }

    async fn add_team_member(&self, team_slug: &str, username: &str) -> Result<(), GithubError> {
        let request = TeamMembershipRequest {
            role: "member".to_string(),
        };

        let response = self
            .request(
                reqwest::Method::PUT,
                format!(
                    "{}/orgs/{}/teams/{}/memberships/{}",
                    GITHUB_API_URL, self.org, team_slug, username
                ),
            )
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GithubError::ApiError(format!(
                "Could not add {}: {}",
                username, error_text
            )));
        }

        Ok(())
    }

    async fn grant_repo_access(&self, team_slug: &str, repo: &str) -> Result<(), GithubError> {
        let request = RepoPermissionRequest {
            permission: self.repo_permission.clone(),
        };

        let response = self
            .request(
                reqwest::Method::PUT,
                format!(
                    "{}/orgs/{}/teams/{}/repos/{}/{}",
                    GITHUB_API_URL, self.org, team_slug, self.org, repo
                ),
            )
            .json(&request)
            .send()
            .await?;

        if response.status() != StatusCode::NO_CONTENT {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GithubError::ApiError(format!(
                "Failed to grant access to {}: {}",
                repo, error_text
            )));
        }

        Ok(())
    }
}
