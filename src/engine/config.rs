//! Roster Configuration Module
//! Handles loading and validating roster.config.json

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Invalid config format: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub project: ProjectConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub github: Option<GithubConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

/// GitHub org settings for the team sync job. The access token is supplied
/// out-of-band (keyring or environment), never through this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    pub org: String,
    #[serde(default = "default_team_privacy")]
    pub team_privacy: String,
    #[serde(default = "default_repo_permission")]
    pub repo_permission: String,
}

fn default_port() -> u16 {
    8642
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_team_privacy() -> String {
    "closed".to_string()
}

fn default_repo_permission() -> String {
    "push".to_string()
}

impl Config {
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = project_dir.join("roster.config.json");
        if !config_path.exists() {
            return Err(ConfigError::NotFound(config_path));
        }
        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, project_dir: &Path) -> Result<(), ConfigError> {
        let config_path = project_dir.join("roster.config.json");
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn default_for_project(name: &str) -> Self {
        Self {
            version: "0.1.0".to_string(),
            project: ProjectConfig {
                name: name.to_string(),
                id: format!("roster-{}", name),
            },
            database: DatabaseConfig {
                path: PathBuf::from("./data/roster.db"),
            },
            api: ApiConfig {
                port: default_port(),
                host: default_host(),
            },
            github: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let mut config = Config::default_for_project("m2-ia");
        config.github = Some(GithubConfig {
            org: "M2-UDS-2025-2026-IA".to_string(),
            team_privacy: default_team_privacy(),
            repo_permission: default_repo_permission(),
        });
        config.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.project.name, "m2-ia");
        assert_eq!(loaded.github.unwrap().org, "M2-UDS-2025-2026-IA");
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_github_defaults() {
        let json = r#"{"org": "my-org"}"#;
        let github: GithubConfig = serde_json::from_str(json).unwrap();
        assert_eq!(github.team_privacy, "closed");
        assert_eq!(github.repo_permission, "push");
    }
}
