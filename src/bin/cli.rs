//! Roster CLI - Main entry point
//!
//! This binary provides the `roster` tool: the registration API server, the
//! GitHub team sync job, and roster queries.

use anyhow::{anyhow, bail};
use clap::Parser;
use colored::Colorize;
use roster_lib::engine::{
    api::{create_router, ApiState},
    cli::{AuthAction, Cli, Commands, OutputFormat},
    config::{Config, GithubConfig},
    database::Database,
    github::GithubClient,
    keystore::Keystore,
    registry::Registry,
    store::{RegistrationStore, SqliteStore},
    sync::{self, TeamOutcome},
};
use std::path::Path;
use std::sync::Arc;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run_cli(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let project_dir = cli.get_project_dir();
    let json_output = cli.format == OutputFormat::Json;

    match cli.command {
        Commands::Init { name, org } => {
            cmd_init(&name, org.as_deref(), &project_dir, json_output)?;
        }
        Commands::Serve { port, host } => {
            cmd_serve(&project_dir, host.as_deref(), port)?;
        }
        Commands::Sync => {
            cmd_sync(&project_dir, json_output)?;
        }
        Commands::Status { matricule } => {
            cmd_status(&project_dir, &matricule, json_output)?;
        }
        Commands::Availability => {
            cmd_availability(&project_dir, json_output)?;
        }
        Commands::Auth { action } => {
            cmd_auth(action, json_output)?;
        }
    }

    Ok(())
}

fn cmd_init(name: &str, org: Option<&str>, project_dir: &Path, json: bool) -> anyhow::Result<()> {
    let target = project_dir.join(name);
    if target.exists() {
        bail!("Project directory already exists: {}", target.display());
    }

    std::fs::create_dir_all(&target)?;
    std::fs::create_dir_all(target.join("data"))?;

    let mut config = Config::default_for_project(name);
    if let Some(org) = org {
        config.github = Some(GithubConfig {
            org: org.to_string(),
            team_privacy: "closed".to_string(),
            repo_permission: "push".to_string(),
        });
    }
    config.save(&target)?;

    // Initialize an empty registration database
    let db_path = target.join(&config.database.path);
    let _db = Database::new(&db_path)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "project_dir": target.display().to_string(),
                "name": name,
            })
        );
    } else {
        println!("{} Created roster project: {}", "✓".green().bold(), name);
        println!("   📁 {}", target.display());
        if org.is_none() {
            println!(
                "{} No GitHub org configured; add a \"github\" section to roster.config.json before syncing",
                "⚠".yellow().bold()
            );
        }
        println!("\n   Next steps:");
        println!("   cd {}", target.display());
        println!("   roster serve");
    }

    Ok(())
}

#[tokio::main]
async fn cmd_serve(project_dir: &Path, host: Option<&str>, port: Option<u16>) -> anyhow::Result<()> {
    let config = Config::load(project_dir)?;
    let db_path = project_dir.join(&config.database.path);
    let db = Database::new(&db_path)?;

    let store: Arc<dyn RegistrationStore> = Arc::new(SqliteStore::new(db));
    let registry = Arc::new(Registry::new(store));
    let app = create_router(ApiState { registry });

    let host = host.unwrap_or(&config.api.host);
    let port = port.unwrap_or(config.api.port);
    let addr = format!("{}:{}", host, port);

    println!("🚀 Roster API Server");
    println!("   Project: {}", config.project.name);
    println!("   Listening: http://{}", addr);
    println!("   Press Ctrl+C to stop");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn cmd_sync(project_dir: &Path, json: bool) -> anyhow::Result<()> {
    let token = Keystore::get_github_token()
        .map_err(|_| anyhow!("Not authenticated. Run `roster auth set-token` first."))?;

    let config = Config::load(project_dir)?;
    let github = config
        .github
        .as_ref()
        .ok_or_else(|| anyhow!("GitHub is not configured. Add a \"github\" section to roster.config.json."))?;

    // A missing database reads as an error here, not an empty roster
    let db_path = project_dir.join(&config.database.path);
    let db = Database::open_existing(&db_path)?;
    let store = SqliteStore::new(db);

    let client = GithubClient::from_config(github, &token);
    let summary = sync::sync_teams(&store, &client).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("🔗 Syncing teams to GitHub org: {}", github.org);
        for outcome in &summary.outcomes {
            match outcome {
                TeamOutcome::Synced {
                    team,
                    invited,
                    invite_failures,
                    ..
                } => {
                    println!("{} {} ({} invited)", "✓".green().bold(), team, invited);
                    for username in invite_failures {
                        println!("  {} could not invite {}", "⚠".yellow().bold(), username);
                    }
                }
                TeamOutcome::Failed { team, error } => {
                    println!("{} {}: {}", "✗".red().bold(), team, error);
                }
            }
        }
        println!(
            "\nSummary: {} teams processed, {} errors.",
            summary.processed, summary.failed
        );
    }

    Ok(())
}

fn cmd_status(project_dir: &Path, matricule: &str, json: bool) -> anyhow::Result<()> {
    let registry = open_registry(project_dir)?;
    let status = registry.status(matricule)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else if status.registered {
        println!(
            "{} {} is registered",
            "✓".green().bold(),
            status.name.as_deref().unwrap_or(matricule)
        );
        println!("   Topic: {}", status.topic.as_deref().unwrap_or("-"));
        println!(
            "   Team: {}",
            status.team.map(|t| t.to_string()).unwrap_or_default()
        );
        println!("   Sub-project: {}", status.sub_project.as_deref().unwrap_or("-"));
    } else {
        println!("Not registered: {}", matricule);
    }

    Ok(())
}

fn cmd_availability(project_dir: &Path, json: bool) -> anyhow::Result<()> {
    let registry = open_registry(project_dir)?;
    let availability = registry.availability()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&availability)?);
    } else {
        println!("Topic availability:");
        for (topic, open) in &availability {
            if *open {
                println!("{} {} (open)", "✓".green().bold(), topic);
            } else {
                println!("  {} (locked)", topic);
            }
        }
    }

    Ok(())
}

fn cmd_auth(action: AuthAction, json: bool) -> anyhow::Result<()> {
    match action {
        AuthAction::SetToken { token } => {
            Keystore::store_github_token(&token)?;
            if json {
                println!("{}", serde_json::json!({ "success": true }));
            } else {
                println!("{} GitHub token stored in the OS keyring", "✓".green().bold());
            }
        }
        AuthAction::Clear => {
            Keystore::delete_github_token()?;
            if json {
                println!("{}", serde_json::json!({ "success": true }));
            } else {
                println!("{} GitHub token removed", "✓".green().bold());
            }
        }
        AuthAction::Status => {
            let authenticated = Keystore::has_github_token();
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "authenticated": authenticated })
                );
            } else if authenticated {
                println!("{} GitHub token is available", "✓".green().bold());
            } else {
                println!(
                    "{} No GitHub token set. Run `roster auth set-token`.",
                    "⚠".yellow().bold()
                );
            }
        }
    }

    Ok(())
}

/// Registration reads tolerate a missing database (a fresh project simply has
/// no rows yet), so these go through `Database::new`.
fn open_registry(project_dir: &Path) -> anyhow::Result<Registry> {
    let config = Config::load(project_dir)?;
    let db_path = project_dir.join(&config.database.path);
    let db = Database::new(&db_path)?;
    let store: Arc<dyn RegistrationStore> = Arc::new(SqliteStore::new(db));
    Ok(Registry::new(store))
}
