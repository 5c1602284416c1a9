use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use github::GitHubClient;
use orchestrator::{
    DiffProvider, OrchestratorError, RunOutcome, Snapshot, StaticDiff, Step, SyncObserver,
    SyncRunner, TrackerDiff,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use sync_core::{PrMapping, SyncConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vcs::GitExporter;

const DEFAULT_CONFIG: &str = "config.json";
const DEFAULT_DB: &str = "pr_db.json";

#[derive(Parser)]
#[command(name = "wpt-sync")]
#[command(about = "Sync web-platform-tests changes to the upstream repository", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (.json or .toml)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle one pull request event and persist the updated mapping
    Run {
        /// Webhook payload (JSON)
        #[arg(short, long)]
        payload: PathBuf,

        #[arg(long, default_value = DEFAULT_DB)]
        db: PathBuf,

        /// Use this diff instead of downloading the pull request's diff_url
        #[arg(long)]
        diff: Option<PathBuf>,

        #[arg(long)]
        dry_run: bool,
    },
    /// Print the steps an event would produce without running them
    Plan {
        #[arg(short, long)]
        payload: PathBuf,

        #[arg(long, default_value = DEFAULT_DB)]
        db: PathBuf,

        #[arg(long)]
        diff: Option<PathBuf>,
    },
    /// Re-run a recorded error snapshot
    Replay {
        snapshot: PathBuf,

        /// Perform the network and git side effects instead of a dry run
        #[arg(long)]
        live: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            payload,
            db,
            diff,
            dry_run,
        } => run(&cli.config, &payload, &db, diff.as_deref(), dry_run).await,
        Commands::Plan { payload, db, diff } => {
            plan(&cli.config, &payload, &db, diff.as_deref()).await
        }
        Commands::Replay { snapshot, live } => replay(&cli.config, &snapshot, live).await,
    }
}

async fn load_config(path: &Path) -> Result<SyncConfig> {
    SyncConfig::from_file(path)
        .await
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

async fn load_payload(path: &Path) -> Result<Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read payload {}", path.display()))?;
    serde_json::from_str(&content).context("Payload is not valid JSON")
}

/// A missing mapping file is an empty mapping.
async fn load_mapping(path: &Path) -> Result<PrMapping> {
    if !path.exists() {
        return Ok(PrMapping::new());
    }
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read mapping {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Mapping {} is not valid JSON", path.display()))
}

async fn save_mapping(path: &Path, mapping: &PrMapping) -> Result<()> {
    let content = serde_json::to_string_pretty(mapping)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write mapping {}", path.display()))?;
    tracing::info!(path = %path.display(), entries = mapping.len(), "Mapping saved");
    Ok(())
}

async fn load_diff(path: Option<&Path>) -> Result<Option<StaticDiff>> {
    match path {
        Some(p) => {
            let content = tokio::fs::read_to_string(p)
                .await
                .with_context(|| format!("Failed to read diff {}", p.display()))?;
            Ok(Some(StaticDiff(content)))
        }
        None => Ok(None),
    }
}

/// Prints each step as it starts and where the snapshot of a failure went.
struct ConsoleObserver;

impl SyncObserver for ConsoleObserver {
    fn on_step(&mut self, step: &dyn Step) {
        println!("  {} {}", "→".cyan(), step.label());
    }

    fn on_error(&mut self, snapshot: Option<&Path>, error: &OrchestratorError) {
        println!("  {} {}", "✗".red(), error);
        match snapshot {
            Some(dir) => println!("  Snapshot: {}", dir.display().to_string().yellow()),
            None => println!("  {}", "No snapshot could be written".red()),
        }
    }
}

fn report(outcome: &RunOutcome) -> Result<()> {
    match outcome {
        RunOutcome::Success { executed } => {
            println!();
            println!("{} ({} steps)", "Sync completed".green(), executed.len());
            Ok(())
        }
        RunOutcome::Failed { error, .. } => {
            println!();
            bail!("Sync failed: {}", error.trim_end())
        }
    }
}

async fn run(
    config_path: &Path,
    payload_path: &Path,
    db_path: &Path,
    diff_path: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let config = load_config(config_path).await?;
    let payload = load_payload(payload_path).await?;
    let mut mapping = load_mapping(db_path).await?;
    let fixed_diff = load_diff(diff_path).await?;

    let client = GitHubClient::from_config(&config).context("Failed to create GitHub client")?;
    let exporter = GitExporter::from_config(&config);
    let live_diff = TrackerDiff::new(&client);
    let diffs: &dyn DiffProvider = match &fixed_diff {
        Some(d) => d,
        None => &live_diff,
    };

    if dry_run {
        println!("{}", "Dry run: no network or git changes".yellow());
    }

    let outcome = SyncRunner::new(&config, &client, &exporter)
        .run(&mut mapping, &payload, diffs, dry_run, &mut ConsoleObserver)
        .await;

    // Mutations made before a failure reflect confirmed upstream state.
    if !dry_run {
        save_mapping(db_path, &mapping).await?;
    }

    report(&outcome)
}

async fn plan(
    config_path: &Path,
    payload_path: &Path,
    db_path: &Path,
    diff_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path).await?;
    let payload = load_payload(payload_path).await?;
    let mapping = load_mapping(db_path).await?;
    let fixed_diff = load_diff(diff_path).await?;

    let client = GitHubClient::from_config(&config).context("Failed to create GitHub client")?;
    let exporter = GitExporter::from_config(&config);
    let live_diff = TrackerDiff::new(&client);
    let diffs: &dyn DiffProvider = match &fixed_diff {
        Some(d) => d,
        None => &live_diff,
    };

    let plan = SyncRunner::new(&config, &client, &exporter)
        .plan(&payload, &mapping, diffs)
        .await
        .context("Planning failed")?;

    if plan.is_empty() {
        println!("Nothing to do.");
        return Ok(());
    }

    println!("Planned steps:");
    for (i, label) in plan.labels().iter().enumerate() {
        println!("  {}. {}", i + 1, label);
    }
    Ok(())
}

async fn replay(config_path: &Path, snapshot_dir: &Path, live: bool) -> Result<()> {
    let config = load_config(config_path).await?;
    let snapshot = Snapshot::load(snapshot_dir)
        .await
        .with_context(|| format!("Failed to load snapshot {}", snapshot_dir.display()))?;

    println!("Replaying {}", snapshot_dir.display());
    println!("Recorded failure:");
    for line in snapshot.exception.lines() {
        println!("  {}", line.dimmed());
    }
    println!();

    let client = GitHubClient::from_config(&config).context("Failed to create GitHub client")?;
    let exporter = GitExporter::from_config(&config);
    let diffs = StaticDiff(snapshot.diff.clone());
    let mut mapping = snapshot.mapping.clone();

    let outcome = SyncRunner::new(&config, &client, &exporter)
        .run(&mut mapping, &snapshot.payload, &diffs, !live, &mut ConsoleObserver)
        .await;

    println!();
    println!("Executed steps:");
    for name in outcome.executed() {
        println!("  {}", name);
    }

    report(&outcome)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wpt_sync=info,orchestrator=info,vcs=info,github=info".into()),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_mapping_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let mapping = load_mapping(&temp_dir.path().join("pr_db.json"))
            .await
            .unwrap();
        assert!(mapping.is_empty());
    }

    #[tokio::test]
    async fn test_mapping_survives_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pr_db.json");
        let mut mapping = PrMapping::new();
        mapping.insert("19623", 8123);

        save_mapping(&path, &mapping).await.unwrap();

        assert_eq!(load_mapping(&path).await.unwrap(), mapping);
    }

    #[tokio::test]
    async fn test_corrupt_mapping_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pr_db.json");
        std::fs::write(&path, "not json").unwrap();

        let err = load_mapping(&path).await.unwrap_err();
        assert!(err.to_string().contains("is not valid JSON"));
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::parse_from([
            "wpt-sync",
            "--config",
            "sync.toml",
            "run",
            "--payload",
            "event.json",
            "--dry-run",
        ]);
        assert_eq!(cli.config, PathBuf::from("sync.toml"));
        match cli.command {
            Commands::Run {
                payload,
                db,
                diff,
                dry_run,
            } => {
                assert_eq!(payload, PathBuf::from("event.json"));
                assert_eq!(db, PathBuf::from(DEFAULT_DB));
                assert!(diff.is_none());
                assert!(dry_run);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_cli_parses_replay() {
        let cli = Cli::parse_from(["wpt-sync", "replay", "error-snapshot-1", "--live"]);
        assert!(matches!(
            cli.command,
            Commands::Replay { live: true, .. }
        ));
    }
}
