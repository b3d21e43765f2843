#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clawgate::security::{scrub, WorkspaceGuard};
use clawgate::tools::validate_url;
use clawgate::{Config, PolicyDecision};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::{fmt, EnvFilter};

/// `clawgate` - inspect and exercise the tool execution guards.
#[derive(Parser, Debug)]
#[command(name = "clawgate")]
#[command(version)]
#[command(about = "Policy, workspace and SSRF checks for agent tool calls.", long_about = None)]
struct Cli {
    /// Path to config.toml (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify filesystem paths against the workspace guard
    #[command(long_about = "\
Classify filesystem paths against the workspace guard.

Prints one `path<TAB>decision` line per argument. Exits with status 1 \
if any path is denied.

Examples:
  clawgate check-path ~/ws/src/main.rs
  clawgate check-path --resolve ~/ws/link/out")]
    CheckPath {
        #[arg(required = true)]
        paths: Vec<String>,
        /// Also resolve symlinks on the real filesystem
        #[arg(long)]
        resolve: bool,
    },
    /// Check whether a URL points at a public destination
    CheckUrl { url: String },
    /// Evaluate the tool policy for a tool name
    Evaluate { tool: String },
    /// Redact credentials from stdin and write the result to stdout
    Scrub,
    /// Print the configured workspace guard as JSON
    Guard,
    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the JSON schema of config.toml
    Schema,
}

fn init_logging() -> Result<()> {
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")
}

async fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let path = match path {
        Some(path) => path,
        None => Config::default_path().context("Could not determine a config directory")?,
    };
    let mut config = Config::load_or_default(&path).await?;
    config.apply_env_overrides();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Print each decision; returns `true` if any path was denied.
fn check_paths(guard: &WorkspaceGuard, paths: &[String], resolve: bool) -> bool {
    let decisions: Vec<_> = if resolve {
        paths
            .iter()
            .map(|path| (path.as_str(), guard.check_resolved(path)))
            .collect()
    } else {
        guard.check_batch(paths)
    };

    let mut denied = false;
    for (path, decision) in decisions {
        denied |= !decision.is_allowed();
        println!("{path}\t{decision}");
    }
    denied
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    // Logs go to stderr so stdout stays machine-readable.
    init_logging()?;

    match cli.command {
        Commands::Scrub => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read stdin")?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(scrub(&input).as_bytes()).await?;
            stdout.flush().await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::CheckUrl { url } => {
            let allowed = validate_url(&url);
            println!("{}", if allowed { "allowed" } else { "blocked" });
            Ok(exit_code(!allowed))
        }
        Commands::CheckPath { paths, resolve } => {
            let config = load_config(cli.config).await?;
            let guard = config.build_guard()?;
            let resolve = resolve || config.workspace.resolve_symlinks;
            Ok(exit_code(check_paths(&guard, &paths, resolve)))
        }
        Commands::Evaluate { tool } => {
            let config = load_config(cli.config).await?;
            let policy = config.build_policy()?;
            let decision = policy.evaluate(&tool);
            match policy.get_deny_reason(&tool) {
                Some(reason) if decision == PolicyDecision::Deny => {
                    println!("{decision}\t{reason}");
                }
                _ => println!("{decision}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Guard => {
            let config = load_config(cli.config).await?;
            println!("{}", config.build_guard()?.serialize());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config(ConfigCommands::Schema) => {
            let schema = schemars::schema_for!(Config);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
