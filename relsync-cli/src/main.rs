//! relsync command line tool
//!
//! Usage:
//!   relsync plan schemas.json [--format json]
//!   relsync run scenario.json [--timeout-ms 500] [--abort-on-parent-failure]
//!
//! `plan` prints the sync levels of a schema file. `run` plays a scenario
//! against simulated endpoints and prints every dispatched notification as
//! one JSON line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use relsync_cli::{Scenario, load_schemas, notification_line, plan, run_scenario};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "relsync")]
#[command(about = "Plan and simulate relation-aware sync passes")]
#[command(version)]
struct Args {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the sync levels of a schema file
    Plan {
        /// JSON array of entity schemas
        schema: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Run a scenario against simulated endpoints
    Run {
        /// Scenario file
        scenario: PathBuf,

        /// Per-operation deadline in ms (0 disables it)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Skip operations whose parent failed earlier in the pass
        #[arg(long)]
        abort_on_parent_failure: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match args.command {
        Command::Plan { schema, format } => {
            let registry = load_schemas(&schema)?;
            let plan = plan(&registry).context("Invalid relation graph")?;
            match format {
                Format::Text => println!("{}", plan.render_text()),
                Format::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
            }
        }
        Command::Run {
            scenario,
            timeout_ms,
            abort_on_parent_failure,
        } => {
            let mut scenario = Scenario::load(&scenario)?;
            if let Some(ms) = timeout_ms {
                scenario.config.operation_timeout_ms = (ms > 0).then_some(ms);
            }
            if abort_on_parent_failure {
                scenario.config.abort_on_parent_failure = true;
            }

            let outcome = run_scenario(scenario).await?;
            for notification in &outcome.notifications {
                println!("{}", notification_line(notification)?);
            }
            for pass in &outcome.passes {
                info!("{}", serde_json::to_string(pass)?);
            }
            println!(
                "summary: {} passes, {} succeeded, {} failed",
                outcome.passes.len(),
                outcome.succeeded(),
                outcome.failed()
            );
        }
    }
    Ok(())
}
