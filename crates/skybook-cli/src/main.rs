//! skybook - config-driven flight checkout automation
//!
//! Usage:
//!   skybook                     Run the booking described by config.json
//!   skybook --config <FILE>     Use a specific config file
//!   skybook --dry-run           Print the step plan without opening a browser
//!
//! Exit status: 0 when every step ran, 1 when a mandatory step aborted the
//! run (or the browser could not start), 2 for configuration errors.

use anyhow::{Context, Result};
use clap::Parser;
use skybook_browser::{BrowserConfig, BrowserSession};
use skybook_core::config::locate_config;
use skybook_core::BookingConfig;
use skybook_flow::{checkout_steps, FailurePolicy, RunResult, Step, StepOutcome, StepSequencer, TimeoutBudget};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

const EXIT_RUN_FAILED: u8 = 1;
const EXIT_BAD_CONFIG: u8 = 2;

#[derive(Parser)]
#[command(name = "skybook")]
#[command(author, version, about = "Config-driven flight checkout automation")]
struct Cli {
    /// Config file (defaults to config.json beside the executable)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the step plan and exit
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install logger: {}", e);
    }

    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_BAD_CONFIG);
        }
    };

    let steps = checkout_steps(&config);
    if cli.dry_run {
        print_plan(&steps);
        return ExitCode::SUCCESS;
    }

    match book(&config, &steps).await {
        Ok(result) => {
            print_summary(&result);
            if result.succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_RUN_FAILED)
            }
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_RUN_FAILED)
        }
    }
}

fn load_config(explicit: Option<PathBuf>) -> Result<BookingConfig> {
    let path = locate_config(explicit.as_deref()).context("Failed to resolve config path")?;
    info!("Loading configuration from {}", path.display());

    BookingConfig::load(&path).with_context(|| format!("Invalid configuration in {}", path.display()))
}

async fn book(config: &BookingConfig, steps: &[Step]) -> Result<RunResult> {
    let settings = &config.browser_settings;
    let session = BrowserSession::launch_with_config(BrowserConfig::from(settings))
        .await
        .context("Failed to launch browser")?;

    let sequencer = StepSequencer::new(TimeoutBudget::from(settings));
    Ok(sequencer.run(steps, &session).await)
}

fn print_plan(steps: &[Step]) {
    println!("Booking plan ({} steps):", steps.len());
    for (i, step) in steps.iter().enumerate() {
        let policy = match step.policy() {
            FailurePolicy::Mandatory => "mandatory",
            FailurePolicy::Optional => "optional",
        };
        let checks = if step.assertions().is_empty() {
            String::new()
        } else {
            format!(", {} checks", step.assertions().len())
        };
        println!("  {:>2}. {} [{}{}]", i + 1, step.name(), policy, checks);
    }
}

fn print_summary(result: &RunResult) {
    let skipped: Vec<&str> = result.skipped().map(|r| r.name.as_str()).collect();

    match result.failure() {
        Some(record) => {
            println!(
                "\nBooking run aborted at step {}/{} ({})",
                record.number, result.planned, record.name
            );
            if let StepOutcome::Failed { diagnostic } = &record.outcome {
                println!("  {}", diagnostic);
            }
        }
        None => println!("\nBooking run completed: {} steps", result.steps.len()),
    }

    if !skipped.is_empty() {
        println!("  Skipped optional steps: {}", skipped.join(", "));
    }
}
