//! `simq` command-line runner.

use clap::{Parser, Subcommand};
use simq_runner::{run_scenario, RunOptions, RunReport, RunnerError, Scenario, SimTime};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "simq", version, about = "Run discrete-event queue scenarios")]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Schedule a scenario's events and drain the queue.
    Run {
        /// Path to the scenario YAML file.
        scenario: PathBuf,

        /// Override the end-of-time boundary.
        #[arg(long)]
        end_time: Option<u64>,

        /// Stop after the last event at or before this time.
        #[arg(long)]
        until: Option<u64>,

        /// Tracer spec, e.g. "*" or "enqueue,reject,failure".
        #[arg(long)]
        trace: Option<String>,

        /// Write the run report as JSON to this file.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Put diagnostic lines in the report instead of the log.
        #[arg(long)]
        capture: bool,
    },

    /// Parse and validate a scenario without running it.
    Check {
        /// Path to the scenario YAML file.
        scenario: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    simq_metrics::describe_metrics();

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(command: Command) -> Result<(), RunnerError> {
    match command {
        Command::Run {
            scenario,
            end_time,
            until,
            trace,
            output,
            capture,
        } => {
            let loaded = Scenario::load(&scenario)?;
            let options = RunOptions {
                end_time: end_time.map(SimTime::from_units),
                trace,
                until: until.map(SimTime::from_units),
                capture_diagnostics: capture,
            };
            let report = run_scenario(&loaded, &options);
            print_summary(&report);
            if let Some(path) = output {
                write_report(&path, &report)?;
            }
            Ok(())
        }
        Command::Check { scenario } => {
            let loaded = Scenario::load(&scenario)?;
            println!(
                "{}: ok ({} initial events, {} total)",
                scenario.display(),
                loaded.events.len(),
                loaded.event_count()
            );
            Ok(())
        }
    }
}

fn print_summary(report: &RunReport) {
    println!("Scheduled:  {} ({} rejected)", report.scheduled, report.rejected);
    println!(
        "Fired:      {} ({} failed)",
        report.stats.events_fired, report.stats.events_failed
    );
    println!("Final time: {}", report.stats.final_time);
    if report.remaining > 0 {
        println!("Remaining:  {}", report.remaining);
    }
}

fn write_report(path: &Path, report: &RunReport) -> Result<(), RunnerError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|e| RunnerError::io(path, e))?;
    tracing::info!(path = %path.display(), "wrote run report");
    Ok(())
}
