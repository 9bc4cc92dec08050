//! pingproc - run the platform ping utility against one or more hosts

mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use pingproc_core::application::constants::{
    CANCELLED_EXIT_CODE, DEFAULT_KILL_GRACE, DEFAULT_MAX_CONCURRENCY, DEFAULT_PROGRAM,
};
use pingproc_core::{cancel_channel, PingConfig, PingError, PingResult};
use pingproc_infra_system::system_ping;
use std::process::ExitCode;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "pingproc")]
#[command(about = "Run the platform ping utility and capture its output", long_about = None)]
#[command(version)]
struct Cli {
    /// Hosts or addresses to probe (more than one runs a batch)
    #[arg(required = true)]
    targets: Vec<String>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Probe executable
    #[arg(long, env = "PINGPROC_PROGRAM", default_value = DEFAULT_PROGRAM)]
    program: String,

    /// Flag passed before the target, repeatable (replaces the platform defaults)
    #[arg(long = "arg", allow_hyphen_values = true)]
    args: Vec<String>,

    /// Maximum batch sub-runs executing at once
    #[arg(long, env = "PINGPROC_MAX_CONCURRENCY", default_value_t = DEFAULT_MAX_CONCURRENCY)]
    max_concurrency: usize,

    /// Milliseconds between SIGTERM and SIGKILL when cancelling
    #[arg(long, env = "PINGPROC_KILL_GRACE_MS", default_value_t = DEFAULT_KILL_GRACE.as_millis() as u64)]
    kill_grace_ms: u64,
}

impl Cli {
    fn config(&self) -> PingConfig {
        let mut config = PingConfig {
            program: self.program.clone(),
            kill_grace: Duration::from_millis(self.kill_grace_ms),
            max_concurrency: self.max_concurrency,
            ..Default::default()
        };
        if !self.args.is_empty() {
            config.base_args = self.args.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_logging()?;

    let config = cli.config();
    config.validate().context("Invalid configuration")?;

    info!(
        program = %config.program,
        targets = ?cli.targets,
        "pingproc v{} starting",
        pingproc_core::VERSION
    );

    let process = system_ping(&config, Handle::current());

    // Ctrl+C cancels the run and kills any running probe
    let (source, token) = cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            source.cancel();
        }
    });

    let handle = match cli.targets.as_slice() {
        [single] => process.run_async_with_cancel(single.clone(), token),
        many => process.run_batch(many.iter().cloned(), token),
    };

    match handle.await {
        Ok(result) => {
            print_result(&result, cli.json)?;
            Ok(exit_code_for(result.exit_code()))
        }
        Err(PingError::Cancelled) => {
            eprintln!("{}", "cancelled".yellow());
            Ok(ExitCode::from(CANCELLED_EXIT_CODE))
        }
        Err(e) => Err(e).context("Probe could not run"),
    }
}

fn print_result(result: &PingResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    if let Some(out) = result.std_output().filter(|s| !s.is_empty()) {
        println!("{}", out);
    }
    if let Some(err) = result.std_error().filter(|s| !s.is_empty()) {
        eprintln!("{}", err);
    }

    let status = format!("exit code {}", result.exit_code());
    if result.is_success() {
        eprintln!("{}", status.green());
    } else {
        eprintln!("{}", status.red());
    }
    Ok(())
}

fn exit_code_for(code: i32) -> ExitCode {
    ExitCode::from(exit_byte(code))
}

/// Process exit codes are a byte: 0 stays 0, 1..=255 pass through, and any
/// other code keeps its low byte unless that is 0, which becomes 1
fn exit_byte(code: i32) -> u8 {
    match u8::try_from(code) {
        Ok(byte) => byte,
        Err(_) => match code as u8 {
            0 => 1,
            low => low,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_replace_platform_defaults() {
        let cli = Cli::try_parse_from([
            "pingproc", "--arg", "-n", "--arg", "1", "--max-concurrency", "2", "localhost",
        ])
        .unwrap();

        let config = cli.config();
        assert_eq!(config.base_args, vec!["-n", "1"]);
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(cli.targets, vec!["localhost"]);
    }

    #[test]
    fn test_targets_are_required() {
        assert!(Cli::try_parse_from(["pingproc"]).is_err());
    }

    #[test]
    fn test_exit_byte_passes_through_byte_range() {
        assert_eq!(exit_byte(0), 0);
        assert_eq!(exit_byte(1), 1);
        assert_eq!(exit_byte(255), 255);
    }

    #[test]
    fn test_exit_byte_keeps_out_of_range_failures_non_zero() {
        assert_eq!(exit_byte(-1), 255);
        assert_eq!(exit_byte(256), 1);
        assert_eq!(exit_byte(1000), 232);
        // STATUS_CONTROL_C_EXIT
        assert_ne!(exit_byte(0xC000013A_u32 as i32), 0);
        assert_ne!(exit_byte(i32::MIN), 0);
    }
}
