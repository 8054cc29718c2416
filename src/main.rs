//! Lookout - point-in-time health and compliance reporter
//!
//! Checks that scheduled job containers ran successfully within a recency
//! window and audits sshd_config against hardening standards. Each run
//! prints JSON reports and exits 0 only when everything passes.

mod cli;
mod error;
mod manifest;
mod report;
mod runner;
mod runtime;
mod sickbay;
mod sshd;
mod standards;
mod sys;

use cli::{Cli, Commands};
use error::{Error, Result};
use manifest::LookoutConfig;
use runner::HostRunner;
use sickbay::Outcome;
use chrono::Utc;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exit code for operational errors (unreadable input, bad configuration)
const EXIT_ERROR: i32 = 2;

fn main() {
    let result = run();
    if let Err(e) = &result {
        eprintln!("Error: {}", e);
    }
    std::process::exit(exit_code(&result));
}

/// Process exit code for the outcome of a run
fn exit_code(result: &Result<i32>) -> i32 {
    match result {
        Ok(code) => *code,
        Err(_) => EXIT_ERROR,
    }
}

/// Initialize tracing: RUST_LOG overrides; --verbose => debug; else warnings only
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "lookout=debug" } else { "lookout=warn" })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Completion { shell } => {
            Cli::generate_completion(shell);
            Ok(0)
        }

        Commands::Check => {
            let config = manifest::load_or_default(cli.config.as_deref())?;
            print_settings(&config);
            Ok(0)
        }

        Commands::Jobs {
            prefix,
            hours,
            per_unit,
            compact,
        } => {
            let mut config = manifest::load_or_default(cli.config.as_deref())?;
            if let Some(prefix) = prefix {
                config.jobs.prefix = prefix;
            }
            if let Some(hours) = hours {
                config.jobs.window_hours = hours;
            }
            config.validate()?;

            run_jobs(&config, per_unit, compact)
        }

        Commands::Sshd {
            sshd_config,
            standards,
            compact,
        } => {
            let config = manifest::load_or_default(cli.config.as_deref())?;
            run_sshd(&config, sshd_config, standards, compact)
        }
    }
}

fn run_jobs(config: &LookoutConfig, per_unit: bool, compact: bool) -> Result<i32> {
    let policy = config.jobs.policy()?;
    let runner = HostRunner::from_config(&config.runtime);
    let now = Utc::now();

    let meta: report::ReportMeta = sys::HostFacts::collect(&runner, now).into();
    let runtime = runtime::ContainerRuntime::new(&runner, config.runtime.binary.as_str());
    let verdicts = runtime.survey(&config.jobs.prefix, &policy, now);

    let unhealthy = verdicts.iter().filter(|(_, v)| !v.healthy).count();
    let (status, reports) = report::jobs_outcome(meta, &verdicts, per_unit);
    info!(
        containers = verdicts.len(),
        unhealthy,
        window_hours = policy.window_hours(),
        status = %status,
        "job survey complete"
    );

    for unit in &reports {
        report::emit(unit, compact)?;
    }

    Ok(status.exit_code())
}

fn run_sshd(
    config: &LookoutConfig,
    sshd_config: Option<PathBuf>,
    standards_file: Option<PathBuf>,
    compact: bool,
) -> Result<i32> {
    let sshd_path = sshd_config.unwrap_or_else(|| config.sshd.config_path.clone());
    let standards_path = standards_file.or_else(|| config.sshd.standards_path.clone());

    let standards = standards::resolve_standards(standards_path.as_deref(), &config.sshd.standards)?;
    let observed = sshd::load_sshd_config(&sshd_path)?.relevant(&standards);
    let result = sickbay::audit(&observed, &standards);
    info!(
        path = %sshd_path.display(),
        tracked = standards.len(),
        violations = result.violations.len(),
        status = %result.status,
        "sshd audit complete"
    );
    let code = result.status.exit_code();

    let runner = HostRunner::from_config(&config.runtime);
    let meta: report::ReportMeta = sys::HostFacts::collect(&runner, Utc::now()).into();
    report::emit(&report::compliance_report(meta, result), compact)?;

    Ok(code)
}

fn print_settings(config: &LookoutConfig) {
    println!("Configuration is valid.");

    println!("\nJobs:");
    println!("  prefix: {}", config.jobs.prefix);
    println!("  window: {}h", config.jobs.window_hours);

    println!("\nRuntime:");
    println!("  binary: {}", config.runtime.binary);
    println!("  timeout: {}s", config.runtime.timeout);
    println!("  max attempts: {}", config.runtime.retry.max_attempts);

    println!("\nsshd:");
    let path = &config.sshd.config_path;
    let status = if path.is_file() { "exists" } else { "missing" };
    println!("  config: {} ({})", path.display(), status);
    match &config.sshd.standards_path {
        Some(path) => {
            let status = match standards::load_standards(path) {
                Ok(standards) => format!("{} parameters", standards.len()),
                Err(Error::StandardsRead { .. }) => "missing".to_string(),
                Err(e) => format!("invalid: {}", e),
            };
            println!("  standards: {} ({})", path.display(), status);
        }
        None if !config.sshd.standards.is_empty() => {
            println!("  standards: inline ({} parameters)", config.sshd.standards.len());
        }
        None => println!("  standards: none"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operational_error_exit_code() {
        let missing = Err(Error::SshdConfigNotFound(PathBuf::from("/nonexistent/sshd_config")));
        assert_eq!(exit_code(&missing), EXIT_ERROR);
        assert_eq!(EXIT_ERROR, 2);
    }

    #[test]
    fn test_status_exit_codes_pass_through() {
        assert_eq!(exit_code(&Ok(sickbay::HealthStatus::Healthy.exit_code())), 0);
        assert_eq!(exit_code(&Ok(sickbay::HealthStatus::Unhealthy.exit_code())), 1);
    }
}
