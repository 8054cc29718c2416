//! Command-line interface for Lookout
//!
//! Uses clap with derive for type-safe CLI parsing

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Lookout - job freshness and sshd hardening reporter
#[derive(Parser)]
#[command(name = "lookout")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path (default: ./lookout.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Report whether scheduled job containers ran successfully and recently
    Jobs {
        /// Container name filter (overrides jobs.prefix)
        #[arg(short, long)]
        prefix: Option<String>,

        /// Recency window in hours (overrides jobs.window_hours)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        hours: Option<u32>,

        /// Emit one report per container instead of one aggregate report
        #[arg(long)]
        per_unit: bool,

        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
    },

    /// Audit sshd_config against hardening standards
    Sshd {
        /// sshd_config to audit (overrides sshd.config_path)
        sshd_config: Option<PathBuf>,

        /// JSON standards file (overrides sshd.standards_path)
        standards: Option<PathBuf>,

        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
    },

    /// Validate configuration and show effective settings
    Check,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Generate shell completion scripts
    pub fn generate_completion(shell: Shell) {
        let mut cmd = Self::command();
        clap_complete::generate(shell, &mut cmd, "lookout", &mut std::io::stdout());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_jobs_overrides() {
        let cli = Cli::try_parse_from([
            "lookout", "jobs", "--prefix", "cron-", "--hours", "6", "--per-unit",
        ])
        .unwrap();
        match cli.command {
            Commands::Jobs {
                prefix,
                hours,
                per_unit,
                compact,
            } => {
                assert_eq!(prefix.as_deref(), Some("cron-"));
                assert_eq!(hours, Some(6));
                assert!(per_unit);
                assert!(!compact);
            }
            _ => panic!("expected jobs command"),
        }
    }

    #[test]
    fn test_zero_hours_rejected() {
        assert!(Cli::try_parse_from(["lookout", "jobs", "--hours", "0"]).is_err());
    }

    #[test]
    fn test_parse_sshd_positional() {
        let cli = Cli::try_parse_from([
            "lookout",
            "-c",
            "site.toml",
            "sshd",
            "/etc/ssh/sshd_config",
            "standards.json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("site.toml")));
        match cli.command {
            Commands::Sshd {
                sshd_config,
                standards,
                ..
            } => {
                assert_eq!(sshd_config, Some(PathBuf::from("/etc/ssh/sshd_config")));
                assert_eq!(standards, Some(PathBuf::from("standards.json")));
            }
            _ => panic!("expected sshd command"),
        }
    }
}
