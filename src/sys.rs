//! Host facts for report metadata

use crate::runner::CommandRunner;
use chrono::{DateTime, SecondsFormat, Utc};
use nix::unistd::{gethostname, geteuid, User};

/// Placeholder for facts that could not be determined
pub const UNKNOWN: &str = "unknown";

/// Facts about the host producing a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    pub timestamp: String,
    pub host: String,
    pub ansible_version: String,
    pub ansible_user: String,
}

impl HostFacts {
    /// Gather facts once for the current run
    pub fn collect<R: CommandRunner>(runner: &R, now: DateTime<Utc>) -> Self {
        Self {
            timestamp: report_timestamp(now),
            host: hostname().unwrap_or_else(|| UNKNOWN.to_string()),
            ansible_version: runner
                .run("ansible", &["--version"])
                .and_then(|out| parse_ansible_version(&out))
                .unwrap_or_else(|| UNKNOWN.to_string()),
            ansible_user: current_user().unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

/// `YYYY-MM-DDTHH:MM:SSZ` without fractional seconds
pub fn report_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Host name via gethostname(2)
pub fn hostname() -> Option<String> {
    gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
}

/// Login name of the effective user
pub fn current_user() -> Option<String> {
    User::from_uid(geteuid()).ok().flatten().map(|user| user.name)
}

/// Extract the version from `ansible --version` output
///
/// Handles both `ansible 2.9.27` and `ansible [core 2.15.3]`.
pub fn parse_ansible_version(output: &str) -> Option<String> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("ansible"))?;

    line.split_whitespace()
        .skip(1)
        .map(|token| token.trim_matches(|c: char| c == '[' || c == ']'))
        .find(|token| token.starts_with(|c: char| c.is_ascii_digit()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::ScriptedRunner;
    use chrono::TimeZone;

    #[test]
    fn test_report_timestamp_has_no_fraction() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 15).unwrap()
            + chrono::TimeDelta::milliseconds(987);
        assert_eq!(report_timestamp(now), "2024-05-01T09:30:15Z");
    }

    #[test]
    fn test_parse_legacy_ansible_version() {
        let output = "ansible 2.9.27\n  config file = /etc/ansible/ansible.cfg\n";
        assert_eq!(parse_ansible_version(output).as_deref(), Some("2.9.27"));
    }

    #[test]
    fn test_parse_core_ansible_version() {
        let output = "ansible [core 2.15.3]\n  config file = None\n  python version = 3.11.4\n";
        assert_eq!(parse_ansible_version(output).as_deref(), Some("2.15.3"));
    }

    #[test]
    fn test_parse_bracketed_version() {
        assert_eq!(
            parse_ansible_version("ansible [2.16.0]").as_deref(),
            Some("2.16.0")
        );
    }

    #[test]
    fn test_parse_without_ansible_line() {
        assert_eq!(parse_ansible_version("command not found"), None);
        assert_eq!(parse_ansible_version("ansible"), None);
    }

    #[test]
    fn test_collect_without_ansible() {
        let runner = ScriptedRunner::new();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let facts = HostFacts::collect(&runner, now);
        assert_eq!(facts.timestamp, "2024-05-01T00:00:00Z");
        assert_eq!(facts.ansible_version, UNKNOWN);
        assert!(!facts.host.is_empty());
    }

    #[test]
    fn test_collect_with_ansible() {
        let runner = ScriptedRunner::new().on("ansible --version", Some("ansible [core 2.17.1]"));
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(HostFacts::collect(&runner, now).ansible_version, "2.17.1");
    }
}
