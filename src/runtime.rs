//! Container runtime inspection
//!
//! Lists job containers and reads their state through the runtime CLI
//! (`docker`, or a compatible tool such as `podman`).

use crate::runner::CommandRunner;
use crate::sickbay::{classify, ContainerFact, JobVerdict, RecencyPolicy};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// `State` block of `docker inspect` output
#[derive(Debug, Default, Deserialize)]
struct InspectState {
    #[serde(rename = "StartedAt")]
    started_at: Option<String>,
    #[serde(rename = "ExitCode")]
    exit_code: Option<i64>,
    #[serde(rename = "Running")]
    running: Option<bool>,
}

/// One element of the `docker inspect` array
#[derive(Debug, Deserialize)]
struct InspectEntry {
    #[serde(rename = "State", default)]
    state: Option<InspectState>,
}

/// Parse `docker inspect` output into a fact for `name`
///
/// Only the first element is considered. Invalid JSON or an empty array
/// yields `None`.
pub fn parse_inspect(name: &str, output: &str) -> Option<ContainerFact> {
    let entries: Vec<InspectEntry> = match serde_json::from_str(output) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(container = name, "unreadable inspect output: {}", e);
            return None;
        }
    };

    let state = entries.into_iter().next()?.state.unwrap_or_default();

    Some(ContainerFact::from_state(
        name,
        state.started_at.as_deref(),
        state.exit_code,
        state.running,
    ))
}

/// Split `docker ps --format {{.Names}}` output into sorted unique names
pub fn parse_names(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Container runtime accessed through its CLI
pub struct ContainerRuntime<'a, R: CommandRunner> {
    runner: &'a R,
    binary: String,
}

impl<'a, R: CommandRunner> ContainerRuntime<'a, R> {
    pub fn new(runner: &'a R, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    /// Names of all containers (any state) matching `prefix`
    ///
    /// Matching follows the runtime's own `name=` filter.
    pub fn list(&self, prefix: &str) -> Vec<String> {
        let filter = format!("name={}", prefix);
        let args = ["ps", "-a", "--filter", filter.as_str(), "--format", "{{.Names}}"];

        match self.runner.run(&self.binary, &args) {
            Some(output) => parse_names(&output),
            None => {
                warn!(binary = %self.binary, prefix, "could not list containers");
                Vec::new()
            }
        }
    }

    /// Current state of a container, `None` when it cannot be observed
    pub fn inspect(&self, name: &str) -> Option<ContainerFact> {
        let output = self.runner.run(&self.binary, &["inspect", name])?;
        if output.is_empty() {
            return None;
        }

        let fact = parse_inspect(name, &output)?;
        debug!(
            container = %fact.name,
            started_at = ?fact.started_at,
            exit_code = fact.exit_code,
            running = fact.running,
            "inspected"
        );
        Some(fact)
    }

    /// Classify every container matching `prefix`
    pub fn survey(
        &self,
        prefix: &str,
        policy: &RecencyPolicy,
        now: DateTime<Utc>,
    ) -> Vec<(String, JobVerdict)> {
        self.list(prefix)
            .into_iter()
            .map(|name| {
                let fact = self.inspect(&name);
                let verdict = classify(fact.as_ref(), policy, now);
                debug!(
                    container = %name,
                    healthy = verdict.healthy,
                    detail = %verdict.detail,
                    "classified"
                );
                (name, verdict)
            })
            .collect()
    }
}
