//! Report assembly and emission
//!
//! Reports are JSON documents: host metadata at the top level plus one
//! `message` block with the verdicts.

use crate::error::Result;
use crate::sickbay::{aggregate, ComplianceResult, HealthStatus, JobSummary, JobVerdict};
use crate::sys::HostFacts;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Host metadata shared by every report in a run
#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub timestamp: String,
    pub host: String,
    pub ansible_version: String,
    pub ansible_user: String,
}

impl From<HostFacts> for ReportMeta {
    fn from(facts: HostFacts) -> Self {
        Self {
            timestamp: facts.timestamp,
            host: facts.host,
            ansible_version: facts.ansible_version,
            ansible_user: facts.ansible_user,
        }
    }
}

/// A complete report
#[derive(Debug, Clone, Serialize)]
pub struct Report<M> {
    #[serde(flatten)]
    pub meta: ReportMeta,
    pub message: M,
}

impl<M: Serialize> Report<M> {
    pub fn new(meta: ReportMeta, message: M) -> Self {
        Self { meta, message }
    }
}

/// One report covering every job
pub fn jobs_report(meta: ReportMeta, summary: JobSummary) -> Report<JobSummary> {
    Report::new(meta, summary)
}

/// One report per job, each carrying only its own status
pub fn per_unit_reports(
    meta: &ReportMeta,
    verdicts: &[(String, JobVerdict)],
) -> Vec<Report<JobSummary>> {
    verdicts
        .iter()
        .map(|(name, verdict)| {
            let summary = JobSummary {
                status: HealthStatus::from_passed(verdict.healthy),
                jobs: BTreeMap::from([(name.clone(), verdict.detail.clone())]),
            };
            Report::new(meta.clone(), summary)
        })
        .collect()
}

/// Reports for a job survey plus the aggregate status that ends the run
///
/// In per-unit mode each report carries only its own status, but the
/// returned status always covers every unit.
pub fn jobs_outcome(
    meta: ReportMeta,
    verdicts: &[(String, JobVerdict)],
    per_unit: bool,
) -> (HealthStatus, Vec<Report<JobSummary>>) {
    let summary = aggregate(verdicts);
    let status = summary.status;

    let reports = if per_unit {
        per_unit_reports(&meta, verdicts)
    } else {
        vec![jobs_report(meta, summary)]
    };

    (status, reports)
}

/// Report for an sshd audit
pub fn compliance_report(meta: ReportMeta, result: ComplianceResult) -> Report<ComplianceResult> {
    Report::new(meta, result)
}

/// Write a report as JSON followed by a newline
pub fn write_report<W: Write, M: Serialize>(
    out: &mut W,
    report: &Report<M>,
    compact: bool,
) -> Result<()> {
    if compact {
        serde_json::to_writer(&mut *out, report)?;
    } else {
        serde_json::to_writer_pretty(&mut *out, report)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Print a report to stdout
pub fn emit<M: Serialize>(report: &Report<M>, compact: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    write_report(&mut lock, report, compact)
}
