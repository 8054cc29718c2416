//! All-must-pass reduction of per-unit verdicts

use crate::sickbay::freshness::JobVerdict;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Anything that can pass or fail on its own
pub trait Verdict {
    fn passed(&self) -> bool;
}

impl Verdict for JobVerdict {
    fn passed(&self) -> bool {
        self.healthy
    }
}

/// An overall status that ends the process
pub trait Outcome: Verdict {
    /// 0 on pass, 1 otherwise
    fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}

/// True iff every verdict passed (vacuously true when empty)
pub fn all_pass<'a, V>(verdicts: impl IntoIterator<Item = &'a V>) -> bool
where
    V: Verdict + 'a,
{
    verdicts.into_iter().all(|v| v.passed())
}

/// Overall health of a set of jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }
}

impl Verdict for HealthStatus {
    fn passed(&self) -> bool {
        *self == HealthStatus::Healthy
    }
}

impl Outcome for HealthStatus {}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Aggregated job status plus every unit's detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub status: HealthStatus,
    pub jobs: BTreeMap<String, String>,
}

/// Reduce named job verdicts into one summary
///
/// Unhealthy units flip the status but are still listed.
pub fn aggregate<'a>(verdicts: impl IntoIterator<Item = &'a (String, JobVerdict)>) -> JobSummary {
    let verdicts: Vec<&(String, JobVerdict)> = verdicts.into_iter().collect();
    let status = HealthStatus::from_passed(all_pass(verdicts.iter().map(|(_, v)| v)));

    let jobs = verdicts
        .into_iter()
        .map(|(name, verdict)| (name.clone(), verdict.detail.clone()))
        .collect();

    JobSummary { status, jobs }
}
