//! Job freshness classification
//!
//! Decides whether a scheduled job container ran successfully within the
//! recency window. Every input shape yields a verdict; nothing here fails.

use chrono::{DateTime, SecondsFormat, TimeDelta, Timelike, Utc};

/// Exit code recorded when the runtime does not report one
pub const UNKNOWN_EXIT_CODE: i64 = -1;

/// Default recency window in hours
pub const DEFAULT_WINDOW_HOURS: u32 = 24;

/// Observed runtime state of a single container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerFact {
    /// Container name
    pub name: String,
    /// Raw start time as reported by the runtime (never empty)
    pub started_at: Option<String>,
    /// Last exit code, `UNKNOWN_EXIT_CODE` when not reported
    pub exit_code: i64,
    /// Whether the container is running right now
    pub running: bool,
}

impl ContainerFact {
    /// Build a fact from loosely-structured runtime state, applying sentinels
    pub fn from_state(
        name: impl Into<String>,
        started_at: Option<&str>,
        exit_code: Option<i64>,
        running: Option<bool>,
    ) -> Self {
        Self {
            name: name.into(),
            started_at: started_at_or_absent(started_at),
            exit_code: exit_code_or_unknown(exit_code),
            running: running.unwrap_or(false),
        }
    }
}

/// Treat an empty or blank start time as absent
pub fn started_at_or_absent(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Substitute `UNKNOWN_EXIT_CODE` for a missing exit code
pub fn exit_code_or_unknown(code: Option<i64>) -> i64 {
    code.unwrap_or(UNKNOWN_EXIT_CODE)
}

/// How recent a start time must be to count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyPolicy {
    window_hours: u32,
}

impl RecencyPolicy {
    /// Create a policy; a zero-hour window is rejected
    pub fn new(window_hours: u32) -> Option<Self> {
        (window_hours > 0).then_some(Self { window_hours })
    }

    /// Window size in hours
    pub fn window_hours(&self) -> u32 {
        self.window_hours
    }

    /// Window size as a duration
    pub fn window(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.window_hours))
    }
}

impl Default for RecencyPolicy {
    fn default() -> Self {
        Self {
            window_hours: DEFAULT_WINDOW_HOURS,
        }
    }
}

/// Outcome of classifying one container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobVerdict {
    pub healthy: bool,
    /// `executed_at: <ts>` when healthy, `last_seen: <ts|unknown>` otherwise
    pub detail: String,
}

impl JobVerdict {
    /// Verdict for a container the runtime could not describe
    pub fn unknown() -> Self {
        Self {
            healthy: false,
            detail: "last_seen: unknown".to_string(),
        }
    }

    fn new(healthy: bool, timestamp: Option<String>) -> Self {
        let label = if healthy { "executed_at" } else { "last_seen" };
        let detail = format!("{}: {}", label, timestamp.as_deref().unwrap_or("unknown"));
        Self { healthy, detail }
    }
}

/// Parse a runtime timestamp into whole-second UTC
///
/// Accepts RFC 3339 with any fractional precision and any offset. The
/// fractional part is truncated, never rounded.
pub fn canonical_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = DateTime::parse_from_rfc3339(raw).ok()?;
    parsed.with_timezone(&Utc).with_nanosecond(0)
}

/// Format a whole-second UTC timestamp as `YYYY-MM-DDTHH:MM:SSZ`
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Best available text for a start time
///
/// Unparseable values still get reported: the fraction is cut off at the
/// first `.` and a `Z` appended, or the value is passed through as-is.
pub fn display_timestamp(raw: Option<&str>) -> Option<String> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;

    if let Some(ts) = canonical_timestamp(raw) {
        return Some(format_timestamp(&ts));
    }

    match raw.split_once('.') {
        Some((base, _)) => Some(format!("{}Z", base)),
        None => Some(raw.to_string()),
    }
}

/// Whether the container started within the window ending at `now`
///
/// The boundary is inclusive. Start times in the future count as recent.
pub fn is_recent(fact: &ContainerFact, policy: &RecencyPolicy, now: DateTime<Utc>) -> bool {
    let Some(started) = fact.started_at.as_deref().and_then(canonical_timestamp) else {
        return false;
    };

    now.signed_duration_since(started) <= policy.window()
}

/// Running containers count as successful; stopped ones need exit code 0
pub fn is_successful(fact: &ContainerFact) -> bool {
    fact.running || fact.exit_code == 0
}

/// Classify a container against the recency policy
pub fn classify(
    fact: Option<&ContainerFact>,
    policy: &RecencyPolicy,
    now: DateTime<Utc>,
) -> JobVerdict {
    let Some(fact) = fact else {
        return JobVerdict::unknown();
    };

    let healthy = is_recent(fact, policy, now) && is_successful(fact);
    JobVerdict::new(healthy, display_timestamp(fact.started_at.as_deref()))
}
