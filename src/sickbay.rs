//! Health and compliance classification
//!
//! Provides:
//! - Job freshness verdicts for scheduled containers
//! - Compliance auditing of key/value configuration against standards
//! - All-must-pass aggregation shared by both

pub mod aggregate;
pub mod compliance;
pub mod freshness;

pub use aggregate::{aggregate, HealthStatus, JobSummary, Outcome};
pub use compliance::{audit, ComplianceResult, StandardsMap};
pub use freshness::{classify, ContainerFact, JobVerdict, RecencyPolicy};
