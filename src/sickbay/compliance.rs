//! Configuration compliance auditing
//!
//! Compares observed key/value configuration against a standards mapping.
//! Only keys named by the standards are checked.

use crate::sickbay::aggregate::{all_pass, Outcome, Verdict};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Value assumed for a parameter the configuration does not set
pub const ABSENT_PARAM_VALUE: &str = "no";

/// Required value per parameter name
pub type StandardsMap = BTreeMap<String, String>;

/// Observed value for `key`, or `ABSENT_PARAM_VALUE` when unset
pub fn resolve_param<'a>(observed: &'a BTreeMap<String, String>, key: &str) -> &'a str {
    observed
        .get(key)
        .map(String::as_str)
        .unwrap_or(ABSENT_PARAM_VALUE)
}

/// Overall compliance status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
}

impl Verdict for ComplianceStatus {
    fn passed(&self) -> bool {
        *self == ComplianceStatus::Compliant
    }
}

impl Outcome for ComplianceStatus {}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplianceStatus::Compliant => write!(f, "compliant"),
            ComplianceStatus::NonCompliant => write!(f, "non-compliant"),
        }
    }
}

/// A parameter that does not match its standard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub expected: String,
    pub found: String,
}

/// Comparison of one tracked parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamCheck {
    pub param: String,
    pub expected: String,
    pub found: String,
}

impl Verdict for ParamCheck {
    fn passed(&self) -> bool {
        self.expected == self.found
    }
}

/// Result of auditing a configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceResult {
    pub status: ComplianceStatus,
    pub violations: BTreeMap<String, Violation>,
}

/// Check every standards key against the observed configuration
pub fn check_params(
    observed: &BTreeMap<String, String>,
    standards: &StandardsMap,
) -> Vec<ParamCheck> {
    standards
        .iter()
        .map(|(param, expected)| ParamCheck {
            param: param.clone(),
            expected: expected.clone(),
            found: resolve_param(observed, param).to_string(),
        })
        .collect()
}

/// Audit observed configuration against standards
pub fn audit(observed: &BTreeMap<String, String>, standards: &StandardsMap) -> ComplianceResult {
    let checks = check_params(observed, standards);

    let status = if all_pass(&checks) {
        ComplianceStatus::Compliant
    } else {
        ComplianceStatus::NonCompliant
    };

    let violations = checks
        .into_iter()
        .filter(|check| !check.passed())
        .map(|check| {
            (
                check.param,
                Violation {
                    expected: check.expected,
                    found: check.found,
                },
            )
        })
        .collect();

    ComplianceResult { status, violations }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_absent_param_defaults_to_no() {
        let observed = map(&[("PermitRootLogin", "yes")]);
        assert_eq!(resolve_param(&observed, "PermitRootLogin"), "yes");
        assert_eq!(resolve_param(&observed, "PasswordAuthentication"), "no");
    }

    #[test]
    fn test_only_mismatch_is_reported() {
        let standards = map(&[("PermitRootLogin", "no"), ("PasswordAuthentication", "no")]);
        let observed = map(&[("PermitRootLogin", "yes")]);

        let result = audit(&observed, &standards);
        assert_eq!(result.status, ComplianceStatus::NonCompliant);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(
            result.violations["PermitRootLogin"],
            Violation {
                expected: "no".to_string(),
                found: "yes".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_config_flags_every_non_no_standard() {
        let standards = map(&[
            ("PermitRootLogin", "no"),
            ("X11Forwarding", "no"),
            ("MaxAuthTries", "3"),
            ("PubkeyAuthentication", "yes"),
        ]);

        let result = audit(&BTreeMap::new(), &standards);
        let flagged: Vec<&str> = result.violations.keys().map(String::as_str).collect();
        assert_eq!(flagged, vec!["MaxAuthTries", "PubkeyAuthentication"]);
        assert_eq!(result.violations["MaxAuthTries"].found, "no");
    }

    #[test]
    fn test_unknown_config_keys_ignored() {
        let standards = map(&[("PermitRootLogin", "no")]);
        let observed = map(&[("PermitRootLogin", "no"), ("Banner", "/etc/issue")]);

        let result = audit(&observed, &standards);
        assert_eq!(result.status, ComplianceStatus::Compliant);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_empty_standards_is_compliant() {
        let observed = map(&[("PermitRootLogin", "yes")]);
        let result = audit(&observed, &StandardsMap::new());
        assert_eq!(result.status, ComplianceStatus::Compliant);
        assert_eq!(result.status.exit_code(), 0);
    }

    #[test]
    fn test_values_compared_verbatim() {
        let standards = map(&[("PermitRootLogin", "no")]);
        let observed = map(&[("PermitRootLogin", "No")]);
        assert_eq!(audit(&observed, &standards).status, ComplianceStatus::NonCompliant);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ComplianceStatus::NonCompliant).unwrap(),
            "\"non-compliant\""
        );
        assert_eq!(ComplianceStatus::Compliant.to_string(), "compliant");
        assert_eq!(ComplianceStatus::NonCompliant.exit_code(), 1);
    }
}
