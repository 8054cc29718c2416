//! Standards loading
//!
//! A standards document is a flat JSON object mapping each tracked
//! parameter to its required value.

use crate::error::{Error, Result};
use crate::sickbay::StandardsMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Parse a JSON standards document
///
/// String values are taken as-is and numbers by their JSON text. Any other
/// value type is rejected.
pub fn parse_standards(path: &Path, content: &str) -> Result<StandardsMap> {
    let raw: BTreeMap<String, Value> =
        serde_json::from_str(content).map_err(|e| Error::StandardsParse {
            path: path.to_path_buf(),
            source: e,
        })?;

    raw.into_iter()
        .map(|(param, value)| match value {
            Value::String(s) => Ok((param, s)),
            Value::Number(n) => Ok((param, n.to_string())),
            _ => Err(Error::StandardsValue { param }),
        })
        .collect()
}

/// Read a JSON standards file
pub fn load_standards(path: &Path) -> Result<StandardsMap> {
    let content = fs::read_to_string(path).map_err(|e| Error::StandardsRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_standards(path, &content)
}

/// Pick the standards to audit against
///
/// A standards file wins over inline standards; having neither is an error.
pub fn resolve_standards(file: Option<&Path>, inline: &StandardsMap) -> Result<StandardsMap> {
    match file {
        Some(path) => load_standards(path),
        None if !inline.is_empty() => Ok(inline.clone()),
        None => Err(Error::StandardsMissing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(content: &str) -> Result<StandardsMap> {
        parse_standards(Path::new("standards.json"), content)
    }

    #[test]
    fn test_parse_string_values() {
        let standards = parse(r#"{"PermitRootLogin": "no", "PasswordAuthentication": "no"}"#).unwrap();
        assert_eq!(standards.len(), 2);
        assert_eq!(standards["PermitRootLogin"], "no");
    }

    #[test]
    fn test_numbers_stringified() {
        let standards = parse(r#"{"MaxAuthTries": 3, "LoginGraceTime": "30"}"#).unwrap();
        assert_eq!(standards["MaxAuthTries"], "3");
        assert_eq!(standards["LoginGraceTime"], "30");
    }

    #[test]
    fn test_other_values_rejected() {
        assert!(matches!(
            parse(r#"{"PermitRootLogin": false}"#),
            Err(Error::StandardsValue { param }) if param == "PermitRootLogin"
        ));
        assert!(matches!(
            parse(r#"["PermitRootLogin"]"#),
            Err(Error::StandardsParse { .. })
        ));
    }

    #[test]
    fn test_file_wins_over_inline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"X11Forwarding": "no"}}"#).unwrap();

        let inline: StandardsMap = [("PermitRootLogin".to_string(), "no".to_string())]
            .into_iter()
            .collect();

        let standards = resolve_standards(Some(file.path()), &inline).unwrap();
        assert_eq!(standards.keys().collect::<Vec<_>>(), vec!["X11Forwarding"]);

        let standards = resolve_standards(None, &inline).unwrap();
        assert_eq!(standards.keys().collect::<Vec<_>>(), vec!["PermitRootLogin"]);
    }

    #[test]
    fn test_no_standards_is_error() {
        assert!(matches!(
            resolve_standards(None, &StandardsMap::new()),
            Err(Error::StandardsMissing)
        ));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_standards(&dir.path().join("nope.json")),
            Err(Error::StandardsRead { .. })
        ));
    }
}
