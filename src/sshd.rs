//! sshd_config reading
//!
//! Extracts global `Keyword value` directives. Lines are parsed with nom;
//! anything after the first `Match` block header is conditional and skipped.

use crate::error::{Error, Result};
use crate::sickbay::StandardsMap;
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, space0, space1},
    combinator::{recognize, rest},
    sequence::delimited,
    Parser,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Global directives of an sshd_config file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshdDirectives {
    /// Lowercased keyword -> value
    directives: BTreeMap<String, String>,
}

impl SshdDirectives {
    /// Value of a directive, keyword matched case-insensitively
    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.directives
            .get(&keyword.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Directives tracked by `standards`, keyed with the standards' spelling
    ///
    /// Parameters the file does not set are left out.
    pub fn relevant(&self, standards: &StandardsMap) -> BTreeMap<String, String> {
        standards
            .keys()
            .filter_map(|param| self.get(param).map(|value| (param.clone(), value.to_string())))
            .collect()
    }
}

/// Parse sshd_config text
///
/// A keyword given more than once keeps the last value.
pub fn parse_sshd_config(content: &str) -> SshdDirectives {
    let mut config = SshdDirectives::default();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Ok((_, (keyword, value))) = parse_directive(line) else {
            debug!(line, "ignoring line without a value");
            continue;
        };

        if keyword.eq_ignore_ascii_case("Match") {
            break;
        }

        if value.is_empty() {
            continue;
        }

        config
            .directives
            .insert(keyword.to_ascii_lowercase(), value.to_string());
    }

    config
}

/// Read and parse an sshd_config file
pub fn load_sshd_config(path: &Path) -> Result<SshdDirectives> {
    if !path.is_file() {
        return Err(Error::SshdConfigNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|e| Error::SshdConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = parse_sshd_config(&content);
    if config.is_empty() {
        warn!(path = %path.display(), "sshd_config sets no global directives");
    } else {
        debug!(path = %path.display(), directives = config.len(), "parsed sshd_config");
    }
    Ok(config)
}

// `Keyword value`, `Keyword=value` or `Keyword = value`
fn parse_directive(input: &str) -> nom::IResult<&str, (&str, &str)> {
    let (input, keyword) =
        take_while1(|c: char| !c.is_whitespace() && c != '=').parse(input)?;
    let (input, _) = alt((recognize(delimited(space0, char('='), space0)), space1)).parse(input)?;
    let (input, value) = rest.parse(input)?;

    Ok((input, (keyword, value.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
# Hardened sshd_config
Port 22
PermitRootLogin prohibit-password
    # indented comment
PasswordAuthentication  no
X11Forwarding=no
MaxAuthTries = 3
AllowUsers deploy ansible
UsePAM

Match User backup
    PasswordAuthentication yes
"#;

    #[test]
    fn test_parse_directives() {
        let config = parse_sshd_config(SAMPLE);
        assert_eq!(config.get("Port"), Some("22"));
        assert_eq!(config.get("PermitRootLogin"), Some("prohibit-password"));
        assert_eq!(config.get("PasswordAuthentication"), Some("no"));
        assert_eq!(config.get("X11Forwarding"), Some("no"));
        assert_eq!(config.get("MaxAuthTries"), Some("3"));
        assert_eq!(config.get("AllowUsers"), Some("deploy ansible"));
    }

    #[test]
    fn test_comments_and_bare_keywords_skipped() {
        let config = parse_sshd_config(SAMPLE);
        assert_eq!(config.get("#"), None);
        assert_eq!(config.get("UsePAM"), None);
        assert_eq!(config.len(), 6);
    }

    #[test]
    fn test_match_block_excluded() {
        let config = parse_sshd_config(SAMPLE);
        assert_eq!(config.get("PasswordAuthentication"), Some("no"));
        assert_eq!(config.get("Match"), None);
    }

    #[test]
    fn test_last_occurrence_wins() {
        let config = parse_sshd_config("PermitRootLogin no\npermitrootlogin yes\n");
        assert_eq!(config.get("PermitRootLogin"), Some("yes"));
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_include_is_not_followed() {
        let config = parse_sshd_config("Include /etc/ssh/sshd_config.d/*.conf\nPermitRootLogin no\n");
        assert_eq!(config.get("Include"), Some("/etc/ssh/sshd_config.d/*.conf"));
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn test_relevant_uses_standards_spelling() {
        let config = parse_sshd_config("permitrootlogin yes\nBanner /etc/issue\n");
        let standards: StandardsMap = [
            ("PermitRootLogin".to_string(), "no".to_string()),
            ("PasswordAuthentication".to_string(), "no".to_string()),
        ]
        .into_iter()
        .collect();

        let relevant = config.relevant(&standards);
        assert_eq!(relevant.len(), 1);
        assert_eq!(relevant["PermitRootLogin"], "yes");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("sshd_config");
        assert!(matches!(
            load_sshd_config(&missing),
            Err(Error::SshdConfigNotFound(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "PermitRootLogin no").unwrap();
        let config = load_sshd_config(file.path()).unwrap();
        assert_eq!(config.get("permitrootlogin"), Some("no"));
    }
}
