//! Commit history decoding and the `Version {N}: {text}` message format.
//!
//! Both directions of the message format live here so that publishing and
//! resolving can never drift apart.

use serde::Serialize;
use tracing::warn;

/// One commit of a history listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    pub hash: String,
    pub message: String,
}

impl CommitRecord {
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        CommitRecord {
            hash: hash.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CommitRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.hash, LOG_DELIMITER, self.message)
    }
}

/// Separator between hash and subject in a history line.
pub const LOG_DELIMITER: &str = " - ";

/// Turns raw `git log` output into commit records.
///
/// The decoder owns both the `--pretty` format it expects and the parsing
/// of that format, so alternate encodings can be swapped in as a unit.
pub trait HistoryDecoder: Send + Sync {
    /// Value passed to `git log --pretty=format:`.
    fn pretty_format(&self) -> &str;

    /// Decode raw log output, newest first.
    fn decode(&self, raw: &str) -> Vec<CommitRecord>;
}

/// `{hash} - {subject}`, one commit per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct DelimitedLogDecoder;

impl HistoryDecoder for DelimitedLogDecoder {
    fn pretty_format(&self) -> &str {
        "%H - %s"
    }

    fn decode(&self, raw: &str) -> Vec<CommitRecord> {
        raw.lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| {
                if let Some((hash, message)) = line.split_once(LOG_DELIMITER) {
                    return Some(CommitRecord::new(hash.trim(), message));
                }
                // Empty subject: the trailing space may have been trimmed away.
                if let Some(hash) = line.trim_end().strip_suffix(" -") {
                    return Some(CommitRecord::new(hash.trim(), ""));
                }
                warn!(line, "Skipping undecodable history line");
                None
            })
            .collect()
    }
}

/// A commit message carrying a version number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag {
    pub number: u64,
    pub text: String,
}

impl VersionTag {
    /// `Version {number}: {text}`
    pub fn format_message(number: u64, text: &str) -> String {
        format!("Version {number}: {text}")
    }

    /// Parse a commit subject of the form `Version {N}: {text}`.
    ///
    /// `N` must be a positive integer without leading zeros. A bare
    /// `Version {N}:` is accepted because git trims the trailing space of
    /// a message whose user text was empty.
    pub fn parse(message: &str) -> Option<VersionTag> {
        let rest = message.strip_prefix("Version ")?;
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (digits, rest) = rest.split_at(digits_end);
        if digits.is_empty() || digits.starts_with('0') {
            return None;
        }
        let number = digits.parse::<u64>().ok()?;
        let rest = rest.strip_prefix(':')?;
        let text = if rest.is_empty() {
            ""
        } else {
            rest.strip_prefix(' ')?
        };
        Some(VersionTag {
            number,
            text: text.to_string(),
        })
    }

    /// Whether `message` is tagged with exactly `number`.
    pub fn matches(message: &str, number: u64) -> bool {
        VersionTag::parse(message).is_some_and(|tag| tag.number == number)
    }
}

/// Where a history listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySource {
    /// The working copy's own log
    Local,
    /// The hosting service's commit listing
    Remote,
}

#[cfg(test)]
mod tests {
    use super::*;

    const H1: &str = "1111111111111111111111111111111111111111";
    const H2: &str = "2222222222222222222222222222222222222222";

    #[test]
    fn decodes_delimited_lines_newest_first() {
        let raw = format!("{H2} - Version 2: second - with dash\n{H1} - Version 1: first");
        let records = DelimitedLogDecoder.decode(&raw);
        assert_eq!(
            records,
            vec![
                CommitRecord::new(H2, "Version 2: second - with dash"),
                CommitRecord::new(H1, "Version 1: first"),
            ]
        );
    }

    #[test]
    fn decodes_empty_subject_and_skips_garbage() {
        let raw = format!("{H2} -\nnot a history line\n\n{H1} - Version 1: first\n");
        let records = DelimitedLogDecoder.decode(&raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "");
        assert_eq!(records[1].hash, H1);
    }

    #[test]
    fn empty_output_is_empty_history() {
        assert!(DelimitedLogDecoder.decode("").is_empty());
    }

    #[test]
    fn record_display_uses_delimiter() {
        let record = CommitRecord::new("abc1234", "Version 3: initial");
        assert_eq!(record.to_string(), "abc1234 - Version 3: initial");
    }

    #[test]
    fn format_and_parse_agree() {
        let message = VersionTag::format_message(5, "fix bug");
        assert_eq!(message, "Version 5: fix bug");
        assert_eq!(
            VersionTag::parse(&message),
            Some(VersionTag {
                number: 5,
                text: "fix bug".to_string()
            })
        );
    }

    #[test]
    fn parse_requires_exact_delimiter() {
        assert!(VersionTag::parse("Version 3:initial").is_none());
        assert!(VersionTag::parse("Version 3 : initial").is_none());
        assert!(VersionTag::parse("version 3: initial").is_none());
        assert!(VersionTag::parse("Version : initial").is_none());
        assert!(VersionTag::parse("Version 03: initial").is_none());
        assert!(VersionTag::parse("Version 0: initial").is_none());
        assert_eq!(VersionTag::parse("Version 3:").map(|t| t.number), Some(3));
    }

    #[test]
    fn matches_does_not_confuse_prefixes() {
        assert!(VersionTag::matches("Version 3: a", 3));
        assert!(!VersionTag::matches("Version 30: a", 3));
        assert!(!VersionTag::matches("Version 3: a", 30));
    }
}
