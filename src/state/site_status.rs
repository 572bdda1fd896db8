/// Site status definitions for tracking indexing progress
///
/// A site moves `INDEXING → {INDEXED, FAILED}` once per crawl cycle.
use serde::Serialize;
use std::fmt;

/// Represents the indexing status of a configured site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteStatus {
    /// At least one crawl or index task for the site is outstanding
    Indexing,

    /// Every page task finished without an unrecoverable fetch error
    Indexed,

    /// A fetch failed or the crawl was interrupted
    Failed,
}

impl SiteStatus {
    /// Returns true if no further transitions happen in this crawl cycle
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Indexing)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Indexing => "INDEXING",
            Self::Indexed => "INDEXED",
            Self::Failed => "FAILED",
        }
    }

    /// Parses a status from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "INDEXING" => Some(Self::Indexing),
            "INDEXED" => Some(Self::Indexed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_string_roundtrip() {
        for status in [SiteStatus::Indexing, SiteStatus::Indexed, SiteStatus::Failed] {
            assert_eq!(SiteStatus::from_db_string(status.to_db_string()), Some(status));
        }
    }

    #[test]
    fn test_unknown_db_string() {
        assert_eq!(SiteStatus::from_db_string("indexing"), None);
        assert_eq!(SiteStatus::from_db_string(""), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SiteStatus::Indexing.is_terminal());
        assert!(SiteStatus::Indexed.is_terminal());
        assert!(SiteStatus::Failed.is_terminal());
    }

    #[test]
    fn test_display_matches_db_string() {
        assert_eq!(SiteStatus::Failed.to_string(), "FAILED");
    }
}
