//! Letter request domain types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::LetterState;
use crate::{Error, Result};

/// Longest accepted letter title, in characters
pub const MAX_TITLE_LEN: usize = 200;

/// Kind of letter a student can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterType {
    /// Proof of active enrollment
    ActiveStudent,
    /// Recommendation for a KKP (internship) placement
    KkpRecommendation,
    /// Permit to collect research data
    ResearchPermit,
    /// General recommendation letter
    Recommendation,
    /// Official transcript request
    Transcript,
    /// Leave of absence request
    LeaveOfAbsence,
}

impl LetterType {
    /// Every letter type
    pub const ALL: [LetterType; 6] = [
        LetterType::ActiveStudent,
        LetterType::KkpRecommendation,
        LetterType::ResearchPermit,
        LetterType::Recommendation,
        LetterType::Transcript,
        LetterType::LeaveOfAbsence,
    ];

    /// Stored name of the letter type
    pub fn as_str(&self) -> &'static str {
        match self {
            LetterType::ActiveStudent => "active_student",
            LetterType::KkpRecommendation => "kkp_recommendation",
            LetterType::ResearchPermit => "research_permit",
            LetterType::Recommendation => "recommendation",
            LetterType::Transcript => "transcript",
            LetterType::LeaveOfAbsence => "leave_of_absence",
        }
    }

    /// Human-readable name
    pub fn description(&self) -> &'static str {
        match self {
            LetterType::ActiveStudent => "Active student certificate",
            LetterType::KkpRecommendation => "KKP recommendation",
            LetterType::ResearchPermit => "Research permit",
            LetterType::Recommendation => "Recommendation letter",
            LetterType::Transcript => "Transcript",
            LetterType::LeaveOfAbsence => "Leave of absence",
        }
    }
}

impl fmt::Display for LetterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LetterType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        LetterType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown letter type: {}", s)))
    }
}

/// A letter request with its typed workflow state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterRequest {
    /// Request ID
    pub id: i64,
    /// Requested letter type
    pub letter_type: LetterType,
    /// Short title
    pub title: String,
    /// Why the student needs the letter
    pub purpose: Option<String>,
    /// When the request was submitted
    pub request_date: DateTime<Utc>,
    /// Workflow state
    pub state: LetterState,
}

/// Trim a title and check it is usable
pub fn normalize_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput("Title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(Error::InvalidInput(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_type_parse() {
        for t in LetterType::ALL {
            assert_eq!(t.as_str().parse::<LetterType>().unwrap(), t);
        }
        assert!("diploma".parse::<LetterType>().is_err());
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Surat aktif  ").unwrap(), "Surat aktif");
        assert!(normalize_title("   ").is_err());
        assert!(normalize_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
        assert!(normalize_title(&"x".repeat(MAX_TITLE_LEN)).is_ok());
    }
}
