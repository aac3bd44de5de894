//! Problem model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Problem database model
///
/// `question_number` is the public identifier handed out to users (monotone
/// from 1001); `id` is the internal primary key referenced by submissions and
/// test cases.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Problem {
    pub id: i32,
    pub question_number: i32,
    /// Optional human-readable identifier (e.g. an import slug)
    pub question_id: Option<String>,
    pub title: String,
    pub content: Option<String>,
    pub difficulty: String,
    /// Comma-separated tag list; full-width commas are accepted on input
    pub tags: String,
    /// draft | published | archived | hidden
    pub status: String,
    /// Time limit in milliseconds
    pub time_limit: i32,
    /// Memory limit in megabytes
    pub memory_limit: i32,
    pub source: Option<String>,
    pub hint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Problem {
    pub fn is_published(&self) -> bool {
        self.status == crate::constants::problem_status::PUBLISHED
    }
}

/// Problem difficulty labels recognized across the system.
///
/// Stored as free-form strings; both English and Chinese labels occur in
/// imported data, so parsing is lenient and ranking lives in the
/// recommendation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// Lenient parse accepting English and Chinese labels.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "easy" | "Easy" | "简单" => Some(Self::Easy),
            "medium" | "Medium" | "中等" => Some(Self::Medium),
            "hard" | "Hard" | "困难" => Some(Self::Hard),
            "expert" | "Expert" | "非常困难" | "地狱" => Some(Self::Expert),
            _ => None,
        }
    }

}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
            Self::Expert => write!(f, "expert"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_parse_bilingual() {
        assert_eq!(Difficulty::parse("Easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse("简单"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse("中等"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::parse("困难"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse(" hard "), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("unknown"), None);
    }

}
