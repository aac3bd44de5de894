//! Submission model and per-case result shape

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Submission database model
///
/// `results` holds the serialized per-case outcomes as a JSON array; it is
/// written exactly once, on the transition to `completed` or `error`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Internal problem primary key (not the public question number)
    pub question_id: i32,
    pub language: String,
    pub code_length: i32,
    pub runtime_ms: i64,
    pub memory_kb: i64,
    pub is_public: bool,
    #[serde(skip_serializing)]
    pub code: String,
    pub status: String,
    pub results: String,
    pub error_code: Option<String>,
    pub error_msg: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Build a fresh pending submission ready for insertion.
    pub fn new(user_id: Uuid, question_id: i32, code: String, language: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            question_id,
            language,
            code_length: code.len() as i32,
            runtime_ms: 0,
            memory_kb: 0,
            is_public: true,
            code,
            status: SubmissionStatus::Pending.as_str().to_string(),
            results: String::new(),
            error_code: None,
            error_msg: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Decode the serialized per-case results; an empty or malformed string
    /// decodes to an empty list.
    pub fn parsed_results(&self) -> Vec<TestCaseResult> {
        if self.results.is_empty() {
            return Vec::new();
        }
        serde_json::from_str(&self.results).unwrap_or_else(|e| {
            tracing::warn!(submission_id = %self.id, "failed to decode results: {}", e);
            Vec::new()
        })
    }

    /// Whether every decoded case is correct (and at least one exists).
    pub fn is_accepted(&self) -> bool {
        let results = self.parsed_results();
        !results.is_empty() && results.iter().all(|r| r.is_correct)
    }
}

/// Submission lifecycle state machine:
/// `pending -> processing -> (completed | error)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Terminal states are never left again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one test case, serialized into `Submission.results`.
///
/// `actual_output` is either the normalized program output or one of the
/// verdict sentinels ("Compile Error", "Time Limit Exceeded", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseResult {
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
    pub is_correct: bool,
    pub runtime_ms: i64,
    pub memory_kb: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in ["pending", "processing", "completed", "error"] {
            assert_eq!(SubmissionStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(SubmissionStatus::parse("running").is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SubmissionStatus::Pending.is_terminal());
        assert!(!SubmissionStatus::Processing.is_terminal());
        assert!(SubmissionStatus::Completed.is_terminal());
        assert!(SubmissionStatus::Error.is_terminal());
    }

    #[test]
    fn test_new_submission_shape() {
        let user = Uuid::new_v4();
        let s = Submission::new(user, 7, "print(1)".into(), "python".into());
        assert_eq!(s.status, "pending");
        assert_eq!(s.code_length, 8);
        assert_eq!(s.runtime_ms, 0);
        assert!(s.results.is_empty());
        assert!(s.parsed_results().is_empty());
    }

    #[test]
    fn test_accepted_requires_nonempty_all_correct() {
        let user = Uuid::new_v4();
        let mut s = Submission::new(user, 7, "x".into(), "go".into());
        assert!(!s.is_accepted());

        let results = vec![
            TestCaseResult {
                input: "1".into(),
                expected_output: "1".into(),
                actual_output: "1".into(),
                is_correct: true,
                runtime_ms: 3,
                memory_kb: 0,
            },
            TestCaseResult {
                input: "2".into(),
                expected_output: "2".into(),
                actual_output: "0".into(),
                is_correct: false,
                runtime_ms: 2,
                memory_kb: 0,
            },
        ];
        s.results = serde_json::to_string(&results).unwrap();
        assert!(!s.is_accepted());

        let all_ok: Vec<_> = results
            .into_iter()
            .map(|mut r| {
                r.is_correct = true;
                r
            })
            .collect();
        s.results = serde_json::to_string(&all_ok).unwrap();
        assert!(s.is_accepted());
    }
}
