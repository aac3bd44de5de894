//! Submission response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::TestCaseResult;

/// Response to a successful submission
#[derive(Debug, Serialize)]
pub struct SubmitCodeResponse {
    pub submission_id: Uuid,
    pub user_id: Uuid,
    pub question_number: i32,
    pub question_id: i32,
    pub status: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Submission result, shaped by the submission's current state
#[derive(Debug, Serialize)]
pub struct SubmissionResultResponse {
    pub submission_id: Uuid,
    pub user_id: Uuid,
    pub question_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_number: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub results: Vec<TestCaseResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cases: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed_cases: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One row of a submission listing
#[derive(Debug, Serialize)]
pub struct SubmissionListItem {
    pub submission_id: Uuid,
    pub user_id: Uuid,
    pub question_number: i32,
    pub submitted_at: DateTime<Utc>,
    pub status: String,
    pub runtime_ms: i64,
    pub memory_kb: i64,
    pub language: String,
    pub code_length: i32,
}

/// Paginated submission listing
#[derive(Debug, Serialize)]
pub struct SubmissionListResponse {
    pub total: i64,
    pub page: u32,
    pub size: u32,
    pub pages: i64,
    pub items: Vec<SubmissionListItem>,
}
