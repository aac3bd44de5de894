//! Submission request DTOs

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Submit code for judging
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitCodeRequest {
    pub user_id: Uuid,

    /// Public question number (not the internal problem id)
    #[validate(range(min = 1))]
    pub question_number: i32,

    /// Source text; the language is detected unless provided
    #[validate(length(min = 1, max = 1048576))] // 1MB max
    pub code: String,

    /// Optional explicit language label overriding detection
    pub language: Option<String>,
}

/// List submissions query parameters
#[derive(Debug, Deserialize)]
pub struct ListSubmissionsQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub status: Option<String>,
    pub language: Option<String>,
    /// Question number filter (user listings only)
    pub problem_id: Option<i32>,
    pub operator_uuid: Option<String>,
}
