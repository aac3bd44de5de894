//! Mastery request DTOs

use serde::Deserialize;
use validator::Validate;

/// Listing query shared by the question and tag endpoints
#[derive(Debug, Deserialize)]
pub struct MasteryListQuery {
    #[serde(rename = "pageIdx")]
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
    pub question_number: Option<i32>,
    pub tag: Option<String>,
    pub min_mastery: Option<f64>,
    pub max_mastery: Option<f64>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub operator_uuid: Option<String>,
}

/// Manually record a mastery event for a user
#[derive(Debug, Deserialize, Validate)]
pub struct MasteryEventRequest {
    #[validate(range(min = 1))]
    pub question_number: i32,
    #[serde(default)]
    pub accepted: bool,
}

/// Operator context for delete endpoints
#[derive(Debug, Deserialize)]
pub struct MasteryDeleteQuery {
    pub tag: Option<String>,
    pub operator_uuid: Option<String>,
}
