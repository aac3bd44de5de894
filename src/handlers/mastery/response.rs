//! Mastery response DTOs

use serde::Serialize;

use crate::models::{UserQuestionMastery, UserSkillMastery, UserTagMastery};

/// Paginated mastery listing
#[derive(Debug, Serialize)]
pub struct MasteryListResponse<T: Serialize> {
    pub result: Vec<T>,
    #[serde(rename = "pageIdx")]
    pub page: u32,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
    #[serde(rename = "totalCnt")]
    pub total: i64,
}

pub type QuestionMasteryListResponse = MasteryListResponse<UserQuestionMastery>;
pub type TagMasteryListResponse = MasteryListResponse<UserTagMastery>;

/// Skill mastery rows driven by the learning law
#[derive(Debug, Serialize)]
pub struct SkillMasteryResponse {
    pub result: Vec<UserSkillMastery>,
}
