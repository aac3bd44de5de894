//! Recommendation request DTOs

use serde::Deserialize;
use uuid::Uuid;

/// Personalized recommendation request
#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: Uuid,
    /// "default" (mastered frontier) or "target" (backward from a goal)
    pub mode: Option<String>,
    pub target_question: Option<i32>,
    pub target_tag: Option<String>,
    pub limit: Option<usize>,
    pub constraints: Option<RecommendationConstraints>,
}

/// Optional tuning knobs
#[derive(Debug, Deserialize)]
pub struct RecommendationConstraints {
    pub mastery_threshold: Option<f64>,
    pub difficulty_tolerance: Option<i32>,
    pub max_depth: Option<usize>,
}

/// Skill-targeted recommendation query
#[derive(Debug, Deserialize)]
pub struct SkillRecommendationQuery {
    pub limit: Option<usize>,
}
