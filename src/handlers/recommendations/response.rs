//! Recommendation response DTOs

use serde::Serialize;

use crate::graph::GraphRecommendation;
use crate::recommend::Recommendation;

/// Ranked personalized recommendations
#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
}

/// Skill-targeted recommendations with mastery-aware reasons
#[derive(Debug, Serialize)]
pub struct SkillRecommendationsResponse {
    pub recommendations: Vec<GraphRecommendation>,
}
