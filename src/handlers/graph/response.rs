//! Graph response DTOs

use serde::Serialize;

use crate::graph::{
    GraphRecommendation, LearningPath, QuestionNode, QuestionRelation, QuestionSkillRelation,
    SkillNode, SkillRelation, SolvedEdge,
};

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub result: Vec<QuestionNode>,
}

#[derive(Debug, Serialize)]
pub struct RelationsResponse {
    pub result: Vec<QuestionRelation>,
}

#[derive(Debug, Serialize)]
pub struct SkillsResponse {
    pub result: Vec<SkillNode>,
}

#[derive(Debug, Serialize)]
pub struct SkillRelationsResponse {
    pub result: Vec<SkillRelation>,
}

#[derive(Debug, Serialize)]
pub struct QuestionSkillsResponse {
    pub result: Vec<QuestionSkillRelation>,
}

#[derive(Debug, Serialize)]
pub struct LearningPathResponse {
    pub result: Option<LearningPath>,
}

#[derive(Debug, Serialize)]
pub struct QuestionRecommendationsResponse {
    pub result: Vec<GraphRecommendation>,
}

#[derive(Debug, Serialize)]
pub struct SolvedEdgesResponse {
    pub result: Vec<SolvedEdge>,
}
