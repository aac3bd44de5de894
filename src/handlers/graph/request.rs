//! Graph request DTOs

use serde::Deserialize;

/// Upsert one explicit relation between problems
#[derive(Debug, Deserialize)]
pub struct UpsertRelationRequest {
    pub from_question_number: i32,
    pub to_question_number: i32,
    /// PREREQUISITE | NEXT_LEVEL | SIMILAR | CATEGORY
    pub relation_type: String,
    pub weight: Option<f64>,
    pub description: Option<String>,
    pub operator_uuid: Option<String>,
}

/// Delete one explicit relation
#[derive(Debug, Deserialize)]
pub struct DeleteRelationRequest {
    pub from_question_number: i32,
    pub to_question_number: i32,
    pub relation_type: String,
    pub operator_uuid: Option<String>,
}

/// Shortest-path query
#[derive(Debug, Deserialize)]
pub struct LearningPathQuery {
    pub start: i32,
    pub end: i32,
}

/// Per-question recommendation query
#[derive(Debug, Deserialize)]
pub struct QuestionRecommendationQuery {
    pub limit: Option<usize>,
}

/// Operator context for admin mutations
#[derive(Debug, Deserialize)]
pub struct OperatorQuery {
    pub operator_uuid: Option<String>,
}
