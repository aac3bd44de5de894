//! Graph handler implementations

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};

use crate::{
    db::repositories::{ProblemRepository, RelationRepository},
    error::{AppError, AppResult},
    graph::RelationType,
    handlers::auth,
    state::AppState,
};

use super::{
    request::{
        DeleteRelationRequest, LearningPathQuery, OperatorQuery, QuestionRecommendationQuery,
        UpsertRelationRequest,
    },
    response::{
        LearningPathResponse, QuestionRecommendationsResponse, QuestionSkillsResponse,
        QuestionsResponse, RelationsResponse, SkillRelationsResponse, SkillsResponse,
    },
};

pub async fn list_questions(State(state): State<AppState>) -> AppResult<Json<QuestionsResponse>> {
    Ok(Json(QuestionsResponse {
        result: state.graph().list_questions().await,
    }))
}

pub async fn list_relations(State(state): State<AppState>) -> AppResult<Json<RelationsResponse>> {
    Ok(Json(RelationsResponse {
        result: state.graph().list_relations().await,
    }))
}

pub async fn list_skills(State(state): State<AppState>) -> AppResult<Json<SkillsResponse>> {
    Ok(Json(SkillsResponse {
        result: state.graph().list_skills().await,
    }))
}

pub async fn list_skill_relations(
    State(state): State<AppState>,
) -> AppResult<Json<SkillRelationsResponse>> {
    Ok(Json(SkillRelationsResponse {
        result: state.graph().list_skill_relations().await,
    }))
}

pub async fn list_question_skills(
    State(state): State<AppState>,
) -> AppResult<Json<QuestionSkillsResponse>> {
    Ok(Json(QuestionSkillsResponse {
        result: state.graph().list_question_skill_relations().await,
    }))
}

/// Create or refresh an explicit relation; written to the record store and
/// mirrored into the graph so the projection stays current between
/// reconciliations.
pub async fn upsert_relation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpsertRelationRequest>,
) -> AppResult<Json<Value>> {
    let operator = auth::operator_uuid(&headers, payload.operator_uuid.as_deref())?;
    auth::ensure_admin(state.db(), &operator).await?;

    let relation_type = parse_explicit_type(&payload.relation_type)?;
    ensure_question_exists(&state, payload.from_question_number).await?;
    ensure_question_exists(&state, payload.to_question_number).await?;

    RelationRepository::upsert(
        state.db(),
        payload.from_question_number,
        payload.to_question_number,
        relation_type.as_str(),
    )
    .await?;

    state
        .graph()
        .upsert_relation(
            payload.from_question_number,
            payload.to_question_number,
            relation_type,
            payload.weight.unwrap_or(1.0),
            payload.description.unwrap_or_default(),
        )
        .await?;

    Ok(Json(json!({ "message": "ok" })))
}

/// Delete an explicit relation from the record store and the graph.
pub async fn delete_relation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<DeleteRelationRequest>,
) -> AppResult<Json<Value>> {
    let operator = auth::operator_uuid(&headers, payload.operator_uuid.as_deref())?;
    auth::ensure_admin(state.db(), &operator).await?;

    let relation_type = parse_explicit_type(&payload.relation_type)?;

    RelationRepository::delete(
        state.db(),
        payload.from_question_number,
        payload.to_question_number,
        relation_type.as_str(),
    )
    .await?;

    state
        .graph()
        .delete_relation(
            payload.from_question_number,
            payload.to_question_number,
            relation_type,
        )
        .await?;

    Ok(Json(json!({ "message": "ok" })))
}

pub async fn get_prerequisites(
    State(state): State<AppState>,
    Path(number): Path<i32>,
) -> AppResult<Json<QuestionsResponse>> {
    Ok(Json(QuestionsResponse {
        result: state.graph().prerequisites(number).await,
    }))
}

pub async fn get_next_level(
    State(state): State<AppState>,
    Path(number): Path<i32>,
) -> AppResult<Json<QuestionsResponse>> {
    Ok(Json(QuestionsResponse {
        result: state.graph().next_level(number).await,
    }))
}

pub async fn get_question_recommendations(
    State(state): State<AppState>,
    Path(number): Path<i32>,
    Query(query): Query<QuestionRecommendationQuery>,
) -> AppResult<Json<QuestionRecommendationsResponse>> {
    let limit = query.limit.unwrap_or(10).clamp(1, 50);
    Ok(Json(QuestionRecommendationsResponse {
        result: state.graph().recommend(number, limit).await,
    }))
}

pub async fn get_learning_path(
    State(state): State<AppState>,
    Query(query): Query<LearningPathQuery>,
) -> AppResult<Json<LearningPathResponse>> {
    Ok(Json(LearningPathResponse {
        result: state.graph().shortest_path(query.start, query.end).await,
    }))
}

/// A user's SOLVED edges with timestamps.
pub async fn get_solved_edges(
    State(state): State<AppState>,
    Path(uuid): Path<uuid::Uuid>,
) -> AppResult<Json<super::response::SolvedEdgesResponse>> {
    Ok(Json(super::response::SolvedEdgesResponse {
        result: state.graph().solved_edges(&uuid).await,
    }))
}

/// Re-run reconciliation against the relational store.
pub async fn init_graph(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OperatorQuery>,
) -> AppResult<Json<Value>> {
    let operator = auth::operator_uuid(&headers, query.operator_uuid.as_deref())?;
    auth::ensure_admin(state.db(), &operator).await?;

    state.graph().init_graph(state.db()).await?;
    Ok(Json(json!({ "message": "ok" })))
}

fn parse_explicit_type(raw: &str) -> AppResult<RelationType> {
    let relation_type = RelationType::parse(raw.trim())
        .ok_or_else(|| AppError::InvalidInput(format!("未知的关系类型: {}", raw)))?;
    if !RelationType::EXPLICIT.contains(&relation_type) {
        return Err(AppError::InvalidInput(format!(
            "自动关系不允许手工维护: {}",
            raw
        )));
    }
    Ok(relation_type)
}

async fn ensure_question_exists(state: &AppState, question_number: i32) -> AppResult<()> {
    ProblemRepository::find_by_number(state.db(), question_number)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("题目不存在: {}", question_number)))?;
    Ok(())
}
