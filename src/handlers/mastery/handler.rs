//! Mastery handler implementations

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::{
    constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    db::repositories::{mastery_repo::MasteryQuery, MasteryRepository, ProblemRepository},
    error::{AppError, AppResult},
    handlers::auth,
    mastery::MasteryService,
    state::AppState,
};

use super::{
    request::{MasteryDeleteQuery, MasteryEventRequest, MasteryListQuery},
    response::{
        QuestionMasteryListResponse, SkillMasteryResponse, TagMasteryListResponse,
    },
};

fn build_query(query: &MasteryListQuery) -> MasteryQuery {
    MasteryQuery {
        page: query.page.unwrap_or(1).max(1),
        page_size: query
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE),
        min_mastery: query.min_mastery,
        max_mastery: query.max_mastery,
        question_number: query.question_number,
        tag: query
            .tag
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        sort: query.sort.clone().unwrap_or_else(|| "updated_at".to_string()),
        descending: !matches!(query.order.as_deref(), Some("asc") | Some("ASC")),
    }
}

async fn guard(
    state: &AppState,
    headers: &HeaderMap,
    operator_query: Option<&str>,
    target: &Uuid,
) -> AppResult<()> {
    let operator = auth::operator_uuid(headers, operator_query)?;
    auth::require_operator(state.db(), &operator).await?;
    auth::ensure_self_or_admin(state.db(), &operator, target).await
}

/// Per-question mastery rows for a user.
pub async fn list_question_mastery(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    headers: HeaderMap,
    Query(query): Query<MasteryListQuery>,
) -> AppResult<Json<QuestionMasteryListResponse>> {
    guard(&state, &headers, query.operator_uuid.as_deref(), &uuid).await?;

    let mastery_query = build_query(&query);
    let (rows, total) =
        MasteryRepository::list_question_mastery(state.db(), &uuid, &mastery_query).await?;

    Ok(Json(QuestionMasteryListResponse {
        result: rows,
        page: mastery_query.page,
        page_size: mastery_query.page_size,
        total,
    }))
}

/// Per-tag mastery rows for a user.
pub async fn list_tag_mastery(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    headers: HeaderMap,
    Query(query): Query<MasteryListQuery>,
) -> AppResult<Json<TagMasteryListResponse>> {
    guard(&state, &headers, query.operator_uuid.as_deref(), &uuid).await?;

    let mastery_query = build_query(&query);
    let (rows, total) =
        MasteryRepository::list_tag_mastery(state.db(), &uuid, &mastery_query).await?;

    Ok(Json(TagMasteryListResponse {
        result: rows,
        page: mastery_query.page,
        page_size: mastery_query.page_size,
        total,
    }))
}

/// Skill mastery rows for a user; the relational store is the source of
/// truth, the graph only carries a projection.
pub async fn list_skill_mastery(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    headers: HeaderMap,
    Query(query): Query<MasteryListQuery>,
) -> AppResult<Json<SkillMasteryResponse>> {
    guard(&state, &headers, query.operator_uuid.as_deref(), &uuid).await?;

    Ok(Json(SkillMasteryResponse {
        result: MasteryRepository::skill_mastery_for_user(state.db(), &uuid).await?,
    }))
}

/// Manually record a mastery event, driving the same upsert the worker uses.
pub async fn submit_mastery_event(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    headers: HeaderMap,
    Query(query): Query<MasteryDeleteQuery>,
    Json(payload): Json<MasteryEventRequest>,
) -> AppResult<Json<Value>> {
    guard(&state, &headers, query.operator_uuid.as_deref(), &uuid).await?;
    payload.validate()?;

    let problem = ProblemRepository::find_by_number(state.db(), payload.question_number)
        .await?
        .ok_or_else(|| AppError::NotFound("题目不存在".to_string()))?;

    MasteryService::record_submission(
        state.db(),
        Some(state.graph()),
        &uuid,
        &problem,
        payload.accepted,
    )
    .await?;

    Ok(Json(json!({ "message": "ok" })))
}

/// Drop a user's mastery row for one question.
pub async fn delete_question_mastery(
    State(state): State<AppState>,
    Path((uuid, number)): Path<(Uuid, i32)>,
    headers: HeaderMap,
    Query(query): Query<MasteryDeleteQuery>,
) -> AppResult<Json<Value>> {
    guard(&state, &headers, query.operator_uuid.as_deref(), &uuid).await?;

    MasteryRepository::delete_question_mastery(state.db(), &uuid, number).await?;
    Ok(Json(json!({ "message": "ok" })))
}

/// Drop a user's mastery row for one tag.
pub async fn delete_tag_mastery(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    headers: HeaderMap,
    Query(query): Query<MasteryDeleteQuery>,
) -> AppResult<Json<Value>> {
    guard(&state, &headers, query.operator_uuid.as_deref(), &uuid).await?;

    let tag = query
        .tag
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidInput("tag 必填".to_string()))?;

    MasteryRepository::delete_tag_mastery(state.db(), &uuid, tag).await?;
    Ok(Json(json!({ "message": "ok" })))
}
