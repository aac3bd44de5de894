//! Recommendation handler implementations

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    constants::{
        DEFAULT_DIFFICULTY_TOLERANCE, DEFAULT_MASTERY_THRESHOLD, DEFAULT_MAX_DEPTH,
        DEFAULT_RECOMMEND_LIMIT,
    },
    error::{AppError, AppResult},
    recommend::{RecommendMode, RecommendParams, RecommendationService},
    state::AppState,
};

use super::{
    request::{RecommendationRequest, SkillRecommendationQuery},
    response::{RecommendationsResponse, SkillRecommendationsResponse},
};

/// Mastery- and graph-driven recommendations, default or target mode.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Json(payload): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationsResponse>> {
    let mode = match payload
        .mode
        .as_deref()
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty())
        .as_deref()
    {
        None | Some("default") => RecommendMode::Default,
        Some("target") => RecommendMode::Target,
        Some(other) => {
            return Err(AppError::InvalidInput(format!("未知的推荐模式: {}", other)))
        }
    };

    let constraints = payload.constraints.as_ref();
    let params = RecommendParams {
        mode,
        target_question: payload.target_question,
        target_tag: payload.target_tag.clone(),
        limit: payload.limit.unwrap_or(DEFAULT_RECOMMEND_LIMIT),
        mastery_threshold: constraints
            .and_then(|c| c.mastery_threshold)
            .unwrap_or(DEFAULT_MASTERY_THRESHOLD),
        difficulty_tolerance: constraints
            .and_then(|c| c.difficulty_tolerance)
            .unwrap_or(DEFAULT_DIFFICULTY_TOLERANCE),
        max_depth: constraints
            .and_then(|c| c.max_depth)
            .unwrap_or(DEFAULT_MAX_DEPTH),
    }
    .clamped();

    let recommendations =
        RecommendationService::personalized(state.db(), state.graph(), &payload.user_id, params)
            .await?;

    Ok(Json(RecommendationsResponse { recommendations }))
}

/// Skill-targeted recommendations from the user's weakest learnable skills.
pub async fn get_skill_recommendations(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Query(query): Query<SkillRecommendationQuery>,
) -> AppResult<Json<SkillRecommendationsResponse>> {
    let limit = query.limit.unwrap_or(10).clamp(1, 50);

    let recommendations =
        RecommendationService::skill_targeted(state.graph(), &uuid, limit).await?;

    Ok(Json(SkillRecommendationsResponse { recommendations }))
}
