//! Submission handler implementations

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    db::repositories::{
        submission_repo::SubmissionFilter, ProblemRepository, SubmissionRepository, UserRepository,
    },
    error::{judge_error_message, AppError, AppResult},
    handlers::auth,
    judge::Language,
    models::{Submission, SubmissionStatus},
    state::AppState,
};

use super::{
    request::{ListSubmissionsQuery, SubmitCodeRequest},
    response::{
        SubmissionListItem, SubmissionListResponse, SubmissionResultResponse, SubmitCodeResponse,
    },
};

/// Accept a submission, create it as `pending`, and enqueue it for judging.
/// The enqueue blocks while the queue is full (producer back-pressure).
pub async fn create_submission(
    State(state): State<AppState>,
    Json(payload): Json<SubmitCodeRequest>,
) -> AppResult<Json<SubmitCodeResponse>> {
    payload.validate()?;

    let user = UserRepository::find_by_uuid(state.db(), &payload.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("用户不存在".to_string()))?;
    if !user.is_active() {
        return Err(AppError::Forbidden("用户已被禁用".to_string()));
    }

    let problem = ProblemRepository::find_by_number(state.db(), payload.question_number)
        .await?
        .ok_or_else(|| AppError::NotFound("题目不存在".to_string()))?;

    // caller-provided language wins; otherwise record the detector's guess
    let language = payload
        .language
        .as_deref()
        .and_then(Language::parse)
        .unwrap_or_else(|| Language::detect(&payload.code));

    let submission = Submission::new(
        payload.user_id,
        problem.id,
        payload.code,
        language.as_str().to_string(),
    );
    SubmissionRepository::insert(state.db(), &submission).await?;

    state.queue().enqueue(submission.clone()).await?;

    Ok(Json(SubmitCodeResponse {
        submission_id: submission.id,
        user_id: submission.user_id,
        question_number: problem.question_number,
        question_id: submission.question_id,
        status: submission.status,
        message: "代码已提交，正在评测中".to_string(),
        created_at: submission.created_at,
    }))
}

/// Fetch a submission's current state and, when terminal, its results.
pub async fn get_submission_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SubmissionResultResponse>> {
    let submission = SubmissionRepository::find_by_id(state.db(), &id)
        .await?
        .ok_or_else(|| AppError::NotFound("提交记录不存在".to_string()))?;

    let question_number = ProblemRepository::find_by_id(state.db(), submission.question_id)
        .await?
        .map(|p| p.question_number);

    let mut response = SubmissionResultResponse {
        submission_id: submission.id,
        user_id: submission.user_id,
        question_id: submission.question_id,
        question_number,
        status: submission.status.clone(),
        created_at: submission.created_at,
        updated_at: submission.updated_at,
        results: Vec::new(),
        pass_rate: None,
        total_cases: None,
        passed_cases: None,
        error_code: None,
        error_message: None,
        message: None,
    };

    match SubmissionStatus::parse(&submission.status) {
        Some(SubmissionStatus::Completed) => {
            let results = submission.parsed_results();
            if results.is_empty() {
                response.pass_rate = Some(0.0);
                response.total_cases = Some(0);
                response.passed_cases = Some(0);
                response.message = Some("评测完成但无测试结果".to_string());
            } else {
                let passed = results.iter().filter(|r| r.is_correct).count();
                response.pass_rate = Some(passed as f64 / results.len() as f64);
                response.total_cases = Some(results.len());
                response.passed_cases = Some(passed);
                response.results = results;
            }
        }
        Some(SubmissionStatus::Processing) => {
            response.message = Some("代码正在评测中，请稍后查询".to_string());
        }
        Some(SubmissionStatus::Error) => {
            let code = submission.error_code.clone().unwrap_or_default();
            response.message = Some(judge_error_message(&code).to_string());
            response.error_code = Some(code);
            response.error_message = submission.error_msg.clone();
        }
        _ => {
            response.message = Some("代码已提交，等待评测".to_string());
        }
    }

    Ok(Json(response))
}

/// Public listing of a problem's submissions.
pub async fn list_problem_submissions(
    State(state): State<AppState>,
    Path(question_number): Path<i32>,
    Query(query): Query<ListSubmissionsQuery>,
) -> AppResult<Json<SubmissionListResponse>> {
    let problem = ProblemRepository::find_by_number(state.db(), question_number)
        .await?
        .ok_or_else(|| AppError::NotFound("题目不存在".to_string()))?;

    let filter = SubmissionFilter {
        question_id: Some(problem.id),
        status: normalize_filter(&query.status),
        language: normalize_filter(&query.language),
        user_id: None,
    };

    list_submissions(&state, filter, &query, problem.question_number).await
}

/// A user's own submissions (self or admin).
pub async fn list_user_submissions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    headers: HeaderMap,
    Query(query): Query<ListSubmissionsQuery>,
) -> AppResult<Json<SubmissionListResponse>> {
    let operator = auth::operator_uuid(&headers, query.operator_uuid.as_deref())?;
    auth::require_operator(state.db(), &operator).await?;
    auth::ensure_self_or_admin(state.db(), &operator, &user_id).await?;

    let question_id = match query.problem_id {
        Some(number) => match ProblemRepository::find_by_number(state.db(), number).await? {
            Some(problem) => Some(problem.id),
            None => Some(number),
        },
        None => None,
    };

    let filter = SubmissionFilter {
        user_id: Some(user_id),
        question_id,
        status: normalize_filter(&query.status),
        language: normalize_filter(&query.language),
    };

    list_submissions(&state, filter, &query, 0).await
}

fn normalize_filter(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

async fn list_submissions(
    state: &AppState,
    filter: SubmissionFilter,
    query: &ListSubmissionsQuery,
    question_number: i32,
) -> AppResult<Json<SubmissionListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let size = query
        .size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = ((page - 1) * size) as i64;

    let (submissions, total) =
        SubmissionRepository::list(state.db(), &filter, offset, size as i64).await?;

    // resolve question numbers for user listings spanning problems
    let mut items = Vec::with_capacity(submissions.len());
    for s in submissions {
        let number = if question_number > 0 {
            question_number
        } else {
            ProblemRepository::find_by_id(state.db(), s.question_id)
                .await?
                .map(|p| p.question_number)
                .unwrap_or(0)
        };
        items.push(SubmissionListItem {
            submission_id: s.id,
            user_id: s.user_id,
            question_number: number,
            submitted_at: s.created_at,
            status: s.status,
            runtime_ms: s.runtime_ms,
            memory_kb: s.memory_kb,
            language: s.language,
            code_length: s.code_length,
        });
    }

    let pages = if total > 0 {
        (total + size as i64 - 1) / size as i64
    } else {
        0
    };

    Ok(Json(SubmissionListResponse {
        total,
        page,
        size,
        pages,
        items,
    }))
}
