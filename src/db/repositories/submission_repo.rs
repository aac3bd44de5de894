//! Submission repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::{constants::statuses, error::AppResult, models::Submission};

/// Filters for submission listings.
#[derive(Debug, Default, Clone)]
pub struct SubmissionFilter {
    pub user_id: Option<Uuid>,
    pub question_id: Option<i32>,
    pub status: Option<String>,
    pub language: Option<String>,
}

/// Repository for submission database operations
pub struct SubmissionRepository;

impl SubmissionRepository {
    /// Insert a freshly built pending submission.
    pub async fn insert(pool: &PgPool, submission: &Submission) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO submissions (
                id, user_id, question_id, language, code_length,
                runtime_ms, memory_kb, is_public, code, status, results
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(submission.id)
        .bind(submission.user_id)
        .bind(submission.question_id)
        .bind(&submission.language)
        .bind(submission.code_length)
        .bind(submission.runtime_ms)
        .bind(submission.memory_kb)
        .bind(submission.is_public)
        .bind(&submission.code)
        .bind(&submission.status)
        .bind(&submission.results)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Find submission by ID
    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> AppResult<Option<Submission>> {
        let submission =
            sqlx::query_as::<_, Submission>(r#"SELECT * FROM submissions WHERE id = $1"#)
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(submission)
    }

    /// Move a submission into `processing`. The guard on the current status
    /// keeps the write sequence legal even if a submission is enqueued twice.
    pub async fn mark_processing(pool: &PgPool, id: &Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE submissions
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = $3
            "#,
        )
        .bind(id)
        .bind(statuses::PROCESSING)
        .bind(statuses::PENDING)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Persist the completed result set. Written exactly once per submission.
    pub async fn save_completed(
        pool: &PgPool,
        id: &Uuid,
        language: &str,
        code_length: i32,
        runtime_ms: i64,
        memory_kb: i64,
        results_json: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE submissions
            SET
                status = $2,
                language = $3,
                code_length = $4,
                runtime_ms = $5,
                memory_kb = $6,
                results = $7,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(statuses::COMPLETED)
        .bind(language)
        .bind(code_length)
        .bind(runtime_ms)
        .bind(memory_kb)
        .bind(results_json)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Persist an infrastructure failure. Results are cleared; the error code
    /// and message drive the user-facing explanation.
    pub async fn save_error(
        pool: &PgPool,
        id: &Uuid,
        error_code: &str,
        error_msg: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE submissions
            SET status = $2, error_code = $3, error_msg = $4, results = '', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(statuses::ERROR)
        .bind(error_code)
        .bind(error_msg)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// List submissions with pagination and filters, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &SubmissionFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Submission>, i64)> {
        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT * FROM submissions
            WHERE
                ($1::uuid IS NULL OR user_id = $1)
                AND ($2::int IS NULL OR question_id = $2)
                AND ($3::text IS NULL OR status = $3)
                AND ($4::text IS NULL OR language = $4)
            ORDER BY created_at DESC
            OFFSET $5 LIMIT $6
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.question_id)
        .bind(&filter.status)
        .bind(&filter.language)
        .bind(offset)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM submissions
            WHERE
                ($1::uuid IS NULL OR user_id = $1)
                AND ($2::int IS NULL OR question_id = $2)
                AND ($3::text IS NULL OR status = $3)
                AND ($4::text IS NULL OR language = $4)
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.question_id)
        .bind(&filter.status)
        .bind(&filter.language)
        .fetch_one(pool)
        .await?;

        Ok((submissions, count))
    }
}
