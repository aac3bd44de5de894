//! Mastery repository
//!
//! Counter updates are single-statement upserts with the arithmetic done in
//! SQL, so concurrent submissions by the same user never lose an increment.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{UserQuestionMastery, UserSkillMastery, UserTagMastery},
};

/// Pagination + filter options for mastery listings.
#[derive(Debug, Clone)]
pub struct MasteryQuery {
    pub page: u32,
    pub page_size: u32,
    pub min_mastery: Option<f64>,
    pub max_mastery: Option<f64>,
    /// `question_number` filter for question listings, exact `tag` for tags
    pub question_number: Option<i32>,
    pub tag: Option<String>,
    pub sort: String,
    pub descending: bool,
}

impl Default for MasteryQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: crate::constants::DEFAULT_PAGE_SIZE,
            min_mastery: None,
            max_mastery: None,
            question_number: None,
            tag: None,
            sort: "updated_at".to_string(),
            descending: true,
        }
    }
}

fn question_sort_column(key: &str) -> &'static str {
    match key {
        "question_number" => "question_number",
        "attempts" => "attempts",
        "accepted_count" => "accepted_count",
        "mastery" => "mastery",
        "created_at" => "created_at",
        _ => "updated_at",
    }
}

fn tag_sort_column(key: &str) -> &'static str {
    match key {
        "tag" => "tag",
        "attempts" => "attempts",
        "accepted_count" => "accepted_count",
        "mastery" => "mastery",
        "created_at" => "created_at",
        _ => "updated_at",
    }
}

/// Repository for mastery database operations
pub struct MasteryRepository;

impl MasteryRepository {
    /// Record an attempt against a question: attempts += 1, accepted_count
    /// += 1 on AC, mastery recomputed, timestamps refreshed. Atomic upsert.
    pub async fn record_question_attempt(
        pool: &PgPool,
        user_uuid: &Uuid,
        question_number: i32,
        question_id: &str,
        accepted: bool,
    ) -> AppResult<()> {
        let inc: i32 = if accepted { 1 } else { 0 };
        sqlx::query(
            r#"
            INSERT INTO user_question_mastery (
                user_uuid, question_number, question_id, attempts, accepted_count,
                mastery, last_submitted_at, last_accepted_at
            )
            VALUES (
                $1, $2, $3, 1, $4,
                $4::double precision,
                NOW(),
                CASE WHEN $4 > 0 THEN NOW() ELSE NULL END
            )
            ON CONFLICT (user_uuid, question_number) DO UPDATE SET
                question_id = EXCLUDED.question_id,
                attempts = user_question_mastery.attempts + 1,
                accepted_count = user_question_mastery.accepted_count + $4,
                mastery = (user_question_mastery.accepted_count + $4)::double precision
                          / (user_question_mastery.attempts + 1),
                last_submitted_at = NOW(),
                last_accepted_at = CASE
                    WHEN $4 > 0 THEN NOW()
                    ELSE user_question_mastery.last_accepted_at
                END,
                updated_at = NOW()
            "#,
        )
        .bind(user_uuid)
        .bind(question_number)
        .bind(question_id)
        .bind(inc)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Same counter arithmetic, keyed by (user, tag).
    pub async fn record_tag_attempt(
        pool: &PgPool,
        user_uuid: &Uuid,
        tag: &str,
        accepted: bool,
    ) -> AppResult<()> {
        let inc: i32 = if accepted { 1 } else { 0 };
        sqlx::query(
            r#"
            INSERT INTO user_tag_mastery (
                user_uuid, tag, attempts, accepted_count, mastery,
                last_submitted_at, last_accepted_at
            )
            VALUES (
                $1, $2, 1, $3, $3::double precision,
                NOW(),
                CASE WHEN $3 > 0 THEN NOW() ELSE NULL END
            )
            ON CONFLICT (user_uuid, tag) DO UPDATE SET
                attempts = user_tag_mastery.attempts + 1,
                accepted_count = user_tag_mastery.accepted_count + $3,
                mastery = (user_tag_mastery.accepted_count + $3)::double precision
                          / (user_tag_mastery.attempts + 1),
                last_submitted_at = NOW(),
                last_accepted_at = CASE
                    WHEN $3 > 0 THEN NOW()
                    ELSE user_tag_mastery.last_accepted_at
                END,
                updated_at = NOW()
            "#,
        )
        .bind(user_uuid)
        .bind(tag)
        .bind(inc)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Current skill mastery, 0.0 when no record exists.
    pub async fn skill_mastery(pool: &PgPool, user_uuid: &Uuid, skill_key: &str) -> AppResult<f64> {
        let mastery: Option<f64> = sqlx::query_scalar(
            r#"SELECT mastery FROM user_skill_mastery WHERE user_uuid = $1 AND skill_key = $2"#,
        )
        .bind(user_uuid)
        .bind(skill_key)
        .fetch_optional(pool)
        .await?;

        Ok(mastery.unwrap_or(0.0))
    }

    /// Upsert the learning-law output. The GREATEST guard keeps the scalar
    /// monotone even when two accepted submissions race.
    pub async fn upsert_skill_mastery(
        pool: &PgPool,
        user_uuid: &Uuid,
        skill_key: &str,
        mastery: f64,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_skill_mastery (user_uuid, skill_key, mastery)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_uuid, skill_key) DO UPDATE SET
                mastery = GREATEST(user_skill_mastery.mastery, EXCLUDED.mastery),
                updated_at = NOW()
            "#,
        )
        .bind(user_uuid)
        .bind(skill_key)
        .bind(mastery)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// All question-mastery rows for a user (recommendation input).
    pub async fn question_mastery_for_user(
        pool: &PgPool,
        user_uuid: &Uuid,
    ) -> AppResult<Vec<UserQuestionMastery>> {
        let rows = sqlx::query_as::<_, UserQuestionMastery>(
            r#"SELECT * FROM user_question_mastery WHERE user_uuid = $1"#,
        )
        .bind(user_uuid)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// All tag-mastery rows for a user (recommendation input).
    pub async fn tag_mastery_for_user(
        pool: &PgPool,
        user_uuid: &Uuid,
    ) -> AppResult<Vec<UserTagMastery>> {
        let rows = sqlx::query_as::<_, UserTagMastery>(
            r#"SELECT * FROM user_tag_mastery WHERE user_uuid = $1"#,
        )
        .bind(user_uuid)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// All skill-mastery rows for a user.
    pub async fn skill_mastery_for_user(
        pool: &PgPool,
        user_uuid: &Uuid,
    ) -> AppResult<Vec<UserSkillMastery>> {
        let rows = sqlx::query_as::<_, UserSkillMastery>(
            r#"SELECT * FROM user_skill_mastery WHERE user_uuid = $1 ORDER BY skill_key"#,
        )
        .bind(user_uuid)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Question number of the user's most recently accepted problem.
    pub async fn latest_accepted_question(
        pool: &PgPool,
        user_uuid: &Uuid,
    ) -> AppResult<Option<i32>> {
        let number: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT question_number FROM user_question_mastery
            WHERE user_uuid = $1 AND accepted_count > 0 AND last_accepted_at IS NOT NULL
            ORDER BY last_accepted_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_uuid)
        .fetch_optional(pool)
        .await?;

        Ok(number)
    }

    /// Paginated question-mastery listing with filters.
    pub async fn list_question_mastery(
        pool: &PgPool,
        user_uuid: &Uuid,
        query: &MasteryQuery,
    ) -> AppResult<(Vec<UserQuestionMastery>, i64)> {
        let order = if query.descending { "DESC" } else { "ASC" };
        let column = question_sort_column(&query.sort);
        let offset = (query.page.saturating_sub(1) as i64) * query.page_size as i64;

        let sql = format!(
            r#"
            SELECT * FROM user_question_mastery
            WHERE user_uuid = $1
                AND ($2::int IS NULL OR question_number = $2)
                AND ($3::float8 IS NULL OR mastery >= $3)
                AND ($4::float8 IS NULL OR mastery <= $4)
            ORDER BY {} {}
            OFFSET $5 LIMIT $6
            "#,
            column, order
        );

        let rows = sqlx::query_as::<_, UserQuestionMastery>(&sql)
            .bind(user_uuid)
            .bind(query.question_number)
            .bind(query.min_mastery)
            .bind(query.max_mastery)
            .bind(offset)
            .bind(query.page_size as i64)
            .fetch_all(pool)
            .await?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM user_question_mastery
            WHERE user_uuid = $1
                AND ($2::int IS NULL OR question_number = $2)
                AND ($3::float8 IS NULL OR mastery >= $3)
                AND ($4::float8 IS NULL OR mastery <= $4)
            "#,
        )
        .bind(user_uuid)
        .bind(query.question_number)
        .bind(query.min_mastery)
        .bind(query.max_mastery)
        .fetch_one(pool)
        .await?;

        Ok((rows, count))
    }

    /// Paginated tag-mastery listing with filters.
    pub async fn list_tag_mastery(
        pool: &PgPool,
        user_uuid: &Uuid,
        query: &MasteryQuery,
    ) -> AppResult<(Vec<UserTagMastery>, i64)> {
        let order = if query.descending { "DESC" } else { "ASC" };
        let column = tag_sort_column(&query.sort);
        let offset = (query.page.saturating_sub(1) as i64) * query.page_size as i64;

        let sql = format!(
            r#"
            SELECT * FROM user_tag_mastery
            WHERE user_uuid = $1
                AND ($2::text IS NULL OR tag = $2)
                AND ($3::float8 IS NULL OR mastery >= $3)
                AND ($4::float8 IS NULL OR mastery <= $4)
            ORDER BY {} {}
            OFFSET $5 LIMIT $6
            "#,
            column, order
        );

        let rows = sqlx::query_as::<_, UserTagMastery>(&sql)
            .bind(user_uuid)
            .bind(&query.tag)
            .bind(query.min_mastery)
            .bind(query.max_mastery)
            .bind(offset)
            .bind(query.page_size as i64)
            .fetch_all(pool)
            .await?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM user_tag_mastery
            WHERE user_uuid = $1
                AND ($2::text IS NULL OR tag = $2)
                AND ($3::float8 IS NULL OR mastery >= $3)
                AND ($4::float8 IS NULL OR mastery <= $4)
            "#,
        )
        .bind(user_uuid)
        .bind(&query.tag)
        .bind(query.min_mastery)
        .bind(query.max_mastery)
        .fetch_one(pool)
        .await?;

        Ok((rows, count))
    }

    /// Delete a user's mastery row for one question.
    pub async fn delete_question_mastery(
        pool: &PgPool,
        user_uuid: &Uuid,
        question_number: i32,
    ) -> AppResult<()> {
        sqlx::query(
            r#"DELETE FROM user_question_mastery WHERE user_uuid = $1 AND question_number = $2"#,
        )
        .bind(user_uuid)
        .bind(question_number)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Delete a user's mastery row for one tag.
    pub async fn delete_tag_mastery(pool: &PgPool, user_uuid: &Uuid, tag: &str) -> AppResult<()> {
        sqlx::query(r#"DELETE FROM user_tag_mastery WHERE user_uuid = $1 AND tag = $2"#)
            .bind(user_uuid)
            .bind(tag)
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_columns_are_whitelisted() {
        assert_eq!(question_sort_column("mastery"), "mastery");
        assert_eq!(question_sort_column("attempts"), "attempts");
        // unknown keys fall back instead of reaching the SQL string
        assert_eq!(question_sort_column("mastery; DROP TABLE"), "updated_at");
        assert_eq!(tag_sort_column("tag"), "tag");
        assert_eq!(tag_sort_column("x"), "updated_at");
    }
}
