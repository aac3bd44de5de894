//! User and solved-list repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{User, UserSolve},
};

/// Repository for user database operations
pub struct UserRepository;

impl UserRepository {
    /// Find a user by UUID
    pub async fn find_by_uuid(pool: &PgPool, uuid: &Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE uuid = $1"#)
            .bind(uuid)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Fetch a user's solved list, if one exists yet.
    pub async fn find_solve(pool: &PgPool, uuid: &Uuid) -> AppResult<Option<UserSolve>> {
        let solve = sqlx::query_as::<_, UserSolve>(r#"SELECT * FROM user_solve WHERE uuid = $1"#)
            .bind(uuid)
            .fetch_optional(pool)
            .await?;

        Ok(solve)
    }

    /// Create a solved list seeded with one question number.
    pub async fn create_solve(
        pool: &PgPool,
        uuid: &Uuid,
        question_number: i32,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_solve (uuid, problem_ids)
            VALUES ($1, $2)
            ON CONFLICT (uuid) DO NOTHING
            "#,
        )
        .bind(uuid)
        .bind(question_number.to_string())
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Overwrite a user's solved list.
    pub async fn update_solve(pool: &PgPool, uuid: &Uuid, problem_ids: &str) -> AppResult<()> {
        sqlx::query(
            r#"UPDATE user_solve SET problem_ids = $2, updated_at = NOW() WHERE uuid = $1"#,
        )
        .bind(uuid)
        .bind(problem_ids)
        .execute(pool)
        .await?;

        Ok(())
    }
}
