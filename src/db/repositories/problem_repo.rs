//! Problem repository

use sqlx::PgPool;

use crate::{error::AppResult, models::Problem};

/// Repository for problem database operations
pub struct ProblemRepository;

impl ProblemRepository {
    /// Find a problem by its internal primary key
    pub async fn find_by_id(pool: &PgPool, id: i32) -> AppResult<Option<Problem>> {
        let problem = sqlx::query_as::<_, Problem>(r#"SELECT * FROM problems WHERE id = $1"#)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(problem)
    }

    /// Find a problem by its public question number
    pub async fn find_by_number(pool: &PgPool, question_number: i32) -> AppResult<Option<Problem>> {
        let problem =
            sqlx::query_as::<_, Problem>(r#"SELECT * FROM problems WHERE question_number = $1"#)
                .bind(question_number)
                .fetch_optional(pool)
                .await?;

        Ok(problem)
    }

    /// All problems ordered by public number; reconciliation input.
    pub async fn list_all(pool: &PgPool) -> AppResult<Vec<Problem>> {
        let problems =
            sqlx::query_as::<_, Problem>(r#"SELECT * FROM problems ORDER BY question_number ASC"#)
                .fetch_all(pool)
                .await?;

        Ok(problems)
    }
}
