//! Test case repository

use sqlx::PgPool;

use crate::{error::AppResult, models::TestCase};

/// Repository for test case database operations
pub struct TestCaseRepository;

impl TestCaseRepository {
    /// All non-hidden cases for a problem, in primary-key order. This is the
    /// visible set the judge runs against.
    pub async fn visible_for_question(pool: &PgPool, question_id: i32) -> AppResult<Vec<TestCase>> {
        let cases = sqlx::query_as::<_, TestCase>(
            r#"
            SELECT * FROM test_cases
            WHERE question_id = $1 AND is_hidden = FALSE
            ORDER BY id ASC
            "#,
        )
        .bind(question_id)
        .fetch_all(pool)
        .await?;

        Ok(cases)
    }
}
