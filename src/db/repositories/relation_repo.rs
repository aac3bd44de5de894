//! Explicit problem-relation repository

use sqlx::PgPool;

use crate::{error::AppResult, models::Relation};

/// Repository for user-authored problem relations
pub struct RelationRepository;

impl RelationRepository {
    /// All explicit relations; reconciliation input.
    pub async fn list_all(pool: &PgPool) -> AppResult<Vec<Relation>> {
        let relations = sqlx::query_as::<_, Relation>(
            r#"SELECT * FROM relations ORDER BY source_number, target_number, relation"#,
        )
        .fetch_all(pool)
        .await?;

        Ok(relations)
    }

    /// Insert or refresh one explicit relation.
    pub async fn upsert(
        pool: &PgPool,
        source_number: i32,
        target_number: i32,
        relation: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO relations (source_number, target_number, relation)
            VALUES ($1, $2, $3)
            ON CONFLICT (source_number, target_number, relation) DO NOTHING
            "#,
        )
        .bind(source_number)
        .bind(target_number)
        .bind(relation)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Delete one explicit relation.
    pub async fn delete(
        pool: &PgPool,
        source_number: i32,
        target_number: i32,
        relation: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"DELETE FROM relations WHERE source_number = $1 AND target_number = $2 AND relation = $3"#,
        )
        .bind(source_number)
        .bind(target_number)
        .bind(relation)
        .execute(pool)
        .await?;

        Ok(())
    }
}
