//! Mastery updater
//!
//! Every judged submission bumps the per-question and per-tag attempt
//! counters. Accepted submissions additionally move the per-skill mastery
//! scalar through the learning law and project it into the graph. Graph
//! failures are logged and skipped; they never fail a judging cycle.

use sqlx::PgPool;
use uuid::Uuid;

use crate::constants::MASTERY_LEARNING_RATE;
use crate::db::repositories::MasteryRepository;
use crate::error::AppResult;
use crate::graph::GraphService;
use crate::models::{Difficulty, Problem};

/// Split a problem's tag list on regular and full-width commas, trimming
/// empties. Order is preserved.
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.replace('，', ",")
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize a tag into a skill key: trimmed, full-width spaces regularized,
/// interior whitespace collapsed, lowercased.
pub fn normalize_skill_key(name: &str) -> String {
    name.replace('　', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Unique, sorted skill keys derived from a tag list.
pub fn skill_keys_from_tags(tags: &str) -> Vec<String> {
    let mut keys: Vec<String> = split_tags(tags)
        .iter()
        .map(|t| normalize_skill_key(t))
        .filter(|k| !k.is_empty())
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

/// Difficulty factor of the learning law; unknown labels learn slowly.
pub fn difficulty_factor(label: &str) -> f64 {
    match Difficulty::parse(label) {
        Some(Difficulty::Easy) => 0.5,
        Some(Difficulty::Medium) => 0.8,
        Some(Difficulty::Hard) => 1.2,
        _ => 0.5,
    }
}

/// The learning law: growth shrinks as mastery approaches 1, scales with
/// problem difficulty, and never decreases.
pub fn apply_learning_law(current: f64, difficulty_label: &str) -> f64 {
    let d = difficulty_factor(difficulty_label);
    let next = current + MASTERY_LEARNING_RATE * (1.0 - current) * d;
    next.clamp(0.0, 1.0)
}

/// Applies mastery updates after a submission reaches a terminal state.
pub struct MasteryService;

impl MasteryService {
    /// Record one judged submission: counters always, the skill law on AC.
    pub async fn record_submission(
        pool: &PgPool,
        graph: Option<&GraphService>,
        user_uuid: &Uuid,
        problem: &Problem,
        accepted: bool,
    ) -> AppResult<()> {
        if problem.question_number == 0 {
            return Ok(());
        }

        let mut question_id = problem
            .question_id
            .clone()
            .unwrap_or_default();
        if question_id.is_empty() {
            question_id = problem.question_number.to_string();
        }
        // column is varchar(36); cut on a char boundary
        if question_id.len() > 36 {
            let mut cut = 36;
            while !question_id.is_char_boundary(cut) {
                cut -= 1;
            }
            question_id.truncate(cut);
        }

        MasteryRepository::record_question_attempt(
            pool,
            user_uuid,
            problem.question_number,
            &question_id,
            accepted,
        )
        .await?;

        for tag in split_tags(&problem.tags) {
            if let Err(e) = MasteryRepository::record_tag_attempt(pool, user_uuid, &tag, accepted).await
            {
                tracing::warn!(user = %user_uuid, tag, "tag mastery update failed: {}", e);
            }
        }

        if accepted {
            Self::apply_skill_growth(pool, graph, user_uuid, problem).await?;
        }

        Ok(())
    }

    /// Move every touched skill through the learning law and mirror the new
    /// value into the graph projection.
    async fn apply_skill_growth(
        pool: &PgPool,
        graph: Option<&GraphService>,
        user_uuid: &Uuid,
        problem: &Problem,
    ) -> AppResult<()> {
        for key in skill_keys_from_tags(&problem.tags) {
            let current = MasteryRepository::skill_mastery(pool, user_uuid, &key).await?;
            let next = apply_learning_law(current, &problem.difficulty);

            MasteryRepository::upsert_skill_mastery(pool, user_uuid, &key, next).await?;

            if let Some(graph) = graph {
                if let Err(e) = graph.update_user_mastery(user_uuid, &key, next).await {
                    tracing::warn!(
                        user = %user_uuid,
                        skill = key,
                        "graph mastery projection failed: {}",
                        e
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tags_both_comma_flavors() {
        assert_eq!(split_tags("dp,graph"), vec!["dp", "graph"]);
        assert_eq!(split_tags("动态规划，图论"), vec!["动态规划", "图论"]);
        assert_eq!(split_tags(" dp , ,graph ,"), vec!["dp", "graph"]);
        assert!(split_tags("").is_empty());
        assert!(split_tags(" ，, ").is_empty());
    }

    #[test]
    fn test_normalize_skill_key() {
        assert_eq!(normalize_skill_key("  Dynamic  Programming "), "dynamic programming");
        assert_eq!(normalize_skill_key("图　论"), "图 论");
        assert_eq!(normalize_skill_key("DP"), "dp");
        assert_eq!(normalize_skill_key("   "), "");
    }

    #[test]
    fn test_skill_keys_unique_sorted() {
        assert_eq!(
            skill_keys_from_tags("Graph, dp, graph , DP"),
            vec!["dp", "graph"]
        );
    }

    #[test]
    fn test_difficulty_factor_table() {
        assert_eq!(difficulty_factor("Easy"), 0.5);
        assert_eq!(difficulty_factor("简单"), 0.5);
        assert_eq!(difficulty_factor("Medium"), 0.8);
        assert_eq!(difficulty_factor("中等"), 0.8);
        assert_eq!(difficulty_factor("Hard"), 1.2);
        assert_eq!(difficulty_factor("困难"), 1.2);
        assert_eq!(difficulty_factor(""), 0.5);
        assert_eq!(difficulty_factor("whatever"), 0.5);
    }

    #[test]
    fn test_learning_law_growth() {
        // fresh skill, easy problem: 0 + 0.2 * 1 * 0.5
        assert!((apply_learning_law(0.0, "Easy") - 0.1).abs() < 1e-9);
        // hard problems grow faster
        assert!((apply_learning_law(0.0, "Hard") - 0.24).abs() < 1e-9);
        // growth slows near the ceiling
        let near_top = apply_learning_law(0.95, "Hard");
        assert!(near_top > 0.95 && near_top <= 1.0);
    }

    #[test]
    fn test_learning_law_monotone_and_clamped() {
        let mut m = 0.0;
        for _ in 0..200 {
            let next = apply_learning_law(m, "困难");
            assert!(next >= m);
            assert!(next <= 1.0);
            m = next;
        }
        assert!(m > 0.999);
        assert_eq!(apply_learning_law(1.0, "Hard"), 1.0);
    }
}
