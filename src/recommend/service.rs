//! Recommendation services
//!
//! Load the engine's inputs from the record store and the graph projection,
//! run the pure engine, and annotate skill-targeted picks with mastery-aware
//! reasons.

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::repositories::{MasteryRepository, ProblemRepository};
use crate::error::AppResult;
use crate::graph::{GraphRecommendation, GraphService};

use super::engine::{difficulty_rank, recommend, EngineInput, RecommendParams, Recommendation};

/// Zone-of-proximal-development band for skill-targeted recommendations.
const ZPD_LOW: f64 = 0.2;
const ZPD_HIGH: f64 = 0.8;

/// Recommendation service over the record store and graph projection.
pub struct RecommendationService;

impl RecommendationService {
    /// Mastery- and graph-driven recommendations (default or target mode).
    pub async fn personalized(
        pool: &PgPool,
        graph: &GraphService,
        user_uuid: &Uuid,
        params: RecommendParams,
    ) -> AppResult<Vec<Recommendation>> {
        let question_rows = MasteryRepository::question_mastery_for_user(pool, user_uuid).await?;
        let tag_rows = MasteryRepository::tag_mastery_for_user(pool, user_uuid).await?;

        let question_mastery: HashMap<i32, f64> = question_rows
            .iter()
            .map(|m| (m.question_number, m.mastery))
            .collect();
        let tag_mastery: HashMap<String, f64> =
            tag_rows.iter().map(|m| (m.tag.clone(), m.mastery)).collect();

        // difficulty anchor: the user's most recently accepted problem
        let base_rank = match MasteryRepository::latest_accepted_question(pool, user_uuid).await? {
            Some(number) => ProblemRepository::find_by_number(pool, number)
                .await?
                .map(|p| difficulty_rank(&p.difficulty)),
            None => None,
        };

        let input = EngineInput {
            questions: graph
                .list_questions()
                .await
                .into_iter()
                .map(|n| (n.question_number, n))
                .collect(),
            relations: graph.list_relations().await,
            question_mastery,
            tag_mastery,
            base_rank,
        };

        recommend(&input, params)
    }

    /// Skill-targeted recommendations: find the user's zone-of-proximal-
    /// development skills and offer unsolved problems touching them.
    pub async fn skill_targeted(
        graph: &GraphService,
        user_uuid: &Uuid,
        limit: usize,
    ) -> AppResult<Vec<GraphRecommendation>> {
        let masteries = graph.get_user_mastery(user_uuid).await;

        let targets: Vec<String> = masteries
            .iter()
            .filter(|m| m.mastery >= ZPD_LOW && m.mastery < ZPD_HIGH)
            .map(|m| m.skill_key.clone())
            .collect();

        let mastery_by_key: HashMap<&str, f64> = masteries
            .iter()
            .map(|m| (m.skill_key.as_str(), m.mastery))
            .collect();

        let mut recommendations = graph
            .recommend_by_skills(user_uuid, &targets, limit)
            .await;

        for rec in &mut recommendations {
            if rec.skill_key.is_empty() {
                continue;
            }
            let current = mastery_by_key
                .get(rec.skill_key.as_str())
                .copied()
                .unwrap_or(0.0);
            rec.reason = if current < ZPD_LOW {
                format!("新技能入门: {}", rec.skill_key)
            } else if current < ZPD_HIGH {
                format!("针对性强化: {} (当前: {:.2})", rec.skill_key, current)
            } else {
                format!("高阶挑战: {} (当前: {:.2})", rec.skill_key, current)
            };
        }

        Ok(recommendations)
    }
}
