//! Mastery tracking models
//!
//! Three granularities: per-question and per-tag attempt counters (updated on
//! every verdict), and the per-skill scalar driven by the learning law
//! (updated only on accepted submissions).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-(user, question) attempt counters.
///
/// `mastery = accepted_count / attempts` when attempts > 0, else 0.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserQuestionMastery {
    pub id: i32,
    pub user_uuid: Uuid,
    pub question_number: i32,
    pub question_id: String,
    pub attempts: i32,
    pub accepted_count: i32,
    pub mastery: f64,
    pub last_submitted_at: Option<DateTime<Utc>>,
    pub last_accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-(user, tag) attempt counters, same arithmetic as the question row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserTagMastery {
    pub id: i32,
    pub user_uuid: Uuid,
    pub tag: String,
    pub attempts: i32,
    pub accepted_count: i32,
    pub mastery: f64,
    pub last_submitted_at: Option<DateTime<Utc>>,
    pub last_accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-(user, skill) mastery scalar in [0, 1].
///
/// Only the learning law writes this value; it is monotone non-decreasing.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserSkillMastery {
    pub id: i32,
    pub user_uuid: Uuid,
    pub skill_key: String,
    pub mastery: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
