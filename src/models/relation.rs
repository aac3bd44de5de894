//! Explicit problem-relation model
//!
//! User-authored relations between problems, stored relationally and
//! projected into the graph by reconciliation. Auto-derived edges
//! (HAS_SKILL, TAG_SIMILAR, skill relations) never appear here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Directed relation between two problems, by public question number.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Relation {
    pub id: i32,
    pub source_number: i32,
    pub target_number: i32,
    /// PREREQUISITE | NEXT_LEVEL | SIMILAR | CATEGORY
    pub relation: String,
    pub created_at: DateTime<Utc>,
}
