//! Graph entity types
//!
//! Nodes are addressed by stable keys (question number, skill key, user
//! UUID); edges reference endpoints by key, never by pointer, so cyclic and
//! bidirectional relations carry no ownership cycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Question node, mirroring the relational problem row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionNode {
    pub question_number: i32,
    pub question_id: String,
    pub title: String,
    pub difficulty: String,
    pub tags: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuestionNode {
    /// Field-wise equality ignoring timestamps; reconciliation uses this to
    /// skip untouched nodes.
    pub fn same_content(&self, other: &QuestionNode) -> bool {
        self.question_number == other.question_number
            && self.question_id == other.question_id
            && self.title == other.title
            && self.difficulty == other.difficulty
            && self.tags == other.tags
            && self.status == other.status
    }
}

/// Skill node keyed by its normalized skill key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillNode {
    pub key: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Typed directed edges between question nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    /// A is a prerequisite of B
    Prerequisite,
    /// From A one can advance to B
    NextLevel,
    /// A and B are similar problems
    Similar,
    /// A and B belong to the same category
    Category,
    /// Auto-derived: A and B share tags (weight = shared count)
    TagSimilar,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prerequisite => "PREREQUISITE",
            Self::NextLevel => "NEXT_LEVEL",
            Self::Similar => "SIMILAR",
            Self::Category => "CATEGORY",
            Self::TagSimilar => "TAG_SIMILAR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PREREQUISITE" => Some(Self::Prerequisite),
            "NEXT_LEVEL" => Some(Self::NextLevel),
            "SIMILAR" => Some(Self::Similar),
            "CATEGORY" => Some(Self::Category),
            "TAG_SIMILAR" => Some(Self::TagSimilar),
            _ => None,
        }
    }

    /// Relation types that users author explicitly (reconciled against the
    /// relational store; never rebuilt automatically).
    pub const EXPLICIT: &'static [RelationType] = &[
        Self::Prerequisite,
        Self::NextLevel,
        Self::Similar,
        Self::Category,
    ];
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Directed edge between two question nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRelation {
    pub from_question_number: i32,
    pub to_question_number: i32,
    pub relation_type: RelationType,
    pub weight: f64,
    pub description: String,
    /// Auto-derived edges are rebuilt from scratch on reconciliation
    pub auto: bool,
    pub created_at: DateTime<Utc>,
}

/// Typed edges between skill nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillRelationType {
    /// Co-occurrence in the same problem; weight = co-occurrence count
    SkillCoOccur,
    /// Name containment, general -> specific; fixed weight
    SkillSubsumes,
}

impl SkillRelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkillCoOccur => "SKILL_CO_OCCUR",
            Self::SkillSubsumes => "SKILL_SUBSUMES",
        }
    }
}

/// Edge between two skill nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRelation {
    pub from_key: String,
    pub to_key: String,
    pub relation_type: SkillRelationType,
    pub weight: f64,
}

/// `Question -[:HAS_SKILL]-> Skill` edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSkillRelation {
    pub question_number: i32,
    pub skill_key: String,
    pub weight: f64,
}

/// `User -[:SOLVED]-> Question` edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvedEdge {
    pub user_uuid: Uuid,
    pub question_number: i32,
    pub solved_at: DateTime<Utc>,
}

/// Per-skill mastery as projected into the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMasteryEntry {
    pub skill_key: String,
    pub mastery: f64,
}

/// Result of the shortest-path query over PREREQUISITE and NEXT_LEVEL edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    pub start_question: i32,
    pub end_question: i32,
    pub path: Vec<i32>,
    pub total_weight: f64,
    pub path_length: usize,
}

/// One per-question recommendation with its best-scoring explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRecommendation {
    pub question_number: i32,
    pub question_id: String,
    pub title: String,
    pub difficulty: String,
    pub score: f64,
    /// NEXT_LEVEL | SIMILAR | TAG | TAG_CO_OCCUR
    pub relation_type: String,
    pub reason: String,
    /// Skill behind the recommendation, when one exists
    pub skill_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_type_round_trip() {
        for t in [
            RelationType::Prerequisite,
            RelationType::NextLevel,
            RelationType::Similar,
            RelationType::Category,
            RelationType::TagSimilar,
        ] {
            assert_eq!(RelationType::parse(t.as_str()), Some(t));
        }
        assert_eq!(RelationType::parse("SOLVED"), None);
    }

    #[test]
    fn test_explicit_types_exclude_auto() {
        assert!(!RelationType::EXPLICIT.contains(&RelationType::TagSimilar));
        assert_eq!(RelationType::EXPLICIT.len(), 4);
    }
}
