//! Graph projection of the problem space
//!
//! The relational store owns the data; the graph is a projection reconciled
//! from it at startup and on demand. Nodes are questions, skills, and users;
//! edges carry the typed relations the recommendation engine traverses.

pub mod service;
pub mod store;
pub mod types;

pub use service::{build_auto_skill_relations, GraphService};
pub use store::GraphStore;
pub use types::{
    GraphRecommendation, LearningPath, QuestionNode, QuestionRelation, QuestionSkillRelation,
    RelationType, SkillNode, SkillRelation, SkillRelationType, SolvedEdge, UserMasteryEntry,
};
