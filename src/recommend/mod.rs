//! Recommendation engine
//!
//! Combines per-user mastery state with a graph snapshot to produce a
//! ranked, diversified list of next problems. The engine itself is a pure
//! function over its inputs, so identical mastery and graph state always
//! yield identical recommendations; the service wrapper loads those inputs
//! from the record store and the graph projection.

pub mod engine;
pub mod service;

pub use engine::{
    difficulty_rank, recommend, EngineInput, Explanation, RecommendMode, RecommendParams,
    Recommendation, ScoreBreakdown,
};
pub use service::RecommendationService;
