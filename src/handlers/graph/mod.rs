//! Graph admin and query handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

/// Graph projection routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/questions", get(handler::list_questions))
        .route("/relations", get(handler::list_relations))
        .route("/relations", post(handler::upsert_relation))
        .route("/relations", delete(handler::delete_relation))
        .route("/skills", get(handler::list_skills))
        .route("/skill-relations", get(handler::list_skill_relations))
        .route("/question-skills", get(handler::list_question_skills))
        .route(
            "/questions/{number}/prerequisites",
            get(handler::get_prerequisites),
        )
        .route("/questions/{number}/next", get(handler::get_next_level))
        .route(
            "/questions/{number}/recommendations",
            get(handler::get_question_recommendations),
        )
        .route("/path", get(handler::get_learning_path))
        .route("/users/{uuid}/solved", get(handler::get_solved_edges))
        .route("/init", post(handler::init_graph))
}
