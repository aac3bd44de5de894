//! Mastery handlers

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

/// Mastery read and admin routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/users/{uuid}/mastery/questions",
            get(handler::list_question_mastery),
        )
        .route(
            "/api/users/{uuid}/mastery/tags",
            get(handler::list_tag_mastery),
        )
        .route(
            "/api/users/{uuid}/mastery/skills",
            get(handler::list_skill_mastery),
        )
        .route(
            "/api/users/{uuid}/mastery/events",
            post(handler::submit_mastery_event),
        )
        .route(
            "/api/users/{uuid}/mastery/questions/{number}",
            delete(handler::delete_question_mastery),
        )
        .route(
            "/api/users/{uuid}/mastery/tags",
            delete(handler::delete_tag_mastery),
        )
}
