//! Submission handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Submission intake and result routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/submission/", post(handler::create_submission))
        .route("/submission/{id}", get(handler::get_submission_result))
        .route(
            "/api/problems/{question_number}/submissions",
            get(handler::list_problem_submissions),
        )
        .route(
            "/api/users/{user_id}/submissions",
            get(handler::list_user_submissions),
        )
}
