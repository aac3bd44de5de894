//! Recommendation handlers

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

/// Recommendation routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/recommendations", post(handler::get_recommendations))
        .route(
            "/api/v1/users/{uuid}/recommendations",
            get(handler::get_skill_recommendations),
        )
}
