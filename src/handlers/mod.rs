//! HTTP Request Handlers
//!
//! This module contains all HTTP request handlers organized by domain.

pub mod auth;
pub mod graph;
pub mod health;
pub mod mastery;
pub mod recommendations;
pub mod submissions;

use axum::Router;

use crate::state::AppState;

/// Create all API routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(submissions::routes())
        .merge(mastery::routes())
        .merge(recommendations::routes())
        .nest("/api/v1/graph", graph::routes())
}
