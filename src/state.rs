//! Application state management
//!
//! This module contains the shared application state that is passed
//! to all request handlers via Axum's State extractor.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::graph::GraphService;
use crate::judge::JudgeQueue;
use crate::storage::ObjectStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    /// Database connection pool
    db: PgPool,

    /// Object store for test-case payloads and assets
    storage: Arc<dyn ObjectStore>,

    /// Graph projection service
    graph: GraphService,

    /// Producer handle onto the judging queue
    queue: JudgeQueue,

    /// Application configuration
    config: Config,
}

impl AppState {
    /// Create a new application state
    pub fn new(
        db: PgPool,
        storage: Arc<dyn ObjectStore>,
        graph: GraphService,
        queue: JudgeQueue,
        config: Config,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                db,
                storage,
                graph,
                queue,
                config,
            }),
        }
    }

    /// Get a reference to the database pool
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// Get the object store
    pub fn storage(&self) -> &Arc<dyn ObjectStore> {
        &self.inner.storage
    }

    /// Get the graph service
    pub fn graph(&self) -> &GraphService {
        &self.inner.graph
    }

    /// Get the judge queue producer handle
    pub fn queue(&self) -> &JudgeQueue {
        &self.inner.queue
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}
