//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

// =============================================================================
// JUDGE DEFAULTS
// =============================================================================

/// Default judge mode (`local` or `remote`)
pub const DEFAULT_JUDGE_MODE: &str = "local";

/// Default timeout for external judge calls in seconds
pub const DEFAULT_JUDGE_TIMEOUT_SECS: u64 = 15;

/// Default capacity of the in-memory submission queue
pub const DEFAULT_JUDGE_QUEUE_SIZE: usize = 100;

/// Default sandbox root directory for the local executors
pub const DEFAULT_SANDBOX_DIR: &str = "./sandbox";

/// Default local executor (`host` or `container`)
pub const DEFAULT_LOCAL_EXECUTOR: &str = "host";

/// Default per-case memory cap in megabytes
pub const DEFAULT_MAX_MEMORY_MB: u64 = 128;

/// Default per-case wall-clock limit in seconds
pub const DEFAULT_MAX_TIME_SECS: u64 = 5;

/// Default output cap in kilobytes
pub const DEFAULT_MAX_OUTPUT_KB: usize = 1024;

/// Problem defaults when the row carries no limits
pub const DEFAULT_TIME_LIMIT_MS: i32 = 2000;
pub const DEFAULT_MEMORY_LIMIT_MB: i32 = 256;

// =============================================================================
// SUPPORTED LANGUAGES
// =============================================================================

/// Language identifiers
pub mod languages {
    pub const GO: &str = "go";
    pub const PYTHON: &str = "python";
    pub const CPP: &str = "cpp";
    pub const JAVA: &str = "java";

    /// All supported language identifiers
    pub const ALL: &[&str] = &[GO, PYTHON, CPP, JAVA];
}

/// Default container images per language, overridable via config
pub mod container_images {
    pub const GO: &str = "golang:1.22-bookworm";
    pub const CPP: &str = "gcc:13-bookworm";
    pub const PYTHON: &str = "python:3.12-bookworm";
    pub const JAVA: &str = "eclipse-temurin:21-jdk";
}

// =============================================================================
// SUBMISSION STATUSES
// =============================================================================

/// Submission lifecycle states; the only legal order is
/// pending -> processing -> (completed | error).
pub mod statuses {
    pub const PENDING: &str = "pending";
    pub const PROCESSING: &str = "processing";
    pub const COMPLETED: &str = "completed";
    pub const ERROR: &str = "error";
}

/// Problem publication states
pub mod problem_status {
    pub const DRAFT: &str = "draft";
    pub const PUBLISHED: &str = "published";
    pub const ARCHIVED: &str = "archived";
    pub const HIDDEN: &str = "hidden";
}

/// User account states
pub mod user_status {
    pub const ACTIVE: &str = "active";
    pub const DISABLED: &str = "disabled";
}

// =============================================================================
// JUDGE ERROR CODES
// =============================================================================

/// Error codes attached to submissions that end in the `error` state.
/// Classification matches on substrings of the failure message.
pub mod judge_errors {
    /// Problem has no usable test cases
    pub const MISSING_TEST_CASES: &str = "E001";
    /// Compilation failed at the infrastructure level
    pub const COMPILE: &str = "E002";
    /// System-level timeout
    pub const TIMEOUT: &str = "E003";
    /// System-level memory exhaustion
    pub const MEMORY: &str = "E004";
    /// Network failure talking to the remote judge
    pub const NETWORK: &str = "E005";
    /// Anything else
    pub const UNKNOWN: &str = "E999";
}

// =============================================================================
// PERMISSIONS
// =============================================================================

/// Permission codes consulted through the authorization hook
pub mod permissions {
    pub const ADMIN: &str = "admin";
}

// =============================================================================
// RECOMMENDATION DEFAULTS
// =============================================================================

/// Default number of recommendations returned
pub const DEFAULT_RECOMMEND_LIMIT: usize = 20;

/// Maximum number of recommendations per request
pub const MAX_RECOMMEND_LIMIT: usize = 100;

/// Default mastery threshold separating "mastered" from "in progress"
pub const DEFAULT_MASTERY_THRESHOLD: f64 = 0.7;

/// Default difficulty-rank tolerance around the user's base difficulty
pub const DEFAULT_DIFFICULTY_TOLERANCE: i32 = 1;

/// Default backward search depth in target mode
pub const DEFAULT_MAX_DEPTH: usize = 6;

/// Hard cap on backward search depth
pub const MAX_SEARCH_DEPTH: usize = 20;

/// Learning rate of the skill-mastery update law
pub const MASTERY_LEARNING_RATE: f64 = 0.2;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for paginated results
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximum page size for paginated results
pub const MAX_PAGE_SIZE: u32 = 100;
