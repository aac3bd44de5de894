//! Object storage contract
//!
//! Test-case payloads and uploaded assets live in an S3-compatible store.
//! The judging pipeline only depends on this trait; the production
//! implementation speaks to MinIO/S3, and an in-memory store backs tests.

pub mod memory;
pub mod s3;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::error::AppResult;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

/// Metadata for a stored object (or synthesized directory entry).
#[derive(Debug, Clone, Serialize)]
pub struct ObjectInfo {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
    pub content_type: Option<String>,
    pub is_dir: bool,
}

/// S3-style object store operations used by the judge and the admin surface.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create the configured bucket when it does not exist yet.
    async fn create_bucket_if_absent(&self) -> AppResult<()>;

    /// Upload an object.
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> AppResult<()>;

    /// Fetch an object's full content.
    async fn get_bytes(&self, key: &str) -> AppResult<Vec<u8>>;

    /// Delete an object.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Fetch an object's metadata.
    async fn stat(&self, key: &str) -> AppResult<ObjectInfo>;

    /// List object keys under a prefix. Non-recursive listings also yield
    /// pseudo-directory keys ending in `/`.
    async fn list(&self, prefix: &str, recursive: bool) -> AppResult<Vec<String>>;

    /// List objects with metadata under a prefix.
    async fn list_info(&self, prefix: &str, recursive: bool) -> AppResult<Vec<ObjectInfo>>;

    /// Presigned download URL.
    async fn presign_get(&self, key: &str, ttl: Duration) -> AppResult<String>;

    /// Presigned upload URL.
    async fn presign_put(&self, key: &str, ttl: Duration) -> AppResult<String>;

    /// Grant anonymous read on the given key prefixes.
    async fn set_public_read_prefixes(&self, prefixes: &[String]) -> AppResult<()>;
}

/// Prefix under which a problem's test-case pairs are discovered; cases are
/// named `<n>.in` / `<n>.out` with positive integer `n`.
pub fn problem_case_prefix(question_number: i32) -> String {
    format!("problems/{}/", question_number)
}

/// Normalize a public-read prefix: strip a leading `/`, ensure a trailing `/`.
pub fn normalize_public_read_prefix(prefix: &str) -> Option<String> {
    let p = prefix.trim().trim_start_matches('/');
    if p.is_empty() {
        return None;
    }
    if p.ends_with('/') {
        Some(p.to_string())
    } else {
        Some(format!("{}/", p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_prefix() {
        assert_eq!(problem_case_prefix(1001), "problems/1001/");
    }

    #[test]
    fn test_normalize_public_read_prefix() {
        assert_eq!(
            normalize_public_read_prefix("/assets"),
            Some("assets/".to_string())
        );
        assert_eq!(
            normalize_public_read_prefix("assets/"),
            Some("assets/".to_string())
        );
        assert_eq!(normalize_public_read_prefix("   "), None);
        assert_eq!(normalize_public_read_prefix("/"), None);
    }
}
