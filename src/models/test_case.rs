//! Test case model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Test case database model
///
/// A case either carries its input/expected text inline or references the
/// object store through `input_key`/`output_key`. Hidden cases never reach
/// the judge's visible set.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TestCase {
    pub id: i32,
    pub question_id: i32,
    pub input: String,
    pub expected_output: String,
    pub input_key: Option<String>,
    pub output_key: Option<String>,
    pub input_size: Option<i64>,
    pub output_size: Option<i64>,
    pub is_hidden: bool,
}

impl TestCase {
    /// A case discovered in the object store rather than loaded from a row.
    pub fn from_object_keys(question_id: i32, input_key: String, output_key: String) -> Self {
        Self {
            id: 0,
            question_id,
            input: String::new(),
            expected_output: String::new(),
            input_key: Some(input_key),
            output_key: Some(output_key),
            input_size: None,
            output_size: None,
            is_hidden: false,
        }
    }
}
