//! User and solved-list models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User database model
///
/// Authentication and session issuance live outside this service; the fields
/// kept here are the ones the judging pipeline and the permission hook read.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub uuid: Uuid,
    pub username: String,
    /// active | disabled; legacy rows may carry an empty string (treated active)
    pub status: String,
    /// Comma-separated permission codes consulted by the authorization hook
    pub permissions: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Disabled accounts cannot submit.
    pub fn is_active(&self) -> bool {
        self.status.is_empty() || self.status == crate::constants::user_status::ACTIVE
    }

    pub fn has_permission(&self, code: &str) -> bool {
        self.permissions
            .split(',')
            .map(str::trim)
            .any(|p| p == code)
    }
}

/// Per-user solved list: comma-joined public question numbers.
///
/// A question number appears at most once regardless of how many accepted
/// submissions the user has; the worker checks membership before appending.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserSolve {
    pub id: i32,
    pub uuid: Uuid,
    pub problem_ids: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSolve {
    /// Split the stored list into question numbers.
    pub fn solved_numbers(&self) -> Vec<String> {
        self.problem_ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn contains(&self, question_number: i32) -> bool {
        let qn = question_number.to_string();
        self.solved_numbers().iter().any(|s| *s == qn)
    }

    /// Append a question number; caller is responsible for the dedup check.
    pub fn appended(&self, question_number: i32) -> String {
        if self.problem_ids.is_empty() {
            question_number.to_string()
        } else {
            format!("{},{}", self.problem_ids, question_number)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(ids: &str) -> UserSolve {
        UserSolve {
            id: 1,
            uuid: Uuid::new_v4(),
            problem_ids: ids.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_solved_membership_is_exact() {
        let s = solve("1001,1002");
        assert!(s.contains(1001));
        assert!(s.contains(1002));
        // substring of an existing entry must not count as solved
        assert!(!s.contains(100));
        assert!(!s.contains(1));
    }

    #[test]
    fn test_append() {
        assert_eq!(solve("").appended(1001), "1001");
        assert_eq!(solve("1001").appended(1002), "1001,1002");
    }

    #[test]
    fn test_user_permissions() {
        let u = User {
            id: 1,
            uuid: Uuid::new_v4(),
            username: "alice".into(),
            status: "active".into(),
            permissions: "admin, grader".into(),
            created_at: Utc::now(),
        };
        assert!(u.is_active());
        assert!(u.has_permission("admin"));
        assert!(u.has_permission("grader"));
        assert!(!u.has_permission("root"));
    }

    #[test]
    fn test_empty_status_is_active() {
        let mut u = User {
            id: 1,
            uuid: Uuid::new_v4(),
            username: "bob".into(),
            status: String::new(),
            permissions: String::new(),
            created_at: Utc::now(),
        };
        assert!(u.is_active());
        u.status = "disabled".into();
        assert!(!u.is_active());
    }
}
