//! Domain models and database row types

pub mod mastery;
pub mod problem;
pub mod relation;
pub mod submission;
pub mod test_case;
pub mod user;

pub use mastery::{UserQuestionMastery, UserSkillMastery, UserTagMastery};
pub use problem::{Difficulty, Problem};
pub use relation::Relation;
pub use submission::{Submission, SubmissionStatus, TestCaseResult};
pub use test_case::TestCase;
pub use user::{User, UserSolve};
