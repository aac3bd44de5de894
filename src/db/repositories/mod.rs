//! Database repositories
//!
//! Stateless record mappers over the connection pool. Handlers and services
//! never write SQL directly; everything goes through this layer.

pub mod mastery_repo;
pub mod problem_repo;
pub mod relation_repo;
pub mod submission_repo;
pub mod test_case_repo;
pub mod user_repo;

pub use mastery_repo::MasteryRepository;
pub use problem_repo::ProblemRepository;
pub use relation_repo::RelationRepository;
pub use submission_repo::SubmissionRepository;
pub use test_case_repo::TestCaseRepository;
pub use user_repo::UserRepository;
