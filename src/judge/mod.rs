//! Judging pipeline
//!
//! Intake validates and enqueues submissions; a background worker drains the
//! bounded queue and drives each one through the coordinator, which loads
//! test cases, executes on the configured backend (host process, container,
//! or remote sandbox service), classifies verdicts, and persists results.

pub mod container;
pub mod coordinator;
pub mod executor;
pub mod host;
pub mod language;
pub mod normalize;
pub mod queue;
pub mod remote;
pub mod testcase;

pub use coordinator::JudgeCoordinator;
pub use executor::{CaseOutcome, ExecutionLimits, Executor};
pub use language::Language;
pub use normalize::normalize_output;
pub use queue::{spawn_worker, JudgeQueue};
pub use testcase::TestCaseSource;
