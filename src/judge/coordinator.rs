//! Judge coordinator
//!
//! Drives one submission through its state machine:
//! `pending -> processing -> (completed | error)`. Owns the executor choice,
//! loads the visible case set, assigns verdicts against normalized output,
//! aggregates resource counters, and persists the serialized results.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::{JudgeConfig, JudgeMode, LocalExecutorKind};
use crate::db::repositories::SubmissionRepository;
use crate::error::{AppError, AppResult};
use crate::models::{Submission, SubmissionStatus, TestCaseResult};
use crate::storage::ObjectStore;

use super::container::ContainerExecutor;
use super::executor::{sentinels, CaseOutcome, ExecutionLimits, Executor};
use super::host::HostExecutor;
use super::language::Language;
use super::normalize::normalize_output;
use super::remote::RemoteJudgeClient;
use super::testcase::{LoadedCase, TestCaseSource};

/// Coordinates judging for the worker. One instance is shared by all worker
/// tasks; the executor is resolved once, at construction.
pub struct JudgeCoordinator {
    pool: PgPool,
    cases: TestCaseSource,
    executor: Arc<dyn Executor>,
    config: JudgeConfig,
}

impl JudgeCoordinator {
    /// Resolve the executor from configuration and build the coordinator.
    /// `docker` is only required when the container backend is selected.
    pub fn new(
        pool: PgPool,
        store: Arc<dyn ObjectStore>,
        config: JudgeConfig,
        docker: Option<bollard::Docker>,
    ) -> AppResult<Self> {
        let executor: Arc<dyn Executor> = match config.mode {
            JudgeMode::Local if config.local.enabled => match config.local.executor {
                LocalExecutorKind::Host => Arc::new(HostExecutor::new(&config.local)),
                LocalExecutorKind::Container => {
                    let docker = docker.ok_or_else(|| {
                        AppError::Configuration(
                            "container executor selected but no docker client".to_string(),
                        )
                    })?;
                    Arc::new(ContainerExecutor::new(docker, config.local.clone()))
                }
            },
            JudgeMode::Local => {
                return Err(AppError::Configuration(
                    "judge.mode=local requires judge.local.enabled".to_string(),
                ))
            }
            JudgeMode::Remote => Arc::new(RemoteJudgeClient::new(
                config.remote.api_url.clone(),
                config.timeout_secs,
            )?),
        };

        Ok(Self {
            cases: TestCaseSource::new(pool.clone(), store),
            pool,
            executor,
            config,
        })
    }

    /// Judge one submission to completion. On success the submission row is
    /// `completed` with serialized results; the caller handles the `error`
    /// transition when this returns `Err`.
    pub async fn judge(&self, submission: &mut Submission) -> AppResult<()> {
        // idempotency guard: a terminal submission is never re-judged
        if submission.status == SubmissionStatus::Completed.as_str() {
            return Err(AppError::Conflict("提交已完成评测，无需重复评测".to_string()));
        }

        let problem = crate::db::repositories::ProblemRepository::find_by_id(
            &self.pool,
            submission.question_id,
        )
        .await
        .map_err(|e| AppError::Judge(format!("获取测试用例失败: {}", e)))?
        .ok_or_else(|| AppError::Judge("题目没有可用的测试用例".to_string()))?;

        let cases = self.cases.load(&problem).await?;

        submission.status = SubmissionStatus::Processing.as_str().to_string();
        SubmissionRepository::mark_processing(&self.pool, &submission.id).await?;

        let language = self.resolve_language(submission)?;

        let limits = ExecutionLimits {
            time_limit_ms: problem.time_limit.max(1) as u64,
            memory_limit_mb: problem.memory_limit.max(1) as u64,
            max_output_kb: self.config.local.max_output_kb,
        };

        tracing::info!(
            submission_id = %submission.id,
            question = problem.question_number,
            language = %language,
            cases = cases.len(),
            "judging submission"
        );

        let inputs: Vec<String> = cases.iter().map(|c| c.input.clone()).collect();
        let outcomes = self
            .executor
            .run_batch(&submission.code, language, &inputs, &limits)
            .await?;

        if outcomes.len() != cases.len() {
            return Err(AppError::Judge(format!(
                "评测结果数量不匹配: got={} want={}",
                outcomes.len(),
                cases.len()
            )));
        }

        let results = assign_verdicts(&cases, outcomes);

        submission.runtime_ms = results.iter().map(|r| r.runtime_ms).max().unwrap_or(0);
        submission.memory_kb = results.iter().map(|r| r.memory_kb).max().unwrap_or(0);
        if submission.language.is_empty() {
            submission.language = Language::detect(&submission.code).as_str().to_string();
        }
        if submission.code_length == 0 {
            submission.code_length = submission.code.len() as i32;
        }
        submission.results = serde_json::to_string(&results)
            .map_err(|e| AppError::Judge(format!("序列化测试结果失败: {}", e)))?;
        submission.status = SubmissionStatus::Completed.as_str().to_string();

        SubmissionRepository::save_completed(
            &self.pool,
            &submission.id,
            &submission.language,
            submission.code_length,
            submission.runtime_ms,
            submission.memory_kb,
            &submission.results,
        )
        .await?;

        Ok(())
    }

    /// Prefer the caller-provided language label; fall back to detection.
    fn resolve_language(&self, submission: &Submission) -> AppResult<Language> {
        let language = if submission.language.is_empty() {
            Language::detect(&submission.code)
        } else {
            Language::parse(&submission.language)
                .unwrap_or_else(|| Language::detect(&submission.code))
        };

        if self.config.mode == JudgeMode::Local
            && !self.config.local.supports_language(language.as_str())
        {
            return Err(AppError::Judge(format!(
                "不支持的编程语言: {}",
                language.as_str()
            )));
        }
        Ok(language)
    }
}

/// Pair raw outcomes with their cases and decide correctness.
///
/// Sentinel outputs are never compared against expected text; everything
/// else is normalized on both sides before the equality check.
pub fn assign_verdicts(cases: &[LoadedCase], outcomes: Vec<CaseOutcome>) -> Vec<TestCaseResult> {
    cases
        .iter()
        .zip(outcomes)
        .map(|(case, outcome)| {
            let expected = normalize_output(&case.expected);
            let (actual, is_correct) = if sentinels::is_verdict(&outcome.actual_output) {
                (outcome.actual_output, false)
            } else {
                let actual = normalize_output(&outcome.actual_output);
                let is_correct = actual == expected;
                (actual, is_correct)
            };

            TestCaseResult {
                input: case.input.clone(),
                expected_output: expected,
                actual_output: actual,
                is_correct,
                runtime_ms: outcome.runtime_ms,
                memory_kb: outcome.memory_kb,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(input: &str, expected: &str) -> LoadedCase {
        LoadedCase {
            input: input.to_string(),
            expected: expected.to_string(),
        }
    }

    fn outcome(actual: &str, runtime_ms: i64) -> CaseOutcome {
        CaseOutcome {
            actual_output: actual.to_string(),
            runtime_ms,
            memory_kb: 0,
        }
    }

    #[test]
    fn test_correct_answer() {
        let results = assign_verdicts(&[case("3 4\n", "7\n")], vec![outcome("7", 12)]);
        assert_eq!(results.len(), 1);
        assert!(results[0].is_correct);
        assert_eq!(results[0].expected_output, "7");
        assert_eq!(results[0].actual_output, "7");
        assert_eq!(results[0].runtime_ms, 12);
    }

    #[test]
    fn test_line_ending_differences_accepted() {
        let results = assign_verdicts(
            &[case("", "a\r\nb")],
            vec![outcome("a\nb", 1)],
        );
        assert!(results[0].is_correct);
    }

    #[test]
    fn test_wrong_answer() {
        let results = assign_verdicts(&[case("3 4\n", "7")], vec![outcome("0", 2)]);
        assert!(!results[0].is_correct);
        assert_eq!(results[0].actual_output, "0");
    }

    #[test]
    fn test_sentinels_never_compare() {
        // expected output literally equal to the sentinel must still fail
        let results = assign_verdicts(
            &[case("", "Time Limit Exceeded")],
            vec![outcome("Time Limit Exceeded", 500)],
        );
        assert!(!results[0].is_correct);
        assert_eq!(results[0].actual_output, "Time Limit Exceeded");
    }

    #[test]
    fn test_compile_error_marks_all_cases() {
        let cases = vec![case("1", "1"), case("2", "2")];
        let outcomes = vec![
            outcome("Compile Error: missing brace", 0),
            outcome("Compile Error: missing brace", 0),
        ];
        let results = assign_verdicts(&cases, outcomes);
        assert!(results.iter().all(|r| !r.is_correct));
        assert!(results
            .iter()
            .all(|r| r.actual_output.starts_with("Compile Error")));
    }
}
