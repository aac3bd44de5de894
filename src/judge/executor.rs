//! The executor capability shared by the host, container, and remote backends
//!
//! Executors never fail a single case with an error: every per-case problem
//! is reported as a sentinel string in the outcome's `actual_output`, so the
//! coordinator can classify verdicts uniformly. Only infrastructure failures
//! that invalidate the whole batch (sandbox creation, HTTP transport, Docker
//! daemon) surface as `Err`.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::judge::language::Language;

/// Resource limits applied to every case of a batch.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionLimits {
    pub time_limit_ms: u64,
    pub memory_limit_mb: u64,
    pub max_output_kb: usize,
}

/// Raw outcome of one case: output (or sentinel) plus resource counters.
/// Verdict assignment happens later, in the coordinator.
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub actual_output: String,
    pub runtime_ms: i64,
    pub memory_kb: i64,
}

impl CaseOutcome {
    pub fn sentinel(message: impl Into<String>) -> Self {
        Self {
            actual_output: message.into(),
            runtime_ms: 0,
            memory_kb: 0,
        }
    }
}

/// A batch executor: one compile (where the language needs it), then one run
/// per input. Implementations must be safe to call from multiple worker tasks
/// concurrently.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn run_batch(
        &self,
        code: &str,
        language: Language,
        inputs: &[String],
        limits: &ExecutionLimits,
    ) -> AppResult<Vec<CaseOutcome>>;
}

/// Verdict sentinel strings embedded in `actual_output`.
pub mod sentinels {
    pub const COMPILE_ERROR: &str = "Compile Error";
    pub const TIME_LIMIT_EXCEEDED: &str = "Time Limit Exceeded";
    pub const MEMORY_LIMIT_EXCEEDED: &str = "Memory Limit Exceeded";
    pub const RUNTIME_ERROR_PREFIX: &str = "Runtime Error";
    pub const ERROR_PREFIX: &str = "Error";
    /// Appended when output exceeds the configured cap
    pub const TRUNCATION_MARK: &str = "...[输出被截断]";

    /// Whether an `actual_output` value is a verdict sentinel rather than
    /// program output. Sentinels are never compared against expected output.
    pub fn is_verdict(actual: &str) -> bool {
        actual == TIME_LIMIT_EXCEEDED
            || actual == MEMORY_LIMIT_EXCEEDED
            || actual.starts_with(RUNTIME_ERROR_PREFIX)
            || actual.starts_with(COMPILE_ERROR)
            || actual.starts_with(ERROR_PREFIX)
    }
}

/// Enforce the output cap: truncate at `max_output_kb` KiB and mark it.
pub fn cap_output(output: String, max_output_kb: usize) -> String {
    let max_bytes = max_output_kb * 1024;
    if output.len() <= max_bytes {
        return output;
    }
    // cut on a char boundary at or below the cap
    let mut cut = max_bytes;
    while cut > 0 && !output.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &output[..cut], sentinels::TRUNCATION_MARK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_detection() {
        assert!(sentinels::is_verdict("Time Limit Exceeded"));
        assert!(sentinels::is_verdict("Memory Limit Exceeded"));
        assert!(sentinels::is_verdict("Compile Error"));
        assert!(sentinels::is_verdict("Compile Error: exit status 1"));
        assert!(sentinels::is_verdict("Runtime Error (Signal 11)"));
        assert!(sentinels::is_verdict("Error: Internal Error"));
        assert!(!sentinels::is_verdict("42"));
        assert!(!sentinels::is_verdict("Timeout at line 3"));
    }

    #[test]
    fn test_cap_output_untouched_below_limit() {
        assert_eq!(cap_output("abc".into(), 1), "abc");
    }

    #[test]
    fn test_cap_output_truncates_and_marks() {
        let long = "x".repeat(2048);
        let capped = cap_output(long, 1);
        assert!(capped.starts_with(&"x".repeat(1024)));
        assert!(capped.ends_with(sentinels::TRUNCATION_MARK));
        assert_eq!(capped.len(), 1024 + sentinels::TRUNCATION_MARK.len());
    }

    #[test]
    fn test_cap_output_respects_char_boundaries() {
        // 3-byte chars; the cap lands mid-char and must back off
        let long = "好".repeat(400);
        let capped = cap_output(long, 1);
        assert!(capped.ends_with(sentinels::TRUNCATION_MARK));
    }
}
