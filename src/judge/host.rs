//! Host-process executor
//!
//! Compiles and runs submissions in an ephemeral working directory on the
//! host. One sandbox per batch; all cases share the compile artifact. The
//! sandbox is removed on every exit path.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::LocalJudgeConfig;
use crate::error::{AppError, AppResult};

use super::executor::{cap_output, sentinels, CaseOutcome, ExecutionLimits, Executor};
use super::language::Language;

/// Executor running submissions as plain host processes.
pub struct HostExecutor {
    sandbox_root: PathBuf,
}

/// Removes the sandbox directory when the batch ends, however it ends.
struct SandboxGuard {
    path: PathBuf,
}

impl Drop for SandboxGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            tracing::warn!(path = %self.path.display(), "sandbox cleanup failed: {}", e);
        }
    }
}

impl HostExecutor {
    pub fn new(config: &LocalJudgeConfig) -> Self {
        Self {
            sandbox_root: config.sandbox_dir.clone(),
        }
    }

    /// Create a uniquely named sandbox directory for one batch.
    async fn create_sandbox(&self) -> AppResult<PathBuf> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = self.sandbox_root.join(format!("sandbox_{}", nanos));

        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| AppError::Judge(format!("创建沙箱目录失败: {}", e)))?;
        Ok(path)
    }

    /// Run the compile step; a non-zero exit becomes a Compile Error sentinel
    /// applied to every case, not an executor failure.
    async fn compile(&self, sandbox: &Path, language: Language) -> AppResult<Option<String>> {
        let Some(args) = language.compile_args() else {
            return Ok(None);
        };

        tracing::debug!(language = %language, "compiling in {}", sandbox.display());

        let output = Command::new(args[0])
            .args(&args[1..])
            .current_dir(sandbox)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| AppError::Judge(format!("编译器启动失败: {}", e)))?;

        if output.status.success() {
            return Ok(None);
        }

        let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
        diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(Some(format!(
            "{}: {}",
            sentinels::COMPILE_ERROR,
            diagnostics.trim()
        )))
    }

    /// Run one case with a wall-clock deadline.
    async fn run_case(
        &self,
        sandbox: &Path,
        language: Language,
        input: &str,
        limits: &ExecutionLimits,
    ) -> CaseOutcome {
        let args = language.run_args();
        let deadline = Duration::from_millis(limits.time_limit_ms);

        let started = Instant::now();
        let mut child = match Command::new(args[0])
            .args(&args[1..])
            .current_dir(sandbox)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return CaseOutcome::sentinel(format!(
                    "{}: {}",
                    sentinels::RUNTIME_ERROR_PREFIX,
                    e
                ))
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(input.as_bytes()).await;
            // drop closes the pipe so the program sees EOF
        }

        let waited = timeout(deadline, child.wait_with_output()).await;
        let elapsed_ms = started.elapsed().as_millis() as i64;

        match waited {
            Err(_) => CaseOutcome {
                actual_output: sentinels::TIME_LIMIT_EXCEEDED.to_string(),
                runtime_ms: elapsed_ms,
                memory_kb: 0,
            },
            Ok(Err(e)) => CaseOutcome {
                actual_output: format!("{}: {}", sentinels::RUNTIME_ERROR_PREFIX, e),
                runtime_ms: elapsed_ms,
                memory_kb: 0,
            },
            Ok(Ok(output)) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));

                let actual = if output.status.success() {
                    cap_output(combined.trim().to_string(), limits.max_output_kb)
                } else {
                    format!(
                        "{}: exit status {}",
                        sentinels::RUNTIME_ERROR_PREFIX,
                        output.status.code().unwrap_or(-1)
                    )
                };

                CaseOutcome {
                    actual_output: actual,
                    runtime_ms: elapsed_ms,
                    // memory accounting is best-effort on the host path
                    memory_kb: 0,
                }
            }
        }
    }
}

#[async_trait]
impl Executor for HostExecutor {
    async fn run_batch(
        &self,
        code: &str,
        language: Language,
        inputs: &[String],
        limits: &ExecutionLimits,
    ) -> AppResult<Vec<CaseOutcome>> {
        let sandbox = self.create_sandbox().await?;
        let _guard = SandboxGuard {
            path: sandbox.clone(),
        };

        let source_path = sandbox.join(language.source_file());
        tokio::fs::write(&source_path, code)
            .await
            .map_err(|e| AppError::Judge(format!("写入代码文件失败: {}", e)))?;

        if let Some(compile_error) = self.compile(&sandbox, language).await? {
            return Ok(inputs
                .iter()
                .map(|_| CaseOutcome::sentinel(compile_error.clone()))
                .collect());
        }

        let mut outcomes = Vec::with_capacity(inputs.len());
        for input in inputs {
            outcomes.push(self.run_case(&sandbox, language, input, limits).await);
        }
        Ok(outcomes)
    }
}
