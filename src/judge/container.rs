//! Container executor
//!
//! Runs the whole compile-and-run batch inside one long-lived, resource-
//! limited container per submission. The host-side sandbox directory is
//! bind-mounted at /work so source and artifacts never need copying out.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bollard::{
    container::LogOutput,
    exec::{CreateExecOptions, StartExecResults},
    models::{ContainerCreateBody, HostConfig},
    query_parameters::{CreateContainerOptionsBuilder, RemoveContainerOptionsBuilder},
    Docker,
};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use crate::config::LocalJudgeConfig;
use crate::error::{AppError, AppResult};

use super::executor::{cap_output, sentinels, CaseOutcome, ExecutionLimits, Executor};
use super::language::Language;

/// Extra wall-clock granted to the compile step beyond the case limit.
const COMPILE_GRACE: Duration = Duration::from_secs(15);

/// Extra wall-clock granted to the docker exec around the in-container
/// `timeout` so the sentinel is produced by the inner kill, not the outer.
const EXEC_GRACE: Duration = Duration::from_secs(2);

/// Deadline for pulling up the container itself.
const CONTAINER_START_DEADLINE: Duration = Duration::from_secs(30);

/// Executor backed by per-submission Docker containers.
pub struct ContainerExecutor {
    docker: Docker,
    config: LocalJudgeConfig,
}

struct ExecResult {
    output: String,
    exit_code: i64,
}

impl ContainerExecutor {
    pub fn new(docker: Docker, config: LocalJudgeConfig) -> Self {
        Self { docker, config }
    }

    async fn create_sandbox(&self) -> AppResult<PathBuf> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = self.config.sandbox_dir.join(format!("sandbox_{}", nanos));
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| AppError::Judge(format!("创建沙箱目录失败: {}", e)))?;
        Ok(path)
    }

    /// Launch the detached judging container with the sandbox mounted at
    /// /work and a no-op sleep loop keeping it alive.
    async fn start_container(
        &self,
        sandbox: &Path,
        image: &str,
        limits: &ExecutionLimits,
    ) -> AppResult<String> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let name = format!("oj_{}", nanos);

        let sandbox_abs = std::fs::canonicalize(sandbox)
            .map_err(|e| AppError::Judge(format!("沙箱路径解析失败: {}", e)))?;

        let host_config = HostConfig {
            memory: Some((limits.memory_limit_mb * 1024 * 1024) as i64),
            memory_swap: Some((limits.memory_limit_mb * 1024 * 1024) as i64),
            cpu_period: Some(100_000),
            cpu_quota: Some(100_000), // 1 CPU
            network_mode: Some("none".to_string()),
            pids_limit: Some(64),
            readonly_rootfs: Some(true),
            tmpfs: Some(HashMap::from([(
                "/tmp".to_string(),
                "rw,size=64m".to_string(),
            )])),
            binds: Some(vec![format!("{}:/work:rw", sandbox_abs.display())]),
            ..Default::default()
        };

        let options = CreateContainerOptionsBuilder::default().name(&name).build();
        let body = ContainerCreateBody {
            image: Some(image.to_string()),
            host_config: Some(host_config),
            working_dir: Some("/work".to_string()),
            cmd: Some(vec![
                "sh".to_string(),
                "-c".to_string(),
                "while true; do sleep 3600; done".to_string(),
            ]),
            env: Some(vec!["LANG=C.UTF-8".to_string()]),
            ..Default::default()
        };

        let created = timeout(
            CONTAINER_START_DEADLINE,
            self.docker.create_container(Some(options), body),
        )
        .await
        .map_err(|_| AppError::Judge("容器创建超时".to_string()))??;

        timeout(
            CONTAINER_START_DEADLINE,
            self.docker.start_container(
                &created.id,
                None::<bollard::query_parameters::StartContainerOptions>,
            ),
        )
        .await
        .map_err(|_| AppError::Judge("容器启动超时".to_string()))??;

        Ok(created.id)
    }

    async fn remove_container(&self, container_id: &str) {
        let options = RemoveContainerOptionsBuilder::default().force(true).build();
        if let Err(e) = self
            .docker
            .remove_container(container_id, Some(options))
            .await
        {
            tracing::warn!(container = container_id, "container teardown failed: {}", e);
        }
    }

    /// Execute a command in the container, optionally piping stdin, with an
    /// outer wall-clock deadline.
    async fn exec(
        &self,
        container_id: &str,
        cmd: Vec<String>,
        stdin: Option<&str>,
        deadline: Duration,
    ) -> AppResult<ExecResult> {
        let exec = self
            .docker
            .create_exec(
                container_id,
                CreateExecOptions {
                    cmd: Some(cmd),
                    attach_stdin: Some(stdin.is_some()),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await?;

        let started = self.docker.start_exec(&exec.id, None).await?;
        let mut combined = String::new();

        if let StartExecResults::Attached {
            mut output,
            mut input,
        } = started
        {
            if let Some(data) = stdin {
                let _ = input.write_all(data.as_bytes()).await;
                let _ = input.shutdown().await;
            }

            let drain = async {
                while let Some(msg) = output.next().await {
                    match msg {
                        Ok(LogOutput::StdOut { message }) | Ok(LogOutput::StdErr { message }) => {
                            combined.push_str(&String::from_utf8_lossy(&message));
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!("exec stream error: {}", e);
                            break;
                        }
                    }
                }
            };

            if timeout(deadline, drain).await.is_err() {
                return Ok(ExecResult {
                    output: combined,
                    exit_code: 124,
                });
            }
        }

        let inspect = self.docker.inspect_exec(&exec.id).await?;
        Ok(ExecResult {
            output: combined,
            exit_code: inspect.exit_code.unwrap_or(-1),
        })
    }

    /// Compile inside the container; Some(sentinel) on failure.
    async fn compile(
        &self,
        container_id: &str,
        language: Language,
        limits: &ExecutionLimits,
    ) -> AppResult<Option<String>> {
        let Some(args) = language.container_compile_args() else {
            return Ok(None);
        };

        let deadline = Duration::from_millis(limits.time_limit_ms) + COMPILE_GRACE;
        let cmd: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let result = self.exec(container_id, cmd, None, deadline).await?;

        if result.exit_code == 0 {
            Ok(None)
        } else {
            Ok(Some(format!(
                "{}: {}",
                sentinels::COMPILE_ERROR,
                result.output.trim()
            )))
        }
    }

    /// Run one case under the in-container `timeout` wrapper.
    async fn run_case(
        &self,
        container_id: &str,
        language: Language,
        input: &str,
        limits: &ExecutionLimits,
    ) -> CaseOutcome {
        let limit_secs = limits.time_limit_ms.div_ceil(1000).max(1);
        let mut cmd = vec![
            "timeout".to_string(),
            "-k".to_string(),
            "1s".to_string(),
            format!("{}s", limit_secs),
        ];
        cmd.extend(language.container_run_args().iter().map(|s| s.to_string()));

        let deadline = Duration::from_secs(limit_secs) + EXEC_GRACE;
        let started = Instant::now();
        let result = self.exec(container_id, cmd, Some(input), deadline).await;
        let elapsed_ms = started.elapsed().as_millis() as i64;

        let result = match result {
            Ok(r) => r,
            Err(e) => {
                return CaseOutcome {
                    actual_output: format!("{}: {}", sentinels::RUNTIME_ERROR_PREFIX, e),
                    runtime_ms: elapsed_ms,
                    memory_kb: 0,
                }
            }
        };

        let trimmed = result.output.trim().to_string();
        let actual = if result.exit_code == 124
            || (result.exit_code != 0
                && (trimmed.contains("Time") || trimmed.contains("exceeded")))
        {
            sentinels::TIME_LIMIT_EXCEEDED.to_string()
        } else if result.exit_code != 0 && trimmed.is_empty() {
            format!(
                "{}: exit status {}",
                sentinels::RUNTIME_ERROR_PREFIX,
                result.exit_code
            )
        } else {
            cap_output(trimmed, limits.max_output_kb)
        };

        CaseOutcome {
            actual_output: actual,
            runtime_ms: elapsed_ms,
            memory_kb: 0,
        }
    }
}

#[async_trait]
impl Executor for ContainerExecutor {
    async fn run_batch(
        &self,
        code: &str,
        language: Language,
        inputs: &[String],
        limits: &ExecutionLimits,
    ) -> AppResult<Vec<CaseOutcome>> {
        let sandbox = self.create_sandbox().await?;

        let run = async {
            let source_path = sandbox.join(language.source_file());
            tokio::fs::write(&source_path, code)
                .await
                .map_err(|e| AppError::Judge(format!("写入代码文件失败: {}", e)))?;

            let image = language.docker_image(&self.config);
            let container_id = self.start_container(&sandbox, &image, limits).await?;

            let batch = async {
                if let Some(compile_error) = self.compile(&container_id, language, limits).await? {
                    return Ok(inputs
                        .iter()
                        .map(|_| CaseOutcome::sentinel(compile_error.clone()))
                        .collect());
                }

                let mut outcomes = Vec::with_capacity(inputs.len());
                for input in inputs {
                    outcomes.push(self.run_case(&container_id, language, input, limits).await);
                }
                Ok(outcomes)
            }
            .await;

            self.remove_container(&container_id).await;
            batch
        }
        .await;

        if let Err(e) = tokio::fs::remove_dir_all(&sandbox).await {
            tracing::warn!(path = %sandbox.display(), "sandbox cleanup failed: {}", e);
        }
        run
    }
}
