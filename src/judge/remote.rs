//! Remote judge client
//!
//! Talks to an external go-judge-compatible sandbox service: one compile
//! request caches the executable, then a single batch request runs every
//! case against the cached file id. Transport failures abort the submission;
//! per-case failures map onto verdict sentinels.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::executor::{CaseOutcome, ExecutionLimits, Executor};
use super::language::Language;

const DEFAULT_ENV: &str = "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// stdout/stderr cap per command, in bytes
const STREAM_CAP: i64 = 10240;

/// Compile-step caps: generous, independent of the problem's limits
const COMPILE_CPU_NS: u64 = 10_000_000_000;
const COMPILE_MEMORY_BYTES: u64 = 512 * 1024 * 1024;
const PROC_LIMIT: u64 = 50;

/// One command of a go-judge request.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct CmdRequest {
    args: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    env: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<CmdFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cpu_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clock_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    memory_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proc_limit: Option<u64>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    copy_in: HashMap<String, CmdFile>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    copy_out_cached: Vec<String>,
}

/// A file slot in a go-judge command: stdin content, a named capture, a
/// copy-in payload, or a cached file reference.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct CmdFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<i64>,
}

impl CmdFile {
    fn stdin(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    fn capture(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            max: Some(STREAM_CAP),
            ..Default::default()
        }
    }

    fn source(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    fn cached(file_id: &str) -> Self {
        Self {
            file_id: Some(file_id.to_string()),
            ..Default::default()
        }
    }
}

/// One command's result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CmdResponse {
    status: String,
    #[serde(default)]
    error: String,
    /// CPU time in nanoseconds
    #[serde(default)]
    time: u64,
    /// Peak memory in bytes
    #[serde(default)]
    memory: u64,
    #[serde(default)]
    files: HashMap<String, String>,
    #[serde(default)]
    file_ids: HashMap<String, String>,
}

/// Client for the external sandbox service.
pub struct RemoteJudgeClient {
    api_url: String,
    http: reqwest::Client,
}

impl RemoteJudgeClient {
    pub fn new(api_url: String, timeout_secs: u64) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("remote judge client: {}", e)))?;
        Ok(Self { api_url, http })
    }

    async fn post(&self, cmds: Vec<CmdRequest>) -> AppResult<Vec<CmdResponse>> {
        let response = self
            .http
            .post(&self.api_url)
            .json(&serde_json::json!({ "cmd": cmds }))
            .send()
            .await
            .map_err(|e| AppError::Judge(format!("评测服务网络请求失败: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Judge(format!(
                "评测服务网络错误: {} - {}",
                status, body
            )));
        }

        response
            .json::<Vec<CmdResponse>>()
            .await
            .map_err(|e| AppError::Judge(format!("评测服务网络响应解析失败: {}", e)))
    }

    fn compile_request(language: Language, code: &str) -> Option<(CmdRequest, &'static str)> {
        let (args, source_name, artifact): (Vec<&str>, &str, &str) = match language {
            Language::Cpp => (
                vec!["g++", "main.cpp", "-o", "main", "-O2", "-std=c++17"],
                "main.cpp",
                "main",
            ),
            Language::Go => (
                vec!["go", "build", "-o", "main", "main.go"],
                "main.go",
                "main",
            ),
            Language::Java => (vec!["javac", "Main.java"], "Main.java", "Main.class"),
            Language::Python => return None,
        };

        let mut env = vec![DEFAULT_ENV.to_string()];
        if language == Language::Go {
            env.insert(0, "GOCACHE=/tmp".to_string());
            env.insert(1, "GOMODCACHE=/tmp".to_string());
        }

        let request = CmdRequest {
            args: args.into_iter().map(str::to_string).collect(),
            env,
            files: vec![
                CmdFile::stdin(""),
                CmdFile::capture("stdout"),
                CmdFile::capture("stderr"),
            ],
            cpu_limit: Some(COMPILE_CPU_NS),
            clock_limit: Some(COMPILE_CPU_NS),
            memory_limit: Some(COMPILE_MEMORY_BYTES),
            proc_limit: Some(PROC_LIMIT),
            copy_in: HashMap::from([(source_name.to_string(), CmdFile::source(code))]),
            copy_out_cached: vec![artifact.to_string()],
        };

        Some((request, artifact))
    }

    fn run_request(
        language: Language,
        code: &str,
        artifact: Option<(&str, &str)>,
        input: &str,
        cpu_limit_ns: u64,
        clock_limit_ns: u64,
        memory_limit_bytes: u64,
    ) -> CmdRequest {
        let (args, env) = match language {
            Language::Go | Language::Cpp => (vec!["./main"], vec![DEFAULT_ENV.to_string()]),
            Language::Java => (vec!["java", "Main"], vec![DEFAULT_ENV.to_string()]),
            Language::Python => (
                vec!["python3", "main.py"],
                vec![
                    DEFAULT_ENV.to_string(),
                    "PYTHONIOENCODING=utf-8".to_string(),
                ],
            ),
        };

        let copy_in = match artifact {
            Some((name, file_id)) => {
                HashMap::from([(name.to_string(), CmdFile::cached(file_id))])
            }
            // interpreted languages ship the source with every run
            None => HashMap::from([("main.py".to_string(), CmdFile::source(code))]),
        };

        CmdRequest {
            args: args.into_iter().map(str::to_string).collect(),
            env,
            files: vec![
                CmdFile::stdin(input),
                CmdFile::capture("stdout"),
                CmdFile::capture("stderr"),
            ],
            cpu_limit: Some(cpu_limit_ns),
            clock_limit: Some(clock_limit_ns),
            memory_limit: Some(memory_limit_bytes),
            proc_limit: Some(PROC_LIMIT),
            copy_in,
            copy_out_cached: Vec::new(),
        }
    }
}

/// Map one go-judge response onto a raw case outcome. Time comes back in
/// nanoseconds and memory in bytes; counters are reported in ms and KB.
fn parse_outcome(resp: &CmdResponse) -> CaseOutcome {
    let runtime_ms = (resp.time / 1_000_000) as i64;
    let memory_kb = (resp.memory / 1024) as i64;

    let actual_output = match resp.status.as_str() {
        "Accepted" => resp
            .files
            .get("stdout")
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        "Time Limit Exceeded" => "Time Limit Exceeded".to_string(),
        "Memory Limit Exceeded" => "Memory Limit Exceeded".to_string(),
        "Signalled" => format!("Runtime Error (Signal {})", resp.error),
        "Non Zero Exit Status" => "Runtime Error (Non Zero Exit)".to_string(),
        other => format!("Error: {}", other),
    };

    CaseOutcome {
        actual_output,
        runtime_ms,
        memory_kb,
    }
}

#[async_trait]
impl Executor for RemoteJudgeClient {
    async fn run_batch(
        &self,
        code: &str,
        language: Language,
        inputs: &[String],
        limits: &ExecutionLimits,
    ) -> AppResult<Vec<CaseOutcome>> {
        let cpu_limit_ns = limits.time_limit_ms * 1_000_000;
        // wall clock gets 3x the cpu budget so IO stalls don't read as TLE
        let clock_limit_ns = cpu_limit_ns * 3;
        let memory_limit_bytes = limits.memory_limit_mb * 1024 * 1024;

        let artifact = match Self::compile_request(language, code) {
            Some((request, artifact_name)) => {
                let responses = self.post(vec![request]).await?;
                let compiled = responses
                    .first()
                    .ok_or_else(|| AppError::Judge("评测服务网络响应为空".to_string()))?;

                if compiled.status != "Accepted" {
                    tracing::info!(
                        status = %compiled.status,
                        "remote compile rejected: {}",
                        compiled.error
                    );
                    return Ok(inputs
                        .iter()
                        .map(|_| CaseOutcome::sentinel("Compile Error"))
                        .collect());
                }

                let file_id = compiled.file_ids.get(artifact_name).cloned().ok_or_else(|| {
                    AppError::Judge("评测服务未返回编译产物".to_string())
                })?;
                Some((artifact_name, file_id))
            }
            None => None,
        };

        let cmds: Vec<CmdRequest> = inputs
            .iter()
            .map(|input| {
                Self::run_request(
                    language,
                    code,
                    artifact.as_ref().map(|(name, id)| (*name, id.as_str())),
                    input,
                    cpu_limit_ns,
                    clock_limit_ns,
                    memory_limit_bytes,
                )
            })
            .collect();

        let responses = self.post(cmds).await?;
        if responses.len() != inputs.len() {
            return Err(AppError::Judge(format!(
                "评测服务返回结果数量不匹配: got={} want={}",
                responses.len(),
                inputs.len()
            )));
        }

        Ok(responses.iter().map(parse_outcome).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: &str) -> CmdResponse {
        CmdResponse {
            status: status.to_string(),
            error: String::new(),
            time: 1_500_000_000,
            memory: 2048 * 1024,
            files: HashMap::from([("stdout".to_string(), "  42\n".to_string())]),
            file_ids: HashMap::new(),
        }
    }

    #[test]
    fn test_accepted_maps_to_trimmed_stdout() {
        let outcome = parse_outcome(&response("Accepted"));
        assert_eq!(outcome.actual_output, "42");
        assert_eq!(outcome.runtime_ms, 1500);
        assert_eq!(outcome.memory_kb, 2048);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            parse_outcome(&response("Time Limit Exceeded")).actual_output,
            "Time Limit Exceeded"
        );
        assert_eq!(
            parse_outcome(&response("Memory Limit Exceeded")).actual_output,
            "Memory Limit Exceeded"
        );
        assert_eq!(
            parse_outcome(&response("Non Zero Exit Status")).actual_output,
            "Runtime Error (Non Zero Exit)"
        );
        assert_eq!(
            parse_outcome(&response("Internal Error")).actual_output,
            "Error: Internal Error"
        );

        let mut signalled = response("Signalled");
        signalled.error = "11".to_string();
        assert_eq!(
            parse_outcome(&signalled).actual_output,
            "Runtime Error (Signal 11)"
        );
    }

    #[test]
    fn test_compile_request_shapes() {
        let (req, artifact) = RemoteJudgeClient::compile_request(Language::Go, "package main").unwrap();
        assert_eq!(artifact, "main");
        assert!(req.env.contains(&"GOCACHE=/tmp".to_string()));
        assert_eq!(req.copy_out_cached, vec!["main"]);
        assert!(req.copy_in.contains_key("main.go"));

        let (req, artifact) =
            RemoteJudgeClient::compile_request(Language::Java, "public class Main {}").unwrap();
        assert_eq!(artifact, "Main.class");
        assert!(req.copy_in.contains_key("Main.java"));

        assert!(RemoteJudgeClient::compile_request(Language::Python, "print(1)").is_none());
    }

    #[test]
    fn test_python_run_ships_source() {
        let req = RemoteJudgeClient::run_request(
            Language::Python,
            "print(1)",
            None,
            "",
            1_000_000_000,
            3_000_000_000,
            256 * 1024 * 1024,
        );
        assert!(req.copy_in.contains_key("main.py"));
        assert!(req.env.iter().any(|e| e.starts_with("PYTHONIOENCODING")));
    }
}
