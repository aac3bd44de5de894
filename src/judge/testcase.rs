//! Test-case loading
//!
//! Cases come from the record store first (non-hidden rows, inline text or
//! object-store keys). When a problem has no rows at all, pairs are
//! discovered in the object store under `problems/<question_number>/` by the
//! `<n>.in` / `<n>.out` naming convention. A problem with neither fails the
//! submission with a configuration error.

use std::collections::BTreeMap;
use std::sync::Arc;

use sqlx::PgPool;

use crate::db::repositories::TestCaseRepository;
use crate::error::{AppError, AppResult};
use crate::models::{Problem, TestCase};
use crate::storage::{problem_case_prefix, ObjectStore};

/// One runnable case: input text and expected output, trailing whitespace on
/// the expected side already stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCase {
    pub input: String,
    pub expected: String,
}

/// Loads the ordered visible case set for a problem.
pub struct TestCaseSource {
    pool: PgPool,
    store: Arc<dyn ObjectStore>,
}

impl TestCaseSource {
    pub fn new(pool: PgPool, store: Arc<dyn ObjectStore>) -> Self {
        Self { pool, store }
    }

    /// Load all visible cases for `problem`, in stable order: record-store
    /// rows by primary key, or discovered pairs by case index.
    pub async fn load(&self, problem: &Problem) -> AppResult<Vec<LoadedCase>> {
        let rows = TestCaseRepository::visible_for_question(&self.pool, problem.id)
            .await
            .map_err(|e| AppError::Judge(format!("获取测试用例失败: {}", e)))?;

        let cases = if rows.is_empty() {
            self.discover_from_store(problem).await?
        } else {
            rows
        };

        let mut loaded = Vec::with_capacity(cases.len());
        for case in &cases {
            loaded.push(self.resolve_io(case).await?);
        }

        if loaded.is_empty() {
            return Err(AppError::Judge("题目没有可用的测试用例".to_string()));
        }
        Ok(loaded)
    }

    /// Fetch a case's input and expected text, from the object store when the
    /// row carries keys, inline otherwise.
    async fn resolve_io(&self, case: &TestCase) -> AppResult<LoadedCase> {
        let input = match &case.input_key {
            Some(key) if !key.is_empty() => {
                let bytes = self.store.get_bytes(key).await.map_err(|e| {
                    AppError::Judge(format!("读取测试用例输入失败(key={}): {}", key, e))
                })?;
                String::from_utf8_lossy(&bytes).into_owned()
            }
            _ => case.input.clone(),
        };

        let expected = match &case.output_key {
            Some(key) if !key.is_empty() => {
                let bytes = self.store.get_bytes(key).await.map_err(|e| {
                    AppError::Judge(format!("读取测试用例输出失败(key={}): {}", key, e))
                })?;
                String::from_utf8_lossy(&bytes).into_owned()
            }
            _ => case.expected_output.clone(),
        };

        Ok(LoadedCase {
            input,
            expected: expected.trim_end().to_string(),
        })
    }

    /// Discover `<n>.in` / `<n>.out` pairs under the problem's prefix.
    async fn discover_from_store(&self, problem: &Problem) -> AppResult<Vec<TestCase>> {
        let prefix = problem_case_prefix(problem.question_number);
        let keys = self
            .store
            .list(&prefix, true)
            .await
            .map_err(|e| AppError::Judge(format!("获取测试用例失败: {}", e)))?;

        let pairs = group_case_pairs(&keys);
        if pairs.is_empty() {
            return Err(AppError::Judge("题目没有可用的测试用例".to_string()));
        }

        Ok(pairs
            .into_iter()
            .map(|(_, input_key, output_key)| {
                TestCase::from_object_keys(problem.id, input_key, output_key)
            })
            .collect())
    }
}

/// Group object keys into complete `(index, in_key, out_key)` pairs, in
/// ascending case-index order. Directory markers, non-numeric names, and
/// one-sided pairs are skipped.
pub fn group_case_pairs(keys: &[String]) -> Vec<(u32, String, String)> {
    #[derive(Default)]
    struct Pair {
        input: Option<String>,
        output: Option<String>,
    }

    let mut pairs: BTreeMap<u32, Pair> = BTreeMap::new();

    for key in keys {
        if key.ends_with('/') {
            continue;
        }
        let name = key.rsplit('/').next().unwrap_or(key);

        if let Some(stem) = name.strip_suffix(".in") {
            if let Ok(n) = stem.parse::<u32>() {
                pairs.entry(n).or_default().input = Some(key.clone());
            }
        } else if let Some(stem) = name.strip_suffix(".out") {
            if let Ok(n) = stem.parse::<u32>() {
                pairs.entry(n).or_default().output = Some(key.clone());
            }
        }
    }

    pairs
        .into_iter()
        .filter_map(|(n, p)| match (p.input, p.output) {
            (Some(i), Some(o)) => Some((n, i, o)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_group_pairs_ascending() {
        let got = group_case_pairs(&keys(&[
            "problems/1001/2.out",
            "problems/1001/1.in",
            "problems/1001/2.in",
            "problems/1001/1.out",
            "problems/1001/10.in",
            "problems/1001/10.out",
        ]));
        let order: Vec<u32> = got.iter().map(|(n, _, _)| *n).collect();
        assert_eq!(order, vec![1, 2, 10]);
        assert_eq!(got[0].1, "problems/1001/1.in");
        assert_eq!(got[0].2, "problems/1001/1.out");
    }

    #[test]
    fn test_group_pairs_skips_incomplete_and_noise() {
        let got = group_case_pairs(&keys(&[
            "problems/1001/",
            "problems/1001/1.in",
            "problems/1001/readme.txt",
            "problems/1001/2.in",
            "problems/1001/2.out",
            "problems/1001/x.out",
        ]));
        // case 1 has no .out, "x" is not numeric
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].0, 2);
    }

    #[test]
    fn test_group_pairs_empty() {
        assert!(group_case_pairs(&[]).is_empty());
        assert!(group_case_pairs(&keys(&["problems/1001/"])).is_empty());
    }
}
