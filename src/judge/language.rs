//! Language classification and per-language toolchain knowledge
//!
//! Detection is intentionally a cheap substring heuristic: the intake uses it
//! to pre-fill the submission's language, and a caller-provided label always
//! wins over the guess.

use serde::{Deserialize, Serialize};

use crate::config::LocalJudgeConfig;
use crate::constants::languages;

/// Supported submission languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    Python,
    Cpp,
    Java,
}

impl Language {
    /// Classify source text by substring checks, first match wins.
    /// Defaults to Go when nothing matches.
    pub fn detect(source: &str) -> Self {
        if source.contains("package main") || source.contains("func main()") {
            Language::Go
        } else if source.contains("def ") || source.contains("import ") {
            Language::Python
        } else if source.contains("#include") || source.contains("int main()") {
            Language::Cpp
        } else if source.contains("public class") || source.contains("public static void main") {
            Language::Java
        } else {
            Language::Go
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Go => languages::GO,
            Language::Python => languages::PYTHON,
            Language::Cpp => languages::CPP,
            Language::Java => languages::JAVA,
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "go" => Some(Language::Go),
            "python" | "python3" => Some(Language::Python),
            "cpp" | "c++" => Some(Language::Cpp),
            "java" => Some(Language::Java),
            _ => None,
        }
    }

    /// Source file name written into the sandbox.
    pub fn source_file(&self) -> &'static str {
        match self {
            Language::Go => "main.go",
            Language::Python => "main.py",
            Language::Cpp => "main.cpp",
            Language::Java => "Main.java",
        }
    }

    /// Compile argv for the host executor; None means no compile step.
    pub fn compile_args(&self) -> Option<Vec<&'static str>> {
        match self {
            Language::Go => Some(vec!["go", "build", "-o", "main.exe", "main.go"]),
            Language::Cpp => Some(vec![
                "g++", "-O2", "-std=c++17", "-o", "main.exe", "main.cpp",
            ]),
            Language::Java => Some(vec!["javac", "Main.java"]),
            Language::Python => None,
        }
    }

    /// Runner argv for the host executor, relative to the sandbox directory.
    pub fn run_args(&self) -> Vec<&'static str> {
        match self {
            Language::Go | Language::Cpp => vec!["./main.exe"],
            Language::Python => vec!["python", "main.py"],
            Language::Java => vec!["java", "-cp", ".", "Main"],
        }
    }

    /// Compile argv inside the judging container (binary is named `main`).
    pub fn container_compile_args(&self) -> Option<Vec<&'static str>> {
        match self {
            Language::Go => Some(vec!["go", "build", "-o", "main", "main.go"]),
            Language::Cpp => Some(vec!["g++", "-O2", "-std=c++17", "-o", "main", "main.cpp"]),
            Language::Java => Some(vec!["javac", "Main.java"]),
            Language::Python => None,
        }
    }

    /// Runner argv inside the judging container.
    pub fn container_run_args(&self) -> Vec<&'static str> {
        match self {
            Language::Go | Language::Cpp => vec!["./main"],
            // unbuffered so partial output survives a timeout kill
            Language::Python => vec!["python", "-u", "main.py"],
            Language::Java => vec!["java", "-cp", ".", "Main"],
        }
    }

    /// Container image for this language, from config.
    pub fn docker_image(&self, cfg: &LocalJudgeConfig) -> String {
        match self {
            Language::Go => cfg.docker_image_go.clone(),
            Language::Cpp => cfg.docker_image_cpp.clone(),
            Language::Python => cfg.docker_image_python.clone(),
            Language::Java => cfg.docker_image_java.clone(),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_go() {
        assert_eq!(Language::detect("package main\nfunc main() {}"), Language::Go);
        assert_eq!(Language::detect("func main() { println(1) }"), Language::Go);
    }

    #[test]
    fn test_detect_python() {
        assert_eq!(Language::detect("def solve():\n    pass"), Language::Python);
        assert_eq!(Language::detect("import sys\nprint(1)"), Language::Python);
    }

    #[test]
    fn test_detect_cpp() {
        assert_eq!(
            Language::detect("#include <iostream>\nint main() {}"),
            Language::Cpp
        );
        assert_eq!(Language::detect("int main() { return 0; }"), Language::Cpp);
    }

    #[test]
    fn test_detect_java() {
        assert_eq!(
            Language::detect("public class Main { public static void main(String[] a) {} }"),
            Language::Java
        );
    }

    #[test]
    fn test_detect_precedence_and_default() {
        // "import " matches before the java checks get a chance
        assert_eq!(
            Language::detect("import java.util.*;\npublic class Main {}"),
            Language::Python
        );
        // nothing matches: default go
        assert_eq!(Language::detect("SELECT 1;"), Language::Go);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!(Language::parse("GO"), Some(Language::Go));
        assert_eq!(Language::parse("c++"), Some(Language::Cpp));
        assert_eq!(Language::parse("python3"), Some(Language::Python));
        assert_eq!(Language::parse("cobol"), None);
    }

    #[test]
    fn test_python_has_no_compile_step() {
        assert!(Language::Python.compile_args().is_none());
        assert!(Language::Python.container_compile_args().is_none());
        assert!(Language::Go.compile_args().is_some());
    }
}
