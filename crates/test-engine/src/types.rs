use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which tests a run should cover
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestScope {
    #[default]
    All,
    Unit,
    Integration,
    Smoke,
    /// Only tests mapped from affected files
    Affected,
    /// Affected tests, with every smoke test run first
    #[serde(rename = "affected+smoke", alias = "affected-smoke")]
    AffectedSmoke,
}

impl TestScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestScope::All => "all",
            TestScope::Unit => "unit",
            TestScope::Integration => "integration",
            TestScope::Smoke => "smoke",
            TestScope::Affected => "affected",
            TestScope::AffectedSmoke => "affected+smoke",
        }
    }

    /// Scopes that select tests through an affected graph
    pub fn is_targeted(&self) -> bool {
        matches!(self, TestScope::Affected | TestScope::AffectedSmoke)
    }

    /// Scopes whose targeted runs put smoke tests first
    pub fn includes_smoke(&self) -> bool {
        matches!(self, TestScope::Smoke | TestScope::AffectedSmoke)
    }
}

impl fmt::Display for TestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestScope {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TestScope::All),
            "unit" => Ok(TestScope::Unit),
            "integration" => Ok(TestScope::Integration),
            "smoke" => Ok(TestScope::Smoke),
            "affected" => Ok(TestScope::Affected),
            "affected+smoke" | "affected-smoke" => Ok(TestScope::AffectedSmoke),
            other => Err(format!(
                "unknown test scope '{other}' (expected all|unit|integration|smoke|affected|affected+smoke)"
            )),
        }
    }
}

/// Declared category of a discovered test.
///
/// Tests with no declared or an unrecognised type are `Other`, which only the
/// unfiltered scopes select.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    Unit,
    Integration,
    Smoke,
    #[default]
    #[serde(other)]
    Other,
}

/// A test discovered by a language runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestInfo {
    pub path: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: TestKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_files: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl TestInfo {
    pub fn new(path: impl Into<String>, kind: TestKind) -> Self {
        let path = path.into();
        let name = Path::new(&path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        Self {
            path,
            name,
            kind,
            target_files: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }
}

/// Caller-supplied settings for one test run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConfig {
    pub language: String,
    pub project_path: PathBuf,
    #[serde(default)]
    pub scope: TestScope,
    #[serde(default)]
    pub parallel: bool,
    /// Per-test timeout handed to runners
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub coverage: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env_vars: BTreeMap<String, String>,
    /// Glob patterns a test path must match (empty = all)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_patterns: Vec<String>,
    /// Glob patterns that exclude a test path
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_patterns: Vec<String>,
}

impl TestConfig {
    pub fn new(
        language: impl Into<String>,
        project_path: impl Into<PathBuf>,
        scope: TestScope,
    ) -> Self {
        Self {
            language: language.into(),
            project_path: project_path.into(),
            scope,
            parallel: false,
            timeout_secs: None,
            coverage: false,
            verbose: false,
            env_vars: BTreeMap::new(),
            test_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_coverage(mut self, coverage: bool) -> Self {
        self.coverage = coverage;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_patterns(mut self, include: Vec<String>, exclude: Vec<String>) -> Self {
        self.test_patterns = include;
        self.exclude_patterns = exclude;
        self
    }
}

/// Outcome of one executed test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub success: bool,
    pub test_path: String,
    #[serde(default)]
    pub test_name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub duration_secs: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestResult {
    pub fn passed(test_path: impl Into<String>, language: impl Into<String>) -> Self {
        let test_path = test_path.into();
        Self {
            success: true,
            test_name: file_name_of(&test_path),
            test_path,
            language: language.into(),
            duration_secs: 0.0,
            output: String::new(),
            error: None,
        }
    }

    pub fn failed(
        test_path: impl Into<String>,
        language: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::passed(test_path, language)
        }
    }
}

fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// The unit of execution handed to a runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuite {
    pub name: String,
    pub language: String,
    pub project_path: PathBuf,
    pub tests: Vec<TestInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<TestConfig>,
}

/// Changed files, everything they reach, and the tests covering them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedGraph {
    pub changed_files: Vec<String>,
    /// Changed files plus direct and indirect dependencies, no duplicates
    pub affected_files: Vec<String>,
    /// Changed file -> files it directly depends on
    pub dependencies: BTreeMap<String, Vec<String>>,
    /// Affected file -> tests covering it
    pub test_mapping: BTreeMap<String, Vec<String>>,
}

impl AffectedGraph {
    /// Graph used when dependency analysis is unavailable: only the changed files
    pub fn changed_only(changed_files: &[String]) -> Self {
        let mut seen = HashSet::new();
        let affected_files = changed_files
            .iter()
            .filter(|f| seen.insert(f.as_str()))
            .cloned()
            .collect();

        Self {
            changed_files: changed_files.to_vec(),
            affected_files,
            dependencies: BTreeMap::new(),
            test_mapping: BTreeMap::new(),
        }
    }

    /// Tests from `test_mapping`, in affected-file order, deduplicated
    pub fn mapped_tests(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.affected_files
            .iter()
            .filter_map(|file| self.test_mapping.get(file))
            .flatten()
            .filter(|t| seen.insert(t.as_str()))
            .cloned()
            .collect()
    }
}

/// Aggregate view over a batch of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestValidation {
    pub success: bool,
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    /// Percentage of passed tests; 0.0 for an empty batch
    pub success_rate: f64,
    pub total_duration_secs: f64,
    pub failed_test_paths: Vec<String>,
}

impl TestValidation {
    pub fn from_results(results: &[TestResult]) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        let failed_test_paths: Vec<String> = results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.test_path.clone())
            .collect();
        let success_rate = if results.is_empty() {
            0.0
        } else {
            passed as f64 / results.len() as f64 * 100.0
        };

        Self {
            success: failed_test_paths.is_empty(),
            total_tests: results.len(),
            passed_tests: passed,
            failed_tests: failed_test_paths.len(),
            success_rate,
            total_duration_secs: results.iter().map(|r| r.duration_secs).sum(),
            failed_test_paths,
        }
    }
}
