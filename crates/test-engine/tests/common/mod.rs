#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use context_graph::{StaticGraphProvider, SymbolEdge, SymbolGraphSnapshot, SymbolNode};
use context_test_engine::{
    LanguageRegistry, TestAnalyzer, TestConfig, TestEngine, TestInfo, TestKind, TestResult,
    TestRunner, TestSuite,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Runner with a fixed test list that records every call
#[derive(Clone, Default)]
pub struct MockRunner {
    tests: Vec<TestInfo>,
    failing: HashSet<String>,
    broken: HashSet<String>,
    discovery_error: Option<String>,
    suite_error: Option<String>,
    pub suites: Arc<Mutex<Vec<Vec<String>>>>,
    pub single_runs: Arc<Mutex<Vec<String>>>,
}

impl MockRunner {
    pub fn with_tests(tests: Vec<TestInfo>) -> Self {
        Self {
            tests,
            ..Self::default()
        }
    }

    /// `run_test` returns `Ok` with `success == false`
    pub fn failing(mut self, test: &str) -> Self {
        self.failing.insert(test.to_string());
        self
    }

    /// `run_test` returns `Err`
    pub fn broken(mut self, test: &str) -> Self {
        self.broken.insert(test.to_string());
        self
    }

    /// `discover_tests` returns `Err`
    pub fn undiscoverable(mut self, message: &str) -> Self {
        self.discovery_error = Some(message.to_string());
        self
    }

    /// `run_test_suite` returns `Err`
    pub fn suite_crashes(mut self, message: &str) -> Self {
        self.suite_error = Some(message.to_string());
        self
    }

    pub fn suite_runs(&self) -> Vec<Vec<String>> {
        self.suites.lock().expect("suites lock").clone()
    }

    pub fn single_runs(&self) -> Vec<String> {
        self.single_runs.lock().expect("runs lock").clone()
    }
}

#[async_trait]
impl TestRunner for MockRunner {
    async fn discover_tests(&self, _project_path: &Path) -> anyhow::Result<Vec<TestInfo>> {
        if let Some(message) = &self.discovery_error {
            return Err(anyhow!("{message}"));
        }
        Ok(self.tests.clone())
    }

    async fn run_test_suite(&self, suite: &TestSuite) -> anyhow::Result<Vec<TestResult>> {
        let paths: Vec<String> = suite.tests.iter().map(|t| t.path.clone()).collect();
        self.suites.lock().expect("suites lock").push(paths.clone());
        if let Some(message) = &self.suite_error {
            return Err(anyhow!("{message}"));
        }
        Ok(paths
            .into_iter()
            .map(|p| TestResult::passed(p, suite.language.clone()))
            .collect())
    }

    async fn run_test(&self, test_path: &str, config: &TestConfig) -> anyhow::Result<TestResult> {
        self.single_runs
            .lock()
            .expect("runs lock")
            .push(test_path.to_string());

        if self.broken.contains(test_path) {
            return Err(anyhow!("runner crashed on {test_path}"));
        }
        if self.failing.contains(test_path) {
            return Ok(TestResult::failed(test_path, &config.language, "assertion failed"));
        }
        Ok(TestResult::passed(test_path, &config.language))
    }
}

/// Analyzer backed by in-memory maps
#[derive(Clone, Default)]
pub struct MockAnalyzer {
    mapping: HashMap<String, Vec<String>>,
    lookup_errors: HashSet<String>,
    smoke: HashSet<String>,
    smoke_errors: HashSet<String>,
    pub lookups: Arc<Mutex<Vec<String>>>,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(mut self, file: &str, tests: &[&str]) -> Self {
        self.mapping
            .insert(file.to_string(), tests.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn lookup_error(mut self, file: &str) -> Self {
        self.lookup_errors.insert(file.to_string());
        self
    }

    pub fn smoke(mut self, test: &str) -> Self {
        self.smoke.insert(test.to_string());
        self
    }

    pub fn smoke_error(mut self, test: &str) -> Self {
        self.smoke_errors.insert(test.to_string());
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().expect("lookups lock").clone()
    }
}

#[async_trait]
impl TestAnalyzer for MockAnalyzer {
    async fn find_tests_for_file(
        &self,
        file_path: &str,
        _project_path: &Path,
    ) -> anyhow::Result<Vec<String>> {
        self.lookups
            .lock()
            .expect("lookups lock")
            .push(file_path.to_string());

        if self.lookup_errors.contains(file_path) {
            return Err(anyhow!("cannot read {file_path}"));
        }
        Ok(self.mapping.get(file_path).cloned().unwrap_or_default())
    }

    async fn is_smoke_test(&self, test_path: &str) -> anyhow::Result<bool> {
        if self.smoke_errors.contains(test_path) {
            return Err(anyhow!("cannot classify {test_path}"));
        }
        Ok(self.smoke.contains(test_path))
    }
}

pub fn unit(path: &str) -> TestInfo {
    TestInfo::new(path, TestKind::Unit)
}

pub fn smoke(path: &str) -> TestInfo {
    TestInfo::new(path, TestKind::Smoke)
}

pub fn integration(path: &str) -> TestInfo {
    TestInfo::new(path, TestKind::Integration)
}

pub fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Symbol graph where each `(from, to)` file pair gets one reference edge
pub fn file_graph(edges: &[(&str, &str)]) -> SymbolGraphSnapshot {
    let mut files: Vec<&str> = Vec::new();
    for (from, to) in edges {
        for file in [*from, *to] {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }

    let nodes = files
        .iter()
        .map(|file| SymbolNode::new(format!("sym:{file}"), *file))
        .collect();
    let edges = edges
        .iter()
        .map(|(from, to)| SymbolEdge::new(format!("sym:{from}"), format!("sym:{to}")))
        .collect();
    SymbolGraphSnapshot::new(nodes, edges)
}

pub fn engine(
    runner: Option<MockRunner>,
    analyzer: Option<MockAnalyzer>,
    graph: StaticGraphProvider,
) -> TestEngine {
    let mut builder = LanguageRegistry::builder();
    if let Some(runner) = runner {
        builder = builder.register_runner("go", runner);
    }
    if let Some(analyzer) = analyzer {
        builder = builder.register_analyzer("go", analyzer);
    }
    TestEngine::new(builder.build(), Arc::new(graph))
}

pub fn go_config(scope: context_test_engine::TestScope) -> TestConfig {
    TestConfig::new("go", "/work/shop", scope)
}
