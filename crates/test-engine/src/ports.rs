//! Capabilities the engine consumes, implemented once per language.

use crate::types::{TestConfig, TestInfo, TestResult, TestSuite};
use async_trait::async_trait;
use std::path::Path;

/// Discovers and executes tests for one language
#[async_trait]
pub trait TestRunner: Send + Sync {
    async fn discover_tests(&self, project_path: &Path) -> anyhow::Result<Vec<TestInfo>>;

    async fn run_test_suite(&self, suite: &TestSuite) -> anyhow::Result<Vec<TestResult>>;

    /// Run a single test. An `Err` means the test could not be executed at all;
    /// a failing test is an `Ok` result with `success == false`.
    async fn run_test(&self, test_path: &str, config: &TestConfig) -> anyhow::Result<TestResult>;
}

/// Maps source files to the tests that cover them
#[async_trait]
pub trait TestAnalyzer: Send + Sync {
    async fn find_tests_for_file(
        &self,
        file_path: &str,
        project_path: &Path,
    ) -> anyhow::Result<Vec<String>>;

    async fn is_smoke_test(&self, test_path: &str) -> anyhow::Result<bool>;

    /// Imports or modules a test depends on
    async fn analyze_test_dependencies(&self, _test_path: &str) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }
}
