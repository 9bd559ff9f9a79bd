use crate::diagnostics::Diagnosed;
use crate::engine::TestEngine;
use crate::error::Result;
use crate::types::{TestConfig, TestResult, TestScope, TestValidation};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Entry point for callers that think in scopes and changed files
#[derive(Clone)]
pub struct TestService {
    engine: Arc<TestEngine>,
}

impl TestService {
    pub fn new(engine: Arc<TestEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &TestEngine {
        &self.engine
    }

    /// Targeted scopes with changed files go through the affected graph;
    /// everything else runs the scope-filtered suite.
    ///
    /// A targeted scope with no changed files runs the full suite, including
    /// for `affected+smoke`, rather than the smoke tests alone.
    pub async fn run(
        &self,
        config: &TestConfig,
        changed_files: &[String],
        cancel: &CancellationToken,
    ) -> Result<Diagnosed<Vec<TestResult>>> {
        if !config.scope.is_targeted() || changed_files.is_empty() {
            return self.engine.run_tests(config, cancel).await;
        }

        let affected = self
            .engine
            .build_affected_graph(changed_files, &config.project_path, cancel)
            .await?;
        let results = self
            .engine
            .run_targeted_tests(config, &affected.value, cancel)
            .await?;

        Ok(results.with_prior_warnings(affected.warnings))
    }

    pub async fn run_smoke_tests(
        &self,
        project_path: &Path,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<Diagnosed<Vec<TestResult>>> {
        let config = TestConfig::new(language, project_path, TestScope::Smoke)
            .with_timeout(self.engine.config().smoke_timeout_secs)
            .with_verbose(true);
        self.engine.run_tests(&config, cancel).await
    }

    pub async fn run_unit_tests(
        &self,
        project_path: &Path,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<Diagnosed<Vec<TestResult>>> {
        let config = TestConfig::new(language, project_path, TestScope::Unit)
            .with_timeout(self.engine.config().unit_timeout_secs)
            .with_coverage(true);
        self.engine.run_tests(&config, cancel).await
    }

    pub async fn run_integration_tests(
        &self,
        project_path: &Path,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<Diagnosed<Vec<TestResult>>> {
        let config = TestConfig::new(language, project_path, TestScope::Integration)
            .with_timeout(self.engine.config().integration_timeout_secs)
            .with_verbose(true);
        self.engine.run_tests(&config, cancel).await
    }

    pub fn validate_results(results: &[TestResult]) -> TestValidation {
        let validation = TestValidation::from_results(results);
        log::info!(
            "Validated {} results: {} passed, {} failed ({:.1}%)",
            validation.total_tests,
            validation.passed_tests,
            validation.failed_tests,
            validation.success_rate
        );
        validation
    }
}
