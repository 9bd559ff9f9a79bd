use crate::affected::AffectedGraphBuilder;
use crate::config::EngineConfig;
use crate::diagnostics::{Diagnosed, Diagnostics, WarningKind};
use crate::error::{Result, TestEngineError};
use crate::filter::{filter_tests_by_scope, PathFilter};
use crate::ports::TestRunner;
use crate::registry::LanguageRegistry;
use crate::types::{AffectedGraph, TestConfig, TestInfo, TestResult, TestSuite};
use context_graph::{DependencyResolver, SymbolGraphProvider};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Discovers, selects and runs tests across registered languages.
///
/// The registry is frozen before the engine is built, so one engine can be
/// shared across concurrent callers behind an `Arc`.
pub struct TestEngine {
    registry: LanguageRegistry,
    affected: AffectedGraphBuilder,
    config: EngineConfig,
}

impl TestEngine {
    pub fn new(registry: LanguageRegistry, provider: Arc<dyn SymbolGraphProvider>) -> Self {
        Self::with_config(registry, provider, EngineConfig::default())
    }

    pub fn with_config(
        registry: LanguageRegistry,
        provider: Arc<dyn SymbolGraphProvider>,
        config: EngineConfig,
    ) -> Self {
        let resolver = DependencyResolver::new(config.max_dependency_depth);
        Self {
            affected: AffectedGraphBuilder::new(provider, registry.clone(), resolver),
            registry,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn supported_languages(&self) -> Vec<String> {
        self.registry.supported_languages()
    }

    pub async fn build_affected_graph(
        &self,
        changed_files: &[String],
        project_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<Diagnosed<AffectedGraph>> {
        self.affected.build(changed_files, project_path, cancel).await
    }

    /// Discover every test the language's runner knows about
    pub async fn discover_tests(
        &self,
        project_path: &Path,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<TestSuite> {
        let runner = self.registry.runner(language)?;
        if cancel.is_cancelled() {
            return Err(TestEngineError::Cancelled);
        }
        discover_with(runner.as_ref(), project_path, language).await
    }

    /// Run the scope-filtered suite through the runner in one batch
    pub async fn run_tests(
        &self,
        config: &TestConfig,
        cancel: &CancellationToken,
    ) -> Result<Diagnosed<Vec<TestResult>>> {
        let runner = self.registry.runner(&config.language)?;
        let path_filter = PathFilter::from_config(config)?;
        if cancel.is_cancelled() {
            return Err(TestEngineError::Cancelled);
        }

        let discovered =
            discover_with(runner.as_ref(), &config.project_path, &config.language).await?;
        let tests: Vec<TestInfo> = filter_tests_by_scope(&discovered.tests, config.scope)
            .into_iter()
            .filter(|t| path_filter.allows(&t.path))
            .collect();

        log::info!(
            "Running {} of {} {} tests (scope: {})",
            tests.len(),
            discovered.tests.len(),
            config.language,
            config.scope
        );

        let suite = TestSuite {
            tests,
            config: Some(config.clone()),
            ..discovered
        };

        if cancel.is_cancelled() {
            return Err(TestEngineError::Cancelled);
        }
        let results = runner
            .run_test_suite(&suite)
            .await
            .map_err(TestEngineError::Execution)?;

        Ok(Diagnosed::clean(results))
    }

    /// Run only the tests covering `affected`, one at a time.
    ///
    /// Falls back to [`TestEngine::run_tests`] when the language has no
    /// analyzer or when selection comes up empty. A test that cannot be
    /// executed becomes a failed result; the batch continues.
    pub async fn run_targeted_tests(
        &self,
        config: &TestConfig,
        affected: &AffectedGraph,
        cancel: &CancellationToken,
    ) -> Result<Diagnosed<Vec<TestResult>>> {
        let runner = self.registry.runner(&config.language)?;
        let path_filter = PathFilter::from_config(config)?;
        let mut diag = Diagnostics::new();

        let Some(analyzer) = self.registry.analyzer(&config.language) else {
            diag.warn(
                WarningKind::AnalyzerMissing,
                Some(config.language.as_str()),
                "no test analyzer registered; running the full suite",
            );
            let full = self.run_tests(config, cancel).await?;
            return Ok(full.with_prior_warnings(diag.into_warnings()));
        };

        let mut targeted = Vec::new();
        let mut seen = HashSet::new();
        for file in &affected.affected_files {
            if cancel.is_cancelled() {
                return Err(TestEngineError::Cancelled);
            }

            match analyzer.find_tests_for_file(file, &config.project_path).await {
                Ok(tests) => {
                    for test in tests {
                        if seen.insert(test.clone()) {
                            targeted.push(test);
                        }
                    }
                }
                Err(e) => diag.warn(
                    WarningKind::TestLookupFailed,
                    Some(file.as_str()),
                    format!("{e:#}"),
                ),
            }
        }

        if config.scope.includes_smoke() {
            match self
                .find_smoke_tests(&config.project_path, &config.language, cancel)
                .await
            {
                Ok(smoke) => {
                    diag.extend(smoke.warnings);
                    targeted = smoke_first(smoke.value, targeted);
                }
                Err(TestEngineError::Cancelled) => return Err(TestEngineError::Cancelled),
                Err(e) => diag.warn(
                    WarningKind::SmokeDiscoveryFailed,
                    Some(config.language.as_str()),
                    format!("continuing with affected tests only: {e}"),
                ),
            }
        }

        if !path_filter.is_noop() {
            targeted.retain(|t| path_filter.allows(t));
        }

        if targeted.is_empty() {
            diag.warn(
                WarningKind::NoTargetedTests,
                None,
                format!(
                    "no tests mapped from {} affected files; running the full suite",
                    affected.affected_files.len()
                ),
            );
            let full = self.run_tests(config, cancel).await?;
            return Ok(full.with_prior_warnings(diag.into_warnings()));
        }

        log::info!(
            "Running {} targeted {} tests for {} affected files",
            targeted.len(),
            config.language,
            affected.affected_files.len()
        );

        let mut results = Vec::with_capacity(targeted.len());
        for test in &targeted {
            if cancel.is_cancelled() {
                return Err(TestEngineError::Cancelled);
            }

            match runner.run_test(test, config).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    let message = format!("{e:#}");
                    diag.warn(
                        WarningKind::TestExecutionFailed,
                        Some(test.as_str()),
                        message.clone(),
                    );
                    results.push(TestResult::failed(test, &config.language, message));
                }
            }
        }

        Ok(diag.finish(results))
    }

    /// Paths of discovered tests the analyzer classifies as smoke, in
    /// discovery order. Tests that cannot be classified are skipped.
    pub async fn find_smoke_tests(
        &self,
        project_path: &Path,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<Diagnosed<Vec<String>>> {
        let analyzer = self
            .registry
            .analyzer(language)
            .ok_or_else(|| TestEngineError::NoAnalyzer(language.to_string()))?;
        let suite = self.discover_tests(project_path, language, cancel).await?;

        let mut diag = Diagnostics::new();
        let mut smoke = Vec::new();
        for test in &suite.tests {
            if cancel.is_cancelled() {
                return Err(TestEngineError::Cancelled);
            }

            match analyzer.is_smoke_test(&test.path).await {
                Ok(true) => smoke.push(test.path.clone()),
                Ok(false) => {}
                Err(e) => diag.warn(
                    WarningKind::SmokeCheckFailed,
                    Some(test.path.as_str()),
                    format!("{e:#}"),
                ),
            }
        }

        log::debug!(
            "{} smoke tests among {} {language} tests",
            smoke.len(),
            suite.tests.len()
        );
        Ok(diag.finish(smoke))
    }
}

async fn discover_with(
    runner: &dyn TestRunner,
    project_path: &Path,
    language: &str,
) -> Result<TestSuite> {
    let tests = runner
        .discover_tests(project_path)
        .await
        .map_err(TestEngineError::Discovery)?;

    Ok(TestSuite {
        name: suite_name(project_path),
        language: language.to_string(),
        project_path: project_path.to_path_buf(),
        tests,
        config: None,
    })
}

fn suite_name(project_path: &Path) -> String {
    project_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| project_path.display().to_string())
}

/// Smoke tests first, then the remaining targeted tests in their order
fn smoke_first(smoke: Vec<String>, targeted: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    smoke
        .into_iter()
        .chain(targeted)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
