use crate::diagnostics::{Diagnosed, Diagnostics, WarningKind};
use crate::error::{Result, TestEngineError};
use crate::registry::{language_for_path, LanguageRegistry};
use crate::types::AffectedGraph;
use context_graph::{DependencyResolver, SymbolGraph, SymbolGraphProvider};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Builds the set of files touched by a change and the tests that cover them
#[derive(Clone)]
pub struct AffectedGraphBuilder {
    provider: Arc<dyn SymbolGraphProvider>,
    registry: LanguageRegistry,
    resolver: DependencyResolver,
}

impl AffectedGraphBuilder {
    pub fn new(
        provider: Arc<dyn SymbolGraphProvider>,
        registry: LanguageRegistry,
        resolver: DependencyResolver,
    ) -> Self {
        Self {
            provider,
            registry,
            resolver,
        }
    }

    pub fn resolver(&self) -> DependencyResolver {
        self.resolver
    }

    /// Expand `changed_files` through the symbol graph and map tests.
    ///
    /// A symbol graph that cannot be built narrows the result to the changed
    /// files and is reported as a warning, not an error. Only cancellation
    /// aborts the build.
    pub async fn build(
        &self,
        changed_files: &[String],
        project_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<Diagnosed<AffectedGraph>> {
        let mut diag = Diagnostics::new();

        let graph = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TestEngineError::Cancelled),
            built = self.provider.build_graph(project_path) => built,
        };

        let graph = match graph {
            Ok(graph) => graph,
            Err(e) => {
                diag.warn(
                    WarningKind::SymbolGraphUnavailable,
                    Some(&project_path.display().to_string()),
                    format!("analyzing changed files only: {e}"),
                );
                return Ok(diag.finish(AffectedGraph::changed_only(changed_files)));
            }
        };

        let mut affected = AffectedGraph::changed_only(changed_files);
        let (dependencies, expanded) = self.expand(&affected.affected_files, &graph, cancel)?;
        affected.dependencies = dependencies;
        affected.affected_files.extend(expanded);

        affected.test_mapping = self
            .map_tests(&affected.affected_files, project_path, cancel, &mut diag)
            .await?;

        log::info!(
            "Affected graph: {} changed, {} affected, {} mapped, {} warnings",
            affected.changed_files.len(),
            affected.affected_files.len(),
            affected.test_mapping.len(),
            diag.warning_count()
        );

        Ok(diag.finish(affected))
    }

    /// Direct dependencies per changed file, and every file reached beyond
    /// the changed set in discovery order
    fn expand(
        &self,
        changed: &[String],
        graph: &SymbolGraph,
        cancel: &CancellationToken,
    ) -> Result<(BTreeMap<String, Vec<String>>, Vec<String>)> {
        let mut dependencies = BTreeMap::new();
        let mut seen: HashSet<String> = changed.iter().cloned().collect();
        let mut reached = Vec::new();

        for file in changed {
            if cancel.is_cancelled() {
                return Err(TestEngineError::Cancelled);
            }

            let direct = self.resolver.find_direct_dependencies(file, graph);
            let indirect = self
                .resolver
                .find_indirect_dependencies(&direct, graph, cancel)?;

            log::debug!(
                "{file}: {} direct, {} indirect dependencies",
                direct.len(),
                indirect.len()
            );

            for dep in direct.iter().chain(indirect.iter()) {
                if seen.insert(dep.clone()) {
                    reached.push(dep.clone());
                }
            }
            dependencies.insert(file.clone(), direct);
        }

        Ok((dependencies, reached))
    }

    async fn map_tests(
        &self,
        files: &[String],
        project_path: &Path,
        cancel: &CancellationToken,
        diag: &mut Diagnostics,
    ) -> Result<BTreeMap<String, Vec<String>>> {
        let mut mapping = BTreeMap::new();
        let mut missing_analyzers: HashSet<&'static str> = HashSet::new();

        for file in files {
            if cancel.is_cancelled() {
                return Err(TestEngineError::Cancelled);
            }

            let language = match language_for_path(file) {
                Ok(language) => language,
                Err(e) => {
                    diag.warn(
                        WarningKind::UnsupportedFileType,
                        Some(file.as_str()),
                        e.to_string(),
                    );
                    continue;
                }
            };

            let Some(analyzer) = self.registry.analyzer(language) else {
                if missing_analyzers.insert(language) {
                    diag.warn(
                        WarningKind::AnalyzerMissing,
                        Some(language),
                        "no test analyzer registered; files of this language are not mapped",
                    );
                }
                continue;
            };

            match analyzer.find_tests_for_file(file, project_path).await {
                Ok(tests) => {
                    mapping.insert(file.clone(), tests);
                }
                Err(e) => {
                    let err = TestEngineError::TestLookup {
                        file: file.clone(),
                        cause: e,
                    };
                    diag.warn(
                        WarningKind::TestLookupFailed,
                        Some(file.as_str()),
                        err.to_string(),
                    );
                }
            }
        }

        Ok(mapping)
    }
}
