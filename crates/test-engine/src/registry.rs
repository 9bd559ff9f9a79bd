use crate::error::{Result, TestEngineError};
use crate::ports::{TestAnalyzer, TestRunner};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Collects runners and analyzers during startup
#[derive(Default)]
pub struct RegistryBuilder {
    runners: HashMap<String, Arc<dyn TestRunner>>,
    analyzers: HashMap<String, Arc<dyn TestAnalyzer>>,
}

impl RegistryBuilder {
    pub fn register_runner<R>(mut self, language: impl Into<String>, runner: R) -> Self
    where
        R: TestRunner + 'static,
    {
        let language = language.into();
        log::info!("Registered test runner for language: {language}");
        self.runners.insert(language, Arc::new(runner));
        self
    }

    pub fn register_analyzer<A>(mut self, language: impl Into<String>, analyzer: A) -> Self
    where
        A: TestAnalyzer + 'static,
    {
        let language = language.into();
        log::info!("Registered test analyzer for language: {language}");
        self.analyzers.insert(language, Arc::new(analyzer));
        self
    }

    /// Freeze the registrations. The result is cheap to clone and read-only.
    pub fn build(self) -> LanguageRegistry {
        LanguageRegistry {
            runners: Arc::new(self.runners),
            analyzers: Arc::new(self.analyzers),
        }
    }
}

/// Immutable language -> runner / analyzer lookup
#[derive(Clone, Default)]
pub struct LanguageRegistry {
    runners: Arc<HashMap<String, Arc<dyn TestRunner>>>,
    analyzers: Arc<HashMap<String, Arc<dyn TestAnalyzer>>>,
}

impl LanguageRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn runner(&self, language: &str) -> Result<Arc<dyn TestRunner>> {
        self.runners
            .get(language)
            .cloned()
            .ok_or_else(|| TestEngineError::NoRunner(language.to_string()))
    }

    pub fn analyzer(&self, language: &str) -> Option<Arc<dyn TestAnalyzer>> {
        self.analyzers.get(language).cloned()
    }

    /// Analyzer for the language inferred from `path`'s extension
    pub fn analyzer_for_file(&self, path: &str) -> Result<Arc<dyn TestAnalyzer>> {
        let language = language_for_path(path)?;
        self.analyzer(language)
            .ok_or_else(|| TestEngineError::NoAnalyzer(language.to_string()))
    }

    /// Languages with a registered runner, sorted
    pub fn supported_languages(&self) -> Vec<String> {
        sorted_keys(&self.runners)
    }

    /// Languages with a registered analyzer, sorted
    pub fn analyzer_languages(&self) -> Vec<String> {
        sorted_keys(&self.analyzers)
    }
}

impl fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageRegistry")
            .field("runners", &self.supported_languages())
            .field("analyzers", &self.analyzer_languages())
            .finish()
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}

/// Language tag for a source file, by extension
pub fn language_for_path(path: &str) -> Result<&'static str> {
    let ext = Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "go" => Ok("go"),
        "ts" | "tsx" => Ok("typescript"),
        "js" | "jsx" => Ok("javascript"),
        "java" => Ok("java"),
        "py" => Ok("python"),
        _ => Err(TestEngineError::UnsupportedFileType(if ext.is_empty() {
            path.to_string()
        } else {
            format!(".{ext}")
        })),
    }
}
