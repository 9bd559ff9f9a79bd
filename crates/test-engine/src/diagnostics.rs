use serde::Serialize;
use std::fmt;

/// Why part of an analysis or run was skipped or degraded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Symbol graph could not be built; only changed files were analyzed
    SymbolGraphUnavailable,
    UnsupportedFileType,
    /// No analyzer for a language; mapping skipped or full suite used
    AnalyzerMissing,
    TestLookupFailed,
    SmokeDiscoveryFailed,
    SmokeCheckFailed,
    /// Targeted selection produced nothing; full suite used
    NoTargetedTests,
    TestExecutionFailed,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WarningKind::SymbolGraphUnavailable => "symbol_graph_unavailable",
            WarningKind::UnsupportedFileType => "unsupported_file_type",
            WarningKind::AnalyzerMissing => "analyzer_missing",
            WarningKind::TestLookupFailed => "test_lookup_failed",
            WarningKind::SmokeDiscoveryFailed => "smoke_discovery_failed",
            WarningKind::SmokeCheckFailed => "smoke_check_failed",
            WarningKind::NoTargetedTests => "no_targeted_tests",
            WarningKind::TestExecutionFailed => "test_execution_failed",
        };
        f.write_str(label)
    }
}

/// A non-fatal problem the engine worked around
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    /// File, test or language the warning is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

/// A value plus the warnings collected while producing it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosed<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Diagnosed<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// Put earlier warnings ahead of the ones already recorded
    pub fn with_prior_warnings(mut self, mut prior: Vec<Warning>) -> Self {
        prior.append(&mut self.warnings);
        self.warnings = prior;
        self
    }
}

/// Warning accumulator; every warning is logged as it is recorded
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, kind: WarningKind, subject: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        match subject {
            Some(subject) => log::warn!("[{kind}] {subject}: {message}"),
            None => log::warn!("[{kind}] {message}"),
        }
        self.warnings.push(Warning {
            kind,
            subject: subject.map(str::to_string),
            message,
        });
    }

    pub fn extend(&mut self, warnings: Vec<Warning>) {
        self.warnings.extend(warnings);
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    pub fn finish<T>(self, value: T) -> Diagnosed<T> {
        Diagnosed {
            value,
            warnings: self.warnings,
        }
    }
}
