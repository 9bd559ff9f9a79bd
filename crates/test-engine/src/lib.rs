//! # Context Test Engine
//!
//! Selects and runs the tests affected by a change.
//!
//! ## Pipeline
//!
//! ```text
//! changed files
//!     │
//!     ├──> AffectedGraphBuilder
//!     │      ├─ SymbolGraphProvider (degrades to changed files only)
//!     │      ├─ DependencyResolver (direct + bounded indirect)
//!     │      └─ TestAnalyzer per language (file -> tests)
//!     │
//!     └──> TestEngine
//!            ├─ discover -> filter by scope -> narrow by globs
//!            ├─ targeted: smoke first, then mapped tests, one at a time
//!            └─ empty selection or no analyzer: full suite
//! ```
//!
//! Non-fatal problems never abort a run. They come back as [`Warning`]s
//! next to the value in a [`Diagnosed`].

mod affected;
pub mod analyzers;
mod config;
mod diagnostics;
mod engine;
mod error;
mod filter;
mod ports;
mod registry;
mod service;
mod types;

pub use affected::AffectedGraphBuilder;
pub use config::{EngineConfig, MAX_DEPTH_ENV};
pub use diagnostics::{Diagnosed, Diagnostics, Warning, WarningKind};
pub use engine::TestEngine;
pub use error::{Result, TestEngineError};
pub use filter::{filter_tests_by_scope, PathFilter};
pub use ports::{TestAnalyzer, TestRunner};
pub use registry::{language_for_path, LanguageRegistry, RegistryBuilder};
pub use service::TestService;
pub use types::{
    AffectedGraph, TestConfig, TestInfo, TestKind, TestResult, TestScope, TestSuite,
    TestValidation,
};

pub use context_graph::CancellationToken;
