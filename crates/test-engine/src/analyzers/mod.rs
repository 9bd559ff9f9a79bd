//! Built-in [`TestAnalyzer`](crate::ports::TestAnalyzer) implementations

mod go;

pub use go::GoTestAnalyzer;
