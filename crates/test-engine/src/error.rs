use context_graph::GraphError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TestEngineError>;

#[derive(Error, Debug)]
pub enum TestEngineError {
    #[error("no test runner registered for language: {0}")]
    NoRunner(String),

    #[error("no test analyzer registered for language: {0}")]
    NoAnalyzer(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("failed to discover tests: {0:#}")]
    Discovery(anyhow::Error),

    #[error("failed to run test suite: {0:#}")]
    Execution(anyhow::Error),

    #[error("failed to find tests for {file}: {cause:#}")]
    TestLookup { file: String, cause: anyhow::Error },

    #[error("operation cancelled")]
    Cancelled,

    #[error("Graph error: {0}")]
    Graph(GraphError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),
}

impl From<GraphError> for TestEngineError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Cancelled => Self::Cancelled,
            other => Self::Graph(other),
        }
    }
}
