//! # Context Graph
//!
//! Symbol graph snapshots and file-level dependency resolution for impact
//! analysis.
//!
//! ## Architecture
//!
//! ```text
//! SymbolGraphProvider (snapshot file, in-memory, ...)
//!     │
//!     ├──> SymbolGraph (petgraph)
//!     │      ├─ Nodes: symbols, each owned by a file path
//!     │      ├─ Edges: references (calls, uses, imports, ...)
//!     │      └─ Indices: id -> node, path -> nodes
//!     │
//!     └──> DependencyResolver
//!            ├─ Direct: files referenced by a file's symbols
//!            └─ Indirect: bounded breadth-first walk (default 3 hops)
//! ```

mod error;
mod graph;
mod provider;
mod resolver;
mod types;

pub use error::{GraphError, Result};
pub use provider::{
    SnapshotFileProvider, StaticGraphProvider, SymbolGraphProvider, DEFAULT_SNAPSHOT_PATH,
};
pub use resolver::{DependencyResolver, Traversal, DEFAULT_MAX_DEPTH};
pub use types::{EdgeKind, SymbolEdge, SymbolGraph, SymbolGraphSnapshot, SymbolKind, SymbolNode};

pub use tokio_util::sync::CancellationToken;
