//! Social graph object mapping and repository layer
//!
//! Maps `User` vertices and `FOLLOW` edges to and from the flat property
//! model of a property graph, and implements the repositories on top of a
//! traversal API executed by a pluggable [`GraphStore`].

// Core modules
pub mod data;
pub mod codec;
pub mod traversal;
pub mod traits;
pub mod conflict;
pub mod query;
pub mod repository;

// Store adapters and wiring
pub mod adapters;
pub mod config;
pub mod graph_data;

// Testing utilities
pub mod test_utils;

// Re-export key types for convenient usage
pub use data::{
    Address, Direction, ElementId, ExecutionFailure, FollowEdge, MappingError, PropertyMap,
    PropertyValue, RepositoryError, RepositoryResult, ResponseError, StoreError, User, UserRef,
};
pub use codec::{flatten, flatten_patch, unflatten, GraphObject};
pub use traversal::{GraphTraversalSource, PartitionStrategy, Predicate, Traversal};
pub use traits::GraphStore;
pub use query::Pagination;
pub use repository::{FollowRepository, UserRepository};
pub use adapters::{EmbeddedGraphStore, RemoteGraphStore, RemoteGraphStoreConfig};
pub use config::{connect, traversal_source, GraphConfig, StoreMode};
pub use graph_data::{export_graph, GraphSnapshot};

/// Initializes the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
