//! Core data structures for the social graph

pub mod types;
pub mod identifiers;
pub mod entities;
pub mod errors;

// Re-export all common types
pub use types::{Direction, PropertyMap, PropertyValue, ID_KEY, LABEL_KEY};
pub use identifiers::ElementId;
pub use entities::{Address, FollowEdge, User, UserRef};
pub use errors::{
    ExecutionFailure, MappingError, RepositoryError, RepositoryResult, ResponseError, StoreError,
    SERVER_ERROR_FAIL_STEP,
};
