//! Error types for the social graph mapping and repository layer

use thiserror::Error;

/// Status code the graph server uses for a traversal that reached a `fail`
/// step.
pub const SERVER_ERROR_FAIL_STEP: u16 = 595;

/// Failure converting between a domain object and a flat property map.
///
/// Signals a schema mismatch between stored data and the domain type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    #[error("Missing required property: {0}")]
    MissingField(String),
    #[error("Property {key} cannot be read as {expected} (found {found})")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: String,
    },
    #[error("Unknown property: {0}")]
    UnknownField(String),
    #[error("Property {0} cannot be cleared")]
    RequiredField(String),
}

/// Error response returned by a remote graph service.
///
/// `message` holds the raw response body, which is usually a JSON document
/// carrying a `message` attribute.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Graph server responded with status {status_code}: {message}")]
pub struct ResponseError {
    pub status_code: u16,
    pub message: String,
}

/// Raw failure produced while executing a traversal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionFailure {
    /// The traversal reached a `fail` step while executing synchronously.
    #[error("{message}")]
    FailStep { message: String },
    /// An asynchronously executed traversal completed with an error response.
    #[error("Traversal completed exceptionally: {0}")]
    Completion(#[source] ResponseError),
    /// Any other engine-side failure.
    #[error("Traversal execution failed: {0}")]
    Engine(String),
}

/// Errors surfaced by a [`GraphStore`](crate::traits::GraphStore) adapter.
///
/// Constraint failures have already been normalized into `Conflict` by the
/// conflict translator; adapters never return a raw fail-step failure.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Execution(ExecutionFailure),
    #[error("Graph store connection error: {0}")]
    Connection(String),
    #[error("Graph store protocol error: {0}")]
    Protocol(String),
}

/// Caller-facing error kinds of the repositories.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Unexpected error while mapping vertex/edge properties to graph object: {0}")]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    StoreExecution(ExecutionFailure),
    #[error(transparent)]
    Store(StoreError),
}

impl RepositoryError {
    /// HTTP status an outer layer should answer with for this error kind.
    pub fn status_code(&self) -> u16 {
        match self {
            RepositoryError::NotFound(_) => 404,
            RepositoryError::Conflict(_) => 409,
            RepositoryError::BadRequest(_) => 400,
            RepositoryError::Mapping(_) | RepositoryError::StoreExecution(_) => 500,
            RepositoryError::Store(_) => 502,
        }
    }
}

impl From<StoreError> for RepositoryError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict(message) => RepositoryError::Conflict(message),
            StoreError::Execution(failure) => RepositoryError::StoreExecution(failure),
            other => RepositoryError::Store(other),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
