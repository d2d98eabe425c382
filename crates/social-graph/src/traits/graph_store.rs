//! GraphStore trait definition for traversal execution

use async_trait::async_trait;

use crate::data::{PropertyMap, StoreError};
use crate::traversal::Traversal;

/// Executes traversals against a property graph.
///
/// This abstracts the underlying engine (embedded or remote). Adapters run a
/// traversal as a single store-side operation, so merge steps are atomic,
/// and they report constraint failures (a traversal reaching a `fail` step)
/// uniformly as [`StoreError::Conflict`] whatever shape the engine raised
/// them in.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Runs `traversal` to completion and returns the element map of every
    /// element it emits, in traversal order.
    ///
    /// Element maps carry the `id` and `label` keys; edge maps also carry
    /// `IN`/`OUT` anchors of the form `{id, label}`.
    async fn submit(&self, traversal: &Traversal) -> Result<Vec<PropertyMap>, StoreError>;
}
