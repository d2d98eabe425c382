//! Traversal construction API
//!
//! A [`Traversal`] is a serializable pipeline of [`Step`]s. Repositories
//! build traversals and submit them through a [`GraphTraversalSource`],
//! which applies the configured [`PartitionStrategy`] before handing them to
//! a [`GraphStore`](crate::traits::GraphStore).

mod predicate;
mod strategy;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::data::{Direction, ElementId, PropertyMap, PropertyValue, StoreError};
use crate::traits::GraphStore;

pub use predicate::{CompiledPredicate, Predicate};
pub use strategy::PartitionStrategy;

/// One stage of a traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum Step {
    /// Vertices with the given ids, or all vertices in store order when empty.
    V { ids: Vec<ElementId> },
    /// Edges with the given ids, or all edges in store order when empty.
    E { ids: Vec<ElementId> },
    /// Matches a vertex by label and `search`, creating it with `id` and
    /// `search` + `on_create` when absent. With `fail_on_match` set, a match
    /// fails the traversal with that message instead.
    MergeV {
        label: String,
        search: PropertyMap,
        on_create: PropertyMap,
        id: ElementId,
        fail_on_match: Option<String>,
    },
    /// Edge counterpart of `MergeV`, matching on label, ordered endpoints
    /// and `search`.
    MergeE {
        label: String,
        from: ElementId,
        to: ElementId,
        search: PropertyMap,
        on_create: PropertyMap,
        id: ElementId,
        fail_on_match: Option<String>,
    },
    HasLabel { label: String },
    HasId { id: ElementId },
    HasNotId { id: ElementId },
    Has { key: String, predicate: Predicate },
    /// Keeps traversers for which `probe`, started from the traverser,
    /// yields at least one element.
    Where { probe: Traversal },
    /// Fails the whole traversal with `message` if `probe` yields anything.
    FailIf { probe: Traversal, message: String },
    /// Incident edges of a vertex (`outE`/`inE`).
    Edges {
        direction: Direction,
        label: Option<String>,
    },
    /// Endpoint vertex of an edge (`outV`/`inV`).
    Vertex { direction: Direction },
    /// Sets a property; a null value drops it.
    Property { key: String, value: PropertyValue },
    DropProperty { key: String },
    /// Drops every property except those named in `keep`.
    ClearProperties { keep: Vec<String> },
    /// Removes the element; vertex removal also removes incident edges.
    Drop,
    /// Half-open offset window `[low, high)`.
    Range { low: usize, high: usize },
}

/// A pipeline of steps, built fluently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Traversal {
    pub steps: Vec<Step>,
}

impl Traversal {
    /// Anonymous traversal with no start step, for use as a `where`/`fail`
    /// probe anchored on the current element.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn v() -> Self {
        Self::anonymous().then(Step::V { ids: Vec::new() })
    }

    pub fn v_id(id: &ElementId) -> Self {
        Self::anonymous().then(Step::V { ids: vec![id.clone()] })
    }

    pub fn e() -> Self {
        Self::anonymous().then(Step::E { ids: Vec::new() })
    }

    pub fn merge_v(label: &str, search: PropertyMap, on_create: PropertyMap) -> MergeBuilder {
        MergeBuilder {
            step: Step::MergeV {
                label: label.to_string(),
                search,
                on_create,
                id: ElementId::new_v4(),
                fail_on_match: None,
            },
        }
    }

    pub fn merge_e(
        label: &str,
        from: &ElementId,
        to: &ElementId,
        on_create: PropertyMap,
    ) -> MergeBuilder {
        MergeBuilder {
            step: Step::MergeE {
                label: label.to_string(),
                from: from.clone(),
                to: to.clone(),
                search: PropertyMap::new(),
                on_create,
                id: ElementId::new_v4(),
                fail_on_match: None,
            },
        }
    }

    fn then(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn has_label(self, label: &str) -> Self {
        self.then(Step::HasLabel { label: label.to_string() })
    }

    pub fn has_id(self, id: &ElementId) -> Self {
        self.then(Step::HasId { id: id.clone() })
    }

    pub fn has_not_id(self, id: &ElementId) -> Self {
        self.then(Step::HasNotId { id: id.clone() })
    }

    pub fn has(self, key: &str, predicate: Predicate) -> Self {
        self.then(Step::Has { key: key.to_string(), predicate })
    }

    pub fn where_(self, probe: Traversal) -> Self {
        self.then(Step::Where { probe })
    }

    pub fn fail_if(self, probe: Traversal, message: impl Into<String>) -> Self {
        self.then(Step::FailIf { probe, message: message.into() })
    }

    pub fn out_e(self, label: &str) -> Self {
        self.edges(Direction::Out, label)
    }

    pub fn in_e(self, label: &str) -> Self {
        self.edges(Direction::In, label)
    }

    /// Incident edges in `direction` carrying `label`.
    pub fn edges(self, direction: Direction, label: &str) -> Self {
        self.then(Step::Edges {
            direction,
            label: Some(label.to_string()),
        })
    }

    pub fn in_v(self) -> Self {
        self.then(Step::Vertex { direction: Direction::In })
    }

    pub fn out_v(self) -> Self {
        self.then(Step::Vertex { direction: Direction::Out })
    }

    pub fn property(self, key: &str, value: PropertyValue) -> Self {
        self.then(Step::Property { key: key.to_string(), value })
    }

    pub fn drop_property(self, key: &str) -> Self {
        self.then(Step::DropProperty { key: key.to_string() })
    }

    pub fn clear_properties(self) -> Self {
        self.then(Step::ClearProperties { keep: Vec::new() })
    }

    pub fn drop(self) -> Self {
        self.then(Step::Drop)
    }

    pub fn range(self, low: usize, high: usize) -> Self {
        self.then(Step::Range { low, high })
    }
}

/// Options for a merge step under construction.
#[derive(Debug, Clone)]
pub struct MergeBuilder {
    step: Step,
}

impl MergeBuilder {
    /// Fails the traversal with `message` if the merge finds a match.
    pub fn fail_on_match(mut self, message: impl Into<String>) -> Self {
        if let Step::MergeV { fail_on_match, .. } | Step::MergeE { fail_on_match, .. } =
            &mut self.step
        {
            *fail_on_match = Some(message.into());
        }
        self
    }

    pub fn build(self) -> Traversal {
        Traversal::anonymous().then(self.step)
    }
}

impl From<MergeBuilder> for Traversal {
    fn from(builder: MergeBuilder) -> Self {
        builder.build()
    }
}

/// Shared entry point for submitting traversals to a store.
///
/// Cheap to clone; all clones share the same store connection.
#[derive(Clone)]
pub struct GraphTraversalSource {
    store: Arc<dyn GraphStore>,
    partition: Option<PartitionStrategy>,
}

impl GraphTraversalSource {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store, partition: None }
    }

    /// Confines every submitted traversal to one partition.
    pub fn with_partition(mut self, partition: PartitionStrategy) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn partition(&self) -> Option<&PartitionStrategy> {
        self.partition.as_ref()
    }

    /// Submits a traversal and returns every resulting element map.
    pub async fn to_list(&self, traversal: impl Into<Traversal>) -> Result<Vec<PropertyMap>, StoreError> {
        let traversal = traversal.into();
        let traversal = match &self.partition {
            Some(partition) => partition.apply(&traversal),
            None => traversal,
        };
        debug!(steps = traversal.steps.len(), "Submitting traversal");
        self.store.submit(&traversal).await
    }

    /// First resulting element map, if any.
    pub async fn try_next(&self, traversal: impl Into<Traversal>) -> Result<Option<PropertyMap>, StoreError> {
        Ok(self.to_list(traversal).await?.into_iter().next())
    }

    /// Whether the traversal yields at least one element. Only the first
    /// element is ever produced by the store.
    pub async fn has_next(&self, traversal: impl Into<Traversal>) -> Result<bool, StoreError> {
        let traversal = traversal.into().range(0, 1);
        Ok(!self.to_list(traversal).await?.is_empty())
    }

    /// Runs the traversal for its side effects only.
    pub async fn iterate(&self, traversal: impl Into<Traversal>) -> Result<(), StoreError> {
        self.to_list(traversal).await.map(|_| ())
    }
}

impl std::fmt::Debug for GraphTraversalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphTraversalSource")
            .field("partition", &self.partition)
            .finish_non_exhaustive()
    }
}
