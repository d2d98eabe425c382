use serde::{Deserialize, Serialize};

use crate::data::PropertyValue;
use crate::traversal::{Predicate, Step, Traversal};

/// Confines traversals to elements whose `key` property equals `name`.
///
/// Reads are filtered after every step that introduces new elements; merges
/// match within the partition and stamp it on created elements; clearing
/// properties never removes the partition key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionStrategy {
    key: String,
    name: String,
}

impl PartitionStrategy {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn partition_filter(&self) -> Step {
        Step::Has {
            key: self.key.clone(),
            predicate: Predicate::Eq(PropertyValue::from(self.name.as_str())),
        }
    }

    /// Rewrites `traversal` so it only observes and creates elements of this
    /// partition.
    pub fn apply(&self, traversal: &Traversal) -> Traversal {
        let mut steps = Vec::with_capacity(traversal.steps.len() * 2);

        for step in &traversal.steps {
            match step {
                Step::V { .. } | Step::E { .. } | Step::Edges { .. } | Step::Vertex { .. } => {
                    steps.push(step.clone());
                    steps.push(self.partition_filter());
                }
                Step::MergeV { .. } | Step::MergeE { .. } => {
                    let mut step = step.clone();
                    if let Step::MergeV { search, .. } | Step::MergeE { search, .. } = &mut step {
                        search.insert(self.key.clone(), PropertyValue::from(self.name.as_str()));
                    }
                    steps.push(step);
                }
                Step::ClearProperties { keep } => {
                    let mut keep = keep.clone();
                    if !keep.contains(&self.key) {
                        keep.push(self.key.clone());
                    }
                    steps.push(Step::ClearProperties { keep });
                }
                Step::Where { probe } => steps.push(Step::Where {
                    probe: self.apply(probe),
                }),
                Step::FailIf { probe, message } => steps.push(Step::FailIf {
                    probe: self.apply(probe),
                    message: message.clone(),
                }),
                other => steps.push(other.clone()),
            }
        }

        Traversal { steps }
    }
}
