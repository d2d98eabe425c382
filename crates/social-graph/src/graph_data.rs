//! Whole-graph snapshot export

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

use crate::data::{Direction, PropertyMap, PropertyValue, StoreError, ID_KEY};
use crate::traversal::{GraphTraversalSource, Traversal};

pub const SOURCE_KEY: &str = "source";
pub const TARGET_KEY: &str = "target";

/// Every vertex and edge visible through a traversal source, keyed by id.
///
/// Edge maps carry `source` (OUT vertex id) and `target` (IN vertex id)
/// in place of the raw endpoint anchors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub vertices: BTreeMap<String, PropertyMap>,
    pub edges: BTreeMap<String, PropertyMap>,
}

#[instrument(skip(g))]
pub async fn export_graph(g: &GraphTraversalSource) -> Result<GraphSnapshot, StoreError> {
    let mut snapshot = GraphSnapshot::default();

    for vertex in g.to_list(Traversal::v()).await? {
        if let Some(id) = element_id(&vertex) {
            snapshot.vertices.insert(id, vertex);
        }
    }

    for mut edge in g.to_list(Traversal::e()).await? {
        let Some(id) = element_id(&edge) else {
            continue;
        };
        for (direction, key) in [(Direction::Out, SOURCE_KEY), (Direction::In, TARGET_KEY)] {
            let endpoint = edge
                .remove(direction.token())
                .and_then(|anchor| anchor.as_map().and_then(|m| m.get(ID_KEY).cloned()));
            if let Some(endpoint) = endpoint {
                edge.insert(key.to_string(), endpoint);
            }
        }
        snapshot.edges.insert(id, edge);
    }

    Ok(snapshot)
}

fn element_id(element: &PropertyMap) -> Option<String> {
    element.get(ID_KEY).and_then(PropertyValue::as_str).map(str::to_string)
}
