//! In-process graph engine
//!
//! Executes traversals synchronously against an in-memory property graph.
//! A whole traversal runs under one lock, so merge steps are atomic with
//! respect to concurrent submissions. Constraint failures surface from the
//! engine as [`ExecutionFailure::FailStep`] and are translated before
//! leaving the adapter.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::conflict;
use crate::data::{
    Direction, ElementId, ExecutionFailure, PropertyMap, PropertyValue, StoreError, ID_KEY,
    LABEL_KEY,
};
use crate::traits::GraphStore;
use crate::traversal::{Step, Traversal};

#[derive(Debug, Clone)]
struct StoredVertex {
    label: String,
    properties: PropertyMap,
}

#[derive(Debug, Clone)]
struct StoredEdge {
    label: String,
    properties: PropertyMap,
    out_vertex: ElementId,
    in_vertex: ElementId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Traverser {
    Vertex(ElementId),
    Edge(ElementId),
}

/// Graph contents plus insertion order and adjacency indexes.
#[derive(Debug, Default)]
struct GraphState {
    vertices: HashMap<ElementId, StoredVertex>,
    vertex_order: Vec<ElementId>,
    edges: HashMap<ElementId, StoredEdge>,
    edge_order: Vec<ElementId>,
    out_edges: HashMap<ElementId, Vec<ElementId>>,
    in_edges: HashMap<ElementId, Vec<ElementId>>,
}

impl GraphState {
    fn execute(&mut self, steps: &[Step], input: Vec<Traverser>) -> Result<Vec<Traverser>, ExecutionFailure> {
        let mut current = input;
        for step in steps {
            current = self.apply(step, current)?;
        }
        Ok(current)
    }

    /// Start steps (`V`, `E`, merges) discard incoming traversers.
    fn apply(&mut self, step: &Step, input: Vec<Traverser>) -> Result<Vec<Traverser>, ExecutionFailure> {
        match step {
            Step::V { ids } if ids.is_empty() => {
                Ok(self.vertex_order.iter().cloned().map(Traverser::Vertex).collect())
            }
            Step::V { ids } => Ok(ids
                .iter()
                .filter(|id| self.vertices.contains_key(*id))
                .cloned()
                .map(Traverser::Vertex)
                .collect()),
            Step::E { ids } if ids.is_empty() => {
                Ok(self.edge_order.iter().cloned().map(Traverser::Edge).collect())
            }
            Step::E { ids } => Ok(ids
                .iter()
                .filter(|id| self.edges.contains_key(*id))
                .cloned()
                .map(Traverser::Edge)
                .collect()),
            Step::MergeV { label, search, on_create, id, fail_on_match } => {
                let matched = self.vertex_order.iter().find(|candidate| {
                    self.vertices
                        .get(*candidate)
                        .is_some_and(|v| v.label == *label && contains_all(&v.properties, search))
                }).cloned();
                match (matched, fail_on_match) {
                    (Some(_), Some(message)) => Err(ExecutionFailure::FailStep { message: message.clone() }),
                    (Some(existing), None) => Ok(vec![Traverser::Vertex(existing)]),
                    (None, _) => {
                        self.add_vertex(id, label, search, on_create)?;
                        Ok(vec![Traverser::Vertex(id.clone())])
                    }
                }
            }
            Step::MergeE { label, from, to, search, on_create, id, fail_on_match } => {
                for endpoint in [from, to] {
                    if !self.vertices.contains_key(endpoint) {
                        return Err(ExecutionFailure::Engine(format!("Vertex not found: {}", endpoint)));
                    }
                }
                let matched = self.out_edges.get(from).and_then(|edge_ids| {
                    edge_ids.iter().find(|edge_id| {
                        self.edges.get(*edge_id).is_some_and(|e| {
                            e.label == *label && e.in_vertex == *to && contains_all(&e.properties, search)
                        })
                    })
                }).cloned();
                match (matched, fail_on_match) {
                    (Some(_), Some(message)) => Err(ExecutionFailure::FailStep { message: message.clone() }),
                    (Some(existing), None) => Ok(vec![Traverser::Edge(existing)]),
                    (None, _) => {
                        self.add_edge(id, label, from, to, search, on_create)?;
                        Ok(vec![Traverser::Edge(id.clone())])
                    }
                }
            }
            Step::HasLabel { label } => Ok(input
                .into_iter()
                .filter(|t| self.label(t) == Some(label.as_str()))
                .collect()),
            Step::HasId { id } => Ok(input.into_iter().filter(|t| traverser_id(t) == id).collect()),
            Step::HasNotId { id } => Ok(input.into_iter().filter(|t| traverser_id(t) != id).collect()),
            Step::Has { key, predicate } => {
                let compiled = predicate.compile().map_err(|e| {
                    ExecutionFailure::Engine(format!("Invalid predicate on property {}: {}", key, e))
                })?;
                Ok(input
                    .into_iter()
                    .filter(|t| compiled.test(self.properties(t).and_then(|p| p.get(key))))
                    .collect())
            }
            Step::Where { probe } => {
                let mut kept = Vec::with_capacity(input.len());
                for traverser in input {
                    if !self.execute(&probe.steps, vec![traverser.clone()])?.is_empty() {
                        kept.push(traverser);
                    }
                }
                Ok(kept)
            }
            Step::FailIf { probe, message } => {
                for traverser in &input {
                    if !self.execute(&probe.steps, vec![traverser.clone()])?.is_empty() {
                        return Err(ExecutionFailure::FailStep { message: message.clone() });
                    }
                }
                Ok(input)
            }
            Step::Edges { direction, label } => {
                let mut edges = Vec::new();
                for traverser in input {
                    let Traverser::Vertex(vertex_id) = traverser else {
                        return Err(ExecutionFailure::Engine(format!(
                            "{}E() requires vertex traversers",
                            step_prefix(*direction)
                        )));
                    };
                    let adjacency = match direction {
                        Direction::Out => self.out_edges.get(&vertex_id),
                        Direction::In => self.in_edges.get(&vertex_id),
                    };
                    edges.extend(
                        adjacency
                            .into_iter()
                            .flatten()
                            .filter(|edge_id| match label {
                                Some(label) => self.edges.get(*edge_id).is_some_and(|e| e.label == *label),
                                None => true,
                            })
                            .cloned()
                            .map(Traverser::Edge),
                    );
                }
                Ok(edges)
            }
            Step::Vertex { direction } => input
                .into_iter()
                .map(|traverser| match traverser {
                    Traverser::Edge(edge_id) => self
                        .edges
                        .get(&edge_id)
                        .map(|edge| match direction {
                            Direction::In => Traverser::Vertex(edge.in_vertex.clone()),
                            Direction::Out => Traverser::Vertex(edge.out_vertex.clone()),
                        })
                        .ok_or_else(|| ExecutionFailure::Engine(format!("Edge not found: {}", edge_id))),
                    Traverser::Vertex(_) => Err(ExecutionFailure::Engine(format!(
                        "{}V() requires edge traversers",
                        step_prefix(*direction)
                    ))),
                })
                .collect(),
            Step::Property { key, value } => {
                if key == ID_KEY || key == LABEL_KEY {
                    return Err(ExecutionFailure::Engine(format!("Property {} is read-only", key)));
                }
                for traverser in &input {
                    if let Some(properties) = self.properties_mut(traverser) {
                        if value.is_null() {
                            properties.remove(key);
                        } else {
                            properties.insert(key.clone(), value.clone());
                        }
                    }
                }
                Ok(input)
            }
            Step::DropProperty { key } => {
                for traverser in &input {
                    if let Some(properties) = self.properties_mut(traverser) {
                        properties.remove(key);
                    }
                }
                Ok(input)
            }
            Step::ClearProperties { keep } => {
                for traverser in &input {
                    if let Some(properties) = self.properties_mut(traverser) {
                        properties.retain(|key, _| keep.contains(key));
                    }
                }
                Ok(input)
            }
            Step::Drop => {
                for traverser in input {
                    match traverser {
                        Traverser::Vertex(id) => self.remove_vertex(&id),
                        Traverser::Edge(id) => self.remove_edge(&id),
                    }
                }
                Ok(Vec::new())
            }
            Step::Range { low, high } => Ok(input
                .into_iter()
                .skip(*low)
                .take(high.saturating_sub(*low))
                .collect()),
        }
    }

    fn add_vertex(
        &mut self,
        id: &ElementId,
        label: &str,
        search: &PropertyMap,
        on_create: &PropertyMap,
    ) -> Result<(), ExecutionFailure> {
        if self.vertices.contains_key(id) {
            return Err(ExecutionFailure::Engine(format!("Vertex with id already exists: {}", id)));
        }
        let vertex = StoredVertex {
            label: label.to_string(),
            properties: initial_properties(search, on_create),
        };
        self.vertices.insert(id.clone(), vertex);
        self.vertex_order.push(id.clone());
        Ok(())
    }

    fn add_edge(
        &mut self,
        id: &ElementId,
        label: &str,
        from: &ElementId,
        to: &ElementId,
        search: &PropertyMap,
        on_create: &PropertyMap,
    ) -> Result<(), ExecutionFailure> {
        if self.edges.contains_key(id) {
            return Err(ExecutionFailure::Engine(format!("Edge with id already exists: {}", id)));
        }
        let edge = StoredEdge {
            label: label.to_string(),
            properties: initial_properties(search, on_create),
            out_vertex: from.clone(),
            in_vertex: to.clone(),
        };
        self.edges.insert(id.clone(), edge);
        self.edge_order.push(id.clone());
        self.out_edges.entry(from.clone()).or_default().push(id.clone());
        self.in_edges.entry(to.clone()).or_default().push(id.clone());
        Ok(())
    }

    fn remove_vertex(&mut self, id: &ElementId) {
        if self.vertices.remove(id).is_none() {
            return;
        }
        self.vertex_order.retain(|v| v != id);

        let incident: Vec<ElementId> = self
            .out_edges
            .remove(id)
            .into_iter()
            .chain(self.in_edges.remove(id))
            .flatten()
            .collect();
        for edge_id in incident {
            self.remove_edge(&edge_id);
        }
    }

    fn remove_edge(&mut self, id: &ElementId) {
        let Some(edge) = self.edges.remove(id) else {
            return;
        };
        self.edge_order.retain(|e| e != id);
        if let Some(ids) = self.out_edges.get_mut(&edge.out_vertex) {
            ids.retain(|e| e != id);
        }
        if let Some(ids) = self.in_edges.get_mut(&edge.in_vertex) {
            ids.retain(|e| e != id);
        }
    }

    fn label(&self, traverser: &Traverser) -> Option<&str> {
        match traverser {
            Traverser::Vertex(id) => self.vertices.get(id).map(|v| v.label.as_str()),
            Traverser::Edge(id) => self.edges.get(id).map(|e| e.label.as_str()),
        }
    }

    fn properties(&self, traverser: &Traverser) -> Option<&PropertyMap> {
        match traverser {
            Traverser::Vertex(id) => self.vertices.get(id).map(|v| &v.properties),
            Traverser::Edge(id) => self.edges.get(id).map(|e| &e.properties),
        }
    }

    fn properties_mut(&mut self, traverser: &Traverser) -> Option<&mut PropertyMap> {
        match traverser {
            Traverser::Vertex(id) => self.vertices.get_mut(id).map(|v| &mut v.properties),
            Traverser::Edge(id) => self.edges.get_mut(id).map(|e| &mut e.properties),
        }
    }

    fn anchor(&self, id: &ElementId) -> PropertyValue {
        let mut anchor = PropertyMap::new();
        anchor.insert(ID_KEY.to_string(), PropertyValue::from(id.as_str()));
        if let Some(vertex) = self.vertices.get(id) {
            anchor.insert(LABEL_KEY.to_string(), PropertyValue::from(vertex.label.as_str()));
        }
        PropertyValue::Map(anchor)
    }

    /// Element map of a traverser; `None` if the element was dropped.
    fn element_map(&self, traverser: &Traverser) -> Option<PropertyMap> {
        let (id, label, properties) = match traverser {
            Traverser::Vertex(id) => {
                let vertex = self.vertices.get(id)?;
                (id, &vertex.label, &vertex.properties)
            }
            Traverser::Edge(id) => {
                let edge = self.edges.get(id)?;
                (id, &edge.label, &edge.properties)
            }
        };

        let mut map = properties.clone();
        map.insert(ID_KEY.to_string(), PropertyValue::from(id.as_str()));
        map.insert(LABEL_KEY.to_string(), PropertyValue::from(label.as_str()));
        if let Traverser::Edge(edge_id) = traverser {
            if let Some(edge) = self.edges.get(edge_id) {
                map.insert(Direction::In.token().to_string(), self.anchor(&edge.in_vertex));
                map.insert(Direction::Out.token().to_string(), self.anchor(&edge.out_vertex));
            }
        }
        Some(map)
    }
}

/// Lower-case prefix of the directional step names (`outE`, `inV`).
fn step_prefix(direction: Direction) -> &'static str {
    match direction {
        Direction::In => "in",
        Direction::Out => "out",
    }
}

fn traverser_id(traverser: &Traverser) -> &ElementId {
    match traverser {
        Traverser::Vertex(id) | Traverser::Edge(id) => id,
    }
}

fn contains_all(properties: &PropertyMap, search: &PropertyMap) -> bool {
    search.iter().all(|(key, value)| properties.get(key) == Some(value))
}

/// Search and create properties of a new element; nulls are not stored.
fn initial_properties(search: &PropertyMap, on_create: &PropertyMap) -> PropertyMap {
    search
        .iter()
        .chain(on_create.iter())
        .filter(|(key, value)| !value.is_null() && key.as_str() != ID_KEY && key.as_str() != LABEL_KEY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// In-memory [`GraphStore`] executing traversals synchronously.
#[derive(Debug, Default)]
pub struct EmbeddedGraphStore {
    state: Mutex<GraphState>,
}

impl EmbeddedGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn run(&self, traversal: &Traversal) -> Result<Vec<PropertyMap>, ExecutionFailure> {
        let mut state = self.state.lock();
        let traversers = state.execute(&traversal.steps, Vec::new())?;
        Ok(traversers.iter().filter_map(|t| state.element_map(t)).collect())
    }
}

#[async_trait]
impl GraphStore for EmbeddedGraphStore {
    #[instrument(skip(self, traversal), fields(steps = traversal.steps.len()))]
    async fn submit(&self, traversal: &Traversal) -> Result<Vec<PropertyMap>, StoreError> {
        let results = self.run(traversal).map_err(conflict::translate)?;
        debug!(results = results.len(), "Traversal completed");
        Ok(results)
    }
}
