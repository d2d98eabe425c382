use tracing::{debug, info, instrument};

use super::{existing_edge_message, no_existing_edge_message, UserRepository};
use crate::codec::{flatten, unflatten, writable_properties, FOLLOW_EDGE_LABEL};
use crate::data::{
    Direction, ElementId, ExecutionFailure, FollowEdge, MappingError, PropertyMap, RepositoryError,
    RepositoryResult, StoreError, UserRef,
};
use crate::traversal::{GraphTraversalSource, Traversal};

/// Create, remove and list FOLLOW edges between users.
#[derive(Debug, Clone)]
pub struct FollowRepository {
    g: GraphTraversalSource,
    users: UserRepository,
}

impl FollowRepository {
    pub fn new(g: GraphTraversalSource) -> Self {
        let users = UserRepository::new(g.clone());
        Self { g, users }
    }

    /// Edges incident to `user_id` in `direction` (`In` for followers, `Out`
    /// for following), each with its opposite endpoint loaded.
    #[instrument(skip(self), fields(user_id = %user_id, direction = %direction))]
    pub async fn list_follow_edges(
        &self,
        user_id: &ElementId,
        direction: Direction,
    ) -> RepositoryResult<Vec<FollowEdge>> {
        self.users.find_vertex(user_id).await?;

        let rows = self
            .g
            .to_list(Traversal::v_id(user_id).edges(direction, FOLLOW_EDGE_LABEL))
            .await?;
        debug!(rows = rows.len(), "Resolving follow edge endpoints");

        let opposite = direction.opposite();
        let mut edges = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut edge: FollowEdge = unflatten(row)?;
            let endpoint = endpoint_mut(&mut edge, opposite);
            let endpoint_id = endpoint
                .as_ref()
                .and_then(UserRef::id)
                .cloned()
                .ok_or_else(|| MappingError::MissingField(opposite.token().to_string()))?;
            let user = self.users.get_user_by_id(&endpoint_id).await?;
            *endpoint = Some(UserRef::Loaded(user));
            edges.push(edge);
        }
        Ok(edges)
    }

    /// Creates the FOLLOW edge `from -> to`, failing with `Conflict` if one
    /// already exists for that ordered pair.
    #[instrument(skip(self, edge), fields(from = %from, to = %to))]
    pub async fn create_follow_edge(
        &self,
        from: &ElementId,
        to: &ElementId,
        edge: &FollowEdge,
    ) -> RepositoryResult<FollowEdge> {
        let source = self.users.get_user_by_id(from).await?;
        let target = self.users.get_user_by_id(to).await?;

        let on_create: PropertyMap = writable_properties(flatten(edge))
            .filter(|(_, value)| !value.is_null())
            .collect();
        let traversal = Traversal::merge_e(FOLLOW_EDGE_LABEL, from, to, on_create)
            .fail_on_match(existing_edge_message(from, to));
        let row = match self.g.try_next(traversal).await {
            Ok(row) => row,
            // an endpoint removed after it was loaded fails the merge
            Err(StoreError::Execution(failure)) => {
                self.users.find_vertex(from).await?;
                self.users.find_vertex(to).await?;
                return Err(RepositoryError::StoreExecution(failure));
            }
            Err(other) => return Err(other.into()),
        }
        .ok_or_else(|| {
            RepositoryError::StoreExecution(ExecutionFailure::Engine(
                "merge step returned no element".to_string(),
            ))
        })?;

        let mut created: FollowEdge = unflatten(&row)?;
        created.target = Some(UserRef::Loaded(target));
        created.source = Some(UserRef::Loaded(source));
        info!(edge_id = ?created.id, "Follow edge created");
        Ok(created)
    }

    /// Removes the FOLLOW edge `from -> to`, failing with `Conflict` if there
    /// is none.
    #[instrument(skip(self), fields(from = %from, to = %to))]
    pub async fn remove_follow_edge(&self, from: &ElementId, to: &ElementId) -> RepositoryResult<()> {
        self.users.find_vertex(from).await?;
        self.users.find_vertex(to).await?;

        if !self.edge_exists(from, to).await? {
            return Err(RepositoryError::Conflict(no_existing_edge_message(from, to)));
        }

        self.g
            .iterate(
                Traversal::v_id(from)
                    .out_e(FOLLOW_EDGE_LABEL)
                    .where_(Traversal::anonymous().in_v().has_id(to))
                    .drop(),
            )
            .await?;
        info!("Follow edge removed");
        Ok(())
    }

    /// Whether a FOLLOW edge leads from `from` to `to`. Walks only the
    /// outgoing edges of `from`.
    pub async fn edge_exists(&self, from: &ElementId, to: &ElementId) -> RepositoryResult<bool> {
        Ok(self
            .g
            .has_next(Traversal::v_id(from).out_e(FOLLOW_EDGE_LABEL).in_v().has_id(to))
            .await?)
    }
}

fn endpoint_mut(edge: &mut FollowEdge, direction: Direction) -> &mut Option<UserRef> {
    match direction {
        Direction::In => &mut edge.target,
        Direction::Out => &mut edge.source,
    }
}

#[cfg(all(test, feature = "mocks"))]
mod tests {
    use super::*;
    use crate::data::PropertyValue;
    use crate::test_utils::{follow_row, user_row, MockGraphStore};
    use crate::traversal::Step;
    use std::sync::Arc;

    fn repository(store: MockGraphStore) -> FollowRepository {
        FollowRepository::new(GraphTraversalSource::new(Arc::new(store)))
    }

    fn is_lookup(traversal: &Traversal) -> bool {
        traversal.steps.len() == 2 && matches!(traversal.steps[1], Step::HasLabel { .. })
    }

    #[tokio::test]
    async fn test_edge_exists_walks_outgoing_edges_only() {
        let mut store = MockGraphStore::new();
        store
            .expect_submit()
            .withf(|traversal| {
                traversal.steps
                    == vec![
                        Step::V { ids: vec![ElementId::from("a")] },
                        Step::Edges { direction: Direction::Out, label: Some("FOLLOW".into()) },
                        Step::Vertex { direction: Direction::In },
                        Step::HasId { id: ElementId::from("b") },
                        Step::Range { low: 0, high: 1 },
                    ]
            })
            .times(1)
            .returning(|_| Ok(vec![]));

        let exists = repository(store)
            .edge_exists(&ElementId::from("a"), &ElementId::from("b"))
            .await
            .unwrap();
        assert!(!exists);
    }

    #[tokio::test]
    async fn test_remove_missing_edge_is_conflict() {
        let mut store = MockGraphStore::new();
        store
            .expect_submit()
            .withf(is_lookup)
            .times(2)
            .returning(|traversal| match &traversal.steps[0] {
                Step::V { ids } => Ok(vec![user_row(ids[0].as_str(), "@user")]),
                _ => Ok(vec![]),
            });
        store
            .expect_submit()
            .withf(|traversal| matches!(traversal.steps.last(), Some(Step::Range { .. })))
            .times(1)
            .returning(|_| Ok(vec![]));

        let result = repository(store)
            .remove_follow_edge(&ElementId::from("a"), &ElementId::from("b"))
            .await;
        match result {
            Err(RepositoryError::Conflict(message)) => {
                assert_eq!(message, "No existing edge found from user id: a to user id: b")
            }
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_edge_uses_fail_on_match_merge() {
        let mut store = MockGraphStore::new();
        store
            .expect_submit()
            .withf(is_lookup)
            .times(2)
            .returning(|traversal| match &traversal.steps[0] {
                Step::V { ids } => Ok(vec![user_row(ids[0].as_str(), "@user")]),
                _ => Ok(vec![]),
            });
        store
            .expect_submit()
            .withf(|traversal| match traversal.steps.as_slice() {
                [Step::MergeE { label, from, to, on_create, fail_on_match, .. }] => {
                    label == "FOLLOW"
                        && from.as_str() == "a"
                        && to.as_str() == "b"
                        && on_create.get("status") == Some(&PropertyValue::from("ACTIVE"))
                        && fail_on_match.as_deref()
                            == Some("Existing edge found from user id: a to user id: b")
                }
                _ => false,
            })
            .times(1)
            .returning(|_| Ok(vec![follow_row("e-1", "a", "b")]));

        let created = repository(store)
            .create_follow_edge(&ElementId::from("a"), &ElementId::from("b"), &FollowEdge::with_status("ACTIVE"))
            .await
            .unwrap();
        assert_eq!(created.id, Some(ElementId::from("e-1")));
        assert_eq!(created.source.as_ref().and_then(UserRef::as_user).map(|u| u.id.clone()), Some(Some(ElementId::from("a"))));
        assert_eq!(created.target.as_ref().and_then(UserRef::id), Some(&ElementId::from("b")));
    }

    #[tokio::test]
    async fn test_create_edge_with_endpoint_removed_before_merge_is_not_found() {
        let mut store = MockGraphStore::new();
        let mut lookups = 0;
        store
            .expect_submit()
            .withf(is_lookup)
            .times(4)
            .returning(move |traversal| {
                lookups += 1;
                match &traversal.steps[0] {
                    // "b" is gone by the time the failed merge is diagnosed
                    Step::V { ids } if lookups < 4 => Ok(vec![user_row(ids[0].as_str(), "@user")]),
                    _ => Ok(vec![]),
                }
            });
        store
            .expect_submit()
            .withf(|traversal| matches!(traversal.steps.as_slice(), [Step::MergeE { .. }]))
            .times(1)
            .returning(|_| {
                Err(StoreError::Execution(ExecutionFailure::Engine("Vertex not found: b".into())))
            });

        let result = repository(store)
            .create_follow_edge(&ElementId::from("a"), &ElementId::from("b"), &FollowEdge::with_status("ACTIVE"))
            .await;
        match result {
            Err(RepositoryError::NotFound(message)) => assert_eq!(message, "User not found by id: b"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_edge_engine_failure_with_endpoints_present_propagates() {
        let mut store = MockGraphStore::new();
        store
            .expect_submit()
            .withf(is_lookup)
            .times(4)
            .returning(|traversal| match &traversal.steps[0] {
                Step::V { ids } => Ok(vec![user_row(ids[0].as_str(), "@user")]),
                _ => Ok(vec![]),
            });
        store
            .expect_submit()
            .withf(|traversal| matches!(traversal.steps.as_slice(), [Step::MergeE { .. }]))
            .times(1)
            .returning(|_| Err(StoreError::Execution(ExecutionFailure::Engine("disk full".into()))));

        let result = repository(store)
            .create_follow_edge(&ElementId::from("a"), &ElementId::from("b"), &FollowEdge::default())
            .await;
        assert!(matches!(
            result,
            Err(RepositoryError::StoreExecution(ExecutionFailure::Engine(message))) if message == "disk full"
        ));
    }

    #[tokio::test]
    async fn test_list_incoming_edges_resolves_sources() {
        let mut store = MockGraphStore::new();
        store
            .expect_submit()
            .withf(|traversal| {
                traversal.steps.get(1)
                    == Some(&Step::Edges { direction: Direction::In, label: Some("FOLLOW".into()) })
            })
            .times(1)
            .returning(|_| Ok(vec![follow_row("e-1", "follower", "me")]));
        store
            .expect_submit()
            .returning(|traversal| match &traversal.steps[0] {
                Step::V { ids } => Ok(vec![user_row(ids[0].as_str(), &format!("@{}", ids[0]))]),
                _ => Ok(vec![]),
            });

        let edges = repository(store)
            .list_follow_edges(&ElementId::from("me"), Direction::In)
            .await
            .unwrap();
        assert_eq!(edges.len(), 1);
        let source = edges[0].source.as_ref().and_then(UserRef::as_user).unwrap();
        assert_eq!(source.username, "@follower");
        assert_eq!(edges[0].target, Some(UserRef::lazy("me")));
    }
}
