#![allow(dead_code)]

use std::sync::Arc;

use social_graph::{
    ElementId, EmbeddedGraphStore, FollowRepository, GraphTraversalSource, PartitionStrategy, User,
    UserRepository,
};

/// Repositories sharing one fresh embedded store.
pub struct TestGraph {
    pub store: Arc<EmbeddedGraphStore>,
    pub g: GraphTraversalSource,
    pub users: UserRepository,
    pub follows: FollowRepository,
}

impl TestGraph {
    pub fn new() -> Self {
        Self::with_source(|store| GraphTraversalSource::new(store))
    }

    pub fn partitioned(name: &str) -> Self {
        let strategy = PartitionStrategy::new("_partition", name);
        Self::with_source(move |store| GraphTraversalSource::new(store).with_partition(strategy))
    }

    /// Another view of the same store, confined to partition `name`.
    pub fn partition_view(&self, name: &str) -> GraphTraversalSource {
        GraphTraversalSource::new(self.store.clone()).with_partition(PartitionStrategy::new("_partition", name))
    }

    fn with_source(build: impl FnOnce(Arc<EmbeddedGraphStore>) -> GraphTraversalSource) -> Self {
        let store = Arc::new(EmbeddedGraphStore::new());
        let g = build(store.clone());
        Self {
            users: UserRepository::new(g.clone()),
            follows: FollowRepository::new(g.clone()),
            store,
            g,
        }
    }

    pub async fn insert(&self, user: User) -> ElementId {
        self.users
            .insert_user(&user)
            .await
            .expect("insert user")
            .id
            .expect("inserted user id")
    }
}
