//! mockall doubles of the store traits

use async_trait::async_trait;
use mockall::mock;

use crate::data::{PropertyMap, StoreError};
use crate::traits::GraphStore;
use crate::traversal::Traversal;

mock! {
    pub GraphStore {}

    #[async_trait]
    impl GraphStore for GraphStore {
        async fn submit(&self, traversal: &Traversal) -> Result<Vec<PropertyMap>, StoreError>;
    }
}
