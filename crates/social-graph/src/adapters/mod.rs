//! Graph store adapters

pub mod embedded;
pub mod remote_store;

pub use embedded::EmbeddedGraphStore;
pub use remote_store::{RemoteGraphStore, RemoteGraphStoreConfig};
