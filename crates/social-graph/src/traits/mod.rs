//! Core traits (interfaces) of the social graph layer

pub mod graph_store;

pub use graph_store::GraphStore;
