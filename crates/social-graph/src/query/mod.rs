//! Filter predicates and pagination windows for list queries

mod filter;
mod pagination;

pub use filter::{build_exact_filter, build_name_filter};
pub use pagination::{pagination_range, Pagination, DEFAULT_LIMIT, DEFAULT_PAGE};
