//! Request handling for cluster-wide cache invalidation.

mod cache_delete;
pub mod models;

pub use cache_delete::{ApiError, CacheDeleteCoordinator};
