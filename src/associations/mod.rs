//! Associations Module - declarations, catalog, and result caching

pub mod cache;
pub mod catalog;
pub mod metadata;

pub use cache::*;
pub use catalog::*;
pub use metadata::*;
