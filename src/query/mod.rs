//! Query Module - join plans and plan composition

pub mod composer;
pub mod plan;

pub use composer::*;
pub use plan::*;
