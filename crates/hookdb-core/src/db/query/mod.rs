//! Query construction and plan rewriting.
mod builder;
pub mod plan;
pub mod predicate;
pub mod stabilize;

pub use builder::Query;
