//! Query plans, their evaluation, and the unit-of-work session.
pub mod executor;
pub mod query;
pub mod session;
pub mod store;

pub use session::{ContextOptions, EntryState, Session};
pub use store::Database;
