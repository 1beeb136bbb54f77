//! Static runtime metadata describing entities.
pub mod entity;
pub mod field;

pub use entity::{EntityModel, KeyCapability};
pub use field::{EntityFieldKind, EntityFieldModel};
