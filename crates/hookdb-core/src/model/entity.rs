use crate::{model::field::EntityFieldModel, traits::HasIntKey};
use std::fmt;

///
/// EntityModel
/// Minimal, hand-declared runtime model for one entity.
///

pub struct EntityModel {
    /// Fully-qualified Rust type path (for dispatch and diagnostics).
    pub path: &'static str,
    /// Stable external name used for tables and plan rendering.
    pub entity_name: &'static str,
    /// Primary key field name (points at an entry in `fields`).
    pub primary_key: &'static str,
    /// Ordered field list; stored rows are validated against it.
    pub fields: &'static [EntityFieldModel],
    /// Integer-key capability declared by the entity type.
    pub key: KeyCapability,
}

impl EntityModel {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&EntityFieldModel> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Name of the integer identifier when the entity exposes one.
    #[must_use]
    pub const fn int_key_field(&self) -> Option<&'static str> {
        match self.key {
            KeyCapability::IntKey { field } => Some(field),
            KeyCapability::None => None,
        }
    }

    #[must_use]
    pub const fn has_int_key(&self) -> bool {
        matches!(self.key, KeyCapability::IntKey { .. })
    }
}

// Models are static singletons; identity is the type path.
impl PartialEq for EntityModel {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for EntityModel {}

impl fmt::Debug for EntityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityModel")
            .field("path", &self.path)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

///
/// KeyCapability
///
/// Whether an entity exposes a readable, unique integer identifier that can
/// break ordering ties. Entity models declare it through `KeyCapability::of`,
/// which only accepts types implementing `HasIntKey`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyCapability {
    IntKey { field: &'static str },
    None,
}

impl KeyCapability {
    #[must_use]
    pub const fn of<E: HasIntKey>() -> Self {
        Self::IntKey {
            field: E::KEY_FIELD,
        }
    }
}
