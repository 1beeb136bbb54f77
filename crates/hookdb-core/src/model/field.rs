use std::fmt;

///
/// EntityFieldModel
/// Runtime field metadata used by selector checks and row validation.
///

#[derive(Debug, Eq, PartialEq)]
pub struct EntityFieldModel {
    /// Field name as used in rows, predicates, and key selectors.
    pub name: &'static str,
    /// Runtime type shape; stored values must match it.
    pub kind: EntityFieldKind,
    /// Whether the stored value may be `Value::Null`.
    pub nullable: bool,
}

impl EntityFieldModel {
    #[must_use]
    pub const fn new(name: &'static str, kind: EntityFieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
        }
    }

    #[must_use]
    pub const fn nullable(name: &'static str, kind: EntityFieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
        }
    }
}

///
/// EntityFieldKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntityFieldKind {
    Bool,
    Int,
    Text,
}

impl fmt::Display for EntityFieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Text => "text",
        };

        write!(f, "{label}")
    }
}
