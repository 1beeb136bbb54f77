use crate::{db::query::plan::ElementType, model::EntityModel, value::Value};

///
/// KeySelector
///
/// Single-parameter lambda used by sort operators: `parameter => body`.
/// `parameter` is the element type the lambda was bound to when built.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeySelector {
    pub parameter: ElementType,
    pub body: SelectorExpr,
}

impl KeySelector {
    #[must_use]
    pub const fn new(parameter: ElementType, body: SelectorExpr) -> Self {
        Self { parameter, body }
    }

    /// `e => e.field` over an entity.
    #[must_use]
    pub fn field(entity: &'static EntityModel, field: impl Into<String>) -> Self {
        Self::new(ElementType::Entity(entity), SelectorExpr::Field(field.into()))
    }

    /// `e => e[name]`, where the property is chosen at runtime.
    #[must_use]
    pub fn property(entity: &'static EntityModel, name: impl Into<String>) -> Self {
        Self::new(
            ElementType::Entity(entity),
            SelectorExpr::Property(name.into()),
        )
    }

    /// The accessed property, if the body is a single property access.
    #[must_use]
    pub fn single_property(&self) -> Option<&str> {
        match &self.body {
            SelectorExpr::Field(name) | SelectorExpr::Property(name) => Some(name),
            SelectorExpr::Lower(_) | SelectorExpr::Coalesce(..) => None,
        }
    }
}

///
/// SelectorExpr
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SelectorExpr {
    /// Statically named member access.
    Field(String),
    /// Dynamically named property access.
    Property(String),
    /// Lower-cased text of the inner expression.
    Lower(Box<Self>),
    /// Inner expression, or the fallback when it is null.
    Coalesce(Box<Self>, Value),
}
