//! Query-plan tree: a closed set of immutable relational operators.
//!
//! Plans are built once per query, rewritten by interceptors, and then
//! evaluated. Nodes are never mutated in place; rewrites allocate new nodes.
mod explain;
mod selector;

pub use selector::{KeySelector, SelectorExpr};

use crate::{db::query::predicate::Predicate, model::EntityModel};
use thiserror::Error as ThisError;

///
/// QueryPlan
///
/// One relational operator and its operand sub-tree.
///
/// `OrderBy` starts a new ordering (the primary sort); `ThenBy` appends a
/// tie-breaking key to the ordering established by its source chain.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueryPlan {
    Scan {
        entity: &'static EntityModel,
    },
    Filter {
        source: Box<Self>,
        predicate: Predicate,
    },
    Project {
        source: Box<Self>,
        fields: Vec<String>,
    },
    OrderBy {
        source: Box<Self>,
        key: KeySelector,
        direction: OrderDirection,
    },
    ThenBy {
        source: Box<Self>,
        key: KeySelector,
        direction: OrderDirection,
    },
    Skip {
        source: Box<Self>,
        count: u32,
    },
    Take {
        source: Box<Self>,
        count: u32,
    },
}

impl QueryPlan {
    #[must_use]
    pub const fn scan(entity: &'static EntityModel) -> Self {
        Self::Scan { entity }
    }

    #[must_use]
    pub fn filter(self, predicate: Predicate) -> Self {
        Self::Filter {
            source: Box::new(self),
            predicate,
        }
    }

    #[must_use]
    pub fn project(self, fields: Vec<String>) -> Self {
        Self::Project {
            source: Box::new(self),
            fields,
        }
    }

    #[must_use]
    pub fn order_by(self, key: KeySelector, direction: OrderDirection) -> Self {
        Self::OrderBy {
            source: Box::new(self),
            key,
            direction,
        }
    }

    #[must_use]
    pub fn then_by(self, key: KeySelector, direction: OrderDirection) -> Self {
        Self::ThenBy {
            source: Box::new(self),
            key,
            direction,
        }
    }

    #[must_use]
    pub fn skip(self, count: u32) -> Self {
        Self::Skip {
            source: Box::new(self),
            count,
        }
    }

    #[must_use]
    pub fn take(self, count: u32) -> Self {
        Self::Take {
            source: Box::new(self),
            count,
        }
    }

    /// Operand sub-tree, if the operator has one.
    #[must_use]
    pub fn source(&self) -> Option<&Self> {
        match self {
            Self::Scan { .. } => None,
            Self::Filter { source, .. }
            | Self::Project { source, .. }
            | Self::OrderBy { source, .. }
            | Self::ThenBy { source, .. }
            | Self::Skip { source, .. }
            | Self::Take { source, .. } => Some(source),
        }
    }

    /// Element type of the sequence this node produces.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Scan { entity } => ElementType::Entity(*entity),
            Self::Project { .. } => ElementType::Projection,
            Self::Filter { source, .. }
            | Self::OrderBy { source, .. }
            | Self::ThenBy { source, .. }
            | Self::Skip { source, .. }
            | Self::Take { source, .. } => source.element_type(),
        }
    }

    /// Number of operators in the tree.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.source().map_or(0, Self::depth)
    }

    #[must_use]
    pub const fn kind(&self) -> OperatorKind {
        match self {
            Self::Scan { .. } => OperatorKind::Scan,
            Self::Filter { .. } => OperatorKind::Filter,
            Self::Project { .. } => OperatorKind::Project,
            Self::OrderBy { .. } => OperatorKind::OrderBy,
            Self::ThenBy { .. } => OperatorKind::ThenBy,
            Self::Skip { .. } => OperatorKind::Skip,
            Self::Take { .. } => OperatorKind::Take,
        }
    }
}

///
/// OperatorKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperatorKind {
    Scan,
    Filter,
    Project,
    OrderBy,
    ThenBy,
    Skip,
    Take,
}

///
/// ElementType
///
/// What a plan node yields: whole entities of one model, or projected rows
/// that no longer carry entity capabilities.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ElementType {
    Entity(&'static EntityModel),
    Projection,
}

impl ElementType {
    #[must_use]
    pub const fn entity(self) -> Option<&'static EntityModel> {
        match self {
            Self::Entity(model) => Some(model),
            Self::Projection => None,
        }
    }
}

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

///
/// PlanError
///
/// Structural failures of a plan tree. These are never transient.
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum PlanError {
    #[error("malformed query plan: {reason}")]
    Malformed { reason: String },
}

impl PlanError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}
