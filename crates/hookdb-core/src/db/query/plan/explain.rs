use crate::db::query::plan::{ElementType, KeySelector, OrderDirection, QueryPlan, SelectorExpr};
use std::fmt;

// Renders plans as a method chain, e.g.
// `Customer.OrderBy(e => e["city"]).ThenBy(e => e.id).Take(20)`.

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan { entity } => write!(f, "{}", entity.entity_name),
            Self::Filter { source, predicate } => write!(f, "{source}.Where({predicate})"),
            Self::Project { source, fields } => {
                write!(f, "{source}.Select({})", fields.join(", "))
            }
            Self::OrderBy {
                source,
                key,
                direction,
            } => {
                let op = match direction {
                    OrderDirection::Asc => "OrderBy",
                    OrderDirection::Desc => "OrderByDescending",
                };
                write!(f, "{source}.{op}({key})")
            }
            Self::ThenBy {
                source,
                key,
                direction,
            } => {
                let op = match direction {
                    OrderDirection::Asc => "ThenBy",
                    OrderDirection::Desc => "ThenByDescending",
                };
                write!(f, "{source}.{op}({key})")
            }
            Self::Skip { source, count } => write!(f, "{source}.Skip({count})"),
            Self::Take { source, count } => write!(f, "{source}.Take({count})"),
        }
    }
}

impl fmt::Display for KeySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e => {}", self.body)
    }
}

impl fmt::Display for SelectorExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "e.{name}"),
            Self::Property(name) => write!(f, "e[{name:?}]"),
            Self::Lower(inner) => write!(f, "lower({inner})"),
            Self::Coalesce(inner, fallback) => write!(f, "({inner} ?? {fallback})"),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(model) => write!(f, "{}", model.entity_name),
            Self::Projection => write!(f, "<projection>"),
        }
    }
}
