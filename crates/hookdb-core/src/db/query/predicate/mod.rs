//! Filter predicates and their row evaluation.
mod eval;

pub use eval::eval;

use crate::value::Value;
use std::{
    fmt,
    ops::{BitAnd, BitOr, Not},
};

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

///
/// Predicate
///
/// Schema-agnostic boolean expression over one row.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Predicate {
    True,
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    IsNull(String),
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
}

impl Predicate {
    #[must_use]
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    #[must_use]
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    #[must_use]
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    #[must_use]
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    #[must_use]
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::IsNull(field.into())
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match self {
            Self::And(mut clauses) => {
                clauses.push(rhs);
                Self::And(clauses)
            }
            lhs => Self::And(vec![lhs, rhs]),
        }
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match self {
            Self::Or(mut clauses) => {
                clauses.push(rhs);
                Self::Or(clauses)
            }
            lhs => Self::Or(vec![lhs, rhs]),
        }
    }
}

impl Not for Predicate {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, clauses: &[Predicate], sep: &str) -> fmt::Result {
            write!(f, "(")?;
            for (i, clause) in clauses.iter().enumerate() {
                if i > 0 {
                    write!(f, " {sep} ")?;
                }
                write!(f, "{clause}")?;
            }
            write!(f, ")")
        }

        match self {
            Self::True => write!(f, "true"),
            Self::Compare { field, op, value } => {
                write!(f, "e.{field} {} {value}", op.symbol())
            }
            Self::IsNull(field) => write!(f, "e.{field} == null"),
            Self::And(clauses) => join(f, clauses, "&&"),
            Self::Or(clauses) => join(f, clauses, "||"),
            Self::Not(inner) => write!(f, "!{inner}"),
        }
    }
}
