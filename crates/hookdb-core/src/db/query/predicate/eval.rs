use crate::{
    db::query::predicate::{CompareOp, Predicate},
    value::{Row, Value, strict_order_cmp},
};
use std::cmp::Ordering;

/// Evaluate a predicate against one row.
///
/// Comparisons involving null or mismatched variants are false, except `Ne`
/// between two differing non-null values.
#[must_use]
pub fn eval(row: &Row, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::True => true,
        Predicate::Compare { field, op, value } => eval_compare(row.get(field), *op, value),
        Predicate::IsNull(field) => row.get(field).is_null(),
        Predicate::And(clauses) => clauses.iter().all(|clause| eval(row, clause)),
        Predicate::Or(clauses) => clauses.iter().any(|clause| eval(row, clause)),
        Predicate::Not(inner) => !eval(row, inner),
    }
}

fn eval_compare(actual: &Value, op: CompareOp, expected: &Value) -> bool {
    if actual.is_null() || expected.is_null() {
        return false;
    }

    let Some(ordering) = strict_order_cmp(actual, expected) else {
        return matches!(op, CompareOp::Ne);
    };

    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Lte => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Gte => ordering != Ordering::Less,
    }
}
