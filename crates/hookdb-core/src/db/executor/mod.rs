//! In-memory evaluation of query plans; must not plan or rewrite.
//!
//! Phases run in tree order: access (scan), filter, order, project, page.
//! A contiguous `OrderBy`/`ThenBy` chain is evaluated as one lexicographic
//! ordering with a stable sort.
#[cfg(test)]
mod tests;

use crate::{
    db::query::{
        plan::{ElementType, KeySelector, OrderDirection, QueryPlan, SelectorExpr},
        predicate,
    },
    error::InternalError,
    model::EntityModel,
    value::{Row, Value, order_cmp},
};
use std::cmp::Ordering;

///
/// RowSource
///
/// Access boundary: yields every stored row of one entity, in storage order.
///

pub trait RowSource {
    fn scan(&self, entity: &'static EntityModel) -> Result<Vec<Row>, InternalError>;
}

/// Evaluate `plan` against `source`.
pub fn execute(plan: &QueryPlan, source: &dyn RowSource) -> Result<Vec<Row>, InternalError> {
    match plan {
        QueryPlan::Scan { entity } => source.scan(*entity),

        QueryPlan::Filter { source: inner, predicate } => {
            let mut rows = execute(inner, source)?;
            rows.retain(|row| predicate::eval(row, predicate));

            Ok(rows)
        }

        QueryPlan::Project { source: inner, fields } => {
            let rows = execute(inner, source)?;

            Ok(rows.iter().map(|row| row.project(fields)).collect())
        }

        QueryPlan::OrderBy { .. } | QueryPlan::ThenBy { .. } => {
            let (root, keys) = collect_ordering(plan)?;
            let mut rows = execute(root, source)?;
            if rows.len() > 1 {
                apply_ordering(&mut rows, &keys);
            }

            Ok(rows)
        }

        QueryPlan::Skip { source: inner, count } => {
            let mut rows = execute(inner, source)?;
            apply_pagination(&mut rows, *count, None);

            Ok(rows)
        }

        QueryPlan::Take { source: inner, count } => {
            let mut rows = execute(inner, source)?;
            apply_pagination(&mut rows, 0, Some(*count));

            Ok(rows)
        }
    }
}

type OrderKeys<'a> = Vec<(&'a KeySelector, OrderDirection)>;

// Walk a ThenBy chain down to its OrderBy root.
// Returns the root's source and the sort keys in significance order.
fn collect_ordering(plan: &QueryPlan) -> Result<(&QueryPlan, OrderKeys<'_>), InternalError> {
    let mut keys = Vec::new();
    let mut node = plan;

    loop {
        match node {
            QueryPlan::ThenBy {
                source,
                key,
                direction,
            } => {
                check_selector(key)?;
                keys.push((key, *direction));
                node = source.as_ref();
            }
            QueryPlan::OrderBy {
                source,
                key,
                direction,
            } => {
                check_selector(key)?;
                keys.push((key, *direction));
                keys.reverse();

                return Ok((source.as_ref(), keys));
            }
            other => {
                return Err(InternalError::executor_invariant(format!(
                    "executor invariant violated: ThenBy requires an ordered source, found {:?}",
                    other.kind()
                )));
            }
        }
    }
}

// Member names must exist on the entity they address.
fn check_selector(key: &KeySelector) -> Result<(), InternalError> {
    fn check(expr: &SelectorExpr, model: &EntityModel) -> Result<(), InternalError> {
        match expr {
            SelectorExpr::Field(name) if model.field(name).is_none() => {
                Err(InternalError::query_invariant(format!(
                    "field '{name}' is not mapped on entity '{}'",
                    model.entity_name
                )))
            }
            SelectorExpr::Property(name) if model.field(name).is_none() => {
                Err(InternalError::query_invariant(format!(
                    "property '{name}' is not mapped on entity '{}'",
                    model.entity_name
                )))
            }
            SelectorExpr::Field(_) | SelectorExpr::Property(_) => Ok(()),
            SelectorExpr::Lower(inner) | SelectorExpr::Coalesce(inner, _) => check(inner, model),
        }
    }

    match key.parameter {
        ElementType::Entity(model) => check(&key.body, model),
        ElementType::Projection => Ok(()),
    }
}

/// Evaluate a key selector body against one row.
#[must_use]
pub fn eval_selector(expr: &SelectorExpr, row: &Row) -> Value {
    match expr {
        SelectorExpr::Field(name) | SelectorExpr::Property(name) => row.get(name).clone(),
        SelectorExpr::Lower(inner) => match eval_selector(inner, row) {
            Value::Text(text) => Value::Text(text.to_lowercase()),
            other => other,
        },
        SelectorExpr::Coalesce(inner, fallback) => match eval_selector(inner, row) {
            Value::Null => fallback.clone(),
            other => other,
        },
    }
}

// Sort rows lexicographically by the given keys.
fn apply_ordering(rows: &mut Vec<Row>, keys: &[(&KeySelector, OrderDirection)]) {
    // Phase 1: evaluate every key once per row.
    let mut decorated: Vec<(Vec<Value>, Row)> = rows
        .drain(..)
        .map(|row| {
            let values = keys
                .iter()
                .map(|(key, _)| eval_selector(&key.body, &row))
                .collect();
            (values, row)
        })
        .collect();

    // Phase 2: stable sort; rows equal under every key keep source order.
    decorated.sort_by(|(left, _), (right, _)| compare_keys(left, right, keys));

    // Phase 3: restore the ordered rows.
    rows.extend(decorated.into_iter().map(|(_, row)| row));
}

fn compare_keys(
    left: &[Value],
    right: &[Value],
    keys: &[(&KeySelector, OrderDirection)],
) -> Ordering {
    for ((left, right), (_, direction)) in left.iter().zip(right).zip(keys) {
        let ordering = match direction {
            OrderDirection::Asc => order_cmp(left, right),
            OrderDirection::Desc => order_cmp(left, right).reverse(),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

/// Apply offset/limit pagination to an in-memory vector, in-place.
///
/// - `offset` and `limit` are logical (u32) pagination parameters
/// - Conversion to `usize` happens only at the indexing boundary
pub fn apply_pagination<T>(rows: &mut Vec<T>, offset: u32, limit: Option<u32>) {
    let total = rows.len();
    let start = usize::try_from(offset).unwrap_or(usize::MAX);

    // If offset is past the end, clear everything
    if start >= total {
        rows.clear();
        return;
    }

    let end = match limit {
        Some(limit) => start
            .saturating_add(usize::try_from(limit).unwrap_or(usize::MAX))
            .min(total),
        None => total,
    };

    // Drop leading rows, then truncate to window size
    rows.drain(..start);
    rows.truncate(end - start);
}
