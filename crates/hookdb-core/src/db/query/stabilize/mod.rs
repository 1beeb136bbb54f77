//! Deterministic-ordering rewrite for query plans.
//!
//! Appends a `ThenBy(e => e.<int key>)` tie-break directly after every
//! primary sort whose element type exposes an integer key, so that paging
//! over a partially ordered sequence is reproducible.
//!
//! Invariants:
//! - The rewrite is purely structural; it never touches data or the store.
//! - The input tree is never mutated; a new tree is returned.
//! - The tie-break is the first `ThenBy` after the primary sort. Existing
//!   secondary sorts keep their relative order after it.
//! - Only primary sorts are targeted. A `ThenBy` chain without an `OrderBy`
//!   root is left as it is.
//! - Re-stabilizing a stabilized plan returns an identical plan.
#[cfg(test)]
mod tests;

use crate::{
    db::query::plan::{
        ElementType, KeySelector, OrderDirection, PlanError, QueryPlan, SelectorExpr,
    },
    model::EntityModel,
};
use tracing::debug;

/// Rewrite `plan` so that every stabilizable primary sort has a key tie-break.
pub fn stabilize(plan: &QueryPlan) -> Result<QueryPlan, PlanError> {
    let mut stabilizer = Stabilizer::default();
    let rewritten = stabilizer.rewrite(plan)?;

    debug!(
        stabilized = stabilizer.stabilized,
        skipped = stabilizer.skipped,
        plan = %rewritten,
        "ordering stabilization complete"
    );

    Ok(rewritten)
}

///
/// SkipReason
/// Why a primary sort was passed through without a tie-break.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipReason {
    /// The sorted element type has no integer key.
    NoIntKey,
    /// The primary key selector is not a single property access.
    UnsupportedSelector,
    /// The tie-break is already the first secondary sort.
    AlreadyStabilized,
}

/// Decide whether a primary sort over `element` with `key` gets a tie-break.
///
/// Returns the entity model and the key field that breaks ties, or the
/// reason the sort is skipped.
pub fn tie_break_target(
    element: ElementType,
    key: &KeySelector,
) -> Result<(&'static EntityModel, &'static str), SkipReason> {
    let Some(target) = element
        .entity()
        .and_then(|entity| entity.int_key_field().map(|field| (entity, field)))
    else {
        return Err(SkipReason::NoIntKey);
    };
    if key.single_property().is_none() {
        return Err(SkipReason::UnsupportedSelector);
    }

    Ok(target)
}

///
/// Stabilizer
/// Per-call rewrite state; counts only feed diagnostics.
///

#[derive(Default)]
struct Stabilizer {
    stabilized: usize,
    skipped: usize,
}

impl Stabilizer {
    fn rewrite(&mut self, node: &QueryPlan) -> Result<QueryPlan, PlanError> {
        match node {
            QueryPlan::Scan { entity } => Ok(QueryPlan::scan(*entity)),

            QueryPlan::Filter { source, predicate } => {
                Ok(self.rewrite(source)?.filter(predicate.clone()))
            }

            QueryPlan::Project { source, fields } => {
                if fields.is_empty() {
                    return Err(PlanError::malformed("projection selects no fields"));
                }

                Ok(self.rewrite(source)?.project(fields.clone()))
            }

            QueryPlan::OrderBy {
                source,
                key,
                direction,
            } => {
                let ordered = self.rewrite_primary(source, key, *direction)?;

                match tie_break_target(source.element_type(), key) {
                    Ok((entity, field)) => Ok(self.append_tie_break(ordered, entity, field)),
                    Err(reason) => {
                        self.skip(reason, key);
                        Ok(ordered)
                    }
                }
            }

            QueryPlan::ThenBy {
                source,
                key,
                direction,
            } => {
                check_selector_binding("ThenBy", source, key)?;

                // A key tie-break sitting directly on a primary sort means the
                // primary sort is already stabilized; do not stack another.
                if let QueryPlan::OrderBy {
                    source: inner,
                    key: primary,
                    direction: primary_direction,
                } = source.as_ref()
                    && is_key_tie_break(inner.element_type(), key, *direction)
                {
                    self.skip(SkipReason::AlreadyStabilized, primary);
                    let ordered = self.rewrite_primary(inner, primary, *primary_direction)?;

                    return Ok(ordered.then_by(key.clone(), *direction));
                }

                Ok(self.rewrite(source)?.then_by(key.clone(), *direction))
            }

            QueryPlan::Skip { source, count } => Ok(self.rewrite(source)?.skip(*count)),

            QueryPlan::Take { source, count } => Ok(self.rewrite(source)?.take(*count)),
        }
    }

    // Rebuild a primary sort over its rewritten source, without a tie-break.
    fn rewrite_primary(
        &mut self,
        source: &QueryPlan,
        key: &KeySelector,
        direction: OrderDirection,
    ) -> Result<QueryPlan, PlanError> {
        check_selector_binding("OrderBy", source, key)?;

        Ok(self.rewrite(source)?.order_by(key.clone(), direction))
    }

    fn append_tie_break(
        &mut self,
        ordered: QueryPlan,
        entity: &'static EntityModel,
        field: &'static str,
    ) -> QueryPlan {
        self.stabilized += 1;
        debug!(
            entity = entity.entity_name,
            key = field,
            "appending key tie-break to primary sort"
        );

        ordered.then_by(KeySelector::field(entity, field), OrderDirection::Asc)
    }

    fn skip(&mut self, reason: SkipReason, key: &KeySelector) {
        self.skipped += 1;
        debug!(?reason, selector = %key, "primary sort left without key tie-break");
    }
}

// The selector must be bound to the element type its source produces.
fn check_selector_binding(
    operator: &str,
    source: &QueryPlan,
    key: &KeySelector,
) -> Result<(), PlanError> {
    let element = source.element_type();
    if key.parameter == element {
        return Ok(());
    }

    Err(PlanError::malformed(format!(
        "{operator} key selector is bound to {} but its source yields {element}",
        key.parameter
    )))
}

// True when `key` is exactly the tie-break this module would synthesize.
fn is_key_tie_break(element: ElementType, key: &KeySelector, direction: OrderDirection) -> bool {
    let Some(field) = element.entity().and_then(EntityModel::int_key_field) else {
        return false;
    };

    direction == OrderDirection::Asc
        && matches!(&key.body, SelectorExpr::Field(name) | SelectorExpr::Property(name) if name == field)
}
