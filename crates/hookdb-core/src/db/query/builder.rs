use crate::{
    db::query::{
        plan::{KeySelector, OrderDirection, QueryPlan},
        predicate::Predicate,
    },
    traits::EntityKind,
};
use std::marker::PhantomData;

///
/// Query
///
/// Typed fluent builder over one entity's table. Every call appends one
/// operator on top of the plan built so far.
///

#[derive(Clone, Debug)]
pub struct Query<E: EntityKind> {
    plan: QueryPlan,
    _marker: PhantomData<E>,
}

impl<E: EntityKind> Query<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            plan: QueryPlan::scan(E::MODEL),
            _marker: PhantomData,
        }
    }

    fn wrap(self, f: impl FnOnce(QueryPlan) -> QueryPlan) -> Self {
        Self {
            plan: f(self.plan),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn filter(self, predicate: Predicate) -> Self {
        self.wrap(|plan| plan.filter(predicate))
    }

    #[must_use]
    pub fn order_by(self, field: &str) -> Self {
        self.wrap(|plan| plan.order_by(KeySelector::field(E::MODEL, field), OrderDirection::Asc))
    }

    #[must_use]
    pub fn order_by_desc(self, field: &str) -> Self {
        self.wrap(|plan| plan.order_by(KeySelector::field(E::MODEL, field), OrderDirection::Desc))
    }

    /// Order by a property whose name is only known at runtime.
    #[must_use]
    pub fn order_by_property(self, name: &str) -> Self {
        self.wrap(|plan| {
            plan.order_by(KeySelector::property(E::MODEL, name), OrderDirection::Asc)
        })
    }

    #[must_use]
    pub fn then_by(self, field: &str) -> Self {
        self.wrap(|plan| plan.then_by(KeySelector::field(E::MODEL, field), OrderDirection::Asc))
    }

    #[must_use]
    pub fn then_by_desc(self, field: &str) -> Self {
        self.wrap(|plan| plan.then_by(KeySelector::field(E::MODEL, field), OrderDirection::Desc))
    }

    #[must_use]
    pub fn skip(self, count: u32) -> Self {
        self.wrap(|plan| plan.skip(count))
    }

    #[must_use]
    pub fn take(self, count: u32) -> Self {
        self.wrap(|plan| plan.take(count))
    }

    /// Zero-based page of `size` rows.
    #[must_use]
    pub fn page(self, page: u32, size: u32) -> Self {
        self.skip(page.saturating_mul(size)).take(size)
    }

    /// Project onto a subset of fields; the result no longer yields entities.
    #[must_use]
    pub fn select(self, fields: &[&str]) -> QueryPlan {
        self.plan
            .project(fields.iter().map(ToString::to_string).collect())
    }

    #[must_use]
    pub const fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    #[must_use]
    pub fn into_plan(self) -> QueryPlan {
        self.plan
    }
}

impl<E: EntityKind> Default for Query<E> {
    fn default() -> Self {
        Self::new()
    }
}
