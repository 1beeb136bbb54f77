use super::*;
use crate::{
    db::query::predicate::Predicate,
    test_fixtures::{Country, Customer},
    traits::EntityKind,
};
use proptest::prelude::*;

fn customers() -> QueryPlan {
    QueryPlan::scan(Customer::MODEL)
}

fn by(field: &str) -> KeySelector {
    KeySelector::field(Customer::MODEL, field)
}

fn by_property(name: &str) -> KeySelector {
    KeySelector::property(Customer::MODEL, name)
}

fn id_tie_break() -> KeySelector {
    KeySelector::field(Customer::MODEL, "id")
}

#[test]
fn primary_sort_gains_id_tie_break() {
    let plan = customers()
        .order_by(by_property("city"), OrderDirection::Asc)
        .skip(0)
        .take(20);

    let stabilized = stabilize(&plan).expect("plan should stabilize");

    let expected = customers()
        .order_by(by_property("city"), OrderDirection::Asc)
        .then_by(id_tie_break(), OrderDirection::Asc)
        .skip(0)
        .take(20);
    assert_eq!(stabilized, expected);
}

#[test]
fn tie_break_precedes_existing_secondary_sorts() {
    let plan = customers()
        .order_by(by("city"), OrderDirection::Asc)
        .then_by(by("phone_number"), OrderDirection::Desc);

    let stabilized = stabilize(&plan).expect("plan should stabilize");

    let expected = customers()
        .order_by(by("city"), OrderDirection::Asc)
        .then_by(id_tie_break(), OrderDirection::Asc)
        .then_by(by("phone_number"), OrderDirection::Desc);
    assert_eq!(stabilized, expected);
}

#[test]
fn descending_primary_sort_gets_ascending_tie_break() {
    let plan = customers().order_by(by("name"), OrderDirection::Desc);

    let stabilized = stabilize(&plan).expect("plan should stabilize");

    assert_eq!(
        stabilized,
        customers()
            .order_by(by("name"), OrderDirection::Desc)
            .then_by(id_tie_break(), OrderDirection::Asc)
    );
}

#[test]
fn non_keyed_entity_passes_through_unchanged() {
    let plan = QueryPlan::scan(Country::MODEL)
        .order_by(KeySelector::field(Country::MODEL, "name"), OrderDirection::Asc)
        .take(5);

    let stabilized = stabilize(&plan).expect("plan should stabilize");

    assert_eq!(stabilized, plan);
}

#[test]
fn unsupported_selector_shape_passes_through_unchanged() {
    let lowered = KeySelector::new(
        ElementType::Entity(Customer::MODEL),
        SelectorExpr::Lower(Box::new(SelectorExpr::Field("name".to_string()))),
    );
    let plan = customers().order_by(lowered, OrderDirection::Asc);

    let stabilized = stabilize(&plan).expect("plan should stabilize");

    assert_eq!(stabilized, plan);
}

#[test]
fn sort_over_projection_is_not_stabilized() {
    let projected = customers().project(vec!["name".to_string(), "city".to_string()]);
    let key = KeySelector::new(ElementType::Projection, SelectorExpr::Field("city".into()));
    let plan = projected.order_by(key, OrderDirection::Asc);

    let stabilized = stabilize(&plan).expect("plan should stabilize");

    assert_eq!(stabilized, plan);
}

#[test]
fn then_by_chain_without_primary_sort_is_left_alone() {
    let plan = customers().then_by(by("city"), OrderDirection::Asc);

    let stabilized = stabilize(&plan).expect("plan should stabilize");

    assert_eq!(stabilized, plan);
}

#[test]
fn explicit_id_tie_break_is_not_duplicated() {
    let plan = customers()
        .order_by(by_property("city"), OrderDirection::Asc)
        .then_by(id_tie_break(), OrderDirection::Asc)
        .take(20);

    let stabilized = stabilize(&plan).expect("plan should stabilize");

    assert_eq!(stabilized, plan);
}

#[test]
fn descending_id_secondary_sort_still_gets_tie_break() {
    let plan = customers()
        .order_by(by("city"), OrderDirection::Asc)
        .then_by(id_tie_break(), OrderDirection::Desc);

    let stabilized = stabilize(&plan).expect("plan should stabilize");

    assert_eq!(
        stabilized,
        customers()
            .order_by(by("city"), OrderDirection::Asc)
            .then_by(id_tie_break(), OrderDirection::Asc)
            .then_by(id_tie_break(), OrderDirection::Desc)
    );
}

#[test]
fn every_primary_sort_in_the_tree_is_stabilized() {
    let plan = customers()
        .order_by(by("name"), OrderDirection::Asc)
        .take(3)
        .filter(Predicate::eq("city", "Ames"))
        .order_by(by("city"), OrderDirection::Asc);

    let stabilized = stabilize(&plan).expect("plan should stabilize");

    let expected = customers()
        .order_by(by("name"), OrderDirection::Asc)
        .then_by(id_tie_break(), OrderDirection::Asc)
        .take(3)
        .filter(Predicate::eq("city", "Ames"))
        .order_by(by("city"), OrderDirection::Asc)
        .then_by(id_tie_break(), OrderDirection::Asc);
    assert_eq!(stabilized, expected);
}

#[test]
fn selector_bound_to_other_entity_is_malformed() {
    let plan = customers().order_by(
        KeySelector::field(Country::MODEL, "name"),
        OrderDirection::Asc,
    );

    let err = stabilize(&plan).expect_err("mismatched selector should be rejected");

    assert!(matches!(err, PlanError::Malformed { .. }));
    assert!(err.to_string().contains("OrderBy key selector is bound to Country"));
}

#[test]
fn empty_projection_is_malformed() {
    let plan = customers().project(Vec::new());

    let err = stabilize(&plan).expect_err("empty projection should be rejected");

    assert!(matches!(err, PlanError::Malformed { .. }));
}

#[test]
fn tie_break_target_reports_skip_reasons() {
    assert_eq!(
        tie_break_target(ElementType::Entity(Country::MODEL), &by("name")),
        Err(SkipReason::NoIntKey)
    );
    assert_eq!(
        tie_break_target(ElementType::Projection, &by("name")),
        Err(SkipReason::NoIntKey)
    );
    assert_eq!(
        tie_break_target(ElementType::Entity(Customer::MODEL), &by("name")),
        Ok((Customer::MODEL, "id"))
    );
}

// ---------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------

#[derive(Clone, Debug)]
enum Op {
    Filter,
    OrderBy(&'static str, bool, bool),
    ThenBy(&'static str, bool),
    Skip(u32),
    Take(u32),
}

fn arb_field() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("id"), Just("name"), Just("city"), Just("phone_number")]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Filter),
        (arb_field(), any::<bool>(), any::<bool>())
            .prop_map(|(field, desc, dynamic)| Op::OrderBy(field, desc, dynamic)),
        (arb_field(), any::<bool>()).prop_map(|(field, desc)| Op::ThenBy(field, desc)),
        (0u32..5).prop_map(Op::Skip),
        (0u32..5).prop_map(Op::Take),
    ]
}

fn direction(desc: bool) -> OrderDirection {
    if desc {
        OrderDirection::Desc
    } else {
        OrderDirection::Asc
    }
}

fn build_plan(model: &'static EntityModel, ops: &[Op]) -> QueryPlan {
    ops.iter().fold(QueryPlan::scan(model), |plan, op| match op {
        Op::Filter => plan.filter(Predicate::ne("name", "")),
        Op::OrderBy(field, desc, true) => {
            plan.order_by(KeySelector::property(model, *field), direction(*desc))
        }
        Op::OrderBy(field, desc, false) => {
            plan.order_by(KeySelector::field(model, *field), direction(*desc))
        }
        Op::ThenBy(field, desc) => plan.then_by(KeySelector::field(model, *field), direction(*desc)),
        Op::Skip(n) => plan.skip(*n),
        Op::Take(n) => plan.take(*n),
    })
}

fn count_primary_sorts(plan: &QueryPlan) -> usize {
    let own = usize::from(matches!(plan, QueryPlan::OrderBy { .. }));
    own + plan.source().map_or(0, count_primary_sorts)
}

// Every primary sort must be followed immediately by an ascending id sort.
fn every_primary_sort_is_tied(plan: &QueryPlan) -> bool {
    let tied_here = match plan {
        QueryPlan::ThenBy {
            source,
            key,
            direction,
        } if matches!(source.as_ref(), QueryPlan::OrderBy { .. }) => {
            *direction == OrderDirection::Asc && key.single_property() == Some("id")
        }
        QueryPlan::OrderBy { .. } => return false,
        _ => true,
    };
    let below = match plan {
        QueryPlan::ThenBy { source, .. } => match source.as_ref() {
            QueryPlan::OrderBy { source, .. } => every_primary_sort_is_tied(source),
            other => every_primary_sort_is_tied(other),
        },
        other => other.source().is_none_or(every_primary_sort_is_tied),
    };

    tied_here && below
}

proptest! {
    #[test]
    fn stabilize_is_idempotent(ops in prop::collection::vec(arb_op(), 0..8)) {
        let plan = build_plan(Customer::MODEL, &ops);
        let once = stabilize(&plan).expect("generated plans are well formed");
        let twice = stabilize(&once).expect("stabilized plans are well formed");

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn stabilize_does_not_touch_input(ops in prop::collection::vec(arb_op(), 0..8)) {
        let plan = build_plan(Customer::MODEL, &ops);
        let snapshot = plan.clone();
        let _ = stabilize(&plan).expect("generated plans are well formed");

        prop_assert_eq!(plan, snapshot);
    }

    #[test]
    fn stabilize_is_identity_for_non_keyed_entities(ops in prop::collection::vec(arb_op(), 0..8)) {
        let plan = build_plan(Country::MODEL, &ops);
        let stabilized = stabilize(&plan).expect("generated plans are well formed");

        prop_assert_eq!(stabilized, plan);
    }

    #[test]
    fn stabilize_ties_every_primary_sort(ops in prop::collection::vec(arb_op(), 0..8)) {
        let plan = build_plan(Customer::MODEL, &ops);
        let stabilized = stabilize(&plan).expect("generated plans are well formed");

        prop_assert!(every_primary_sort_is_tied(&stabilized));
        prop_assert_eq!(count_primary_sorts(&stabilized), count_primary_sorts(&plan));
        prop_assert!(stabilized.depth() <= plan.depth() + count_primary_sorts(&plan));
    }
}
