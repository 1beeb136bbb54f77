use super::*;
use crate::{
    db::query::{plan::PlanError, predicate::Predicate, stabilize::stabilize},
    error::ErrorClass,
    test_fixtures::{Country, Customer, customer_rows},
    traits::EntityKind,
};
use proptest::prelude::*;

///
/// FixedSource
/// Returns the same rows for every scan, in the given order.
///

struct FixedSource(Vec<Row>);

impl RowSource for FixedSource {
    fn scan(&self, _entity: &'static EntityModel) -> Result<Vec<Row>, InternalError> {
        Ok(self.0.clone())
    }
}

fn ids(rows: &[Row]) -> Vec<i64> {
    rows.iter()
        .map(|row| row.get("id").as_int().expect("fixture rows carry ids"))
        .collect()
}

fn by_city() -> KeySelector {
    KeySelector::property(Customer::MODEL, "city")
}

#[test]
fn scan_returns_storage_order() {
    let source = FixedSource(customer_rows());

    let rows = execute(&QueryPlan::scan(Customer::MODEL), &source).expect("scan should run");

    assert_eq!(ids(&rows), vec![4, 2, 3, 1]);
}

#[test]
fn order_by_places_nulls_last_and_keeps_ties_in_source_order() {
    let source = FixedSource(customer_rows());
    let plan = QueryPlan::scan(Customer::MODEL).order_by(by_city(), OrderDirection::Asc);

    let rows = execute(&plan, &source).expect("plan should run");

    assert_eq!(ids(&rows), vec![2, 1, 4, 3]);
}

#[test]
fn stabilized_order_breaks_ties_by_ascending_id() {
    let source = FixedSource(customer_rows());
    let plan = QueryPlan::scan(Customer::MODEL).order_by(by_city(), OrderDirection::Asc);
    let plan = stabilize(&plan).expect("plan should stabilize");

    let rows = execute(&plan, &source).expect("plan should run");

    assert_eq!(ids(&rows), vec![1, 2, 3, 4]);
}

#[test]
fn descending_order_puts_nulls_first() {
    let source = FixedSource(customer_rows());
    let plan = QueryPlan::scan(Customer::MODEL).order_by(by_city(), OrderDirection::Desc);
    let plan = stabilize(&plan).expect("plan should stabilize");

    let rows = execute(&plan, &source).expect("plan should run");

    assert_eq!(ids(&rows), vec![3, 4, 1, 2]);
}

#[test]
fn then_by_without_order_by_is_rejected() {
    let source = FixedSource(customer_rows());
    let plan = QueryPlan::scan(Customer::MODEL).then_by(by_city(), OrderDirection::Asc);

    let err = execute(&plan, &source).expect_err("unordered ThenBy should fail");

    assert!(err.message.contains("ThenBy requires an ordered source"));
}

#[test]
fn unknown_dynamic_property_is_rejected() {
    let source = FixedSource(customer_rows());
    let plan = QueryPlan::scan(Customer::MODEL).order_by(
        KeySelector::property(Customer::MODEL, "shoe_size"),
        OrderDirection::Asc,
    );

    let err = execute(&plan, &source).expect_err("unknown property should fail");

    assert!(err.message.contains("'shoe_size' is not mapped"));
}

#[test]
fn misspelled_static_field_is_rejected() {
    let source = FixedSource(customer_rows());
    let plan = QueryPlan::scan(Customer::MODEL)
        .order_by(KeySelector::field(Customer::MODEL, "cty"), OrderDirection::Asc);

    let err = execute(&plan, &source).expect_err("unknown field should fail");

    assert_eq!(err.class, ErrorClass::InvariantViolation);
    assert!(err.message.contains("field 'cty' is not mapped"));
}

#[test]
fn filter_project_and_page_run_in_tree_order() {
    let source = FixedSource(customer_rows());
    let plan = QueryPlan::scan(Customer::MODEL)
        .filter(Predicate::is_null("city"))
        .order_by(KeySelector::field(Customer::MODEL, "name"), OrderDirection::Asc)
        .project(vec!["name".to_string()])
        .skip(1)
        .take(5);

    let rows = execute(&plan, &source).expect("plan should run");

    assert_eq!(rows, vec![Row::new().with("name", "Toast")]);
}

#[test]
fn computed_selectors_evaluate_against_rows() {
    let row = Row::new().with("name", "ALICE");
    let lowered = SelectorExpr::Lower(Box::new(SelectorExpr::Field("name".to_string())));
    let coalesced = SelectorExpr::Coalesce(
        Box::new(SelectorExpr::Field("city".to_string())),
        Value::from("nowhere"),
    );

    assert_eq!(eval_selector(&lowered, &row), Value::from("alice"));
    assert_eq!(eval_selector(&coalesced, &row), Value::from("nowhere"));
}

#[test]
fn empty_source_yields_empty_result() {
    let source = FixedSource(Vec::new());
    let plan = QueryPlan::scan(Customer::MODEL)
        .order_by(by_city(), OrderDirection::Asc)
        .skip(0)
        .take(20);
    let plan = stabilize(&plan).expect("plan should stabilize");

    let rows = execute(&plan, &source).expect("plan should run");

    assert!(rows.is_empty());
}

#[test]
fn non_keyed_entities_sort_by_primary_key_only() {
    let source = FixedSource(vec![
        Country::new("Wales", "+44").to_row(),
        Country::new("England", "+44").to_row(),
    ]);
    let plan = QueryPlan::scan(Country::MODEL).order_by(
        KeySelector::field(Country::MODEL, "dialing_codes"),
        OrderDirection::Asc,
    );
    let stabilized = stabilize(&plan).expect("plan should stabilize");
    assert_eq!(stabilized, plan);

    let rows = execute(&stabilized, &source).expect("plan should run");

    assert_eq!(rows[0].get("name"), &Value::from("Wales"));
}

#[test]
fn pagination_clamps_to_bounds() {
    let mut rows = vec![1, 2, 3, 4, 5];
    apply_pagination(&mut rows, 1, Some(2));
    assert_eq!(rows, vec![2, 3]);

    let mut rows = vec![1, 2, 3];
    apply_pagination(&mut rows, 3, Some(2));
    assert!(rows.is_empty());

    let mut rows = vec![1, 2, 3];
    apply_pagination(&mut rows, 1, Some(u32::MAX));
    assert_eq!(rows, vec![2, 3]);
}

#[test]
fn plan_error_converts_into_query_invariant() {
    let err: InternalError = PlanError::malformed("broken").into();

    assert_eq!(err.class, crate::error::ErrorClass::InvariantViolation);
    assert_eq!(err.origin, crate::error::ErrorOrigin::Query);
}

// ---------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------

fn arb_rows() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        prop::option::of(prop_oneof![Just("Ames"), Just("Boone"), Just("Cedar")]),
        0..24,
    )
    .prop_flat_map(|cities| {
        let len = cities.len();
        (Just(cities), Just((1..=len as i64).collect::<Vec<_>>()).prop_shuffle())
    })
    .prop_map(|(cities, ids)| {
        cities
            .into_iter()
            .zip(ids)
            .map(|(city, id)| Customer::with_id(id, "n", city).to_row())
            .collect()
    })
}

proptest! {
    #[test]
    fn stabilized_sort_is_total_under_unique_ids(rows in arb_rows(), desc in any::<bool>()) {
        let direction = if desc { OrderDirection::Desc } else { OrderDirection::Asc };
        let plan = QueryPlan::scan(Customer::MODEL).order_by(by_city(), direction);
        let plan = stabilize(&plan).expect("plan should stabilize");

        let forward = execute(&plan, &FixedSource(rows.clone())).expect("plan should run");
        let mut reversed_input = rows;
        reversed_input.reverse();
        let backward = execute(&plan, &FixedSource(reversed_input)).expect("plan should run");

        // Input order must not leak into the output.
        prop_assert_eq!(&forward, &backward);

        // Equal cities appear in ascending id order.
        for pair in forward.windows(2) {
            if pair[0].get("city") == pair[1].get("city") {
                prop_assert!(pair[0].get("id").as_int() < pair[1].get("id").as_int());
            }
        }
    }

    #[test]
    fn restabilizing_keeps_result_order(rows in arb_rows()) {
        let plan = QueryPlan::scan(Customer::MODEL).order_by(by_city(), OrderDirection::Asc);
        let once = stabilize(&plan).expect("plan should stabilize");
        let twice = stabilize(&once).expect("plan should stabilize");
        let source = FixedSource(rows);

        prop_assert_eq!(
            execute(&once, &source).expect("plan should run"),
            execute(&twice, &source).expect("plan should run")
        );
    }
}
