//! One function per walkthrough. Each resets the database first.
use crate::entities::{Country, Customer};
use hookdb_core::{
    error::{ErrorClass, ErrorOrigin},
    prelude::*,
};
use std::sync::Arc;
use tracing::info;

fn reset(db: &Database) {
    db.ensure_deleted();
    db.ensure_created(&[Customer::MODEL, Country::MODEL]);
}

/// Stamp loaded customers with their retrieval time.
pub fn materialization(db: &Database) -> Result<(), InternalError> {
    reset(db);

    let mut session = Session::new(db.clone(), ContextOptions::new());
    session.add_range(&[
        Customer::new("Alice").with_phone_number("+1 515 555 0123"),
        Customer::new("Mac").with_phone_number("+1 515 555 0124"),
    ]);
    session.save_changes()?;

    let options =
        ContextOptions::new().add_materialization_interceptor(Arc::new(SetRetrievedInterceptor));
    let session = Session::new(db.clone(), options);
    let customer =
        session.single(session.query::<Customer>().filter(Predicate::eq("name", "Alice")))?;

    match customer.retrieved() {
        Some(at) => println!("Customer '{}' was retrieved at '{}'", customer.name, at.to_rfc3339()),
        None => println!("Customer '{}' has no retrieval time", customer.name),
    }

    Ok(())
}

/// Serve countries from a process-wide cache after their first load.
pub fn caching(db: &Database) -> Result<(), InternalError> {
    reset(db);
    db.seed(&Country::reference_data())?;

    let cache = Arc::new(EntityCachingInterceptor::<Country>::new());
    let options = ContextOptions::new().add_materialization_interceptor(cache.clone());

    let mut session = Session::new(db.clone(), options.clone());
    session.add_range(&[
        Customer::new("Alice")
            .with_phone_number("515 555 0123")
            .in_country("United States"),
        Customer::new("Mac")
            .with_phone_number("515 555 0124")
            .in_country("United Kingdom"),
    ]);
    session.save_changes()?;

    // Second pass is served entirely from the cache.
    for pass in 1..=2 {
        info!(pass, cached = cache.len(), "listing customers");
        let session = Session::new(db.clone(), options.clone());

        for customer in session.load(session.query::<Customer>().order_by("id"))? {
            let country = match &customer.country {
                Some(name) => session.find::<Country>(name.as_str())?,
                None => None,
            };
            let country = country.map_or_else(|| "<none>".to_string(), |c| c.name);

            println!("Customer '{}' in Country '{country}'", customer.name);
        }
    }

    Ok(())
}

/// Hand every customer a shared logger and log a phone number change.
pub fn inject_logger(db: &Database) -> Result<(), InternalError> {
    reset(db);

    let options = ContextOptions::new()
        .add_materialization_interceptor(Arc::new(LoggerInjectionInterceptor::new("customers")));

    let mut session = Session::new(db.clone(), options.clone());
    session.add_range(&[
        Customer::new("Alice").with_phone_number("+1 515 555 0123"),
        Customer::new("Mac").with_phone_number("+1 515 555 0124"),
    ]);
    session.save_changes()?;

    let mut session = Session::new(db.clone(), options);
    let mut customer =
        session.single(session.query::<Customer>().filter(Predicate::eq("name", "Alice")))?;
    customer.set_phone_number("+1 515 555 0125");
    session.update(&customer);
    session.save_changes()?;

    println!(
        "Customer '{}' now has phone number '{}'",
        customer.name,
        customer.phone_number().unwrap_or_default()
    );

    Ok(())
}

/// Delete the same customer from two sessions; the second delete's
/// concurrency violation is suppressed.
pub fn concurrency(db: &Database) -> Result<(), InternalError> {
    reset(db);

    let options = ContextOptions::new()
        .add_save_changes_interceptor(Arc::new(SuppressDeleteConcurrencyInterceptor));

    let mut session = Session::new(db.clone(), options.clone());
    session.add_range(&[Customer::new("Bill"), Customer::new("Bob")]);
    session.save_changes()?;

    let mut first = Session::new(db.clone(), options.clone());
    let bill = first.single(first.query::<Customer>().filter(Predicate::eq("name", "Bill")))?;

    {
        let mut second = Session::new(db.clone(), options);
        second.remove(&bill);
        let affected = second.save_changes()?;
        println!("Second session deleted {affected} row(s)");
    }

    if first.reload(&bill)?.is_none() {
        println!("Customer '{}' is already gone", bill.name);
    }

    first.remove(&bill);
    let affected = first.save_changes()?;
    println!("First session deleted {affected} row(s)");
    println!("{} customer(s) remain", db.row_count(Customer::MODEL)?);

    Ok(())
}

/// Page customers by a property chosen at runtime, with and without a
/// deterministic id tie-break.
pub fn key_ordering(
    db: &Database,
    sort_property: &str,
    page: u32,
    page_size: u32,
    json: bool,
) -> Result<(), InternalError> {
    reset(db);

    let mut session = Session::new(db.clone(), ContextOptions::new());
    session.add_range(&[
        Customer::new("Alice")
            .with_phone_number("+1 515 555 0123")
            .in_city("Ames"),
        Customer::new("Mac")
            .with_phone_number("+1 515 555 0124")
            .in_city("Ames"),
        Customer::new("Toast"),
        Customer::new("Baxter"),
    ]);
    session.save_changes()?;

    let plain = Session::new(db.clone(), ContextOptions::new().log_queries(true));
    let query = || {
        plain
            .query::<Customer>()
            .order_by_property(sort_property)
    };

    println!("OrderBy({sort_property}):");
    print_page(&plain.load(query().page(page, page_size))?);

    println!("OrderBy({sort_property}).ThenBy(id):");
    print_page(&plain.load(query().then_by("id").page(page, page_size))?);

    let options = ContextOptions::new()
        .add_query_interceptor(Arc::new(KeyOrderingInterceptor))
        .log_queries(true);
    let ordered = Session::new(db.clone(), options);

    println!("OrderBy({sort_property}) with key ordering:");
    let page_query = ordered
        .query::<Customer>()
        .order_by_property(sort_property)
        .page(page, page_size);

    if json {
        let rows = ordered.execute_rows(page_query.select(&["id", "name", sort_property]))?;
        for row in &rows {
            let line = serde_json::to_string(row).map_err(|err| {
                InternalError::new(ErrorClass::Internal, ErrorOrigin::Query, err.to_string())
            })?;
            println!("{line}");
        }
    } else {
        print_page(&ordered.load(page_query)?);
    }

    Ok(())
}

fn print_page(customers: &[Customer]) {
    for customer in customers {
        println!("  {}", customer.name);
    }
}
