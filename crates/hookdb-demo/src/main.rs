//! Command-line walkthroughs of the HookDB session interceptors.
mod demos;
mod entities;

use clap::{Parser, Subcommand};
use hookdb_core::db::Database;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Run one interceptor walkthrough against a fresh in-memory database.
#[derive(Debug, Parser)]
#[command(name = "hookdb-demo", version)]
struct Args {
    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    demo: Demo,
}

#[derive(Debug, Subcommand)]
enum Demo {
    /// Stamp loaded entities with their retrieval time
    Materialization,

    /// Serve reference entities from a shared cache
    Caching,

    /// Inject a shared logger into loaded entities
    InjectLogger,

    /// Suppress the concurrency violation of a repeated delete
    Concurrency,

    /// Page by a runtime-chosen property with a deterministic tie-break
    KeyOrdering {
        /// Property to order customers by
        #[arg(long, default_value = "city")]
        sort_property: String,

        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: u32,

        #[arg(long, default_value_t = 20)]
        page_size: u32,

        /// Print the key-ordered page as JSON rows
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(log_level: &str) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|err| format!("invalid log filter '{log_level}': {err}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| err.to_string())
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = init_tracing(&args.log_level) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }

    let db = Database::new();
    let result = match &args.demo {
        Demo::Materialization => demos::materialization(&db),
        Demo::Caching => demos::caching(&db),
        Demo::InjectLogger => demos::inject_logger(&db),
        Demo::Concurrency => demos::concurrency(&db),
        Demo::KeyOrdering {
            sort_property,
            page,
            page_size,
            json,
        } => demos::key_ordering(&db, sort_property, *page, *page_size, *json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err.display_with_class());
            ExitCode::FAILURE
        }
    }
}
