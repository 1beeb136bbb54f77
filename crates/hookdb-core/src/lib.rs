//! Core runtime for HookDB: entity traits, values, query plans, the
//! in-memory store, and the session lifecycle hooks that interceptors plug
//! into. The ergonomic surface is exported via the `prelude`.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod db;
pub mod error;
pub mod interceptor;
pub mod model;
pub mod traits;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// Prelude
///
/// Vocabulary needed to declare entities, register interceptors, and run
/// queries through a session.
///

pub mod prelude {
    pub use crate::{
        db::{
            ContextOptions, Database, EntryState, Session,
            query::{
                Query,
                plan::{KeySelector, OrderDirection, QueryPlan},
                predicate::Predicate,
            },
        },
        entity_instance,
        error::InternalError,
        interceptor::{
            EntityCachingInterceptor, InterceptionResult, KeyOrderingInterceptor,
            LoggerInjectionInterceptor, SetRetrievedInterceptor,
            SuppressDeleteConcurrencyInterceptor,
        },
        model::{EntityFieldKind, EntityFieldModel, EntityModel, KeyCapability},
        traits::{EntityInstance, EntityKind, EntityLogger, HasIntKey, HasLogger, HasRetrieved},
        value::{Row, Value},
    };
}
