use crate::{error::InternalError, model::EntityModel, value::Row};
use chrono::{DateTime, Utc};
use std::any::Any;

// ============================================================================
// ENTITY SCHEMA
// ============================================================================

///
/// EntityKind
///
/// An entity type mapped onto one store table.
///
/// `to_row` and `from_row` are the mapping layer: they must round-trip every
/// field listed in `MODEL.fields`. Unmapped state (timestamps, loggers) is
/// never written to rows.
///

pub trait EntityKind: EntityInstance + Clone + Sized {
    const MODEL: &'static EntityModel;

    fn to_row(&self) -> Row;

    fn from_row(row: &Row) -> Result<Self, InternalError>;
}

///
/// HasIntKey
///
/// Capability marker for entities with a unique integer identifier.
/// Declare it in the model with `KeyCapability::of::<Self>()`.
///

pub trait HasIntKey: EntityKind {
    const KEY_FIELD: &'static str = "id";

    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);
}

// ============================================================================
// MATERIALIZED INSTANCES
// ============================================================================

///
/// EntityInstance
///
/// Type-erased view of a materialized entity, handed to materialization
/// interceptors. Capability accessors return `None` unless the entity opts
/// in by overriding them.
///

pub trait EntityInstance: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn as_has_retrieved_mut(&mut self) -> Option<&mut dyn HasRetrieved> {
        None
    }

    fn as_has_logger_mut(&mut self) -> Option<&mut dyn HasLogger> {
        None
    }
}

/// Implement the `Any` plumbing of `EntityInstance`.
///
/// Capability overrides can be passed in a trailing brace block.
#[macro_export]
macro_rules! entity_instance {
    ($ty:ty $(, { $($body:tt)* })? $(,)?) => {
        impl $crate::traits::EntityInstance for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any> {
                self
            }

            $($($body)*)?
        }
    };
}

///
/// HasRetrieved
/// Entities that record when they were materialized.
///

pub trait HasRetrieved {
    fn retrieved(&self) -> Option<DateTime<Utc>>;

    fn set_retrieved(&mut self, at: DateTime<Utc>);
}

///
/// HasLogger
/// Entities that accept an injected logger after materialization.
///

pub trait HasLogger {
    fn logger(&self) -> Option<&EntityLogger>;

    fn set_logger(&mut self, logger: EntityLogger);
}

///
/// EntityLogger
///
/// Cheap-to-clone handle that scopes entity log events under a named span.
///

#[derive(Clone, Debug)]
pub struct EntityLogger {
    category: &'static str,
    span: tracing::Span,
}

impl EntityLogger {
    #[must_use]
    pub fn new(category: &'static str) -> Self {
        Self {
            category,
            span: tracing::info_span!("entity_logger", category),
        }
    }

    #[must_use]
    pub const fn category(&self) -> &'static str {
        self.category
    }

    /// Emit one informational event with a numeric event id.
    pub fn info(&self, event_id: u32, message: &str) {
        self.span.in_scope(|| {
            tracing::info!(event_id, category = self.category, "{message}");
        });
    }
}
