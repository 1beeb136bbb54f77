//! Lifecycle hooks invoked by a session.
//!
//! Interceptors are registered once on `ContextOptions` and shared by every
//! session built from them, so implementations must be `Send + Sync` and keep
//! any state behind their own synchronization.
mod materialization;
mod query;
mod save;

pub use materialization::{
    EntityCachingInterceptor, LoggerInjectionInterceptor, MaterializationData,
    MaterializationInterceptor, SetRetrievedInterceptor,
};
pub use query::{KeyOrderingInterceptor, QueryEventData, QueryExpressionInterceptor};
pub use save::{
    ConcurrencyEventData, EntryInfo, SaveChangesInterceptor, StoreCommand, StoreCommandKind,
    SuppressDeleteConcurrencyInterceptor,
};

///
/// InterceptionResult
///
/// Outcome threaded through a chain of interceptors for one event.
/// `Suppress` stops the default behavior, optionally supplying a replacement.
///

#[derive(Debug, Default)]
pub enum InterceptionResult<T> {
    #[default]
    Continue,
    Suppress(T),
}

impl<T> InterceptionResult<T> {
    #[must_use]
    pub const fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppress(_))
    }
}

impl InterceptionResult<()> {
    #[must_use]
    pub const fn suppress() -> Self {
        Self::Suppress(())
    }
}
