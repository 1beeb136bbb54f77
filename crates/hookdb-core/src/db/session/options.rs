use crate::interceptor::{
    MaterializationInterceptor, QueryExpressionInterceptor, SaveChangesInterceptor,
};
use std::{fmt, sync::Arc};

///
/// ContextOptions
///
/// Session configuration: registered interceptors (run in registration
/// order) and query logging. Cloning shares the interceptor instances.
///

#[derive(Clone, Default)]
pub struct ContextOptions {
    query: Vec<Arc<dyn QueryExpressionInterceptor>>,
    materialization: Vec<Arc<dyn MaterializationInterceptor>>,
    save_changes: Vec<Arc<dyn SaveChangesInterceptor>>,
    log_queries: bool,
}

impl ContextOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add_query_interceptor(mut self, interceptor: Arc<dyn QueryExpressionInterceptor>) -> Self {
        self.query.push(interceptor);
        self
    }

    #[must_use]
    pub fn add_materialization_interceptor(
        mut self,
        interceptor: Arc<dyn MaterializationInterceptor>,
    ) -> Self {
        self.materialization.push(interceptor);
        self
    }

    #[must_use]
    pub fn add_save_changes_interceptor(
        mut self,
        interceptor: Arc<dyn SaveChangesInterceptor>,
    ) -> Self {
        self.save_changes.push(interceptor);
        self
    }

    /// Log every plan at `info` right before it is evaluated.
    #[must_use]
    pub const fn log_queries(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    pub(crate) fn query_interceptors(&self) -> &[Arc<dyn QueryExpressionInterceptor>] {
        &self.query
    }

    pub(crate) fn materialization_interceptors(&self) -> &[Arc<dyn MaterializationInterceptor>] {
        &self.materialization
    }

    pub(crate) fn save_changes_interceptors(&self) -> &[Arc<dyn SaveChangesInterceptor>] {
        &self.save_changes
    }

    pub(crate) const fn logs_queries(&self) -> bool {
        self.log_queries
    }
}

impl fmt::Debug for ContextOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextOptions")
            .field("query_interceptors", &self.query.len())
            .field("materialization_interceptors", &self.materialization.len())
            .field("save_changes_interceptors", &self.save_changes.len())
            .field("log_queries", &self.log_queries)
            .finish()
    }
}
