use crate::{
    db::query::{
        plan::{ElementType, QueryPlan},
        stabilize::stabilize,
    },
    error::InternalError,
};

///
/// QueryEventData
/// Context passed alongside a plan about to be executed.
///

#[derive(Clone, Copy, Debug)]
pub struct QueryEventData {
    pub session_id: u64,
    pub element: ElementType,
}

///
/// QueryExpressionInterceptor
///
/// Rewrites a plan before it is evaluated. The returned plan is
/// authoritative for execution.
///

pub trait QueryExpressionInterceptor: Send + Sync {
    fn processing_query(
        &self,
        plan: QueryPlan,
        event: &QueryEventData,
    ) -> Result<QueryPlan, InternalError>;
}

///
/// KeyOrderingInterceptor
///
/// Makes ordering over integer-keyed entities total by appending an id
/// tie-break to every primary sort.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct KeyOrderingInterceptor;

impl QueryExpressionInterceptor for KeyOrderingInterceptor {
    fn processing_query(
        &self,
        plan: QueryPlan,
        _event: &QueryEventData,
    ) -> Result<QueryPlan, InternalError> {
        Ok(stabilize(&plan)?)
    }
}
