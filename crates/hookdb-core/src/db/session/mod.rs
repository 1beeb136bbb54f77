//! Unit of work over a `Database`, with interceptors wired in.
//!
//! A session tracks pending writes until `save_changes`, runs query
//! interceptors before evaluating a plan, and builds entities from rows
//! through the materialization interceptors.
mod options;

pub use options::ContextOptions;

use crate::{
    db::{
        executor::execute,
        query::{Query, plan::QueryPlan},
        store::Database,
    },
    error::{ErrorClass, ErrorOrigin, InternalError},
    interceptor::{
        ConcurrencyEventData, EntryInfo, InterceptionResult, MaterializationData, QueryEventData,
        StoreCommand, StoreCommandKind,
    },
    model::EntityModel,
    traits::{EntityInstance, EntityKind, HasIntKey},
    value::{Row, Value},
};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

///
/// EntryState
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryState {
    Added,
    Modified,
    Deleted,
}

///
/// TrackedEntry
/// Pending write captured by `add`, `update`, or `remove`.
///

#[derive(Clone, Debug)]
struct TrackedEntry {
    entity: &'static EntityModel,
    state: EntryState,
    row: Row,
}

impl TrackedEntry {
    fn key(&self) -> &Value {
        self.row.get(self.entity.primary_key)
    }

    fn info(&self) -> EntryInfo {
        EntryInfo {
            entity: self.entity,
            key: self.key().clone(),
            state: self.state,
        }
    }
}

///
/// Session
///

pub struct Session {
    id: u64,
    db: Database,
    options: ContextOptions,
    entries: Vec<TrackedEntry>,
}

impl Session {
    #[must_use]
    pub fn new(db: Database, options: ContextOptions) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            db,
            options,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Number of writes waiting for `save_changes`.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    // ------------------------------------------------------------------
    // Change tracking
    // ------------------------------------------------------------------

    pub fn add<E: EntityKind>(&mut self, entity: &E) {
        self.track(E::MODEL, EntryState::Added, entity.to_row());
    }

    pub fn add_range<'a, E: EntityKind>(&mut self, entities: impl IntoIterator<Item = &'a E>) {
        for entity in entities {
            self.add(entity);
        }
    }

    /// Track `entity` as Added, first giving it a store key if it has none.
    ///
    /// The key is written back immediately so the caller can update or
    /// remove the same instance later.
    pub fn add_keyed<E: HasIntKey>(&mut self, entity: &mut E) -> Result<(), InternalError> {
        if entity.id() == 0 {
            let id = self.db.reserve_key(E::MODEL)?;
            entity.set_id(id);
        }
        self.add(entity);

        Ok(())
    }

    pub fn update<E: EntityKind>(&mut self, entity: &E) {
        self.track(E::MODEL, EntryState::Modified, entity.to_row());
    }

    pub fn remove<E: EntityKind>(&mut self, entity: &E) {
        self.track(E::MODEL, EntryState::Deleted, entity.to_row());
    }

    fn track(&mut self, entity: &'static EntityModel, state: EntryState, row: Row) {
        self.entries.push(TrackedEntry { entity, state, row });
    }

    /// Apply every tracked write in order. Returns rows affected.
    ///
    /// A Modified or Deleted entry that affects no row is a concurrency
    /// violation; save-changes interceptors may suppress it. On failure the
    /// failed entry and every entry after it stay tracked.
    pub fn save_changes(&mut self) -> Result<usize, InternalError> {
        let entries = std::mem::take(&mut self.entries);
        let mut affected = 0;

        for (index, entry) in entries.iter().enumerate() {
            if let Err(err) = self.apply_entry(entry, &mut affected) {
                self.entries = entries[index..].to_vec();
                return Err(err);
            }
        }

        info!(session = self.id, affected, "changes saved");

        Ok(affected)
    }

    fn apply_entry(&self, entry: &TrackedEntry, affected: &mut usize) -> Result<(), InternalError> {
        let (kind, rows) = match entry.state {
            EntryState::Added => {
                self.db.insert(entry.entity, entry.row.clone())?;
                (StoreCommandKind::Insert, 1)
            }
            EntryState::Modified => (
                StoreCommandKind::Update,
                self.db.update(entry.entity, entry.key(), entry.row.clone())?,
            ),
            EntryState::Deleted => (
                StoreCommandKind::Delete,
                self.db.delete(entry.entity, entry.key())?,
            ),
        };

        if rows > 0 {
            *affected += rows;
            return Ok(());
        }

        let command = StoreCommand {
            kind,
            entity: entry.entity,
            key: entry.key().clone(),
        };
        let infos = [entry.info()];
        let event = ConcurrencyEventData {
            session_id: self.id,
            entries: &infos,
            command: &command,
        };

        let result = self
            .options
            .save_changes_interceptors()
            .iter()
            .fold(InterceptionResult::Continue, |result, interceptor| {
                interceptor.throwing_concurrency_exception(&event, result)
            });

        if result.is_suppressed() {
            debug!(session = self.id, %command, "concurrency violation suppressed");
            Ok(())
        } else {
            Err(InternalError::concurrency_conflict(&command))
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn query<E: EntityKind>(&self) -> Query<E> {
        Query::new()
    }

    /// Run query interceptors over `plan`, returning the plan to evaluate.
    pub fn prepare(&self, plan: QueryPlan) -> Result<QueryPlan, InternalError> {
        let event = QueryEventData {
            session_id: self.id,
            element: plan.element_type(),
        };

        let plan = self
            .options
            .query_interceptors()
            .iter()
            .try_fold(plan, |plan, interceptor| {
                interceptor.processing_query(plan, &event)
            })?;

        if self.options.logs_queries() {
            info!(session = self.id, %plan, "executing query");
        }

        Ok(plan)
    }

    /// Evaluate a plan and return raw rows (projections included).
    pub fn execute_rows(&self, plan: QueryPlan) -> Result<Vec<Row>, InternalError> {
        let plan = self.prepare(plan)?;

        execute(&plan, &self.db)
    }

    /// Evaluate a query and materialize every row as `E`.
    pub fn load<E: EntityKind>(&self, query: Query<E>) -> Result<Vec<E>, InternalError> {
        let plan = self.prepare(query.into_plan())?;
        if plan.element_type().entity() != Some(E::MODEL) {
            return Err(InternalError::query_invariant(format!(
                "plan yields {} and cannot materialize '{}'",
                plan.element_type(),
                E::MODEL.entity_name
            )));
        }

        execute(&plan, &self.db)?
            .iter()
            .map(|row| self.materialize::<E>(row))
            .collect()
    }

    /// Evaluate a query that must match exactly one entity.
    pub fn single<E: EntityKind>(&self, query: Query<E>) -> Result<E, InternalError> {
        let mut found = self.load(query.take(2))?;

        match found.len() {
            1 => Ok(found.remove(0)),
            0 => Err(InternalError::new(
                ErrorClass::NotFound,
                ErrorOrigin::Query,
                format!("sequence of '{}' contains no elements", E::MODEL.entity_name),
            )),
            _ => Err(InternalError::new(
                ErrorClass::Conflict,
                ErrorOrigin::Query,
                format!(
                    "sequence of '{}' contains more than one element",
                    E::MODEL.entity_name
                ),
            )),
        }
    }

    /// Look up one entity by primary key.
    pub fn find<E: EntityKind>(&self, key: impl Into<Value>) -> Result<Option<E>, InternalError> {
        self.db
            .get(E::MODEL, &key.into())?
            .map(|row| self.materialize::<E>(&row))
            .transpose()
    }

    /// Load the stored state of an integer-keyed entity.
    pub fn reload<E: HasIntKey>(&self, entity: &E) -> Result<Option<E>, InternalError> {
        self.find(entity.id())
    }

    // Build one entity from one row, running materialization hooks in order.
    fn materialize<E: EntityKind>(&self, row: &Row) -> Result<E, InternalError> {
        let data = MaterializationData {
            session_id: self.id,
            entity: E::MODEL,
            row,
        };
        let interceptors = self.options.materialization_interceptors();

        let result = interceptors
            .iter()
            .fold(InterceptionResult::Continue, |result, interceptor| {
                interceptor.creating_instance(&data, result)
            });

        let mut instance: Box<dyn EntityInstance> = match result {
            InterceptionResult::Suppress(instance) => instance,
            InterceptionResult::Continue => Box::new(E::from_row(row)?),
        };

        for interceptor in interceptors {
            interceptor.created_instance(&data, &mut *instance);
        }
        for interceptor in interceptors {
            interceptor.initialized_instance(&data, &mut *instance);
        }

        instance.into_any().downcast::<E>().map(|entity| *entity).map_err(|_| {
            InternalError::new(
                ErrorClass::InvariantViolation,
                ErrorOrigin::Interceptor,
                format!(
                    "materialization interceptor supplied an instance that is not '{}'",
                    E::MODEL.entity_name
                ),
            )
        })
    }
}
