use crate::{db::session::EntryState, interceptor::InterceptionResult, model::EntityModel, value::Value};
use std::fmt;
use tracing::warn;

///
/// StoreCommandKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StoreCommandKind {
    Insert,
    Update,
    Delete,
}

///
/// StoreCommand
/// One keyed write issued against a table during save.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoreCommand {
    pub kind: StoreCommandKind,
    pub entity: &'static EntityModel,
    pub key: Value,
}

impl fmt::Display for StoreCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.kind {
            StoreCommandKind::Insert => "insert",
            StoreCommandKind::Update => "update",
            StoreCommandKind::Delete => "delete",
        };

        write!(
            f,
            "{verb} {} where {} = {}",
            self.entity.entity_name, self.entity.primary_key, self.key
        )
    }
}

///
/// EntryInfo
/// Tracked entry touched by a failed command.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntryInfo {
    pub entity: &'static EntityModel,
    pub key: Value,
    pub state: EntryState,
}

///
/// ConcurrencyEventData
///

#[derive(Clone, Copy, Debug)]
pub struct ConcurrencyEventData<'a> {
    pub session_id: u64,
    pub entries: &'a [EntryInfo],
    pub command: &'a StoreCommand,
}

///
/// SaveChangesInterceptor
///
/// Hooks into save. `throwing_concurrency_exception` runs when a command
/// affected no rows; returning `Suppress` lets the save continue.
///

pub trait SaveChangesInterceptor: Send + Sync {
    fn throwing_concurrency_exception(
        &self,
        _event: &ConcurrencyEventData<'_>,
        result: InterceptionResult<()>,
    ) -> InterceptionResult<()> {
        result
    }
}

///
/// SuppressDeleteConcurrencyInterceptor
///
/// Deleting a row someone else already deleted is not a conflict: the
/// desired end state holds. Violations for any other entry state propagate.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct SuppressDeleteConcurrencyInterceptor;

impl SaveChangesInterceptor for SuppressDeleteConcurrencyInterceptor {
    fn throwing_concurrency_exception(
        &self,
        event: &ConcurrencyEventData<'_>,
        result: InterceptionResult<()>,
    ) -> InterceptionResult<()> {
        if event
            .entries
            .iter()
            .all(|entry| entry.state == EntryState::Deleted)
        {
            warn!(command = %event.command, "suppressing concurrency violation for command");
            return InterceptionResult::suppress();
        }

        result
    }
}
