//! Shared in-memory tables backing every session of one database.
//!
//! Rows are kept in insertion order. Integer keys are assigned on insert
//! when the row carries no key yet.
use crate::{
    db::executor::RowSource,
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::{EntityFieldKind, EntityModel},
    traits::EntityKind,
    value::{Row, Value},
};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info};

///
/// Database
///
/// Cheap-to-clone handle; clones share the same tables.
///

#[derive(Clone, Debug, Default)]
pub struct Database {
    tables: Arc<RwLock<HashMap<&'static str, Table>>>,
}

#[derive(Debug)]
struct Table {
    model: &'static EntityModel,
    rows: Vec<Row>,
    next_id: i64,
}

impl Table {
    // The sequence value that follows `id`.
    fn key_after(&self, id: i64) -> Result<i64, InternalError> {
        id.checked_add(1).ok_or_else(|| {
            InternalError::store_invariant(format!(
                "integer key sequence of '{}' exhausted",
                self.model.entity_name
            ))
        })
    }

    fn position(&self, key: &Value) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.get(self.model.primary_key) == key)
    }
}

impl Database {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every table. Returns whether anything existed.
    pub fn ensure_deleted(&self) -> bool {
        let mut tables = self.tables.write();
        let existed = !tables.is_empty();
        tables.clear();
        info!(existed, "database deleted");

        existed
    }

    /// Create an empty table for each model that has none. Returns whether
    /// any table was created.
    pub fn ensure_created(&self, models: &[&'static EntityModel]) -> bool {
        let mut tables = self.tables.write();
        let mut created = false;
        for &model in models {
            tables.entry(model.path).or_insert_with(|| {
                created = true;
                Table {
                    model,
                    rows: Vec::new(),
                    next_id: 1,
                }
            });
        }
        info!(created, tables = tables.len(), "database ensured");

        created
    }

    /// Insert static reference data directly, bypassing sessions.
    pub fn seed<E: EntityKind>(&self, entities: &[E]) -> Result<(), InternalError> {
        for entity in entities {
            self.insert(E::MODEL, entity.to_row())?;
        }
        debug!(entity = E::MODEL.entity_name, rows = entities.len(), "seeded");

        Ok(())
    }

    /// Take the next integer key of `model` without inserting a row.
    pub fn reserve_key(&self, model: &'static EntityModel) -> Result<i64, InternalError> {
        if !model.has_int_key() {
            return Err(InternalError::store_invariant(format!(
                "'{}' has no integer key to reserve",
                model.entity_name
            )));
        }

        let mut tables = self.tables.write();
        let table = table_mut(&mut tables, model)?;
        let id = table.next_id;
        table.next_id = table.key_after(id)?;
        debug!(entity = model.entity_name, id, "reserved key");

        Ok(id)
    }

    /// Insert one row, assigning an integer key if needed. Returns the key.
    pub fn insert(&self, model: &'static EntityModel, mut row: Row) -> Result<Value, InternalError> {
        let mut tables = self.tables.write();
        let table = table_mut(&mut tables, model)?;

        let mut next_id = None;
        if let Some(field) = model.int_key_field() {
            let id = match row.get(field).clone() {
                Value::Null | Value::Int(0) => {
                    let id = table.next_id;
                    row.set(field, id);
                    id
                }
                Value::Int(id) => id,
                other => {
                    return Err(InternalError::store_invariant(format!(
                        "integer key '{field}' of '{}' holds {other}",
                        model.entity_name
                    )));
                }
            };
            next_id = Some(table.key_after(id)?);
        }
        check_row(model, &row)?;

        let key = row.get(model.primary_key).clone();
        if key.is_null() {
            return Err(InternalError::store_invariant(format!(
                "primary key '{}' of '{}' is null",
                model.primary_key, model.entity_name
            )));
        }
        if table.position(&key).is_some() {
            return Err(InternalError::new(
                ErrorClass::Conflict,
                ErrorOrigin::Store,
                format!("duplicate key {key} in '{}'", model.entity_name),
            ));
        }

        if let Some(next) = next_id {
            table.next_id = table.next_id.max(next);
        }
        table.rows.push(row);

        Ok(key)
    }

    /// Replace the row stored under `key`. Returns rows affected.
    pub fn update(&self, model: &'static EntityModel, key: &Value, row: Row) -> Result<usize, InternalError> {
        check_row(model, &row)?;
        let mut tables = self.tables.write();
        let table = table_mut(&mut tables, model)?;

        Ok(match table.position(key) {
            Some(index) => {
                table.rows[index] = row;
                1
            }
            None => 0,
        })
    }

    /// Delete the row stored under `key`. Returns rows affected.
    pub fn delete(&self, model: &'static EntityModel, key: &Value) -> Result<usize, InternalError> {
        let mut tables = self.tables.write();
        let table = table_mut(&mut tables, model)?;

        Ok(match table.position(key) {
            Some(index) => {
                table.rows.remove(index);
                1
            }
            None => 0,
        })
    }

    pub fn get(&self, model: &'static EntityModel, key: &Value) -> Result<Option<Row>, InternalError> {
        let tables = self.tables.read();
        let table = tables
            .get(model.path)
            .ok_or_else(|| missing_table(model))?;

        Ok(table.position(key).map(|index| table.rows[index].clone()))
    }

    pub fn row_count(&self, model: &'static EntityModel) -> Result<usize, InternalError> {
        let tables = self.tables.read();
        let table = tables
            .get(model.path)
            .ok_or_else(|| missing_table(model))?;

        Ok(table.rows.len())
    }
}

impl RowSource for Database {
    fn scan(&self, entity: &'static EntityModel) -> Result<Vec<Row>, InternalError> {
        let tables = self.tables.read();
        let table = tables
            .get(entity.path)
            .ok_or_else(|| missing_table(entity))?;

        Ok(table.rows.clone())
    }
}

// Rows carry only mapped fields, each null only when nullable and otherwise
// of its declared kind.
fn check_row(model: &EntityModel, row: &Row) -> Result<(), InternalError> {
    if let Some((name, _)) = row.iter().find(|(name, _)| model.field(name).is_none()) {
        return Err(InternalError::store_invariant(format!(
            "field '{name}' is not mapped on '{}'",
            model.entity_name
        )));
    }

    for field in model.fields {
        let value = row.get(field.name);
        let fits = match value {
            Value::Null => field.nullable,
            Value::Bool(_) => field.kind == EntityFieldKind::Bool,
            Value::Int(_) => field.kind == EntityFieldKind::Int,
            Value::Text(_) => field.kind == EntityFieldKind::Text,
        };
        if fits {
            continue;
        }

        let found = if row.contains(field.name) {
            value.to_string()
        } else {
            "nothing".to_string()
        };
        return Err(InternalError::store_invariant(format!(
            "field '{}' of '{}' expects {} but holds {found}",
            field.name, model.entity_name, field.kind
        )));
    }

    Ok(())
}

fn table_mut<'a>(
    tables: &'a mut HashMap<&'static str, Table>,
    model: &'static EntityModel,
) -> Result<&'a mut Table, InternalError> {
    tables.get_mut(model.path).ok_or_else(|| missing_table(model))
}

fn missing_table(model: &EntityModel) -> InternalError {
    InternalError::new(
        ErrorClass::NotFound,
        ErrorOrigin::Store,
        format!("table '{}' does not exist", model.entity_name),
    )
}
