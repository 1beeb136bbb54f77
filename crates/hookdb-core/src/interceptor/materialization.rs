use crate::{
    interceptor::InterceptionResult,
    model::EntityModel,
    traits::{EntityInstance, EntityKind, EntityLogger},
    value::{Row, Value},
};
use chrono::Utc;
use parking_lot::RwLock;
use std::{collections::HashMap, sync::OnceLock};
use tracing::info;

///
/// MaterializationData
/// The stored row an entity instance is being built from.
///

#[derive(Clone, Copy, Debug)]
pub struct MaterializationData<'a> {
    pub session_id: u64,
    pub entity: &'static EntityModel,
    pub row: &'a Row,
}

impl MaterializationData<'_> {
    #[must_use]
    pub fn property(&self, name: &str) -> &Value {
        self.row.get(name)
    }

    #[must_use]
    pub fn primary_key(&self) -> &Value {
        self.row.get(self.entity.primary_key)
    }
}

///
/// MaterializationInterceptor
///
/// Hooks around building one entity instance from one row:
/// `creating_instance` (may suppress construction and supply an instance),
/// then `created_instance`, then `initialized_instance`.
///

pub trait MaterializationInterceptor: Send + Sync {
    fn creating_instance(
        &self,
        _data: &MaterializationData<'_>,
        result: InterceptionResult<Box<dyn EntityInstance>>,
    ) -> InterceptionResult<Box<dyn EntityInstance>> {
        result
    }

    fn created_instance(&self, _data: &MaterializationData<'_>, _instance: &mut dyn EntityInstance) {
    }

    fn initialized_instance(
        &self,
        _data: &MaterializationData<'_>,
        _instance: &mut dyn EntityInstance,
    ) {
    }
}

///
/// SetRetrievedInterceptor
/// Stamps `HasRetrieved` entities with the time they were loaded.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct SetRetrievedInterceptor;

impl MaterializationInterceptor for SetRetrievedInterceptor {
    fn initialized_instance(
        &self,
        _data: &MaterializationData<'_>,
        instance: &mut dyn EntityInstance,
    ) {
        if let Some(has_retrieved) = instance.as_has_retrieved_mut() {
            has_retrieved.set_retrieved(Utc::now());
        }
    }
}

///
/// LoggerInjectionInterceptor
///
/// Hands one shared `EntityLogger` to every `HasLogger` entity. The logger is
/// created on first use.
///

#[derive(Debug)]
pub struct LoggerInjectionInterceptor {
    category: &'static str,
    logger: OnceLock<EntityLogger>,
}

impl LoggerInjectionInterceptor {
    #[must_use]
    pub const fn new(category: &'static str) -> Self {
        Self {
            category,
            logger: OnceLock::new(),
        }
    }
}

impl MaterializationInterceptor for LoggerInjectionInterceptor {
    fn initialized_instance(
        &self,
        _data: &MaterializationData<'_>,
        instance: &mut dyn EntityInstance,
    ) {
        if let Some(has_logger) = instance.as_has_logger_mut() {
            let logger = self.logger.get_or_init(|| EntityLogger::new(self.category));
            has_logger.set_logger(logger.clone());
        }
    }
}

///
/// EntityCachingInterceptor
///
/// Process-wide cache of immutable reference entities keyed by primary key.
/// A cache hit suppresses construction and serves a clone of the cached
/// instance; every newly built instance is offered to the cache.
///

pub struct EntityCachingInterceptor<E: EntityKind> {
    cache: RwLock<HashMap<Value, E>>,
}

impl<E: EntityKind> EntityCachingInterceptor<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &Value) -> bool {
        self.cache.read().contains_key(key)
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }
}

impl<E: EntityKind> Default for EntityCachingInterceptor<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityKind> MaterializationInterceptor for EntityCachingInterceptor<E> {
    fn creating_instance(
        &self,
        data: &MaterializationData<'_>,
        result: InterceptionResult<Box<dyn EntityInstance>>,
    ) -> InterceptionResult<Box<dyn EntityInstance>> {
        if data.entity != E::MODEL || result.is_suppressed() {
            return result;
        }

        let key = data.primary_key();
        match self.cache.read().get(key) {
            Some(cached) => {
                info!(entity = E::MODEL.entity_name, %key, "got entity from cache");
                let instance: Box<dyn EntityInstance> = Box::new(cached.clone());

                InterceptionResult::Suppress(instance)
            }
            None => result,
        }
    }

    fn created_instance(&self, data: &MaterializationData<'_>, instance: &mut dyn EntityInstance) {
        let Some(entity) = instance.as_any().downcast_ref::<E>() else {
            return;
        };

        let key = data.primary_key().clone();
        let mut cache = self.cache.write();
        if !cache.contains_key(&key) {
            info!(entity = E::MODEL.entity_name, %key, "entity added to cache");
            cache.insert(key, entity.clone());
        }
    }
}
