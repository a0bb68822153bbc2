//! Entity registry, per-system caches, and deferred deletion.
//!
//! The [`World`] is the data half of the orchestrator. It owns every entity's
//! [`ComponentContainer`], one cached entity set per registered system, and
//! the set of entities waiting to be hard-deleted at the end of the tick.
//!
//! Every structural change (creating an entity, adding or removing a
//! component) re-evaluates that one entity against every system's required
//! set, so a cache is always exact as of the last structural change.
//! Mutating component fields through
//! [`get_component_mut`](World::get_component_mut) never touches caches.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::component::{Component, ComponentSet, ComponentTypeId};
use crate::container::ComponentContainer;
use crate::entity::{EntityAllocator, EntityId};
use crate::system::{EntitySet, SystemId};
use crate::EcsError;

// ---------------------------------------------------------------------------
// ComponentBundle
// ---------------------------------------------------------------------------

/// Several components to attach to one entity in a single structural change.
///
/// Usage:
/// ```
/// use ember_ecs::prelude::*;
///
/// struct Position { x: f32, y: f32 }
/// struct Health(u32);
///
/// let mut ecs = Ecs::new();
/// let e = ecs.create_entity();
/// let bundle = ComponentBundle::new()
///     .with(Position { x: 0.0, y: 0.0 })
///     .with(Health(100));
/// ecs.add_components(e, bundle).unwrap();
/// assert_eq!(ecs.get_components(e).unwrap().len(), 2);
/// ```
#[derive(Default)]
pub struct ComponentBundle {
    entries: Vec<(ComponentTypeId, Box<dyn Any>)>,
}

impl ComponentBundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component to the bundle. A later component of the same type
    /// replaces an earlier one.
    pub fn add<T: Component>(&mut self, value: T) {
        let id = ComponentTypeId::of::<T>();
        let boxed: Box<dyn Any> = Box::new(value);
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = boxed,
            None => self.entries.push((id, boxed)),
        }
    }

    /// Builder-style [`add`](Self::add).
    #[must_use]
    pub fn with<T: Component>(mut self, value: T) -> Self {
        self.add(value);
        self
    }

    /// Number of distinct component types in the bundle.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bundle holds no components.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The component types carried by this bundle.
    pub fn component_types(&self) -> ComponentSet {
        self.entries.iter().map(|(id, _)| *id).collect()
    }
}

impl std::fmt::Debug for ComponentBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(id, _)| id))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SystemCache
// ---------------------------------------------------------------------------

/// The entities currently matching one system's required set.
#[derive(Debug)]
struct SystemCache {
    required: ComponentSet,
    entities: EntitySet,
}

impl SystemCache {
    fn new(required: ComponentSet) -> Self {
        Self {
            required,
            entities: EntitySet::new(),
        }
    }

    /// Re-evaluate `entity` against the required set. Returns whether it
    /// matches.
    fn sync(&mut self, entity: EntityId, container: &ComponentContainer) -> bool {
        if container.has_all(&self.required) {
            self.entities.insert(entity);
            true
        } else {
            self.entities.remove(&entity);
            false
        }
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Entities, their components, and the per-system caches over them.
///
/// A `World` is normally owned by an [`Ecs`](crate::ecs::Ecs) and lent to
/// each system during [`Ecs::update`](crate::ecs::Ecs::update).
pub struct World {
    /// Entity ID allocator.
    allocator: EntityAllocator,
    /// Live entities and their components.
    entities: BTreeMap<EntityId, ComponentContainer>,
    /// One cache per registered system, indexed by `SystemId`.
    caches: Vec<SystemCache>,
    /// Soft-deleted entities awaiting the end of the tick.
    pending_deletion: BTreeSet<EntityId>,
    /// Timestep passed to the current (or most recent) tick.
    timestep_ms: f64,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entity_count", &self.entities.len())
            .field("system_caches", &self.caches.len())
            .field("pending_deletion", &self.pending_deletion.len())
            .finish()
    }
}

impl World {
    /// Create a new, empty world.
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            entities: BTreeMap::new(),
            caches: Vec::new(),
            pending_deletion: BTreeSet::new(),
            timestep_ms: 0.0,
        }
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Allocate a fresh entity with no components.
    ///
    /// The new entity immediately joins the cache of every system whose
    /// required set is empty.
    pub fn create_entity(&mut self) -> EntityId {
        let entity = self.allocator.allocate();
        let container = ComponentContainer::new();
        for cache in &mut self.caches {
            cache.sync(entity, &container);
        }
        self.entities.insert(entity, container);
        entity
    }

    /// Mark `entity` for deletion at the end of the current tick.
    ///
    /// Idempotent. Existence is not checked: marking an unknown or already
    /// purged id is harmless and the flush skips it. Until the tick ends the
    /// entity stays fully visible.
    pub fn delete_entity(&mut self, entity: EntityId) {
        self.pending_deletion.insert(entity);
    }

    /// Hard-delete every entity marked by [`delete_entity`](Self::delete_entity),
    /// purging it from the registry and from every system cache.
    ///
    /// Returns the number of entities actually removed.
    pub(crate) fn flush_deletions(&mut self) -> usize {
        let mut removed = 0;
        for entity in std::mem::take(&mut self.pending_deletion) {
            if self.entities.remove(&entity).is_some() {
                removed += 1;
            }
            for cache in &mut self.caches {
                cache.entities.remove(&entity);
            }
        }
        removed
    }

    // -- structural mutation ------------------------------------------------

    /// Attach `component` to `entity`, replacing any component of the same
    /// type, then refresh the entity's system memberships.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity does not exist; the
    /// world is left unchanged.
    pub fn add_component<T: Component>(
        &mut self,
        entity: EntityId,
        component: T,
    ) -> Result<(), EcsError> {
        self.container_mut(entity)?.insert(component);
        self.refresh_entity_caches(entity)
    }

    /// Attach every component in `bundle` to `entity`, then refresh the
    /// entity's system memberships once.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity does not exist; the
    /// world is left unchanged.
    pub fn add_components(
        &mut self,
        entity: EntityId,
        bundle: ComponentBundle,
    ) -> Result<(), EcsError> {
        let container = self.container_mut(entity)?;
        for (id, component) in bundle.entries {
            container.insert_boxed(id, component);
        }
        self.refresh_entity_caches(entity)
    }

    /// Remove the `T` component from `entity` (no-op if absent), then refresh
    /// the entity's system memberships.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity does not exist.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Result<(), EcsError> {
        self.remove_component_by_id(entity, ComponentTypeId::of::<T>())
    }

    /// Untyped form of [`remove_component`](Self::remove_component).
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity does not exist.
    pub fn remove_component_by_id(
        &mut self,
        entity: EntityId,
        component: ComponentTypeId,
    ) -> Result<(), EcsError> {
        self.container_mut(entity)?.remove(component);
        self.refresh_entity_caches(entity)
    }

    // -- component access ---------------------------------------------------

    /// The components of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity was never created or
    /// has already been hard-deleted.
    pub fn get_components(&self, entity: EntityId) -> Result<&ComponentContainer, EcsError> {
        self.entities
            .get(&entity)
            .ok_or(EcsError::EntityNotFound(entity))
    }

    /// Mutably borrow the `T` component of `entity`, for editing field values
    /// in place.
    ///
    /// Only the value is reachable, never the container, so which systems
    /// match the entity cannot change here.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity does not exist and
    /// [`EcsError::MissingComponent`] if it holds no `T`.
    pub fn get_component_mut<T: Component>(
        &mut self,
        entity: EntityId,
    ) -> Result<&mut T, EcsError> {
        self.container_mut(entity)?.fetch_mut::<T>()
    }

    fn container_mut(&mut self, entity: EntityId) -> Result<&mut ComponentContainer, EcsError> {
        self.entities
            .get_mut(&entity)
            .ok_or(EcsError::EntityNotFound(entity))
    }

    // -- inspection ---------------------------------------------------------

    /// Whether `entity` is currently in the registry (including entities
    /// marked for deletion but not yet purged).
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Whether `entity` has been marked for deletion this tick.
    pub fn is_pending_deletion(&self, entity: EntityId) -> bool {
        self.pending_deletion.contains(&entity)
    }

    /// Number of entities in the registry.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of entities marked for deletion.
    pub fn pending_deletion_count(&self) -> usize {
        self.pending_deletion.len()
    }

    /// Iterate all live entities in creation order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// The timestep, in milliseconds, passed to the tick currently running
    /// (or the last one). Advisory only.
    pub fn timestep_ms(&self) -> f64 {
        self.timestep_ms
    }

    /// The cached entity set for `system`, if it is registered.
    pub fn cached_entities(&self, system: SystemId) -> Option<&EntitySet> {
        self.caches.get(system.index()).map(|cache| &cache.entities)
    }

    // -- system caches ------------------------------------------------------

    /// Create a cache slot for a new system and back-fill it against every
    /// existing entity.
    pub(crate) fn register_system_cache(&mut self, required: ComponentSet) -> SystemId {
        let id = SystemId(self.caches.len() as u32);
        let mut cache = SystemCache::new(required);
        for (&entity, container) in &self.entities {
            cache.sync(entity, container);
        }
        self.caches.push(cache);
        id
    }

    /// A copy of `system`'s cache, handed to the system's update call.
    pub(crate) fn snapshot_cache(&self, system: SystemId) -> Result<EntitySet, EcsError> {
        self.cached_entities(system)
            .cloned()
            .ok_or(EcsError::SystemCacheInconsistency(system))
    }

    pub(crate) fn set_timestep(&mut self, timestep_ms: f64) {
        self.timestep_ms = timestep_ms;
    }

    /// Re-evaluate `entity` against every registered system.
    fn refresh_entity_caches(&mut self, entity: EntityId) -> Result<(), EcsError> {
        for index in 0..self.caches.len() {
            self.refresh_system_cache(SystemId(index as u32), entity)?;
        }
        Ok(())
    }

    /// Re-evaluate whether `system` should see `entity`.
    fn refresh_system_cache(&mut self, system: SystemId, entity: EntityId) -> Result<(), EcsError> {
        let container = self
            .entities
            .get(&entity)
            .ok_or(EcsError::EntityNotFound(entity))?;
        let cache = self
            .caches
            .get_mut(system.index())
            .ok_or(EcsError::SystemCacheInconsistency(system))?;
        let matched = cache.sync(entity, container);
        trace!(%entity, %system, matched, "refreshed system cache");
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
