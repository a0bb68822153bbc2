//! The orchestrator: ordered systems over a [`World`].
//!
//! Each call to [`Ecs::update`] is one tick:
//!
//! 1. Every registered system runs once, in registration order, with a
//!    snapshot of its cached entity set and mutable access to the world.
//! 2. Entities marked with [`delete_entity`](Ecs::delete_entity) during the
//!    tick are hard-deleted from the registry and from every cache.
//! 3. The tick counter advances.
//!
//! Because deletion waits for step 2, a system later in the tick still sees
//! (and can still read) an entity that an earlier system deleted.
//!
//! # Example
//!
//! ```
//! use ember_ecs::prelude::*;
//!
//! struct Lifetime(u32);
//!
//! let mut ecs = Ecs::new();
//! ecs.add_system(FnSystem::new("expire", component_set![Lifetime], |entities, world| {
//!     for &entity in entities {
//!         let left = world.get_component_mut::<Lifetime>(entity)?;
//!         if left.0 == 0 {
//!             world.delete_entity(entity);
//!         } else {
//!             left.0 -= 1;
//!         }
//!     }
//!     Ok(())
//! }));
//!
//! let e = ecs.create_entity();
//! ecs.add_component(e, Lifetime(1)).unwrap();
//! ecs.tick().unwrap();
//! assert!(ecs.get_components(e).is_ok());
//! ecs.tick().unwrap();
//! assert!(ecs.get_components(e).is_err());
//! ```

use tracing::{debug, warn};

use crate::component::{Component, ComponentTypeId};
use crate::container::ComponentContainer;
use crate::entity::EntityId;
use crate::system::{EntitySet, System, SystemId};
use crate::world::{ComponentBundle, World};
use crate::EcsError;

/// Logical ticks per second the engine is tuned for.
pub const TARGET_UPDATES_PER_SECOND: u32 = 30;

/// Duration of one logical tick in milliseconds (`1000 / 30`).
pub const DEFAULT_TIMESTEP_MS: f64 = 1000.0 / TARGET_UPDATES_PER_SECOND as f64;

// ---------------------------------------------------------------------------
// RegisteredSystem
// ---------------------------------------------------------------------------

/// A system together with the handle of its cache slot.
struct RegisteredSystem {
    id: SystemId,
    system: Box<dyn System>,
}

// ---------------------------------------------------------------------------
// Ecs
// ---------------------------------------------------------------------------

/// Entity-component-system orchestrator.
///
/// Owns the [`World`] and the ordered list of systems, and drives the
/// per-tick protocol. All entity operations are also available directly on
/// the world, which is what systems use during their update.
pub struct Ecs {
    world: World,
    /// Systems in execution (registration) order.
    systems: Vec<RegisteredSystem>,
    /// Number of ticks completed.
    tick_counter: u64,
}

impl std::fmt::Debug for Ecs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ecs")
            .field("world", &self.world)
            .field("systems", &self.system_names())
            .field("tick_counter", &self.tick_counter)
            .finish()
    }
}

impl Ecs {
    /// Create an orchestrator with an empty world and no systems.
    pub fn new() -> Self {
        Self {
            world: World::new(),
            systems: Vec::new(),
            tick_counter: 0,
        }
    }

    // -- entities -----------------------------------------------------------

    /// See [`World::create_entity`].
    pub fn create_entity(&mut self) -> EntityId {
        self.world.create_entity()
    }

    /// See [`World::delete_entity`].
    pub fn delete_entity(&mut self, entity: EntityId) {
        self.world.delete_entity(entity);
    }

    /// See [`World::add_component`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity does not exist.
    pub fn add_component<T: Component>(
        &mut self,
        entity: EntityId,
        component: T,
    ) -> Result<(), EcsError> {
        self.world.add_component(entity, component)
    }

    /// See [`World::add_components`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity does not exist.
    pub fn add_components(
        &mut self,
        entity: EntityId,
        bundle: ComponentBundle,
    ) -> Result<(), EcsError> {
        self.world.add_components(entity, bundle)
    }

    /// See [`World::remove_component`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity does not exist.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Result<(), EcsError> {
        self.world.remove_component::<T>(entity)
    }

    /// See [`World::remove_component_by_id`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity does not exist.
    pub fn remove_component_by_id(
        &mut self,
        entity: EntityId,
        component: ComponentTypeId,
    ) -> Result<(), EcsError> {
        self.world.remove_component_by_id(entity, component)
    }

    /// See [`World::get_components`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity does not exist.
    pub fn get_components(&self, entity: EntityId) -> Result<&ComponentContainer, EcsError> {
        self.world.get_components(entity)
    }

    /// See [`World::get_component_mut`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity does not exist and
    /// [`EcsError::MissingComponent`] if it holds no `T`.
    pub fn get_component_mut<T: Component>(
        &mut self,
        entity: EntityId,
    ) -> Result<&mut T, EcsError> {
        self.world.get_component_mut::<T>(entity)
    }

    // -- systems ------------------------------------------------------------

    /// Register a system to run every tick, after all previously registered
    /// systems.
    ///
    /// The system's required set is read now and its cache is immediately
    /// filled with every existing matching entity.
    pub fn add_system<S: System>(&mut self, system: S) -> SystemId {
        self.add_boxed_system(Box::new(system))
    }

    /// Register an already boxed system. See [`add_system`](Self::add_system).
    pub fn add_boxed_system(&mut self, system: Box<dyn System>) -> SystemId {
        let required = system.required_components();
        let id = self.world.register_system_cache(required);
        debug!(
            system = system.name(),
            %id,
            matched = self.world.cached_entities(id).map_or(0, EntitySet::len),
            "registered system"
        );
        self.systems.push(RegisteredSystem { id, system });
        id
    }

    // -- tick ---------------------------------------------------------------

    /// Execute one tick.
    ///
    /// `timestep_ms` is not interpreted; it is exposed to systems through
    /// [`World::timestep_ms`].
    ///
    /// # Errors
    ///
    /// The first error returned by a system aborts the tick: later systems do
    /// not run, pending deletions are kept for the next completed tick, and
    /// the tick counter does not advance.
    pub fn update(&mut self, timestep_ms: f64) -> Result<(), EcsError> {
        self.world.set_timestep(timestep_ms);

        // Phase 1: run all systems in registration order.
        for registered in &mut self.systems {
            let entities = self.world.snapshot_cache(registered.id)?;
            if let Err(err) = registered.system.update(&entities, &mut self.world) {
                warn!(
                    system = registered.system.name(),
                    tick = self.tick_counter,
                    error = %err,
                    "system failed, aborting tick"
                );
                return Err(err);
            }
        }

        // Phase 2: hard-delete everything marked during the tick.
        let purged = self.world.flush_deletions();
        if purged > 0 {
            debug!(tick = self.tick_counter, purged, "deleted entities");
        }

        // Phase 3: advance the tick counter.
        self.tick_counter += 1;
        Ok(())
    }

    /// [`update`](Self::update) with [`DEFAULT_TIMESTEP_MS`].
    ///
    /// # Errors
    ///
    /// See [`update`](Self::update).
    pub fn tick(&mut self) -> Result<(), EcsError> {
        self.update(DEFAULT_TIMESTEP_MS)
    }

    // -- accessors ----------------------------------------------------------

    /// Read-only access to the world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for setup outside of a tick.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The cached entity set of a registered system.
    pub fn cached_entities(&self, system: SystemId) -> Option<&EntitySet> {
        self.world.cached_entities(system)
    }

    /// Number of completed ticks.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// The number of registered systems.
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// The names of all registered systems, in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.system.name()).collect()
    }
}

impl Default for Ecs {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
