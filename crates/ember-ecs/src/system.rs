//! The system contract.
//!
//! A [`System`] declares the component types it needs and an update routine.
//! Once registered with an [`Ecs`](crate::ecs::Ecs), it is invoked once per
//! tick with the set of entities whose containers hold every required type.
//!
//! Systems never own the world. Each call to [`System::update`] receives a
//! `&mut World` borrowed from the orchestrator for the duration of the call,
//! which is how a system reads and writes component data, creates entities,
//! and requests deletions.

use std::collections::BTreeSet;
use std::fmt;

use crate::component::ComponentSet;
use crate::entity::EntityId;
use crate::world::World;
use crate::EcsError;

/// The set of entities handed to a system each tick.
///
/// Ordered, so systems iterate entities in creation order.
pub type EntitySet = BTreeSet<EntityId>;

// ---------------------------------------------------------------------------
// SystemId
// ---------------------------------------------------------------------------

/// Handle for a registered system, assigned in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(pub(crate) u32);

impl SystemId {
    /// Position of the system in execution order.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "system#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// A unit of per-tick game logic.
pub trait System: 'static {
    /// Human-readable name used in logs and diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Component types an entity must hold to be passed to
    /// [`update`](Self::update).
    ///
    /// Read once, when the system is registered. The result is treated as
    /// fixed for the lifetime of the system.
    fn required_components(&self) -> ComponentSet;

    /// Run one tick of this system.
    ///
    /// `entities` is a snapshot of the system's cache taken right before the
    /// call. Structural changes made through `world` during the call update
    /// the live caches but not this snapshot. Entities deleted earlier in the
    /// same tick are still present here and still resolvable through `world`.
    ///
    /// # Errors
    ///
    /// Any error aborts the rest of the tick and is returned from
    /// [`Ecs::update`](crate::ecs::Ecs::update).
    fn update(&mut self, entities: &EntitySet, world: &mut World) -> Result<(), EcsError>;
}

// ---------------------------------------------------------------------------
// FnSystem
// ---------------------------------------------------------------------------

/// A [`System`] backed by a closure.
///
/// ```
/// use ember_ecs::prelude::*;
///
/// struct Health(u32);
///
/// let mut ecs = Ecs::new();
/// ecs.add_system(FnSystem::new("regen", component_set![Health], |entities, world| {
///     for &entity in entities {
///         world.get_component_mut::<Health>(entity)?.0 += 1;
///     }
///     Ok(())
/// }));
///
/// let e = ecs.create_entity();
/// ecs.add_component(e, Health(10)).unwrap();
/// ecs.tick().unwrap();
/// assert_eq!(ecs.get_components(e).unwrap().get::<Health>().unwrap().0, 11);
/// ```
pub struct FnSystem<F> {
    name: String,
    required: ComponentSet,
    func: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(&EntitySet, &mut World) -> Result<(), EcsError> + 'static,
{
    /// Wrap `func` as a system named `name` requiring `required`.
    pub fn new(name: impl Into<String>, required: ComponentSet, func: F) -> Self {
        Self {
            name: name.into(),
            required,
            func,
        }
    }
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&EntitySet, &mut World) -> Result<(), EcsError> + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn required_components(&self) -> ComponentSet {
        self.required.clone()
    }

    fn update(&mut self, entities: &EntitySet, world: &mut World) -> Result<(), EcsError> {
        (self.func)(entities, world)
    }
}

impl<F> fmt::Debug for FnSystem<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSystem")
            .field("name", &self.name)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
