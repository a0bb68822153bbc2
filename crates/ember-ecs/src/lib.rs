//! Ember ECS -- a minimal, deterministic entity-component-system runtime.
//!
//! Entities are opaque ids. Each owns a [`ComponentContainer`](container::ComponentContainer)
//! holding at most one component per Rust type. Systems declare the
//! component types they need and run once per tick, in registration order,
//! over a cached set of matching entities. Caches are refreshed eagerly on
//! every structural change, and deletions are deferred to the end of the
//! tick.
//!
//! # Quick Start
//!
//! ```
//! use ember_ecs::prelude::*;
//!
//! #[derive(Debug, PartialEq)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Debug, PartialEq)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! struct Movement;
//!
//! impl System for Movement {
//!     fn required_components(&self) -> ComponentSet {
//!         component_set![Position, Velocity]
//!     }
//!
//!     fn update(&mut self, entities: &EntitySet, world: &mut World) -> Result<(), EcsError> {
//!         for &entity in entities {
//!             let (dx, dy) = {
//!                 let v = world.get_components(entity)?.fetch::<Velocity>()?;
//!                 (v.dx, v.dy)
//!             };
//!             let p = world.get_component_mut::<Position>(entity)?;
//!             p.x += dx;
//!             p.y += dy;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut ecs = Ecs::new();
//! ecs.add_system(Movement);
//!
//! let entity = ecs.create_entity();
//! let bundle = ComponentBundle::new()
//!     .with(Position { x: 0.0, y: 0.0 })
//!     .with(Velocity { dx: 1.0, dy: 2.0 });
//! ecs.add_components(entity, bundle).unwrap();
//!
//! ecs.tick().unwrap();
//! assert_eq!(
//!     ecs.get_components(entity).unwrap().get::<Position>(),
//!     Some(&Position { x: 1.0, y: 2.0 })
//! );
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod container;
pub mod ecs;
pub mod entity;
pub mod system;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity was never created or has already been hard-deleted.
    #[error("entity {0} does not exist (never created or already deleted)")]
    EntityNotFound(entity::EntityId),

    /// A cache refresh targeted a system with no cache slot. Indicates a bug
    /// in the orchestrator, not in user code.
    #[error("no entity cache for {0}; system registry is out of sync")]
    SystemCacheInconsistency(system::SystemId),

    /// A typed component fetch found no component of that type.
    #[error("entity has no '{component}' component")]
    MissingComponent {
        /// Short type name of the missing component.
        component: &'static str,
    },

    /// A system reported a failure of its own.
    #[error("system '{system}' failed: {message}")]
    SystemFailed {
        /// Name of the failing system.
        system: String,
        /// What went wrong.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{Component, ComponentSet, ComponentTypeId};
    pub use crate::component_set;
    pub use crate::container::ComponentContainer;
    pub use crate::ecs::{Ecs, DEFAULT_TIMESTEP_MS, TARGET_UPDATES_PER_SECOND};
    pub use crate::entity::EntityId;
    pub use crate::system::{EntitySet, FnSystem, System, SystemId};
    pub use crate::world::{ComponentBundle, World};
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    // -- test component types -----------------------------------------------

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: i64,
        y: i64,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Health(u32);

    #[derive(Debug, Clone, PartialEq)]
    struct NotUsed(String);

    // -- test systems -------------------------------------------------------

    /// What a recording system observed.
    #[derive(Debug, Default)]
    struct Seen {
        last: Option<EntitySet>,
        times_called: u32,
    }

    /// Records the entities it is handed each tick.
    struct Recorder {
        required: ComponentSet,
        seen: Rc<RefCell<Seen>>,
    }

    impl Recorder {
        fn new(required: ComponentSet) -> (Self, Rc<RefCell<Seen>>) {
            let seen = Rc::new(RefCell::new(Seen::default()));
            (
                Self {
                    required,
                    seen: Rc::clone(&seen),
                },
                seen,
            )
        }
    }

    impl System for Recorder {
        fn required_components(&self) -> ComponentSet {
            self.required.clone()
        }

        fn update(&mut self, entities: &EntitySet, _world: &mut World) -> Result<(), EcsError> {
            let mut seen = self.seen.borrow_mut();
            seen.last = Some(entities.clone());
            seen.times_called += 1;
            Ok(())
        }
    }

    /// Moves every positioned entity by (+1, -1) and records what it saw.
    struct Adding {
        seen: Rc<RefCell<Option<EntitySet>>>,
    }

    impl Adding {
        fn new() -> (Self, Rc<RefCell<Option<EntitySet>>>) {
            let seen = Rc::new(RefCell::new(None));
            (
                Self {
                    seen: Rc::clone(&seen),
                },
                seen,
            )
        }
    }

    impl System for Adding {
        fn required_components(&self) -> ComponentSet {
            component_set![Position]
        }

        fn update(&mut self, entities: &EntitySet, world: &mut World) -> Result<(), EcsError> {
            *self.seen.borrow_mut() = Some(entities.clone());
            for &entity in entities {
                let p = world.get_component_mut::<Position>(entity)?;
                p.x += 1;
                p.y -= 1;
            }
            Ok(())
        }
    }

    /// Doubles every position.
    struct Multiplying;

    impl System for Multiplying {
        fn required_components(&self) -> ComponentSet {
            component_set![Position]
        }

        fn update(&mut self, entities: &EntitySet, world: &mut World) -> Result<(), EcsError> {
            for &entity in entities {
                let p = world.get_component_mut::<Position>(entity)?;
                p.x *= 2;
                p.y *= 2;
            }
            Ok(())
        }
    }

    /// Requests deletion of every positioned entity.
    struct DeletePositioned;

    impl System for DeletePositioned {
        fn required_components(&self) -> ComponentSet {
            component_set![Position]
        }

        fn update(&mut self, entities: &EntitySet, world: &mut World) -> Result<(), EcsError> {
            for &entity in entities {
                world.delete_entity(entity);
            }
            Ok(())
        }
    }

    fn set<const N: usize>(entities: [EntityId; N]) -> Option<EntitySet> {
        Some(EntitySet::from(entities))
    }

    fn position_of(ecs: &Ecs, entity: EntityId) -> Option<&Position> {
        ecs.get_components(entity).unwrap().get::<Position>()
    }

    // -- components ---------------------------------------------------------

    #[test]
    fn add_entities_with_components() {
        let mut ecs = Ecs::new();
        let e = ecs.create_entity();
        assert!(!ecs.get_components(e).unwrap().has::<Position>());

        let bundle = ComponentBundle::new()
            .with(Position { x: 0, y: 0 })
            .with(Health(100));
        ecs.add_components(e, bundle).unwrap();

        let components = ecs.get_components(e).unwrap();
        assert!(components.has::<Position>());
        assert!(components.has::<Health>());
        assert!(!components.has::<NotUsed>());
        assert_eq!(components.get::<Position>(), Some(&Position { x: 0, y: 0 }));
        assert_eq!(components.get::<Health>(), Some(&Health(100)));
    }

    #[test]
    fn remove_components_from_entity() {
        let mut ecs = Ecs::new();
        let e = ecs.create_entity();
        ecs.add_component(e, Position { x: 0, y: 0 }).unwrap();
        ecs.add_component(e, Health(100)).unwrap();

        ecs.remove_component::<Position>(e).unwrap();
        let components = ecs.get_components(e).unwrap();
        assert!(!components.has::<Position>());
        assert!(components.has::<Health>());

        // Removing an absent component is a no-op.
        ecs.remove_component::<NotUsed>(e).unwrap();
    }

    // -- system caches ------------------------------------------------------

    #[test]
    fn systems_registered_late_pick_up_existing_entities() {
        let mut ecs = Ecs::new();
        let e1 = ecs.create_entity();
        let bundle = ComponentBundle::new()
            .with(Position { x: 0, y: 0 })
            .with(Health(100));
        ecs.add_components(e1, bundle).unwrap();
        let e2 = ecs.create_entity();
        ecs.add_component(e2, Position { x: 0, y: 0 }).unwrap();

        let (position_sys, position_seen) = Recorder::new(component_set![Position]);
        let (health_sys, health_seen) = Recorder::new(component_set![Health]);
        let (both_sys, both_seen) = Recorder::new(component_set![Position, Health]);
        let (empty_sys, empty_seen) = Recorder::new(component_set![]);
        let (_unused_sys, unused_seen) = Recorder::new(component_set![NotUsed]);

        let position_id = ecs.add_system(position_sys);
        ecs.add_system(health_sys);
        ecs.add_system(both_sys);
        ecs.add_system(empty_sys);

        // Caches are filled at registration, before any tick.
        assert_eq!(ecs.cached_entities(position_id).cloned(), set([e1, e2]));

        ecs.tick().unwrap();

        assert_eq!(position_seen.borrow().last, set([e1, e2]));
        assert_eq!(health_seen.borrow().last, set([e1]));
        assert_eq!(both_seen.borrow().last, set([e1]));
        assert_eq!(empty_seen.borrow().last, set([e1, e2]));
        assert_eq!(unused_seen.borrow().last, None);
    }

    #[test]
    fn entities_added_after_registration_are_picked_up() {
        let mut ecs = Ecs::new();
        let (position_sys, position_seen) = Recorder::new(component_set![Position]);
        let (health_sys, health_seen) = Recorder::new(component_set![Health]);
        let (both_sys, both_seen) = Recorder::new(component_set![Position, Health]);
        let (empty_sys, empty_seen) = Recorder::new(component_set![]);
        ecs.add_system(position_sys);
        ecs.add_system(health_sys);
        ecs.add_system(both_sys);
        ecs.add_system(empty_sys);

        let e1 = ecs.create_entity();
        let bundle = ComponentBundle::new()
            .with(Position { x: 0, y: 0 })
            .with(Health(100));
        ecs.add_components(e1, bundle).unwrap();
        let e2 = ecs.create_entity();
        ecs.add_component(e2, Position { x: 0, y: 0 }).unwrap();

        ecs.tick().unwrap();
        assert_eq!(position_seen.borrow().last, set([e1, e2]));
        assert_eq!(health_seen.borrow().last, set([e1]));
        assert_eq!(both_seen.borrow().last, set([e1]));
        assert_eq!(empty_seen.borrow().last, set([e1, e2]));

        ecs.add_component(e2, Health(100)).unwrap();
        ecs.tick().unwrap();
        assert_eq!(position_seen.borrow().last, set([e1, e2]));
        assert_eq!(health_seen.borrow().last, set([e1, e2]));
        assert_eq!(both_seen.borrow().last, set([e1, e2]));
        assert_eq!(empty_seen.borrow().last, set([e1, e2]));
    }

    #[test]
    fn removing_a_component_only_affects_systems_requiring_it() {
        let mut ecs = Ecs::new();
        let position_id = ecs.add_system(Recorder::new(component_set![Position]).0);
        let health_id = ecs.add_system(Recorder::new(component_set![Health]).0);

        let e = ecs.create_entity();
        let bundle = ComponentBundle::new()
            .with(Position { x: 0, y: 0 })
            .with(Health(1));
        ecs.add_components(e, bundle).unwrap();

        ecs.remove_component::<Health>(e).unwrap();
        assert!(ecs.cached_entities(position_id).unwrap().contains(&e));
        assert!(!ecs.cached_entities(health_id).unwrap().contains(&e));
    }

    // -- update protocol ----------------------------------------------------

    #[test]
    fn systems_modify_components() {
        let mut ecs = Ecs::new();
        let e1 = ecs.create_entity();
        ecs.add_component(e1, Position { x: 0, y: 0 }).unwrap();
        let e2 = ecs.create_entity();
        ecs.add_component(e2, Position { x: 5, y: 8 }).unwrap();
        ecs.add_system(Adding::new().0);

        ecs.tick().unwrap();
        assert_eq!(position_of(&ecs, e1), Some(&Position { x: 1, y: -1 }));
        assert_eq!(position_of(&ecs, e2), Some(&Position { x: 6, y: 7 }));

        ecs.tick().unwrap();
        assert_eq!(position_of(&ecs, e1), Some(&Position { x: 2, y: -2 }));
        assert_eq!(position_of(&ecs, e2), Some(&Position { x: 7, y: 6 }));
    }

    #[test]
    fn systems_run_once_per_update() {
        let mut ecs = Ecs::new();
        let (first, seen) = Recorder::new(component_set![]);
        ecs.add_system(first);
        ecs.add_system(Recorder::new(component_set![]).0);
        ecs.add_system(Recorder::new(component_set![]).0);

        for expected in 1..=3 {
            ecs.tick().unwrap();
            assert_eq!(seen.borrow().times_called, expected);
        }
    }

    #[test]
    fn systems_run_in_registration_order() {
        let mut ecs = Ecs::new();
        ecs.add_system(Adding::new().0);
        ecs.add_system(Multiplying);
        ecs.add_system(Adding::new().0);

        let e = ecs.create_entity();
        ecs.add_component(e, Position { x: 0, y: 0 }).unwrap();

        // add 1, multiply by 2, add 1
        ecs.tick().unwrap();
        assert_eq!(position_of(&ecs, e), Some(&Position { x: 3, y: -3 }));

        ecs.tick().unwrap();
        assert_eq!(position_of(&ecs, e), Some(&Position { x: 9, y: -9 }));
    }

    // -- deferred deletion --------------------------------------------------

    #[test]
    fn marked_entities_are_removed_at_end_of_update() {
        let mut ecs = Ecs::new();
        let e1 = ecs.create_entity();
        ecs.add_component(e1, Position { x: 0, y: 0 }).unwrap();
        let e2 = ecs.create_entity();
        ecs.add_component(e2, Position { x: 5, y: 8 }).unwrap();

        ecs.tick().unwrap();
        assert!(ecs.get_components(e1).is_ok());
        assert!(ecs.get_components(e2).is_ok());

        ecs.delete_entity(e1);
        // Still retrievable until the tick ends.
        assert!(ecs.get_components(e1).is_ok());
        ecs.tick().unwrap();
        assert!(matches!(
            ecs.get_components(e1),
            Err(EcsError::EntityNotFound(_))
        ));
        assert!(ecs.get_components(e2).is_ok());

        let e3 = ecs.create_entity();
        ecs.add_component(e3, Position { x: 1, y: 1 }).unwrap();
        let e4 = ecs.create_entity();
        ecs.add_component(e4, Health(100)).unwrap();
        ecs.add_system(DeletePositioned);
        ecs.tick().unwrap();

        assert!(ecs.get_components(e1).is_err());
        assert!(ecs.get_components(e2).is_err());
        assert!(ecs.get_components(e3).is_err());
        assert!(ecs.get_components(e4).is_ok());
    }

    #[test]
    fn deleted_entities_still_reach_later_systems_in_same_tick() {
        let mut ecs = Ecs::new();
        ecs.add_system(DeletePositioned);
        let (adding, adding_seen) = Adding::new();
        let adding_id = ecs.add_system(adding);
        let (recorder, recorder_seen) = Recorder::new(component_set![Position]);
        ecs.add_system(recorder);

        let e = ecs.create_entity();
        ecs.add_component(e, Position { x: 0, y: 0 }).unwrap();

        ecs.tick().unwrap();

        assert!(ecs.get_components(e).is_err());
        assert_eq!(*adding_seen.borrow(), set([e]));
        assert_eq!(recorder_seen.borrow().last, set([e]));
        assert!(ecs.cached_entities(adding_id).unwrap().is_empty());

        // Next tick nobody sees it.
        ecs.tick().unwrap();
        assert_eq!(*adding_seen.borrow(), set([]));
        assert_eq!(recorder_seen.borrow().last, set([]));
    }

    #[test]
    fn deleting_twice_or_unknown_is_harmless() {
        let mut ecs = Ecs::new();
        let e = ecs.create_entity();
        ecs.delete_entity(e);
        ecs.delete_entity(e);
        ecs.delete_entity(EntityId::from_raw(9_999));
        ecs.tick().unwrap();
        ecs.delete_entity(e);
        ecs.tick().unwrap();
        assert_eq!(ecs.world().entity_count(), 0);
    }

    #[test]
    fn structural_ops_on_deleted_entity_fail() {
        let mut ecs = Ecs::new();
        let e = ecs.create_entity();
        ecs.delete_entity(e);
        ecs.tick().unwrap();

        assert!(matches!(
            ecs.add_component(e, Health(1)),
            Err(EcsError::EntityNotFound(_))
        ));
        assert!(matches!(
            ecs.remove_component::<Health>(e),
            Err(EcsError::EntityNotFound(_))
        ));
    }
}
