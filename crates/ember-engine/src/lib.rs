//! Ember Engine -- fixed-timestep driver, input, and view hooks for
//! [`ember_ecs`].
//!
//! The ECS knows nothing about wall-clock time. This crate supplies the loop
//! that turns real elapsed time into a deterministic sequence of
//! `Ecs::update(fixed_dt_ms)` calls, plus the host-side pieces a game needs
//! around it: keyboard state shared with systems and a drawing hook.
//!
//! # Quick Start
//!
//! ```
//! use ember_engine::prelude::*;
//!
//! struct Lifetime(u32);
//!
//! let mut ecs = Ecs::new();
//! ecs.add_system(FnSystem::new("expire", component_set![Lifetime], |entities, world| {
//!     for &e in entities {
//!         let life = world.get_component_mut::<Lifetime>(e)?;
//!         life.0 = life.0.saturating_sub(1);
//!         if life.0 == 0 {
//!             world.delete_entity(e);
//!         }
//!     }
//!     Ok(())
//! }));
//! let e = ecs.create_entity();
//! ecs.add_component(e, Lifetime(3)).unwrap();
//!
//! let config = TickConfig { headless: true, ..Default::default() };
//! let mut game = GameLoop::new(ecs, config);
//! game.run_ticks(3).unwrap();
//! assert!(!game.ecs().world().is_alive(e));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod input;
pub mod tick;
pub mod view;

/// Re-export the ECS crate for convenience.
pub use ember_ecs;

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use ember_ecs::prelude::*;

    pub use crate::input::{InputState, PlayerInputSystem};
    pub use crate::tick::{ConfigError, FrameDiagnostics, GameLoop, TickConfig};
    pub use crate::view::{TraceView, View};
}
