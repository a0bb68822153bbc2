//! Keyboard input shared between the host and systems.
//!
//! The host feeds key events into an [`InputState`] between frames. Systems
//! hold a clone of the same handle and read it during ticks. Everything runs
//! on one thread, so the handle is an `Rc<RefCell<..>>`.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use ember_ecs::component::ComponentSet;
use ember_ecs::system::{EntitySet, System};
use ember_ecs::world::World;
use ember_ecs::EcsError;
use tracing::debug;

#[derive(Debug, Default)]
struct InputBuffer {
    /// Keys currently held down.
    pressed: BTreeSet<String>,
    /// Keys seen by the last [`PlayerInputSystem`] tick.
    latched: BTreeSet<String>,
}

/// Shared handle to the set of currently pressed keys.
///
/// Cloning the handle shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    inner: Rc<RefCell<InputBuffer>>,
}

impl InputState {
    /// Create a handle with no keys pressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press. Repeated presses of a held key are no-ops.
    pub fn key_down(&self, key: impl Into<String>) {
        self.inner.borrow_mut().pressed.insert(key.into());
    }

    /// Record a key release. Releasing a key that is not held is a no-op.
    pub fn key_up(&self, key: &str) {
        self.inner.borrow_mut().pressed.remove(key);
    }

    /// Whether `key` is currently held.
    pub fn is_pressed(&self, key: &str) -> bool {
        self.inner.borrow().pressed.contains(key)
    }

    /// Keys currently held, in sorted order.
    pub fn pressed(&self) -> Vec<String> {
        self.inner.borrow().pressed.iter().cloned().collect()
    }

    /// Keys that were held when [`PlayerInputSystem`] last ran.
    pub fn latched(&self) -> Vec<String> {
        self.inner.borrow().latched.iter().cloned().collect()
    }

    /// Release every key.
    pub fn clear(&self) {
        self.inner.borrow_mut().pressed.clear();
    }

    fn latch(&self) -> Vec<String> {
        let mut buffer = self.inner.borrow_mut();
        buffer.latched = buffer.pressed.clone();
        buffer.latched.iter().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// PlayerInputSystem
// ---------------------------------------------------------------------------

/// Samples the [`InputState`] once per tick.
///
/// Requires no components, so it sees every live entity. It does not touch
/// the world; it latches the pressed keys so later systems and the host see
/// a per-tick view of the input.
#[derive(Debug, Clone)]
pub struct PlayerInputSystem {
    input: InputState,
}

impl PlayerInputSystem {
    /// Create the system around a shared input handle.
    pub fn new(input: InputState) -> Self {
        Self { input }
    }
}

impl System for PlayerInputSystem {
    fn name(&self) -> &str {
        "player_input"
    }

    fn required_components(&self) -> ComponentSet {
        ComponentSet::new()
    }

    fn update(&mut self, _entities: &EntitySet, _world: &mut World) -> Result<(), EcsError> {
        let keys = self.input.latch();
        if !keys.is_empty() {
            debug!(keys = ?keys, "currently pressed keys");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
