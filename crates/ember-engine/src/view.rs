//! Presentation hook for the [`GameLoop`](crate::tick::GameLoop).
//!
//! A [`View`] is called after each frame's ticks with read-only access to the
//! world. The simulation never depends on what a view does.

use ember_ecs::world::World;
use tracing::trace;

/// Draws the world once per frame.
pub trait View {
    /// Present the current state of `world`.
    fn draw(&mut self, world: &World);
}

/// A view that only logs. Useful in tests and when no display is attached.
#[derive(Debug, Default)]
pub struct TraceView {
    frames_drawn: u64,
}

impl TraceView {
    /// Create a view that has drawn nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames drawn so far.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }
}

impl View for TraceView {
    fn draw(&mut self, world: &World) {
        self.frames_drawn += 1;
        trace!(
            frame = self.frames_drawn,
            entities = world.entity_count(),
            pending = world.pending_deletion_count(),
            "draw"
        );
    }
}
