//! Entity identifiers and allocation.
//!
//! An [`EntityId`] is an opaque 64-bit handle. Identifiers are handed out from
//! a monotonically increasing counter and are never recycled, so a handle to a
//! deleted entity can never alias a live one.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// An opaque entity identifier.
///
/// The entity itself carries no data. It exists exactly as long as the
/// [`World`](crate::world::World) holds a component container for it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    ///
    /// The result is only meaningful for values previously obtained from
    /// [`to_raw`](Self::to_raw).
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Allocates fresh [`EntityId`]s.
///
/// There is no free-list: once an id has been handed out it is retired for
/// the lifetime of the allocator.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// The next raw value to hand out.
    next: u64,
}

impl EntityAllocator {
    /// Create a new, empty allocator.
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocate a fresh [`EntityId`].
    ///
    /// # Panics
    ///
    /// Panics once the 64-bit id space is exhausted, since every further id
    /// would repeat an earlier one.
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        let Some(next) = self.next.checked_add(1) else {
            panic!("entity id space exhausted");
        };
        self.next = next;
        id
    }

    /// Total number of ids handed out so far.
    pub fn allocated_count(&self) -> u64 {
        self.next
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
