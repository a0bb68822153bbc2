//! Per-entity component storage.
//!
//! A [`ComponentContainer`] maps each [`ComponentTypeId`] to at most one
//! type-erased component instance. Reads are public. Every write, including
//! in-place field edits, is crate-internal: user code only ever holds a
//! shared `&ComponentContainer`, and mutates through the
//! [`World`](crate::world::World), which keeps system caches in sync.
//!
//! Containers cannot be built outside the crate:
//!
//! ```compile_fail
//! use ember_ecs::container::ComponentContainer;
//!
//! let _empty = ComponentContainer::new();
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::component::{Component, ComponentSet, ComponentTypeId};
use crate::EcsError;

/// The components attached to a single entity.
pub struct ComponentContainer {
    components: HashMap<ComponentTypeId, Box<dyn Any>>,
}

impl ComponentContainer {
    /// Create an empty container.
    pub(crate) fn new() -> Self {
        Self {
            components: HashMap::new(),
        }
    }

    // -- crate-internal structural mutation ---------------------------------

    /// Store `component`, replacing any existing instance of the same type.
    pub(crate) fn insert<T: Component>(&mut self, component: T) {
        self.components
            .insert(ComponentTypeId::of::<T>(), Box::new(component));
    }

    /// Store an already type-erased component under `id`.
    pub(crate) fn insert_boxed(&mut self, id: ComponentTypeId, component: Box<dyn Any>) {
        self.components.insert(id, component);
    }

    /// Remove the component of type `id`. Returns `false` if none was stored.
    pub(crate) fn remove(&mut self, id: ComponentTypeId) -> bool {
        self.components.remove(&id).is_some()
    }

    // -- queries ------------------------------------------------------------

    /// Borrow the component of type `T`, if present.
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.components
            .get(&ComponentTypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// Mutably borrow the component of type `T`, if present.
    pub(crate) fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .get_mut(&ComponentTypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut::<T>())
    }

    /// Like [`get`](Self::get), but reports a missing component as an error.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::MissingComponent`] if no `T` is stored.
    pub fn fetch<T: Component>(&self) -> Result<&T, EcsError> {
        self.get::<T>().ok_or_else(missing::<T>)
    }

    /// Like [`get_mut`](Self::get_mut), but reports a missing component as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::MissingComponent`] if no `T` is stored.
    pub(crate) fn fetch_mut<T: Component>(&mut self) -> Result<&mut T, EcsError> {
        self.get_mut::<T>().ok_or_else(missing::<T>)
    }

    /// Whether a component of type `T` is stored.
    pub fn has<T: Component>(&self) -> bool {
        self.has_type(ComponentTypeId::of::<T>())
    }

    /// Whether a component with identity `id` is stored.
    pub fn has_type(&self, id: ComponentTypeId) -> bool {
        self.components.contains_key(&id)
    }

    /// Whether every type in `required` is stored. Vacuously true for the
    /// empty set.
    pub fn has_all(&self, required: &ComponentSet) -> bool {
        required.iter().all(|id| self.has_type(id))
    }

    /// Number of components stored.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether no components are stored.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// The set of component types currently stored.
    pub fn component_types(&self) -> ComponentSet {
        self.components.keys().copied().collect()
    }
}

impl fmt::Debug for ComponentContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.component_types().iter())
            .finish()
    }
}

fn missing<T: Component>() -> EcsError {
    EcsError::MissingComponent {
        component: ComponentTypeId::of::<T>().short_name(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
