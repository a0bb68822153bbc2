//! Component type identity and required-component sets.
//!
//! Any `'static` Rust type can be used as a component. Its identity is a
//! [`ComponentTypeId`], derived from [`TypeId`] the first time the type is
//! named, so there is no registration step. Systems declare the component
//! types they need as a [`ComponentSet`].

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Marker for types that can be stored in a
/// [`ComponentContainer`](crate::container::ComponentContainer).
///
/// Implemented for every `'static` type.
pub trait Component: Any {}

impl<T: Any> Component for T {}

// ---------------------------------------------------------------------------
// ComponentTypeId
// ---------------------------------------------------------------------------

/// Lightweight identity token for a component type.
///
/// Equality, ordering and hashing use only the underlying [`TypeId`]; the
/// type name is kept for diagnostics.
#[derive(Clone, Copy)]
pub struct ComponentTypeId {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentTypeId {
    /// The identity of component type `T`.
    #[inline]
    pub fn of<T: Component>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified Rust type name of the component.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name without its module path (`game::Position` -> `Position`).
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl PartialEq for ComponentTypeId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentTypeId {}

impl Hash for ComponentTypeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl PartialOrd for ComponentTypeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ComponentTypeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.type_id.cmp(&other.type_id)
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.short_name())
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

// ---------------------------------------------------------------------------
// ComponentSet
// ---------------------------------------------------------------------------

/// An immutable-by-convention set of component types.
///
/// The empty set is meaningful: a system requiring nothing matches every
/// entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentSet {
    types: BTreeSet<ComponentTypeId>,
}

impl ComponentSet {
    /// The empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A set containing only `T`.
    pub fn of<T: Component>() -> Self {
        Self::new().with::<T>()
    }

    /// Builder-style: add `T` to the set.
    #[must_use]
    pub fn with<T: Component>(mut self) -> Self {
        self.types.insert(ComponentTypeId::of::<T>());
        self
    }

    /// Add a component type by id. Returns `false` if it was already present.
    pub fn insert(&mut self, id: ComponentTypeId) -> bool {
        self.types.insert(id)
    }

    /// Whether `id` is part of the set.
    pub fn contains(&self, id: ComponentTypeId) -> bool {
        self.types.contains(&id)
    }

    /// Number of component types in the set.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the set requires nothing.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate the component types in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.types.iter().copied()
    }
}

impl FromIterator<ComponentTypeId> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = ComponentTypeId>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

/// Build a [`ComponentSet`] from a list of component types.
///
/// ```
/// use ember_ecs::component_set;
///
/// struct Position;
/// struct Health;
///
/// let required = component_set![Position, Health];
/// assert_eq!(required.len(), 2);
/// assert!(component_set![].is_empty());
/// ```
#[macro_export]
macro_rules! component_set {
    () => {
        $crate::component::ComponentSet::new()
    };
    ($($ty:ty),+ $(,)?) => {
        $crate::component::ComponentSet::new()$(.with::<$ty>())+
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
