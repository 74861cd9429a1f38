//! Type descriptors used as registration keys.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::size_of;

/// Whether a descriptor names a concrete event type or a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// A sized event type, matched by exact type.
    Concrete,
    /// An unsized type (normally `dyn Trait`), matched by conformance.
    Capability,
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete => write!(f, "concrete"),
            Self::Capability => write!(f, "capability"),
        }
    }
}

/// Identifies the parameter type of a listener.
///
/// The kind is derived from the type itself: references to sized types are
/// thin pointers, references to trait objects (and other unsized types) are
/// fat pointers. A given type therefore always classifies the same way.
#[derive(Clone, Copy)]
pub struct Descriptor {
    id: TypeId,
    name: &'static str,
    kind: DescriptorKind,
}

impl Descriptor {
    /// Builds the descriptor for `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        let kind = if size_of::<&T>() == size_of::<&()>() {
            DescriptorKind::Concrete
        } else {
            DescriptorKind::Capability
        };
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind,
        }
    }

    /// Registration key.
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Type name, for diagnostics only.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// How events are matched against this descriptor.
    #[must_use]
    pub const fn kind(&self) -> DescriptorKind {
        self.kind
    }

    /// Returns true for capability descriptors.
    #[must_use]
    pub fn is_capability(&self) -> bool {
        self.kind == DescriptorKind::Capability
    }
}

impl PartialEq for Descriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Descriptor {}

impl Hash for Descriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.name)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
