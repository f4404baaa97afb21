//! Service key types — the runtime type identity used to index the registry.

use std::any::TypeId;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A runtime identity for a registered service.
///
/// Equality is nominal: two keys referring to the same constructed type
/// compare equal regardless of where they were constructed. The display name
/// carried alongside a `TypeId` is for diagnostics only and never
/// participates in comparison or hashing — two `Key::Type` values with the
/// same `TypeId` are the same key even if their name strings differ (which
/// should never happen in practice, but the hot path should not pay for a
/// string compare either way).
#[derive(Debug, Clone, Copy)]
pub enum Key {
    /// A concrete (possibly monomorphized-generic) type.
    Type(TypeId, &'static str),
    /// A single-binding trait object, identified by the trait's type name.
    Trait(&'static str),
    /// One slot of a multi-binding (`Vec<Arc<dyn T>>`) trait registration.
    MultiTrait(&'static str, usize),
}

impl Key {
    /// A human-readable name for diagnostics and error messages.
    pub fn display_name(&self) -> String {
        match self {
            Key::Type(_, name) => name.to_string(),
            Key::Trait(name) => format!("dyn {}", name),
            Key::MultiTrait(name, idx) => format!("dyn {}[{}]", name, idx),
        }
    }

    /// The bare service name, without multi-binding index decoration.
    pub fn service_name(&self) -> &'static str {
        match self {
            Key::Type(_, name) => name,
            Key::Trait(name) => name,
            Key::MultiTrait(name, _) => name,
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // TypeId alone is the identity; the name is not compared.
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::Trait(a), Key::Trait(b)) => a == b,
            (Key::MultiTrait(a, ia), Key::MultiTrait(b, ib)) => a == b && ia == ib,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::Trait(name) => {
                1u8.hash(state);
                name.hash(state);
            }
            Key::MultiTrait(name, idx) => {
                2u8.hash(state);
                name.hash(state);
                idx.hash(state);
            }
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        fn rank(k: &Key) -> u8 {
            match k {
                Key::Type(..) => 0,
                Key::Trait(_) => 1,
                Key::MultiTrait(..) => 2,
            }
        }
        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a.cmp(b),
            (Key::Trait(a), Key::Trait(b)) => a.cmp(b),
            (Key::MultiTrait(a, ia), Key::MultiTrait(b, ib)) => a.cmp(b).then(ia.cmp(ib)),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

/// Builds the `Key` for a concrete type `T`.
pub fn key_of_type<T: 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}
