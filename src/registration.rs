//! Service registration types and the shared registry they live in.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use crate::error::DiResult;
use crate::key::Key;
use crate::lifetime::Lifetime;

#[cfg(feature = "once-cell")]
use once_cell::sync::OnceCell;

pub(crate) use crate::provider::ResolverContext;

/// Type-erased `Arc` used to store any resolved service instance.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// One registration: its lifetime, its constructor, and the runtime caching
/// state that lifetime implies.
pub(crate) struct Registration {
    pub(crate) lifetime: Lifetime,
    pub(crate) ctor: Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>,
    /// Implementation type ID, kept for diagnostics (identifies the concrete
    /// type backing a trait registration).
    pub(crate) impl_id: Option<TypeId>,

    /// Singleton cache — lock-free after first initialization.
    #[cfg(feature = "once-cell")]
    pub(crate) single_runtime: Option<OnceCell<AnyArc>>,
    #[cfg(not(feature = "once-cell"))]
    pub(crate) single_runtime: Option<Arc<std::sync::Mutex<Option<AnyArc>>>>,

    /// Index into a `Scope`'s slot array, assigned once at registration time.
    pub(crate) scoped_slot: Option<usize>,
}

impl Registration {
    pub(crate) fn new(
        lifetime: Lifetime,
        ctor: Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>,
    ) -> Self {
        let single_runtime = match lifetime {
            Lifetime::Singleton => {
                #[cfg(feature = "once-cell")]
                { Some(OnceCell::new()) }
                #[cfg(not(feature = "once-cell"))]
                { Some(Arc::new(std::sync::Mutex::new(None))) }
            }
            _ => None,
        };

        Self {
            lifetime,
            ctor,
            impl_id: None,
            single_runtime,
            scoped_slot: None,
        }
    }

    pub(crate) fn with_impl_id(
        lifetime: Lifetime,
        ctor: Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>,
        impl_id: Option<TypeId>,
    ) -> Self {
        let mut reg = Self::new(lifetime, ctor);
        reg.impl_id = impl_id;
        reg
    }
}

/// The registration table: one map for single-binding (override/last-wins)
/// registrations, one for multi-binding (append-only, enumerable)
/// registrations, plus the open-generic family table that drives closed-form
/// synthesis.
///
/// Lives behind an `Arc<RwLock<..>>` (see [`SharedRegistry`]) so that
/// registrations made on a `ServiceCollection` handle after its first
/// `build()` call remain visible to every `ServiceProvider` sharing that
/// registry — the provider holds a reference, never a snapshot.
pub(crate) struct Registry {
    pub(crate) one: HashMap<Key, Arc<Registration>>,
    pub(crate) many: HashMap<&'static str, Vec<Arc<Registration>>>,
    /// `(trait_name, index) -> scoped slot`, kept alongside `many` so Scope
    /// lookups don't need to re-scan the Vec to find a slot.
    pub(crate) multi_scoped_slots: HashMap<(&'static str, usize), usize>,
    /// Open-generic families registered via `add_open_generic`, keyed by the
    /// family name (the type name truncated at its first `<`).
    pub(crate) families: HashMap<&'static str, Lifetime>,
    scoped_slot_counter: AtomicUsize,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            one: HashMap::new(),
            many: HashMap::new(),
            multi_scoped_slots: HashMap::new(),
            families: HashMap::new(),
            scoped_slot_counter: AtomicUsize::new(0),
        }
    }

    fn next_scoped_slot(&self) -> usize {
        self.scoped_slot_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Inserts (or overrides) a single-binding registration, assigning it a
    /// scoped slot if needed.
    pub(crate) fn insert(&mut self, key: Key, mut registration: Registration) -> Arc<Registration> {
        if registration.lifetime == Lifetime::Scoped {
            registration.scoped_slot = Some(self.next_scoped_slot());
        }
        let reg = Arc::new(registration);
        self.one.insert(key, reg.clone());
        reg
    }

    /// Appends a multi-binding registration, assigning it a scoped slot if
    /// needed and recording its `(trait_name, index)` slot mapping.
    pub(crate) fn push_many(&mut self, trait_name: &'static str, mut registration: Registration) -> Arc<Registration> {
        let entries = self.many.entry(trait_name).or_default();
        let index = entries.len();
        if registration.lifetime == Lifetime::Scoped {
            let slot = self.next_scoped_slot();
            registration.scoped_slot = Some(slot);
            self.multi_scoped_slots.insert((trait_name, index), slot);
        }
        let reg = Arc::new(registration);
        entries.push(reg.clone());
        reg
    }

    pub(crate) fn get(&self, key: &Key) -> Option<Arc<Registration>> {
        self.one.get(key).cloned()
    }

    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.one.contains_key(key)
    }

    pub(crate) fn many(&self, trait_name: &'static str) -> Vec<Arc<Registration>> {
        self.many.get(trait_name).cloned().unwrap_or_default()
    }

    pub(crate) fn register_family(&mut self, family: &'static str, lifetime: Lifetime) {
        self.families.insert(family, lifetime);
    }

    pub(crate) fn family_lifetime(&self, family: &str) -> Option<Lifetime> {
        self.families.get(family).copied()
    }

    /// Total number of scoped slots assigned so far; used to size a new
    /// `Scope`'s fixed-capacity slot array.
    pub(crate) fn scoped_count(&self) -> usize {
        self.scoped_slot_counter.load(Ordering::Relaxed)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &Arc<Registration>)> {
        self.one.iter()
    }
}

/// A cheaply-cloneable handle to a shared [`Registry`].
///
/// Every read takes the registry's read lock just long enough to clone an
/// `Arc<Registration>` out; construction never runs while the lock is held,
/// so a factory that resolves other services cannot deadlock against
/// concurrent registration.
#[derive(Clone)]
pub(crate) struct SharedRegistry(Arc<RwLock<Registry>>);

impl SharedRegistry {
    pub(crate) fn new() -> Self {
        Self(Arc::new(RwLock::new(Registry::new())))
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
        f(&self.0.read().unwrap_or_else(|e| e.into_inner()))
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> R {
        f(&mut self.0.write().unwrap_or_else(|e| e.into_inner()))
    }
}
