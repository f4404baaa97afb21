//! Service provider module for dependency injection.
//!
//! This module contains the ServiceProvider type and related functionality
//! for resolving registered services from the DI container.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::{DiResult, DiError, Key, Lifetime};
use crate::registration::{AnyArc, Registration, SharedRegistry};
use crate::internal::{DisposeBag, BoxFutureUnit, StackGuard};
use crate::observer::Observers;
use crate::traits::{Resolver, ResolverCore};

// Re-export Scope and ResolverContext
pub mod scope;
pub mod context;
pub use scope::*;
pub use context::ResolverContext;

/// Service provider for resolving dependencies from the DI container.
///
/// The `ServiceProvider` is the heart of the dependency injection system. It resolves
/// services according to their registered lifetimes (Singleton, Scoped, Transient) and
/// manages the lifecycle of singleton services including disposal.
///
/// Registrations made on the `ServiceCollection` handle that built this provider,
/// after `build()` was called, remain visible: the provider shares the same
/// backing registry rather than holding a point-in-time snapshot.
///
/// # Thread Safety
///
/// ServiceProvider is fully thread-safe and can be shared across multiple threads.
/// Singleton services are cached with proper synchronization, and the provider
/// can be cloned cheaply (it uses `Arc` internally).
///
/// # Examples
///
/// ```
/// use ferrous_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let collection = ServiceCollection::new();
/// collection.add_singleton(Database { url: "postgres://localhost".to_string() });
/// collection.add_transient_factory::<UserService, _>(|resolver| {
///     UserService { db: resolver.get_required::<Database>() }
/// });
///
/// let provider = collection.build();
/// let user_service = provider.get_required::<UserService>();
/// assert_eq!(user_service.db.url, "postgres://localhost");
/// ```
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    pub registry: SharedRegistry,
    pub root_disposers: Mutex<DisposeBag>,
    pub observers: Observers,
    pub disposed: AtomicBool,
}

impl ServiceProvider {
    #[inline]
    pub(crate) fn inner(&self) -> &ProviderInner {
        &self.inner
    }

    /// Creates a new scope for resolving scoped services.
    ///
    /// Scoped services are cached per scope and are ideal for request-scoped
    /// dependencies in web applications. Each scope maintains its own cache
    /// of scoped services while still accessing singleton services from the
    /// root provider.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Resolver};
    /// use std::sync::{Arc, Mutex};
    ///
    /// #[derive(Debug)]
    /// struct RequestId(String);
    ///
    /// let collection = ServiceCollection::new();
    /// let counter = Arc::new(Mutex::new(0));
    /// let counter_clone = counter.clone();
    ///
    /// collection.add_scoped_factory::<RequestId, _>(move |_| {
    ///     let mut c = counter_clone.lock().unwrap();
    ///     *c += 1;
    ///     RequestId(format!("req-{}", *c))
    /// });
    ///
    /// let provider = collection.build();
    ///
    /// let scope1 = provider.create_scope();
    /// let scope2 = provider.create_scope();
    ///
    /// let req1a = scope1.get_required::<RequestId>();
    /// let req1b = scope1.get_required::<RequestId>(); // Same instance
    /// let req2 = scope2.get_required::<RequestId>(); // Different instance
    ///
    /// assert!(Arc::ptr_eq(&req1a, &req1b));
    /// assert!(!Arc::ptr_eq(&req1a, &req2));
    /// ```
    pub fn create_scope(&self) -> Scope {
        Scope::new(self.clone())
    }

    /// Disposes all registered disposal hooks in LIFO order (registration
    /// order reversed, regardless of sync/async kind).
    ///
    /// Once this completes, any further resolution attempt on this provider
    /// (or a scope created from it, for singletons) fails with
    /// [`DiError::ObjectDisposed`].
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Dispose, AsyncDispose, Resolver};
    /// use async_trait::async_trait;
    /// use std::sync::Arc;
    ///
    /// struct Cache;
    /// impl Dispose for Cache {
    ///     fn dispose(&self) {
    ///         println!("Cache disposed");
    ///     }
    /// }
    ///
    /// struct Client;
    /// #[async_trait]
    /// impl AsyncDispose for Client {
    ///     async fn dispose(&self) {
    ///         println!("Client disposed");
    ///     }
    /// }
    ///
    /// # async fn example() {
    /// let services = ServiceCollection::new();
    /// services.add_singleton_factory::<Cache, _>(|r| {
    ///     let cache = Arc::new(Cache);
    ///     r.register_disposer(cache.clone());
    ///     Cache
    /// });
    /// services.add_singleton_factory::<Client, _>(|r| {
    ///     let client = Arc::new(Client);
    ///     r.register_async_disposer(client.clone());
    ///     Client
    /// });
    ///
    /// let provider = services.build();
    /// // ... use services ...
    /// provider.dispose_all().await;
    /// # }
    /// ```
    pub async fn dispose_all(&self) {
        self.inner().disposed.store(true, Ordering::Release);
        let mut bag = std::mem::take(&mut *self.inner().root_disposers.lock().unwrap());
        bag.run_all_reverse().await;
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Service Provider Debug ===\n");
        s.push_str("Single Bindings:\n");
        self.inner().registry.read(|registry| {
            for (k, r) in registry.iter() {
                s.push_str(&format!("  {:?}: {:?}\n", k, r.lifetime));
            }
            s.push_str("Multi Bindings:\n");
            for (name, regs) in &registry.many {
                for (i, r) in regs.iter().enumerate() {
                    s.push_str(&format!("  MultiTrait({} @ {}): {:?}\n", name, i, r.lifetime));
                }
            }
        });
        s
    }
}

impl Clone for ServiceProvider {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl Drop for ServiceProvider {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            if let Ok(bag) = self.inner.root_disposers.try_lock() {
                if !bag.is_empty() {
                    eprintln!("[ferrous-di] ServiceProvider dropped with undisposed resources. Call dispose_all().await before dropping.");
                }
            }
        }
    }
}

/// Invokes a registration's constructor, surfacing a factory panic to every
/// observer in `observers` before letting it continue unwinding. Shared by
/// `ServiceProvider` and `Scope`, both of which delegate to the root
/// provider's observer set.
pub(crate) fn invoke_ctor(
    observers: &Observers,
    reg: &Registration,
    ctx: &ResolverContext,
    key: &Key,
) -> DiResult<AnyArc> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| (reg.ctor)(ctx)));
    match result {
        Ok(value) => value,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "factory panicked".to_string());
            observers.factory_panic(key, &message);
            panic::resume_unwind(payload);
        }
    }
}

impl ServiceProvider {
    /// Ultra-optimized singleton resolution using the registration's
    /// embedded cache cell — lock-free after first initialization.
    pub(crate) fn resolve_singleton(&self, reg: &Registration, key: &Key) -> DiResult<AnyArc> {
        let ctx = ResolverContext::new(self);

        #[cfg(feature = "once-cell")]
        {
            let cell = reg.single_runtime.as_ref().expect("singleton registration missing cache cell");
            if let Some(value) = cell.get() {
                return Ok(value.clone());
            }
            let value = invoke_ctor(&self.inner().observers, reg, &ctx, key)?;
            Ok(cell.get_or_init(|| value.clone()).clone())
        }

        #[cfg(not(feature = "once-cell"))]
        {
            let mutex = reg.single_runtime.as_ref().expect("singleton registration missing cache cell");
            let mut guard = mutex.lock().unwrap();
            if let Some(value) = guard.as_ref() {
                return Ok(value.clone());
            }
            let value = invoke_ctor(&self.inner().observers, reg, &ctx, key)?;
            *guard = Some(value.clone());
            Ok(value)
        }
    }

    /// Constructs one value for `reg` according to its lifetime, observing
    /// timing when observers are registered.
    fn construct(&self, reg: &Arc<Registration>, key: &Key) -> DiResult<AnyArc> {
        match reg.lifetime {
            Lifetime::Singleton => {
                if self.inner().observers.has_observers() {
                    let start = Instant::now();
                    self.inner().observers.resolving(key);
                    let result = self.resolve_singleton(reg, key);
                    self.inner().observers.resolved(key, start.elapsed());
                    result
                } else {
                    self.resolve_singleton(reg, key)
                }
            }
            Lifetime::Scoped => Err(DiError::ScopedFromRoot(key.service_name())),
            Lifetime::Transient => {
                let ctx = ResolverContext::new(self);
                if self.inner().observers.has_observers() {
                    let start = Instant::now();
                    self.inner().observers.resolving(key);
                    let result = invoke_ctor(&self.inner().observers, reg, &ctx, key);
                    self.inner().observers.resolved(key, start.elapsed());
                    result
                } else {
                    invoke_ctor(&self.inner().observers, reg, &ctx, key)
                }
            }
        }
    }

    fn resolve_any_impl(&self, key: &Key) -> DiResult<AnyArc> {
        let reg = self.inner().registry.read(|r| r.get(key))
            .ok_or_else(|| DiError::NotRegistered(key.service_name()))?;
        self.construct(&reg, key)
    }

    fn resolve_many_impl(&self, key: &Key) -> DiResult<Vec<AnyArc>> {
        let trait_name = key.service_name();
        let regs = self.inner().registry.read(|r| r.many(trait_name));
        let mut results = Vec::with_capacity(regs.len());
        for (i, reg) in regs.iter().enumerate() {
            let multi_key = Key::MultiTrait(trait_name, i);
            results.push(self.construct(reg, &multi_key)?);
        }
        Ok(results)
    }

    /// Create a new ServiceProvider with the given registry. Used internally
    /// by `ServiceCollection::build()`.
    pub(crate) fn new(registry: SharedRegistry, observers: Observers) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                registry,
                root_disposers: Mutex::new(DisposeBag::default()),
                observers,
                disposed: AtomicBool::new(false),
            }),
        }
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        if self.inner().disposed.load(Ordering::Acquire) {
            return Err(DiError::ObjectDisposed(key.service_name()));
        }
        let _guard = StackGuard::enter(key.service_name())?;
        self.resolve_any_impl(key)
    }

    fn resolve_many(&self, key: &Key) -> DiResult<Vec<AnyArc>> {
        if self.inner().disposed.load(Ordering::Acquire) {
            return Err(DiError::ObjectDisposed(key.service_name()));
        }
        let _guard = StackGuard::enter(key.service_name())?;
        self.resolve_many_impl(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.inner().root_disposers.lock().unwrap().push_sync(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.inner().root_disposers.lock().unwrap().push_async(f);
    }

    fn registry(&self) -> &SharedRegistry {
        &self.inner().registry
    }
}

impl Resolver for ServiceProvider {}
