//! Scoped service resolution and lifecycle management.
//!
//! This module contains the Scope and ScopedResolver types for managing
//! request-scoped services and their automatic disposal.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::future::Future;

#[cfg(feature = "once-cell")]
use once_cell::sync::OnceCell;

use crate::{DiResult, DiError, Key, Lifetime};
use crate::registration::{AnyArc, Registration, SharedRegistry};
use super::{ResolverContext, invoke_ctor};
use crate::internal::{DisposeBag, BoxFutureUnit, StackGuard};
use crate::traits::{Resolver, ResolverCore, Dispose, AsyncDispose};
use super::ServiceProvider;

/// Scoped service container for request-scoped dependency resolution.
///
/// A `Scope` provides isolated dependency resolution for scoped services while
/// still accessing singleton services from the root provider. This is ideal for
/// web applications where you want request-scoped services (like database connections,
/// user contexts, etc.) that are shared within a single request but isolated
/// between requests.
///
/// # Lifetime Behavior
///
/// - **Singleton**: resolved and cached in the root provider (shared across all scopes)
/// - **Scoped**: resolved and cached within this specific scope
/// - **Transient**: created fresh on every resolution (no caching)
///
/// # Examples
///
/// ```
/// use ferrous_di::{ServiceCollection, Resolver};
/// use std::sync::{Arc, Mutex};
///
/// #[derive(Debug)]
/// struct DatabaseConnection(String);
///
/// #[derive(Debug)]
/// struct UserService {
///     db: Arc<DatabaseConnection>,
/// }
///
/// let collection = ServiceCollection::new();
///
/// collection.add_scoped_factory::<DatabaseConnection, _>(|_| {
///     DatabaseConnection("connection-123".to_string())
/// });
///
/// collection.add_transient_factory::<UserService, _>(|resolver| {
///     UserService {
///         db: resolver.get_required::<DatabaseConnection>(),
///     }
/// });
///
/// let provider = collection.build();
/// let scope = provider.create_scope();
///
/// let user1 = scope.get_required::<UserService>();
/// let user2 = scope.get_required::<UserService>();
/// assert!(Arc::ptr_eq(&user1.db, &user2.db));
/// ```
pub struct Scope {
    pub(crate) root: ServiceProvider,
    /// Fast-path cache sized from `registry.scoped_count()` at creation
    /// time. A scoped registration added later gets a slot index beyond
    /// this array's length; such slots fall back to `late_scoped`.
    #[cfg(feature = "once-cell")]
    scoped_cells: Box<[OnceCell<AnyArc>]>,
    #[cfg(feature = "once-cell")]
    late_scoped: Mutex<HashMap<Key, AnyArc>>,
    #[cfg(not(feature = "once-cell"))]
    scoped: Mutex<HashMap<Key, AnyArc>>,
    scoped_disposers: Mutex<DisposeBag>,
    disposed: AtomicBool,
}

impl Scope {
    pub(crate) fn new(root: ServiceProvider) -> Self {
        #[cfg(feature = "once-cell")]
        {
            let scoped_count = root.inner().registry.read(|r| r.scoped_count());
            let scoped_cells: Box<[OnceCell<AnyArc>]> =
                (0..scoped_count).map(|_| OnceCell::new()).collect::<Vec<_>>().into_boxed_slice();
            Self {
                root,
                scoped_cells,
                late_scoped: Mutex::new(HashMap::new()),
                scoped_disposers: Mutex::new(DisposeBag::default()),
                disposed: AtomicBool::new(false),
            }
        }

        #[cfg(not(feature = "once-cell"))]
        {
            Self {
                root,
                scoped: Mutex::new(HashMap::new()),
                scoped_disposers: Mutex::new(DisposeBag::default()),
                disposed: AtomicBool::new(false),
            }
        }
    }
}

impl Clone for Scope {
    fn clone(&self) -> Self {
        // A fresh scope against the same root: scoped state is never shared
        // between clones, only the root provider (and its singletons) is.
        Scope::new(self.root.clone())
    }
}

impl ResolverCore for Scope {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(DiError::ObjectDisposed(key.service_name()));
        }
        let _guard = StackGuard::enter(key.service_name())?;
        self.resolve_any_impl(key)
    }

    fn resolve_many(&self, key: &Key) -> DiResult<Vec<AnyArc>> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(DiError::ObjectDisposed(key.service_name()));
        }
        let _guard = StackGuard::enter(key.service_name())?;
        self.resolve_many_impl(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.scoped_disposers.lock().unwrap().push_sync(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.scoped_disposers.lock().unwrap().push_async(f);
    }

    fn registry(&self) -> &SharedRegistry {
        self.root.registry()
    }
}

impl Scope {
    /// Resolves (and caches) a Scoped registration, using the slot-based
    /// fast path when the slot was assigned before this scope was created,
    /// falling back to a keyed map otherwise.
    fn resolve_scoped(&self, reg: &Registration, key: &Key) -> DiResult<AnyArc> {
        let ctx = ResolverContext::new(self);
        let observers = &self.root.inner().observers;

        #[cfg(feature = "once-cell")]
        {
            if let Some(slot) = reg.scoped_slot {
                if slot < self.scoped_cells.len() {
                    let cell = &self.scoped_cells[slot];
                    if let Some(value) = cell.get() {
                        return Ok(value.clone());
                    }
                    let value = invoke_ctor(observers, reg, &ctx, key)?;
                    return Ok(cell.get_or_init(|| value.clone()).clone());
                }
            }
        }

        #[cfg(not(feature = "once-cell"))]
        {
            let mut guard = self.scoped.lock().unwrap();
            if let Some(value) = guard.get(key) {
                return Ok(value.clone());
            }
            let value = invoke_ctor(observers, reg, &ctx, key)?;
            return Ok(guard.entry(key.clone()).or_insert(value).clone());
        }

        #[cfg(feature = "once-cell")]
        {
            // Slot assigned after this scope was created: fall back to a
            // keyed map, held across construction so two threads sharing
            // this scope can't both build it.
            let mut guard = self.late_scoped.lock().unwrap();
            if let Some(value) = guard.get(key) {
                return Ok(value.clone());
            }
            let value = invoke_ctor(observers, reg, &ctx, key)?;
            Ok(guard.entry(key.clone()).or_insert(value).clone())
        }
    }

    fn construct(&self, reg: &Arc<Registration>, key: &Key) -> DiResult<AnyArc> {
        match reg.lifetime {
            // Singletons are root-owned and scope-independent: resolved
            // against the root provider regardless of which scope triggered
            // the first construction.
            Lifetime::Singleton => self.root.resolve_singleton(reg, key),
            Lifetime::Scoped => self.resolve_scoped(reg, key),
            Lifetime::Transient => {
                // Passing `self` (not the root) keeps any Scoped dependency
                // this factory resolves scoped to this request, not erroring
                // out as if called from the root.
                let ctx = ResolverContext::new(self);
                invoke_ctor(&self.root.inner().observers, reg, &ctx, key)
            }
        }
    }

    fn resolve_any_impl(&self, key: &Key) -> DiResult<AnyArc> {
        let reg = self.root.inner().registry.read(|r| r.get(key))
            .ok_or_else(|| DiError::NotRegistered(key.service_name()))?;
        self.construct(&reg, key)
    }

    fn resolve_many_impl(&self, key: &Key) -> DiResult<Vec<AnyArc>> {
        let trait_name = key.service_name();
        let regs = self.root.inner().registry.read(|r| r.many(trait_name));
        let mut results = Vec::with_capacity(regs.len());
        for (i, reg) in regs.iter().enumerate() {
            let multi_key = Key::MultiTrait(trait_name, i);
            results.push(self.construct(reg, &multi_key)?);
        }
        Ok(results)
    }

    /// Disposes all scoped disposal hooks in LIFO order.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Dispose, Resolver};
    /// use std::sync::Arc;
    ///
    /// struct ScopedCache {
    ///     name: String,
    /// }
    ///
    /// impl Dispose for ScopedCache {
    ///     fn dispose(&self) {
    ///         println!("Disposing scoped cache: {}", self.name);
    ///     }
    /// }
    ///
    /// # async fn example() {
    /// let services = ServiceCollection::new();
    /// services.add_scoped_factory::<ScopedCache, _>(|r| {
    ///     let cache = Arc::new(ScopedCache { name: "request_cache".to_string() });
    ///     r.register_disposer(cache.clone());
    ///     ScopedCache { name: "request_cache".to_string() }
    /// });
    ///
    /// let provider = services.build();
    /// let scope = provider.create_scope();
    /// // ... use scoped services ...
    /// scope.dispose_all().await; // Only disposes scoped resources
    /// # }
    /// ```
    pub async fn dispose_all(&self) {
        self.disposed.store(true, Ordering::Release);
        let mut bag = std::mem::take(&mut *self.scoped_disposers.lock().unwrap());
        bag.run_all_reverse().await;
    }

    /// Executes an async block with automatic disposal of services resolved via `*_disposable` methods.
    ///
    /// Services resolved with the disposable variants (`get_disposable`,
    /// `get_async_disposable`, etc.) are disposed when the block exits, in
    /// LIFO order, regardless of whether it returned `Ok` or `Err`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Dispose, AsyncDispose, DiError};
    /// use async_trait::async_trait;
    /// use std::sync::Arc;
    ///
    /// struct DatabaseConnection;
    /// impl Dispose for DatabaseConnection {
    ///     fn dispose(&self) {
    ///         println!("Closing database connection");
    ///     }
    /// }
    ///
    /// struct ApiClient;
    /// #[async_trait]
    /// impl AsyncDispose for ApiClient {
    ///     async fn dispose(&self) {
    ///         println!("Shutting down API client");
    ///     }
    /// }
    ///
    /// # async fn example() -> Result<(), DiError> {
    /// let services = ServiceCollection::new();
    /// services.add_scoped_factory::<DatabaseConnection, _>(|_| DatabaseConnection);
    /// services.add_scoped_factory::<ApiClient, _>(|_| ApiClient);
    ///
    /// let provider = services.build();
    /// let scope = provider.create_scope();
    ///
    /// let result = scope.using(|resolver| async move {
    ///     let db = resolver.get_disposable::<DatabaseConnection>()?;
    ///     let api = resolver.get_async_disposable::<ApiClient>()?;
    ///     Ok::<String, DiError>("Operation completed".to_string())
    /// }).await?;
    ///
    /// assert_eq!(result, "Operation completed");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn using<F, Fut, R, E>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(ScopedResolver) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: From<DiError>,
    {
        let resolver = ScopedResolver::new(self);
        let bag_handle = resolver.bag.clone();

        let result = f(resolver).await;

        let mut bag = std::mem::take(&mut *bag_handle.lock().unwrap());
        bag.run_all_reverse().await;

        result
    }

    /// Executes a synchronous block with automatic disposal of services resolved via `*_disposable` methods.
    ///
    /// Only synchronous disposers run; an async disposer registered inside
    /// the block is skipped (use [`using`](Self::using) if any resolved
    /// service needs async disposal).
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Dispose, DiError};
    /// use std::sync::Arc;
    ///
    /// struct FileHandle;
    /// impl Dispose for FileHandle {
    ///     fn dispose(&self) {
    ///         println!("Closing file");
    ///     }
    /// }
    ///
    /// # fn example() -> Result<(), DiError> {
    /// let services = ServiceCollection::new();
    /// services.add_scoped_factory::<FileHandle, _>(|_| FileHandle);
    ///
    /// let provider = services.build();
    /// let scope = provider.create_scope();
    ///
    /// let result = scope.using_sync(|resolver| {
    ///     let file = resolver.get_disposable::<FileHandle>()?;
    ///     Ok::<String, DiError>("File processed".to_string())
    /// })?;
    ///
    /// assert_eq!(result, "File processed");
    /// # Ok(())
    /// # }
    /// ```
    pub fn using_sync<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(ScopedResolver) -> Result<R, E>,
        E: From<DiError>,
    {
        let resolver = ScopedResolver::new(self);
        let bag_handle = resolver.bag.clone();

        let result = f(resolver);

        let mut bag = std::mem::take(&mut *bag_handle.lock().unwrap());
        bag.run_sync_best_effort_reverse();

        result
    }

    /// Creates a fresh scope sharing this one's root provider, with
    /// independent scoped storage.
    pub fn create_child(&self) -> Self {
        self.clone()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let bag = self.scoped_disposers.get_mut().unwrap();
        if !bag.is_empty() {
            eprintln!("[ferrous-di] Scope dropped with undisposed resources. Call dispose_all().await before dropping.");
        }
    }
}

impl Resolver for Scope {}

// ===== ScopedResolver =====

/// Block-scoped resolver with automatic disposal of requested services.
///
/// `ScopedResolver` provides automatic disposal registration for services resolved
/// within a `using()` block. It maintains a shared `DisposeBag` that is automatically
/// disposed at the end of the block in LIFO order.
///
/// The resolver is cloneable and can be safely moved into async closures thanks to
/// its shared interior state.
///
/// # Examples
///
/// ```
/// use ferrous_di::{ServiceCollection, Dispose, AsyncDispose};
/// use async_trait::async_trait;
/// use std::sync::Arc;
///
/// struct DbConnection;
/// impl Dispose for DbConnection {
///     fn dispose(&self) {
///         // Close database connection
///     }
/// }
///
/// struct ApiClient;
/// #[async_trait]
/// impl AsyncDispose for ApiClient {
///     async fn dispose(&self) {
///         // Graceful shutdown
///     }
/// }
///
/// # async fn example() -> Result<(), ferrous_di::DiError> {
/// let services = ServiceCollection::new();
/// services.add_scoped_factory::<DbConnection, _>(|_| DbConnection);
/// services.add_scoped_factory::<ApiClient, _>(|_| ApiClient);
///
/// let provider = services.build();
/// let scope = provider.create_scope();
///
/// let result = scope.using(|resolver| async move {
///     let db = resolver.get_disposable::<DbConnection>()?;
///     let api = resolver.get_async_disposable::<ApiClient>()?;
///     Ok::<i32, ferrous_di::DiError>(42)
/// }).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ScopedResolver {
    scope: Arc<Scope>,
    pub(crate) bag: Arc<Mutex<DisposeBag>>,
}

impl ScopedResolver {
    pub(crate) fn new(scope: &Scope) -> Self {
        Self {
            scope: Arc::new(scope.clone()),
            bag: Arc::new(Mutex::new(DisposeBag::default())),
        }
    }

    // --- Plain resolution (no auto-dispose) ---

    /// Resolves a concrete service type without auto-disposal registration.
    pub fn get<T: 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        self.scope.get::<T>()
    }

    /// Resolves a single trait implementation without auto-disposal registration.
    pub fn get_trait<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        self.scope.get_trait::<T>()
    }

    /// Resolves all trait implementations without auto-disposal registration.
    pub fn get_all_trait<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Vec<Arc<T>>> {
        self.scope.get_all_trait::<T>()
    }

    // --- Auto-disposing variants for concrete types ---

    /// Resolves a concrete service type and registers it for automatic synchronous disposal.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ferrous_di::{ServiceCollection, Dispose};
    /// # use std::sync::Arc;
    /// struct Cache;
    /// impl Dispose for Cache {
    ///     fn dispose(&self) { /* cleanup */ }
    /// }
    ///
    /// # async fn example() -> Result<(), ferrous_di::DiError> {
    /// # let services = ServiceCollection::new();
    /// # services.add_scoped_factory::<Cache, _>(|_| Cache);
    /// # let provider = services.build();
    /// # let scope = provider.create_scope();
    /// scope.using(|resolver| async move {
    ///     let cache = resolver.get_disposable::<Cache>()?;
    ///     Ok::<(), ferrous_di::DiError>(())
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_disposable<T>(&self) -> DiResult<Arc<T>>
    where
        T: Dispose + 'static,
    {
        let s = self.scope.get::<T>()?;
        let clone = s.clone();
        self.bag.lock().unwrap().push_sync(Box::new(move || clone.dispose()));
        Ok(s)
    }

    /// Resolves a concrete service type and registers it for automatic asynchronous disposal.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ferrous_di::{ServiceCollection, AsyncDispose};
    /// # use async_trait::async_trait;
    /// # use std::sync::Arc;
    /// struct ApiClient;
    /// #[async_trait]
    /// impl AsyncDispose for ApiClient {
    ///     async fn dispose(&self) { /* async cleanup */ }
    /// }
    ///
    /// # async fn example() -> Result<(), ferrous_di::DiError> {
    /// # let services = ServiceCollection::new();
    /// # services.add_scoped_factory::<ApiClient, _>(|_| ApiClient);
    /// # let provider = services.build();
    /// # let scope = provider.create_scope();
    /// scope.using(|resolver| async move {
    ///     let client = resolver.get_async_disposable::<ApiClient>()?;
    ///     Ok::<(), ferrous_di::DiError>(())
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_async_disposable<T>(&self) -> DiResult<Arc<T>>
    where
        T: AsyncDispose + 'static,
    {
        let s = self.scope.get::<T>()?;
        let clone = s.clone();
        self.bag.lock().unwrap().push_async(Box::new(move || {
            Box::pin(async move { clone.dispose().await })
        }));
        Ok(s)
    }

    // --- Auto-disposing variants for trait objects ---

    /// Resolves a trait implementation and registers it for automatic synchronous disposal.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ferrous_di::{ServiceCollection, Dispose};
    /// # use std::sync::Arc;
    /// trait Cache: Dispose + Send + Sync {}
    /// struct MemoryCache;
    /// impl Dispose for MemoryCache {
    ///     fn dispose(&self) { /* cleanup */ }
    /// }
    /// impl Cache for MemoryCache {}
    ///
    /// # async fn example() -> Result<(), ferrous_di::DiError> {
    /// # let services = ServiceCollection::new();
    /// # services.add_scoped_trait_factory::<dyn Cache, _>(|_| Arc::new(MemoryCache));
    /// # let provider = services.build();
    /// # let scope = provider.create_scope();
    /// scope.using(|resolver| async move {
    ///     let cache = resolver.get_trait_disposable::<dyn Cache>()?;
    ///     Ok::<(), ferrous_di::DiError>(())
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_trait_disposable<T>(&self) -> DiResult<Arc<T>>
    where
        T: ?Sized + Dispose + 'static + Send + Sync,
    {
        let s = self.scope.get_trait::<T>()?;
        let clone = s.clone();
        self.bag.lock().unwrap().push_sync(Box::new(move || clone.dispose()));
        Ok(s)
    }

    /// Resolves a trait implementation and registers it for automatic asynchronous disposal.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ferrous_di::{ServiceCollection, AsyncDispose};
    /// # use async_trait::async_trait;
    /// # use std::sync::Arc;
    /// #[async_trait]
    /// trait ApiClient: AsyncDispose + Send + Sync {
    ///     async fn call_api(&self) -> String;
    /// }
    ///
    /// struct HttpClient;
    /// #[async_trait]
    /// impl AsyncDispose for HttpClient {
    ///     async fn dispose(&self) { /* cleanup */ }
    /// }
    /// #[async_trait]
    /// impl ApiClient for HttpClient {
    ///     async fn call_api(&self) -> String { "response".to_string() }
    /// }
    ///
    /// # async fn example() -> Result<(), ferrous_di::DiError> {
    /// # let services = ServiceCollection::new();
    /// # services.add_scoped_trait_factory::<dyn ApiClient, _>(|_| Arc::new(HttpClient));
    /// # let provider = services.build();
    /// # let scope = provider.create_scope();
    /// scope.using(|resolver| async move {
    ///     let client = resolver.get_trait_async_disposable::<dyn ApiClient>()?;
    ///     let response = client.call_api().await;
    ///     Ok::<String, ferrous_di::DiError>(response)
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_trait_async_disposable<T>(&self) -> DiResult<Arc<T>>
    where
        T: ?Sized + AsyncDispose + 'static + Send + Sync,
    {
        let s = self.scope.get_trait::<T>()?;
        let clone = s.clone();
        self.bag.lock().unwrap().push_async(Box::new(move || {
            Box::pin(async move { clone.dispose().await })
        }));
        Ok(s)
    }
}
