//! Resolver traits for service resolution.

use std::any::TypeId;
use std::sync::Arc;
use crate::error::DiResult;
use crate::key::{key_of_type, Key};
use crate::open_generic::{family_of, OpenGeneric};
use crate::registration::{AnyArc, Registration, SharedRegistry};
use crate::traits::{Dispose, AsyncDispose};
use crate::internal::BoxFutureUnit;

/// Core resolver trait for object-safe service resolution.
///
/// Object-safe so it can be boxed/erased; most users should reach for
/// [`Resolver`] instead, which layers ergonomic generic methods on top.
pub trait ResolverCore: Send + Sync {
    /// Resolves a single service, with thread-local cycle detection.
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc>;

    /// Resolves every multi-bound implementation for a trait key, in
    /// registration order. Keys with no multi-binding return an empty `Vec`.
    fn resolve_many(&self, key: &Key) -> DiResult<Vec<AnyArc>>;

    /// Registers a synchronous disposal hook on the owning provider/scope.
    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>);

    /// Registers an asynchronous disposal hook on the owning provider/scope.
    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>);

    /// The registry backing this resolver. Not nameable outside the crate
    /// (the return type is crate-private), so this does not widen the
    /// public API surface despite living on a `pub` trait.
    fn registry(&self) -> &SharedRegistry;
}

/// High-level resolver interface with ergonomic generic methods.
///
/// Both `ServiceProvider` and `Scope` implement this trait, so application
/// code can generally be written against `&impl Resolver` rather than a
/// concrete type.
///
/// # Examples
///
/// ```
/// use ferrous_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str);
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) {
///         println!("LOG: {}", msg);
///     }
/// }
///
/// let services = ServiceCollection::new();
/// services.add_singleton(42usize);
/// services.add_singleton_trait(Arc::new(ConsoleLogger) as Arc<dyn Logger>);
///
/// let provider = services.build();
///
/// let number = provider.get_required::<usize>();
/// assert_eq!(*number, 42);
///
/// let logger = provider.get_required_trait::<dyn Logger>();
/// logger.log("Service resolved successfully");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete service type.
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Resolver};
    ///
    /// let services = ServiceCollection::new();
    /// services.add_singleton("configuration".to_string());
    ///
    /// let provider = services.build();
    /// let config = provider.get::<String>().unwrap();
    /// assert_eq!(&*config, "configuration");
    /// ```
    fn get<T: 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        let key = key_of_type::<T>();
        let any = self.resolve_any(&key)?;
        any.downcast::<T>()
            .map_err(|_| crate::error::DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves a service registered via an open-generic family, synthesizing
    /// a closed-form registration the first time a given closed type is
    /// requested.
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Resolver, Lifetime, OpenGeneric, ResolverContext, DiResult};
    ///
    /// struct Repo<T> { _marker: std::marker::PhantomData<T> }
    /// impl<T: Send + Sync + 'static> OpenGeneric for Repo<T> {
    ///     fn construct_open(_ctx: &ResolverContext) -> DiResult<Self> {
    ///         Ok(Repo { _marker: std::marker::PhantomData })
    ///     }
    /// }
    ///
    /// let services = ServiceCollection::new();
    /// services.add_open_generic::<Repo<()>>(Lifetime::Singleton);
    ///
    /// let provider = services.build();
    /// let repo = provider.get_open::<Repo<u32>>().unwrap();
    /// let same = provider.get_open::<Repo<u32>>().unwrap();
    /// assert!(std::sync::Arc::ptr_eq(&repo, &same));
    /// ```
    fn get_open<T: OpenGeneric>(&self) -> DiResult<Arc<T>> {
        self.ensure_open_generic::<T>()?;
        self.get::<T>()
    }

    /// [`get_open`](Self::get_open), panicking on failure.
    fn get_required_open<T: OpenGeneric>(&self) -> Arc<T> {
        self.get_open::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {:?}", std::any::type_name::<T>(), e))
    }

    /// Synthesizes and memoizes a closed-form registration for `T` from its
    /// open-generic family, if one was registered and `T` has no explicit
    /// registration of its own yet. A no-op otherwise.
    fn ensure_open_generic<T: OpenGeneric>(&self) -> DiResult<()> {
        let key = key_of_type::<T>();
        let registry = self.registry();
        if registry.read(|r| r.contains_key(&key)) {
            return Ok(());
        }
        let family = family_of::<T>();
        let lifetime = match registry.read(|r| r.family_lifetime(family)) {
            Some(lifetime) => lifetime,
            None => return Ok(()),
        };
        let ctor: Arc<dyn for<'a> Fn(&crate::provider::ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync> =
            Arc::new(|ctx: &crate::provider::ResolverContext| -> DiResult<AnyArc> {
                T::construct_open(ctx).map(|v| Arc::new(v) as AnyArc)
            });
        registry.write(|r| {
            if !r.contains_key(&key) {
                r.insert(key, Registration::with_impl_id(lifetime, ctor.clone(), Some(TypeId::of::<T>())));
            }
        });
        Ok(())
    }

    /// Resolves the most recently registered implementation of a trait.
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Resolver};
    /// use std::sync::Arc;
    ///
    /// trait Database: Send + Sync {
    ///     fn connect(&self) -> &str;
    /// }
    ///
    /// struct PostgresDb;
    /// impl Database for PostgresDb {
    ///     fn connect(&self) -> &str { "postgres://..." }
    /// }
    ///
    /// let services = ServiceCollection::new();
    /// services.add_singleton_trait(Arc::new(PostgresDb) as Arc<dyn Database>);
    ///
    /// let provider = services.build();
    /// let db = provider.get_trait::<dyn Database>().unwrap();
    /// assert_eq!(db.connect(), "postgres://...");
    /// ```
    fn get_trait<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Arc<T>>
    where
        Arc<T>: 'static,
    {
        let key = Key::Trait(std::any::type_name::<T>());
        let any = self.resolve_any(&key)?;
        // Trait objects are stored as Arc<Arc<dyn T>> since an unsized Arc<T>
        // cannot be downcast directly out of Arc<dyn Any>.
        any.downcast::<Arc<T>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| crate::error::DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves every registered implementation of a trait, in registration
    /// order.
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Resolver, Lifetime};
    /// use std::sync::Arc;
    ///
    /// trait Plugin: Send + Sync {
    ///     fn name(&self) -> &str;
    /// }
    ///
    /// struct PluginA;
    /// impl Plugin for PluginA { fn name(&self) -> &str { "Plugin A" } }
    /// struct PluginB;
    /// impl Plugin for PluginB { fn name(&self) -> &str { "Plugin B" } }
    ///
    /// let services = ServiceCollection::new();
    /// services.add_trait_implementation(Arc::new(PluginA) as Arc<dyn Plugin>, Lifetime::Singleton);
    /// services.add_trait_implementation(Arc::new(PluginB) as Arc<dyn Plugin>, Lifetime::Singleton);
    ///
    /// let provider = services.build();
    /// let plugins = provider.get_all_trait::<dyn Plugin>().unwrap();
    /// assert_eq!(plugins.len(), 2);
    /// assert_eq!(plugins[0].name(), "Plugin A");
    /// assert_eq!(plugins[1].name(), "Plugin B");
    /// ```
    fn get_all_trait<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Vec<Arc<T>>>
    where
        Arc<T>: 'static,
    {
        let key = Key::Trait(std::any::type_name::<T>());
        let anys = self.resolve_many(&key)?;

        let mut results = Vec::with_capacity(anys.len());
        for any in anys {
            let arc = any.downcast::<Arc<T>>()
                .map(|boxed| (*boxed).clone())
                .map_err(|_| crate::error::DiError::TypeMismatch(std::any::type_name::<T>()))?;
            results.push(arc);
        }
        Ok(results)
    }

    /// [`get`](Self::get), panicking on failure.
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Resolver};
    ///
    /// let services = ServiceCollection::new();
    /// services.add_singleton(42usize);
    ///
    /// let provider = services.build();
    /// let number = provider.get_required::<usize>();
    /// assert_eq!(*number, 42);
    /// ```
    fn get_required<T: 'static + Send + Sync>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {:?}", std::any::type_name::<T>(), e))
    }

    /// [`get_trait`](Self::get_trait), panicking on failure.
    fn get_required_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Arc<T>
    where
        Arc<T>: 'static,
    {
        self.get_trait::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve trait {}: {:?}", std::any::type_name::<T>(), e))
    }

    /// Registers a service for synchronous disposal, run in LIFO order when
    /// the owning provider/scope is disposed.
    ///
    /// ```
    /// use ferrous_di::{Dispose, ServiceCollection, Resolver};
    /// use std::sync::Arc;
    ///
    /// struct Cache { name: String }
    /// impl Dispose for Cache {
    ///     fn dispose(&self) {
    ///         println!("Disposing cache: {}", self.name);
    ///     }
    /// }
    ///
    /// let services = ServiceCollection::new();
    /// services.add_scoped_factory::<Cache, _>(|resolver| {
    ///     let cache = Arc::new(Cache { name: "user_cache".to_string() });
    ///     resolver.register_disposer(cache.clone());
    ///     Cache { name: "user_cache".to_string() }
    /// });
    /// ```
    fn register_disposer<T: Dispose>(&self, service: Arc<T>) {
        self.push_sync_disposer(Box::new(move || service.dispose()));
    }

    /// Registers a service for asynchronous disposal, run in LIFO order
    /// alongside sync disposers when the owning provider/scope is disposed.
    fn register_async_disposer<T: AsyncDispose>(&self, service: Arc<T>) {
        self.push_async_disposer(Box::new(move || Box::pin(async move {
            service.dispose().await;
        })));
    }
}
