//! Service collection module for dependency injection.
//!
//! This module contains the `ServiceCollection` type, the registration-time
//! builder that accumulates descriptors before `build()` produces a
//! `ServiceProvider`.

use std::any::TypeId;
use std::sync::{Arc, Mutex};

use crate::{DiResult, Key, Lifetime, ServiceDescriptor, DiObserver};
use crate::registration::{Registration, AnyArc, SharedRegistry};
use crate::open_generic::{family_of, OpenGeneric};
use crate::provider::ResolverContext;
use crate::observer::Observers;
use crate::ServiceProvider;

pub mod module_system;
pub use module_system::*;

/// Builder for a DI container's registrations.
///
/// `ServiceCollection` is cheaply cloneable and every clone shares the same
/// backing registry, so registrations made through one handle are visible
/// through any other, including handles already captured by a built
/// `ServiceProvider` (see [`SharedRegistry`]). `build()` can be called more
/// than once; each call produces an independent `ServiceProvider` over the
/// same live registry.
pub struct ServiceCollection {
    registry: SharedRegistry,
    observers: Arc<Mutex<Observers>>,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self {
            registry: SharedRegistry::new(),
            observers: Arc::new(Mutex::new(Observers::new())),
        }
    }

    /// Creates a collection with itself registered as a Singleton instance,
    /// so application code can resolve the `ServiceCollection` (the
    /// container) as a service of itself, the way a `Scope` can resolve its
    /// owning `ServiceProvider` through a `&ResolverContext`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Resolver};
    ///
    /// let services = ServiceCollection::bootstrap();
    /// services.add_singleton(42usize);
    ///
    /// let provider = services.build();
    /// let container = provider.get_required::<ServiceCollection>();
    /// container.add_singleton("late".to_string());
    ///
    /// assert_eq!(*provider.get_required::<usize>(), 42);
    /// assert_eq!(&*provider.get_required::<String>(), "late");
    /// ```
    pub fn bootstrap() -> Self {
        let collection = Self::new();
        collection.add_singleton(collection.clone());
        collection
    }

    // ----- Concrete Type Registrations -----

    /// Registers a singleton instance that will be shared across the entire application.
    ///
    /// The instance is created immediately and wrapped in an `Arc` for thread-safe sharing.
    /// All requests for this service type will return the same instance.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::ServiceCollection;
    /// struct Config {
    ///     database_url: String
    /// }
    ///
    /// let services = ServiceCollection::new();
    /// services.add_singleton(Config {
    ///     database_url: "postgres://localhost".to_string()
    /// });
    /// ```
    pub fn add_singleton<T: 'static + Send + Sync>(&self, value: T) -> &Self {
        let arc = Arc::new(value);
        let key = Key::Type(TypeId::of::<T>(), std::any::type_name::<T>());
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> {
            Ok(arc.clone())
        };
        self.registry.write(|r| {
            r.insert(key, Registration::with_impl_id(
                Lifetime::Singleton,
                Arc::new(ctor),
                Some(TypeId::of::<T>()),
            ));
        });
        self
    }

    /// Registers a singleton factory that creates the instance on first request.
    ///
    /// The factory is called only once, and the result is cached and shared across
    /// all subsequent requests. The factory receives a `ResolverContext` to resolve
    /// dependencies.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// struct Database { url: String }
    /// struct UserService { db: Arc<Database> }
    ///
    /// let services = ServiceCollection::new();
    /// services.add_singleton(Database { url: "postgres://localhost".to_string() });
    /// services.add_singleton_factory::<UserService, _>(|resolver| {
    ///     UserService {
    ///         db: resolver.get_required::<Database>()
    ///     }
    /// });
    /// ```
    pub fn add_singleton_factory<T, F>(&self, factory: F) -> &Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory::<T, F>(Lifetime::Singleton, factory)
    }

    /// Registers a scoped factory that creates one instance per scope.
    ///
    /// Each scope gets its own instance, but within a scope, the same instance
    /// is reused. Perfect for per-request services in web applications.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// struct Database { url: String }
    /// struct RequestContext { request_id: String }
    /// struct UserService { db: Arc<Database>, context: Arc<RequestContext> }
    ///
    /// let services = ServiceCollection::new();
    /// services.add_singleton(Database { url: "postgres://localhost".to_string() });
    /// services.add_scoped_factory::<RequestContext, _>(|_| {
    ///     RequestContext { request_id: "req-123".to_string() }
    /// });
    /// services.add_scoped_factory::<UserService, _>(|resolver| {
    ///     UserService {
    ///         db: resolver.get_required::<Database>(),
    ///         context: resolver.get_required::<RequestContext>()
    ///     }
    /// });
    /// ```
    pub fn add_scoped_factory<T, F>(&self, factory: F) -> &Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory::<T, F>(Lifetime::Scoped, factory)
    }

    /// Registers a transient factory that creates a new instance on every request.
    ///
    /// No caching is performed - the factory is called every time this service
    /// is resolved, even within the same scope.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// struct Database { url: String }
    /// struct Logger { timestamp: std::time::SystemTime }
    ///
    /// let services = ServiceCollection::new();
    /// services.add_singleton(Database { url: "postgres://localhost".to_string() });
    /// services.add_transient_factory::<Logger, _>(|_| {
    ///     Logger { timestamp: std::time::SystemTime::now() }
    /// });
    /// ```
    pub fn add_transient_factory<T, F>(&self, factory: F) -> &Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory::<T, F>(Lifetime::Transient, factory)
    }

    fn add_factory<T, F>(&self, lifetime: Lifetime, factory: F) -> &Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        let key = Key::Type(TypeId::of::<T>(), std::any::type_name::<T>());
        let factory = Arc::new(factory);
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(r)))
        };
        self.registry.write(|r| {
            r.insert(key, Registration::with_impl_id(
                lifetime,
                Arc::new(ctor),
                Some(TypeId::of::<T>()),
            ));
        });
        self
    }

    // ----- Trait Single-Binding Registrations -----

    /// Registers a singleton trait implementation.
    ///
    /// Binds a concrete implementation to a trait, creating a single instance
    /// that's shared across the entire application. The implementation must
    /// already be wrapped in an `Arc`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait Logger: Send + Sync {
    ///     fn log(&self, message: &str);
    /// }
    ///
    /// struct FileLogger { path: String }
    /// impl Logger for FileLogger {
    ///     fn log(&self, message: &str) {
    ///         // Write to file
    ///     }
    /// }
    ///
    /// let services = ServiceCollection::new();
    /// let logger = Arc::new(FileLogger { path: "/var/log/app.log".to_string() });
    /// services.add_singleton_trait::<dyn Logger>(logger);
    /// ```
    pub fn add_singleton_trait<T>(&self, value: Arc<T>) -> &Self
    where
        T: ?Sized + 'static + Send + Sync,
    {
        let key = Key::Trait(std::any::type_name::<T>());
        let any_arc: AnyArc = Arc::new(value);
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> {
            Ok(any_arc.clone())
        };
        self.registry.write(|r| {
            r.insert(key, Registration::with_impl_id(Lifetime::Singleton, Arc::new(ctor), None));
        });
        self
    }

    /// Registers a singleton trait factory.
    ///
    /// The factory creates a trait implementation on first request, and the result
    /// is cached as a singleton. The factory must return an `Arc<Trait>`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait Logger: Send + Sync {
    ///     fn log(&self, message: &str);
    /// }
    ///
    /// struct FileLogger { path: String }
    /// impl Logger for FileLogger {
    ///     fn log(&self, message: &str) {
    ///         // Write to file
    ///     }
    /// }
    ///
    /// let services = ServiceCollection::new();
    /// services.add_singleton_trait_factory::<dyn Logger, _>(|_| {
    ///     Arc::new(FileLogger { path: "/var/log/app.log".to_string() })
    /// });
    /// ```
    pub fn add_singleton_trait_factory<Trait, F>(&self, factory: F) -> &Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add_trait_factory_impl(Lifetime::Singleton, factory)
    }

    /// Registers a scoped trait factory.
    ///
    /// Creates one trait implementation per scope. Within a scope, the same instance
    /// is reused, but different scopes get different instances.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait RequestLogger: Send + Sync {
    ///     fn log_request(&self, path: &str);
    /// }
    ///
    /// struct FileRequestLogger {
    ///     request_id: String,
    /// }
    /// impl RequestLogger for FileRequestLogger {
    ///     fn log_request(&self, path: &str) {
    ///         // Log with request ID
    ///     }
    /// }
    ///
    /// let services = ServiceCollection::new();
    /// services.add_scoped_trait_factory::<dyn RequestLogger, _>(|_| {
    ///     Arc::new(FileRequestLogger {
    ///         request_id: "req-456".to_string(),
    ///     })
    /// });
    /// ```
    pub fn add_scoped_trait_factory<Trait, F>(&self, factory: F) -> &Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add_trait_factory_impl(Lifetime::Scoped, factory)
    }

    /// Registers a transient trait factory.
    ///
    /// Creates a new trait implementation on every request. No caching is performed,
    /// making this suitable for lightweight, stateless services.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait TimeProvider: Send + Sync {
    ///     fn now(&self) -> std::time::SystemTime;
    /// }
    ///
    /// struct SystemTimeProvider;
    /// impl TimeProvider for SystemTimeProvider {
    ///     fn now(&self) -> std::time::SystemTime {
    ///         std::time::SystemTime::now()
    ///     }
    /// }
    ///
    /// let services = ServiceCollection::new();
    /// services.add_transient_trait_factory::<dyn TimeProvider, _>(|_| {
    ///     Arc::new(SystemTimeProvider)
    /// });
    /// ```
    pub fn add_transient_trait_factory<Trait, F>(&self, factory: F) -> &Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add_trait_factory_impl(Lifetime::Transient, factory)
    }

    fn add_trait_factory_impl<Trait, F>(&self, lifetime: Lifetime, factory: F) -> &Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        let key = Key::Trait(std::any::type_name::<Trait>());
        let factory = Arc::new(factory);
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(r)))
        };
        self.registry.write(|r| {
            r.insert(key, Registration::with_impl_id(lifetime, Arc::new(ctor), None));
        });
        self
    }

    // ----- Trait Multi-Binding Registrations -----

    /// Adds a trait implementation to the enumerable multi-binding list.
    ///
    /// Every call appends, rather than overriding a prior registration;
    /// `Resolver::get_all_trait` returns implementations in registration order.
    pub fn add_trait_implementation<T>(&self, value: Arc<T>, lifetime: Lifetime) -> &Self
    where
        T: ?Sized + 'static + Send + Sync,
    {
        let name = std::any::type_name::<T>();
        let any_arc: AnyArc = Arc::new(value);
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> {
            Ok(any_arc.clone())
        };
        self.registry.write(|r| {
            r.push_many(name, Registration::with_impl_id(lifetime, Arc::new(ctor), None));
        });
        self
    }

    /// Adds a trait factory to the enumerable multi-binding list.
    pub fn add_trait_factory<Trait, F>(&self, lifetime: Lifetime, factory: F) -> &Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        let name = std::any::type_name::<Trait>();
        let factory = Arc::new(factory);
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(r)))
        };
        self.registry.write(|r| {
            r.push_many(name, Registration::with_impl_id(lifetime, Arc::new(ctor), None));
        });
        self
    }

    // ----- Open-Generic Registration -----

    /// Registers an open-generic family, named by one of its closed
    /// instantiations (`F`). Later, any closed instantiation of the same
    /// family resolved via `Resolver::get_open`/`get_required_open` gets a
    /// closed-form registration synthesized the first time it's requested.
    ///
    /// # Examples
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
    /// let repo = provider.get_required_open::<Repo<u32>>();
    /// ```
    pub fn add_open_generic<F: OpenGeneric>(&self, lifetime: Lifetime) -> &Self {
        let family = family_of::<F>();
        self.registry.write(|r| r.register_family(family, lifetime));
        self
    }

    // ----- Service Descriptors and Introspection -----

    /// Get all service descriptors for introspection and diagnostics.
    ///
    /// Returns a vector of `ServiceDescriptor` objects that describe all registered services,
    /// including their keys, lifetimes, and implementation type information when available.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Lifetime};
    ///
    /// let services = ServiceCollection::new();
    /// services.add_singleton(42usize);
    /// services.add_scoped_factory::<String, _>(|_| "hello".to_string());
    ///
    /// let descriptors = services.get_service_descriptors();
    /// assert_eq!(descriptors.len(), 2);
    ///
    /// let usize_desc = descriptors.iter()
    ///     .find(|d| d.type_name().contains("usize"))
    ///     .unwrap();
    /// assert_eq!(usize_desc.lifetime, Lifetime::Singleton);
    /// ```
    pub fn get_service_descriptors(&self) -> Vec<ServiceDescriptor> {
        self.registry.read(|registry| {
            let mut descriptors = Vec::new();

            for (key, registration) in registry.iter() {
                descriptors.push(ServiceDescriptor {
                    key: key.clone(),
                    lifetime: registration.lifetime,
                    impl_type_id: registration.impl_id,
                    impl_type_name: registration.impl_id.map(|_| key.service_name()),
                });
            }

            for (trait_name, registrations) in &registry.many {
                for (index, registration) in registrations.iter().enumerate() {
                    descriptors.push(ServiceDescriptor {
                        key: Key::MultiTrait(trait_name, index),
                        lifetime: registration.lifetime,
                        impl_type_id: registration.impl_id,
                        impl_type_name: registration.impl_id.map(|_| *trait_name),
                    });
                }
            }

            descriptors
        })
    }

    // ----- Observer Management -----

    /// Adds a diagnostic observer for DI resolution events.
    ///
    /// Observers enable structured tracing and monitoring of the dependency injection
    /// container's behavior.
    ///
    /// # Performance
    ///
    /// Observer calls are made synchronously during resolution. Keep observer
    /// implementations lightweight to avoid impacting performance.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, LoggingObserver};
    /// use std::sync::Arc;
    ///
    /// let services = ServiceCollection::new();
    /// services.add_observer(Arc::new(LoggingObserver::new()));
    ///
    /// let provider = services.build();
    /// ```
    pub fn add_observer(&self, observer: Arc<dyn DiObserver>) -> &Self {
        self.observers.lock().unwrap().add(observer);
        self
    }

    /// Builds the final service provider from this collection.
    ///
    /// The returned `ServiceProvider` shares this collection's backing
    /// registry, so later registrations made through this (or any cloned)
    /// `ServiceCollection` handle remain visible to it.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Resolver};
    ///
    /// let collection = ServiceCollection::new();
    /// collection.add_singleton(42usize);
    /// collection.add_transient_factory::<String, _>(|_| "Hello".to_string());
    ///
    /// let provider = collection.build();
    /// let number = provider.get_required::<usize>();
    /// let text = provider.get_required::<String>();
    ///
    /// assert_eq!(*number, 42);
    /// assert_eq!(&*text, "Hello");
    /// ```
    pub fn build(&self) -> ServiceProvider {
        let observers = self.observers.lock().unwrap().clone();
        ServiceProvider::new(self.registry.clone(), observers)
    }
}

impl Clone for ServiceCollection {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            observers: self.observers.clone(),
        }
    }
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}
