//! # ferrous-di
//!
//! Type-safe, performant dependency injection for Rust, inspired by Microsoft.Extensions.DependencyInjection.
//!
//! ## Features
//!
//! - **Type-safe lifetimes**: Singleton, Scoped, and Transient services
//! - **Trait support**: Single and multi-binding trait resolution
//! - **Thread-safe**: Arc-based sharing with proper lifetime management
//! - **Circular dependency detection**: Prevents infinite loops with detailed error paths
//! - **Scoped isolation**: Request-scoped services with proper cleanup
//! - **Open-generic synthesis**: Closed-form registrations generated on demand from a family
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_di::{ServiceCollection, Resolver};
//! use std::sync::Arc;
//!
//! // Define your services
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! // Register services
//! let services = ServiceCollection::new();
//! services.add_singleton(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! services.add_transient_factory::<UserService, _>(|resolver| {
//!     UserService {
//!         db: resolver.get_required::<Database>(),
//!     }
//! });
//!
//! // Build and use the service provider
//! let provider = services.build();
//! let user_service = provider.get_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: Created once and shared across the entire application
//! - **Scoped**: Created once per scope (ideal for web request contexts)
//! - **Transient**: Created fresh on every resolution
//!
//! ## Trait Resolution
//!
//! ```rust
//! use ferrous_di::{ServiceCollection, Resolver};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str);
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, message: &str) {
//!         println!("[LOG] {}", message);
//!     }
//! }
//!
//! let services = ServiceCollection::new();
//! services.add_singleton_trait::<dyn Logger>(Arc::new(ConsoleLogger));
//!
//! let provider = services.build();
//! let logger = provider.get_required_trait::<dyn Logger>();
//! logger.log("Hello, World!");
//! ```
//!
//! ## Scoped Services
//!
//! ```rust
//! use ferrous_di::{ServiceCollection, Resolver};
//! use std::sync::{Arc, Mutex};
//!
//! struct RequestId(String);
//!
//! let services = ServiceCollection::new();
//! let counter = Arc::new(Mutex::new(0));
//! let counter_clone = counter.clone();
//!
//! services.add_scoped_factory::<RequestId, _>(move |_| {
//!     let mut c = counter_clone.lock().unwrap();
//!     *c += 1;
//!     RequestId(format!("req-{}", *c))
//! });
//!
//! let provider = services.build();
//! let scope1 = provider.create_scope();
//! let scope2 = provider.create_scope();
//!
//! let req1 = scope1.get_required::<RequestId>();
//! let req2 = scope2.get_required::<RequestId>();
//! // Different scopes get different instances
//! ```

// Module declarations
pub mod collection;
pub mod provider;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod open_generic;
pub mod traits;

// Internal modules
mod internal;
mod registration;

// Standard library imports for Options pattern
use std::sync::Arc;

// Import for internal use in Options pattern
use self::provider::ResolverContext as InternalResolverContext;

// Re-export core types
pub use collection::{ServiceCollection, ServiceModule, ServiceCollectionExt, ServiceCollectionModuleExt};
pub use provider::{ServiceProvider, Scope, ScopedResolver, ResolverContext};
pub use descriptors::ServiceDescriptor;
pub use error::{DiError, DiResult};
pub use key::{Key, key_of_type};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, LoggingObserver};
pub use open_generic::OpenGeneric;
pub use traits::{Dispose, AsyncDispose, Resolver, ResolverCore};

// ===== Options Pattern =====

/// Options interface for dependency injection.
///
/// This trait provides access to immutable configuration snapshots that are resolved
/// once during application startup and remain consistent throughout the application lifetime.
///
/// Inspired by Microsoft.Extensions.DependencyInjection's `IOptions<T>` pattern.
///
/// # Examples
///
/// ```
/// use ferrous_di::{ServiceCollection, IOptions, Options, Resolver};
///
/// #[derive(Default)]
/// struct AppSettings {
///     name: String,
///     debug: bool,
/// }
///
/// let services = ServiceCollection::new();
/// services.add_options::<AppSettings>()
///     .configure(|_r, s| {
///         s.name = "MyApp".to_string();
///         s.debug = true;
///     })
///     .register();
///
/// let provider = services.build();
/// let options = provider.get_required::<Options<AppSettings>>();
/// let settings = options.get();
/// assert_eq!(settings.name, "MyApp");
/// assert!(settings.debug);
/// ```
pub trait IOptions<T>: Send + Sync + 'static {
    /// Gets the configured options instance.
    fn get(&self) -> Arc<T>;
}

/// Immutable options wrapper that implements `IOptions<T>`.
///
/// This struct holds an `Arc<T>` containing the final configured options snapshot.
/// Options are built once during container setup and remain immutable thereafter.
///
/// # Examples
///
/// ```
/// use ferrous_di::{ServiceCollection, IOptions, Options, Resolver};
///
/// #[derive(Default)]
/// struct DatabaseConfig {
///     connection_string: String,
///     max_connections: u32,
/// }
///
/// let services = ServiceCollection::new();
/// services.add_options::<DatabaseConfig>()
///     .default_with(|| DatabaseConfig {
///         connection_string: "postgres://localhost".to_string(),
///         max_connections: 10,
///     })
///     .validate(|cfg| {
///         if cfg.max_connections == 0 {
///             Err("max_connections must be > 0".to_string())
///         } else {
///             Ok(())
///         }
///     })
///     .register();
///
/// let provider = services.build();
/// let config = provider.get_required::<Options<DatabaseConfig>>();
/// let db_config = config.get();
/// assert_eq!(db_config.max_connections, 10);
/// ```
pub struct Options<T> {
    inner: Arc<T>,
}

impl<T> Options<T> {
    /// Creates a new `Options<T>` wrapping the given value.
    pub fn new(value: T) -> Self {
        Self { inner: Arc::new(value) }
    }

    /// Gets a reference to the inner `Arc<T>`.
    pub fn value(&self) -> &Arc<T> {
        &self.inner
    }

    /// Gets a clone of the inner `Arc<T>` containing the configured options.
    /// This is a convenience method that calls the `IOptions<T>` trait method.
    pub fn get(&self) -> Arc<T> {
        self.inner.clone()
    }
}

impl<T> IOptions<T> for Options<T>
where
    T: Send + Sync + 'static,
{
    fn get(&self) -> Arc<T> {
        self.inner.clone()
    }
}

// Type aliases for common options patterns
type ConfigureFn<T> = Arc<dyn Fn(&InternalResolverContext, &mut T) + Send + Sync>;
type PostConfigureFn<T> = Arc<dyn Fn(&InternalResolverContext, &mut T) + Send + Sync>;
type ValidateFn<T> = Arc<dyn Fn(&T) -> Result<(), String> + Send + Sync>;

/// Options builder for configuring complex options with dependencies.
///
/// The `OptionsBuilder` provides a fluent API for configuring options that depend on
/// other services from the DI container. It supports default value creation, configuration
/// phases, post-configuration for computed values, and validation.
///
/// # Examples
///
/// ```
/// use ferrous_di::{ServiceCollection, Resolver, Options};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct ApiConfig {
///     base_url: String,
///     timeout_ms: u64,
///     api_key: Option<String>,
/// }
///
/// trait ConfigProvider: Send + Sync {
///     fn get(&self, key: &str) -> Option<String>;
/// }
/// struct EnvConfig;
/// impl ConfigProvider for EnvConfig {
///     fn get(&self, key: &str) -> Option<String> {
///         std::env::var(key).ok()
///     }
/// }
///
/// let services = ServiceCollection::new();
/// services.add_singleton_trait::<dyn ConfigProvider>(Arc::new(EnvConfig));
///
/// services.add_options::<ApiConfig>()
///     .default_with(|| ApiConfig {
///         base_url: "https://api.example.com".to_string(),
///         timeout_ms: 5000,
///         api_key: None,
///     })
///     .configure(|resolver, config| {
///         let provider = resolver.get_required_trait::<dyn ConfigProvider>();
///         if let Some(url) = provider.get("API_BASE_URL") {
///             config.base_url = url;
///         }
///         if let Some(timeout) = provider.get("API_TIMEOUT").and_then(|s| s.parse().ok()) {
///             config.timeout_ms = timeout;
///         }
///         config.api_key = provider.get("API_KEY");
///     })
///     .post_configure(|_resolver, config| {
///         if !config.base_url.ends_with('/') {
///             config.base_url.push('/');
///         }
///     })
///     .validate(|config| {
///         if config.timeout_ms == 0 {
///             return Err("timeout_ms must be greater than 0".to_string());
///         }
///         if config.base_url.is_empty() {
///             return Err("base_url cannot be empty".to_string());
///         }
///         Ok(())
///     })
///     .register();
///
/// let provider = services.build();
/// let options = provider.get_required::<Options<ApiConfig>>();
/// let api_config = options.get();
/// assert!(api_config.timeout_ms > 0);
/// assert!(api_config.base_url.ends_with('/'));
/// ```
pub struct OptionsBuilder<T>
where
    T: Default + Send + Sync + 'static,
{
    sc: ServiceCollection,
    default_maker: Option<Arc<dyn Fn() -> T + Send + Sync>>,
    configures: Vec<ConfigureFn<T>>,
    post_configures: Vec<PostConfigureFn<T>>,
    validates: Vec<ValidateFn<T>>,
}

impl<T> OptionsBuilder<T>
where
    T: Default + Send + Sync + 'static,
{
    pub(crate) fn new(sc: &ServiceCollection) -> Self {
        Self {
            sc: sc.clone(),
            default_maker: None,
            configures: Vec::new(),
            post_configures: Vec::new(),
            validates: Vec::new(),
        }
    }

    /// Provide a custom default value creator (otherwise T::default()).
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, IOptions, Options, Resolver};
    ///
    /// #[derive(Default)]
    /// struct ServerConfig {
    ///     host: String,
    ///     port: u16,
    /// }
    ///
    /// let services = ServiceCollection::new();
    /// services.add_options::<ServerConfig>()
    ///     .default_with(|| ServerConfig {
    ///         host: "0.0.0.0".to_string(),
    ///         port: 8080,
    ///     })
    ///     .register();
    ///
    /// let provider = services.build();
    /// let options = provider.get_required::<Options<ServerConfig>>();
    /// let config = options.get();
    /// assert_eq!(config.host, "0.0.0.0");
    /// assert_eq!(config.port, 8080);
    /// ```
    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.default_maker = Some(Arc::new(f));
        self
    }

    /// Configure options by providing a callback that can resolve other services from the container.
    ///
    /// Configure callbacks are executed in the order they were added.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, IOptions, Options, Resolver};
    ///
    /// #[derive(Default)]
    /// struct AppConfig {
    ///     feature_enabled: bool,
    /// }
    ///
    /// let services = ServiceCollection::new();
    /// services.add_singleton("production".to_string());
    ///
    /// services.add_options::<AppConfig>()
    ///     .configure(|resolver, config| {
    ///         let env = resolver.get_required::<String>();
    ///         config.feature_enabled = env.as_str() == "production";
    ///     })
    ///     .register();
    ///
    /// let provider = services.build();
    /// let options = provider.get_required::<Options<AppConfig>>();
    /// let config = options.get();
    /// assert!(config.feature_enabled);
    /// ```
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: Fn(&InternalResolverContext, &mut T) + Send + Sync + 'static,
    {
        self.configures.push(Arc::new(f));
        self
    }

    /// Post-configure options after all configure actions have been applied.
    ///
    /// Post-configure callbacks run after all configure callbacks and are useful for
    /// computed values, normalization, or cross-field validation and correction.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, IOptions, Options, Resolver};
    ///
    /// #[derive(Default)]
    /// struct UrlConfig {
    ///     base_url: String,
    ///     api_path: String,
    ///     full_url: String,
    /// }
    ///
    /// let services = ServiceCollection::new();
    /// services.add_options::<UrlConfig>()
    ///     .configure(|_resolver, config| {
    ///         config.base_url = "https://api.example.com".to_string();
    ///         config.api_path = "/v1/users".to_string();
    ///     })
    ///     .post_configure(|_resolver, config| {
    ///         config.full_url = format!("{}{}", config.base_url, config.api_path);
    ///     })
    ///     .register();
    ///
    /// let provider = services.build();
    /// let options = provider.get_required::<Options<UrlConfig>>();
    /// let config = options.get();
    /// assert_eq!(config.full_url, "https://api.example.com/v1/users");
    /// ```
    pub fn post_configure<F>(mut self, f: F) -> Self
    where
        F: Fn(&ResolverContext, &mut T) + Send + Sync + 'static,
    {
        self.post_configures.push(Arc::new(f));
        self
    }

    /// Validate the final options after all configuration steps.
    ///
    /// If any validation fails, registration panics with a descriptive error
    /// message, following the fail-fast principle for configuration errors.
    ///
    /// # Examples
    ///
    /// ```should_panic
    /// use ferrous_di::{ServiceCollection, IOptions, Options, Resolver};
    ///
    /// #[derive(Default)]
    /// struct DatabaseConfig {
    ///     connection_string: String,
    ///     pool_size: u32,
    /// }
    ///
    /// let services = ServiceCollection::new();
    /// services.add_options::<DatabaseConfig>()
    ///     .configure(|_resolver, config| {
    ///         config.connection_string = "".to_string();
    ///         config.pool_size = 0;
    ///     })
    ///     .validate(|config| {
    ///         if config.connection_string.is_empty() {
    ///             return Err("connection_string cannot be empty".to_string());
    ///         }
    ///         if config.pool_size == 0 {
    ///             return Err("pool_size must be greater than 0".to_string());
    ///         }
    ///         Ok(())
    ///     })
    ///     .register();
    ///
    /// let provider = services.build();
    /// let _options = provider.get_required::<Options<DatabaseConfig>>();
    /// ```
    pub fn validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validates.push(Arc::new(f));
        self
    }

    /// Finish building and register `Options<T>` as a singleton in the DI container.
    ///
    /// The configuration process follows this order:
    /// 1. Create initial value (`default_with` or `T::default()`)
    /// 2. Run all configure callbacks in order
    /// 3. Run all post_configure callbacks in order
    /// 4. Run all validate callbacks, panicking on any failure
    /// 5. Wrap in `Options<T>` and register as a singleton factory
    ///
    /// # Panics
    ///
    /// Panics (at first resolution of `Options<T>`) if any validation callback
    /// returns an error.
    pub fn register(self) {
        let sc = self.sc;
        let default_maker = self.default_maker;
        let configures = self.configures;
        let post_configures = self.post_configures;
        let validates = self.validates;

        sc.add_singleton_factory::<Options<T>, _>(move |resolver| {
            let mut value: T = if let Some(mk) = &default_maker {
                (mk)()
            } else {
                T::default()
            };

            for c in &configures {
                c(resolver, &mut value);
            }
            for pc in &post_configures {
                pc(resolver, &mut value);
            }
            for v in &validates {
                if let Err(msg) = v(&value) {
                    panic!("Options<{}> validation failed: {}", std::any::type_name::<T>(), msg);
                }
            }

            Options::new(value)
        });
    }
}

/// Extensions to `ServiceCollection` for the Options pattern.
impl ServiceCollection {
    /// Start building `Options<T>`. Call `.register()` to finalize.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, IOptions, Options, Resolver};
    ///
    /// #[derive(Default)]
    /// struct MySettings {
    ///     enabled: bool,
    ///     timeout: u64,
    /// }
    ///
    /// let services = ServiceCollection::new();
    /// services.add_options::<MySettings>()
    ///     .configure(|_resolver, settings| {
    ///         settings.enabled = true;
    ///         settings.timeout = 5000;
    ///     })
    ///     .register();
    ///
    /// let provider = services.build();
    /// let options = provider.get_required::<Options<MySettings>>();
    /// let settings = options.get();
    /// assert!(settings.enabled);
    /// assert_eq!(settings.timeout, 5000);
    /// ```
    pub fn add_options<T>(&self) -> OptionsBuilder<T>
    where
        T: Default + Send + Sync + 'static,
    {
        OptionsBuilder::new(self)
    }
}
