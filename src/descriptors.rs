//! Service descriptors for introspection and diagnostics.

use std::any::TypeId;
use crate::key::Key;
use crate::lifetime::Lifetime;

/// Snapshot of one registration, for introspection and diagnostics.
///
/// # Examples
///
/// ```rust
/// use ferrous_di::{ServiceCollection, Lifetime};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { name: String }
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str);
/// }
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) { println!("LOG: {}", msg); }
/// }
///
/// let services = ServiceCollection::new();
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
/// services.add_scoped_factory::<Repository, _>(|_| Repository { name: "UserRepo".to_string() });
/// services.add_singleton_trait(Arc::new(ConsoleLogger) as Arc<dyn Logger>);
///
/// let descriptors = services.get_service_descriptors();
/// let db_descriptor = descriptors.iter()
///     .find(|d| d.type_name().contains("Database"))
///     .unwrap();
/// assert_eq!(db_descriptor.lifetime, Lifetime::Singleton);
///
/// let singleton_count = descriptors.iter().filter(|d| d.lifetime == Lifetime::Singleton).count();
/// let scoped_count = descriptors.iter().filter(|d| d.lifetime == Lifetime::Scoped).count();
/// assert_eq!(singleton_count, 2);
/// assert_eq!(scoped_count, 1);
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// The service key this descriptor was registered under.
    pub key: Key,
    /// Service lifetime.
    pub lifetime: Lifetime,
    /// Implementation type ID, if known (helps identify the concrete type
    /// backing a trait registration).
    pub impl_type_id: Option<TypeId>,
    /// Implementation type name, if known.
    pub impl_type_name: Option<&'static str>,
}

impl ServiceDescriptor {
    /// The type/trait name this descriptor was registered under.
    pub fn type_name(&self) -> String {
        self.key.display_name()
    }
}
