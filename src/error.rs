//! Error types for the dependency injection container.

use std::fmt;

/// Dependency injection errors.
///
/// # Examples
///
/// ```rust
/// use ferrous_di::{DiError, ServiceCollection, Resolver};
///
/// let provider = ServiceCollection::new().build();
/// match provider.get::<String>() {
///     Err(DiError::NotRegistered(type_name)) => {
///         assert_eq!(type_name, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// No descriptor (and no open-generic family) matches the requested key.
    NotRegistered(&'static str),
    /// An open-generic family was registered but closed-form synthesis could
    /// not produce a usable constructor for the requested closed type.
    NoConstructor(&'static str),
    /// A type downcast failed; indicates a bug in key construction rather
    /// than a normal user-facing condition.
    TypeMismatch(&'static str),
    /// Circular dependency detected; carries the resolution path that closed
    /// the cycle, in resolution order.
    Circular(Vec<&'static str>),
    /// A Scoped service was requested from the root provider, which has no
    /// scope of its own.
    ScopedFromRoot(&'static str),
    /// Resolution was attempted after `dispose_all()` completed.
    ObjectDisposed(&'static str),
    /// Maximum resolution recursion depth exceeded.
    DepthExceeded(usize),
    /// A fallible factory returned an application-level construction error.
    ConstructionFailed(&'static str),
    /// A fallible factory failed for a reason unrelated to the value it was
    /// constructing (e.g. a dependency it resolved failed).
    FactoryFailed(&'static str),
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::NotRegistered(name) => write!(f, "service not registered: {}", name),
            DiError::NoConstructor(name) => write!(f, "no constructor available for: {}", name),
            DiError::TypeMismatch(name) => write!(f, "type mismatch for: {}", name),
            DiError::Circular(path) => write!(f, "circular dependency: {}", path.join(" -> ")),
            DiError::ScopedFromRoot(name) => {
                write!(f, "cannot resolve scoped service '{}' from the root provider", name)
            }
            DiError::ObjectDisposed(name) => {
                write!(f, "cannot resolve '{}': owner has already been disposed", name)
            }
            DiError::DepthExceeded(depth) => write!(f, "max resolution depth {} exceeded", depth),
            DiError::ConstructionFailed(msg) => write!(f, "construction failed: {}", msg),
            DiError::FactoryFailed(msg) => write!(f, "factory failed: {}", msg),
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for DI operations.
pub type DiResult<T> = Result<T, DiError>;
