//! Diagnostic observers for dependency injection traceability.
//!
//! Hooks for observing resolution events: structured tracing, latency
//! measurement, and surfacing factory panics to whatever logging
//! infrastructure the host application uses.

use std::sync::Arc;
use crate::Key;

/// Observer trait for dependency injection resolution events.
///
/// # Performance
///
/// Observer calls are made synchronously during resolution. Keep
/// implementations lightweight; for expensive processing, queue events and
/// drain them elsewhere.
///
/// # Examples
///
/// ```
/// use ferrous_di::{DiObserver, ServiceCollection, Key};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// struct TracingObserver {
///     trace_id: String,
/// }
///
/// impl DiObserver for TracingObserver {
///     fn resolving(&self, key: &Key) {
///         println!("[{}] Resolving: {}", self.trace_id, key.display_name());
///     }
///
///     fn resolved(&self, key: &Key, duration: Duration) {
///         println!("[{}] Resolved: {} in {:?}", self.trace_id, key.display_name(), duration);
///     }
///
///     fn factory_panic(&self, key: &Key, message: &str) {
///         println!("[{}] PANIC in {}: {}", self.trace_id, key.display_name(), message);
///     }
/// }
///
/// let services = ServiceCollection::new();
/// services.add_observer(Arc::new(TracingObserver { trace_id: "run-123".to_string() }));
///
/// let provider = services.build();
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a factory function runs.
    fn resolving(&self, key: &Key);

    /// Called after a factory function completes successfully.
    ///
    /// `duration` is the elapsed time between `resolving` and `resolved`.
    fn resolved(&self, key: &Key, duration: std::time::Duration);

    /// Called when a factory function panics. The panic still propagates
    /// after this call returns.
    fn factory_panic(&self, key: &Key, message: &str);
}

/// Container for registered observers, fanning each event out to all of
/// them. Near-zero overhead when empty.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &Key, duration: std::time::Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    #[inline]
    pub(crate) fn factory_panic(&self, key: &Key, message: &str) {
        for observer in &self.observers {
            observer.factory_panic(key, message);
        }
    }
}

/// Built-in observer that logs resolution events to stdout/stderr.
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
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self { prefix: "[ferrous-di]".to_string() }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, key: &Key) {
        println!("{} Resolving: {}", self.prefix, key.display_name());
    }

    fn resolved(&self, key: &Key, duration: std::time::Duration) {
        println!("{} Resolved: {} in {:?}", self.prefix, key.display_name(), duration);
    }

    fn factory_panic(&self, key: &Key, message: &str) {
        eprintln!("{} FACTORY PANIC in {}: {}", self.prefix, key.display_name(), message);
    }
}
