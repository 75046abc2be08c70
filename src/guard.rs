//! Declarative attachment: wrap callables so every invocation is guarded.
//!
//! The relay itself is attached at the call site with [`Relay::run`];
//! this module is the definition-time convenience. [`Guarded`] binds one
//! callable to a shared relay, and [`GuardedSet`] guards a statically
//! known registration list of named handlers with one relay - no
//! reflection over anything, the list is the registration.
//!
//! [`Relay::run`]: crate::relay::Relay::run

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::registry::{self, NoDefaultRelayError};
use crate::relay::{Relay, RelayError};

/// Error returned by [`GuardedSet::call`].
#[derive(Debug, Error)]
pub enum GuardError<E> {
    /// Dispatch by a name nothing was registered under.
    #[error("no operation registered under '{name}'")]
    UnknownOperation {
        /// The name that failed to resolve.
        name: String,
    },

    /// The relay rejected or the operation failed.
    #[error(transparent)]
    Relay(#[from] RelayError<E>),
}

/// A callable bound to a shared relay.
///
/// Every [`call`](Self::call) routes through [`Relay::run`], so a
/// threshold crossed here rejects calls through any other holder of the
/// same relay.
pub struct Guarded<F> {
    relay: Arc<Relay>,
    operation: F,
}

impl<F> Guarded<F> {
    /// Bind `operation` to `relay`.
    pub fn new(relay: Arc<Relay>, operation: F) -> Self {
        Self { relay, operation }
    }

    /// Bind `operation` to the process-wide default relay.
    ///
    /// Fails at construction time when no default was set, mirroring the
    /// definition-time nature of the attachment.
    pub fn with_default(operation: F) -> Result<Self, NoDefaultRelayError> {
        Ok(Self {
            relay: registry::get_default()?,
            operation,
        })
    }

    /// The relay this callable is bound to.
    pub const fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    /// Invoke the wrapped callable through the relay.
    pub async fn call<A, Fut, T, E>(&self, args: A) -> Result<T, RelayError<E>>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.relay.run(|| (self.operation)(args)).await
    }
}

type BoxHandler<A, T, E> =
    Box<dyn Fn(A) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send>> + Send + Sync>;

/// A registration list of named handlers, all guarded by one relay.
///
/// The rendering of "wrap every qualifying method": each handler is
/// registered explicitly, and dispatch by name routes through the shared
/// relay. Handlers share one argument, success and error type; wrap
/// heterogeneous operations in their own [`Guarded`] instead.
pub struct GuardedSet<A, T, E> {
    relay: Arc<Relay>,
    handlers: HashMap<String, BoxHandler<A, T, E>>,
}

impl<A, T, E> GuardedSet<A, T, E> {
    /// Create an empty set guarded by `relay`.
    pub fn new(relay: Arc<Relay>) -> Self {
        Self {
            relay,
            handlers: HashMap::new(),
        }
    }

    /// Create an empty set guarded by the process-wide default relay.
    pub fn with_default() -> Result<Self, NoDefaultRelayError> {
        Ok(Self::new(registry::get_default()?))
    }

    /// Register `handler` under `name`, replacing any previous entry.
    #[must_use]
    pub fn register<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.handlers
            .insert(name.into(), Box::new(move |args| Box::pin(handler(args))));
        self
    }

    /// The relay guarding this set.
    pub const fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    /// Whether a handler is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered handler names, in arbitrary order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Dispatch the handler registered under `name` through the relay.
    pub async fn call(&self, name: &str, args: A) -> Result<T, GuardError<E>> {
        let Some(handler) = self.handlers.get(name) else {
            warn!(name, "dispatch to unregistered operation");
            return Err(GuardError::UnknownOperation {
                name: name.to_string(),
            });
        };
        self.relay.run(|| handler(args)).await.map_err(GuardError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::RelayConfig;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn small_relay() -> Arc<Relay> {
        Arc::new(Relay::with_config(RelayConfig {
            failure_threshold: 2,
            cool_down_period: Duration::from_secs(300),
            ..Default::default()
        }))
    }

    #[tokio::test]
    async fn test_guarded_passes_result_through() {
        let guarded = Guarded::new(small_relay(), |x: u32| async move {
            Ok::<_, String>(x * 2)
        });

        assert_eq!(guarded.call(21).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_guarded_opens_shared_relay() {
        let relay = small_relay();
        let guarded = Guarded::new(Arc::clone(&relay), |(): ()| async {
            Err::<u32, _>("fail".to_string())
        });

        for _ in 0..2 {
            let err = guarded.call(()).await.unwrap_err();
            assert!(matches!(err, RelayError::Inner(_)));
        }

        // Threshold reached through the wrapper; direct calls reject too
        let err = relay
            .run(|| async { Ok::<_, String>(1) })
            .await
            .unwrap_err();
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn test_guarded_with_default_requires_registry() {
        let _guard = crate::registry::TEST_LOCK.lock();
        crate::registry::clear_default();

        let missing = Guarded::with_default(|(): ()| async { Ok::<_, String>(()) });
        assert!(missing.is_err());

        crate::registry::set_default(small_relay());
        let bound = Guarded::with_default(|x: u32| async move { Ok::<_, String>(x + 1) })
            .expect("default was just set");
        assert_eq!(bound.call(1).await.unwrap(), 2);

        crate::registry::clear_default();
    }

    #[tokio::test]
    async fn test_guarded_set_dispatches_by_name() {
        let set = GuardedSet::new(small_relay())
            .register("double", |x: u32| async move { Ok::<_, String>(x * 2) })
            .register("square", |x: u32| async move { Ok::<_, String>(x * x) });

        assert!(set.contains("double"));
        assert!(!set.contains("halve"));
        assert_eq!(set.call("double", 4).await.unwrap(), 8);
        assert_eq!(set.call("square", 4).await.unwrap(), 16);
    }

    #[tokio::test]
    async fn test_guarded_set_unknown_name_is_typed_error() {
        let set: GuardedSet<u32, u32, String> = GuardedSet::new(small_relay());

        let err = set.call("missing", 1).await.unwrap_err();
        match err {
            GuardError::UnknownOperation { name } => assert_eq!(name, "missing"),
            GuardError::Relay(_) => panic!("expected UnknownOperation"),
        }
    }

    #[tokio::test]
    async fn test_guarded_set_shares_one_relay_across_handlers() {
        let calls = Arc::new(AtomicU32::new(0));
        let counted = Arc::clone(&calls);

        let set = GuardedSet::new(small_relay())
            .register("flaky", |(): ()| async { Err::<u32, _>("down".to_string()) })
            .register("healthy", move |(): ()| {
                let counted = Arc::clone(&counted);
                async move {
                    counted.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(7)
                }
            });

        // Open the relay through one handler
        for _ in 0..2 {
            let _ = set.call("flaky", ()).await;
        }

        // The sibling handler is rejected without being invoked
        let err = set.call("healthy", ()).await.unwrap_err();
        assert!(matches!(err, GuardError::Relay(RelayError::Open)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
