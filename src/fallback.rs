//! Fallback dispatch: substitute a result when a guarded call fails.
//!
//! Sits strictly outside the relay's admission/outcome loop - the relay
//! accounts for the primary operation as usual, then a fallback handler
//! gets the chance to turn the error into a result. Three shapes mirror
//! the three ways a handler can be supplied: an explicit function value
//! ([`run_with_fallback`]), a handler resolved by name from a lookup
//! table ([`FallbackMap`] + [`run_with_named_fallback`]), and a provider
//! constructed at most once per instance ([`LazyFallback`]).
//!
//! A fallback never masks the primary error: when the handler cannot be
//! resolved, or itself fails, the original relay error propagates and the
//! fallback problem is only logged.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::OnceLock;

use tracing::warn;

use crate::relay::{Relay, RelayError};

/// Run `operation` through `relay`; on any relay error invoke `fallback`
/// with that error and return its result instead.
///
/// The handler receives the error by reference and must build a future
/// that owns what it needs from it. If the fallback itself fails, the
/// original error propagates.
pub async fn run_with_fallback<F, Fut, G, Gut, T, E>(
    relay: &Relay,
    operation: F,
    fallback: G,
) -> Result<T, RelayError<E>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    G: FnOnce(&RelayError<E>) -> Gut,
    Gut: Future<Output = Result<T, E>>,
{
    match relay.run(operation).await {
        Ok(value) => Ok(value),
        Err(error) => match fallback(&error).await {
            Ok(substitute) => Ok(substitute),
            Err(_fallback_error) => {
                warn!("fallback handler failed, propagating the original error");
                Err(error)
            },
        },
    }
}

type BoxFallbackHandler<A, T, E> = Box<
    dyn Fn(&RelayError<E>, A) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send>> + Send + Sync,
>;

/// Lookup-by-key table of fallback handlers.
///
/// The capability interface replacing resolve-by-name on a live object:
/// the table is the statically known set of handlers, and a name either
/// resolves or it does not.
pub struct FallbackMap<A, T, E> {
    handlers: HashMap<String, BoxFallbackHandler<A, T, E>>,
}

impl<A, T, E> FallbackMap<A, T, E> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` under `name`, replacing any previous entry.
    ///
    /// The handler is called with the original error and the call
    /// arguments; the future it returns must own what it keeps from the
    /// error (format or clone before the `async move`).
    #[must_use]
    pub fn register<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&RelayError<E>, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.handlers.insert(
            name.into(),
            Box::new(move |error, args| Box::pin(handler(error, args))),
        );
        self
    }

    /// Whether a handler is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    fn resolve(&self, name: &str) -> Option<&BoxFallbackHandler<A, T, E>> {
        self.handlers.get(name)
    }
}

impl<A, T, E> Default for FallbackMap<A, T, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `operation` through `relay`; on failure dispatch the fallback
/// registered under `name` with the error and `args`.
///
/// An unresolved name is logged and the original operation error
/// propagates unchanged - resolution failure never masks it.
pub async fn run_with_named_fallback<A, F, Fut, T, E>(
    relay: &Relay,
    operation: F,
    handlers: &FallbackMap<A, T, E>,
    name: &str,
    args: A,
) -> Result<T, RelayError<E>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match relay.run(operation).await {
        Ok(value) => Ok(value),
        Err(error) => {
            let Some(handler) = handlers.resolve(name) else {
                warn!(name, "fallback handler not found, propagating the original error");
                return Err(error);
            };
            match handler(&error, args).await {
                Ok(substitute) => Ok(substitute),
                Err(_fallback_error) => {
                    warn!(name, "fallback handler failed, propagating the original error");
                    Err(error)
                },
            }
        },
    }
}

/// A fallback provider constructed at most once per instance.
///
/// The rendering of the lazily-built fallback object: construction is
/// deferred to the first failed call, and every later failure reuses the
/// same provider.
pub struct LazyFallback<P> {
    provider: OnceLock<P>,
    init: Box<dyn Fn() -> P + Send + Sync>,
}

impl<P> LazyFallback<P> {
    /// Defer construction of the provider to first use.
    pub fn new(init: impl Fn() -> P + Send + Sync + 'static) -> Self {
        Self {
            provider: OnceLock::new(),
            init: Box::new(init),
        }
    }

    /// The provider, constructing it on first call.
    pub fn get(&self) -> &P {
        self.provider.get_or_init(|| (self.init)())
    }

    /// Whether the provider was already constructed.
    pub fn is_initialized(&self) -> bool {
        self.provider.get().is_some()
    }
}
