//! Test support: a synchronous scripted auth source and small helpers.

use crate::principal::Identity;
use crate::source::{AuthCallback, AuthEventSource, SubscriberRegistry, Subscription};

/// A synchronous `AuthEventSource` fake.
///
/// `emit` drives every live subscriber inline on the calling thread, so
/// tests can script an exact sequence of notifications and assert on the
/// state after each one.
pub struct ScriptedSource {
    registry: SubscriberRegistry,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            registry: SubscriberRegistry::new(),
        }
    }

    /// Deliver `identity` to every live subscriber, synchronously.
    pub fn emit(&self, identity: Option<Identity>) {
        self.registry.notify(identity.as_ref());
    }

    /// Number of live subscriptions, for cancellation assertions.
    pub fn active_subscriptions(&self) -> usize {
        self.registry.len()
    }
}

impl AuthEventSource for ScriptedSource {
    fn subscribe(&self, on_change: AuthCallback) -> Subscription {
        self.registry.add(on_change)
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal identity record for tests.
pub fn identity(uid: &str) -> Identity {
    Identity::new(uid)
}

/// Initialize a tracing subscriber for a test run. Safe to call from every
/// test; repeat initialization is ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity=debug".into()),
        )
        .try_init();
}
