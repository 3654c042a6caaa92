//! Subscription boundary for identity-change notifications.
//!
//! This module defines the one interface the auth bridge depends on: a
//! source of identity-change notifications that hands back a cancellation
//! capability. The production implementation is `AuthService`; tests drive
//! the same interface with a synchronous scripted fake.
//!
//! # Subscription Lifecycle
//!
//! 1. A consumer calls `subscribe` with a callback
//! 2. The source invokes the callback once per emitted notification, in
//!    emission order
//! 3. The consumer cancels via `Subscription::cancel`, or the subscription
//!    is released when the `Subscription` is dropped
//! 4. After release, the callback is never invoked again
//!
//! # Invariants
//! - Exactly one cancellation ever reaches the source per subscription;
//!   the canceller is taken at most once.
//! - Dropping a `Subscription` without calling `cancel` still releases it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::principal::Identity;

/// Callback invoked with the latest identity value on each notification.
///
/// `None` is an explicit signed-out notification, not an error.
pub type AuthCallback = Box<dyn FnMut(Option<Identity>) + Send>;

/// A source of identity-change notifications.
///
/// Implementations deliver notifications in emission order and stop
/// delivering to a callback once its subscription has been released.
pub trait AuthEventSource {
    /// Register `on_change` and return the cancellation capability for it.
    fn subscribe(&self, on_change: AuthCallback) -> Subscription;
}

/// An opaque cancellation capability for one subscription.
///
/// Releasing happens exactly once: either through `cancel`, which consumes
/// the handle, or when the handle is dropped. After release the source
/// never invokes the associated callback again.
pub struct Subscription {
    canceller: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a canceller closure. The closure runs at most once.
    #[must_use]
    pub const fn new(canceller: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            canceller: Some(canceller),
        }
    }

    /// Release the subscription now.
    pub fn cancel(mut self) {
        self.release();
    }

    /// Run the canceller if it has not run yet.
    fn release(&mut self) {
        if let Some(canceller) = self.canceller.take() {
            canceller();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("released", &self.canceller.is_none())
            .finish()
    }
}

/// Shared fan-out registry backing `AuthEventSource` implementations.
///
/// Callbacks are keyed by a monotonically increasing id, so delivery order
/// within one notification matches registration order.
pub struct SubscriberRegistry {
    subscribers: Arc<Mutex<BTreeMap<u64, AuthCallback>>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a callback and return its cancellation handle.
    ///
    /// The canceller holds only a weak reference to the registry, so an
    /// outstanding `Subscription` does not keep the source alive.
    pub fn add(&self, on_change: AuthCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.insert(id, on_change);
        }

        let registry = Arc::downgrade(&self.subscribers);
        Subscription::new(Box::new(move || {
            if let Some(subscribers) = registry.upgrade() {
                if let Ok(mut subscribers) = subscribers.lock() {
                    subscribers.remove(&id);
                }
            }
        }))
    }

    /// Deliver `identity` to every live subscriber, in registration order.
    #[allow(clippy::disallowed_methods)] // Clone needed for per-subscriber delivery
    pub fn notify(&self, identity: Option<&Identity>) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            for on_change in subscribers.values_mut() {
                on_change(identity.cloned());
            }
        }
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.subscribers.lock().map_or(0, |subscribers| subscribers.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counting_callback(counter: &Arc<AtomicUsize>) -> AuthCallback {
        let counter = Arc::clone(counter);
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_notify_reaches_subscriber() {
        let registry = SubscriberRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let _subscription = registry.add(counting_callback(&count));

        registry.notify(Some(&Identity::new("user-1")));
        registry.notify(None);

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cancel_stops_delivery() {
        let registry = SubscriberRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let subscription = registry.add(counting_callback(&count));

        registry.notify(Some(&Identity::new("user-1")));
        subscription.cancel();
        registry.notify(Some(&Identity::new("user-2")));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_drop_releases_subscription() {
        let registry = SubscriberRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        {
            let _subscription = registry.add(counting_callback(&count));
            assert_eq!(registry.len(), 1);
        }
        assert_eq!(registry.len(), 0);

        registry.notify(None);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_delivery_matches_registration_order() {
        let registry = SubscriberRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut subscriptions = Vec::new();
        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            subscriptions.push(registry.add(Box::new(move |_| {
                order.lock().expect("order lock").push(label);
            })));
        }

        registry.notify(None);

        let observed = order.lock().expect("order lock");
        assert_eq!(*observed, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_canceller_outlives_registry() {
        let registry = SubscriberRegistry::new();
        let subscription = registry.add(Box::new(|_| {}));
        drop(registry);
        // Cancelling after the source is gone is a no-op, not a panic.
        subscription.cancel();
    }

    #[test]
    fn test_subscription_debug_reports_release() {
        let subscription = Subscription::new(Box::new(|| {}));
        assert!(format!("{subscription:?}").contains("released: false"));
    }
}
