//! Auth bridge: mirrors the platform's auth state into consumer-visible
//! state.
//!
//! The bridge opens exactly one subscription against an `AuthEventSource`
//! for its mounted lifetime, stores the latest identity value from each
//! notification, and latches a `ready` flag on the first one. Wrapped
//! content stays hidden until `ready` latches, so consumers never see a
//! flash of signed-out state before the platform has reported real status.
//!
//! # Bridge Lifecycle
//!
//! 1. `AuthBridge::mount` subscribes to the source
//! 2. Each notification overwrites `current_identity` and sets `ready`
//! 3. Consumers read state through `view` or an `AuthContext`
//! 4. `unmount` (or drop) releases the subscription on every exit path
//!
//! # Invariants
//!
//! - `ready` transitions false -> true exactly once per bridge instance and
//!   never reverts; sign-in/out transitions change `current_identity` only.
//! - A consumer never observes `ready == true` unless at least one
//!   notification has set `current_identity`; both fields are written under
//!   one lock guard.
//! - A bridge instance never re-subscribes after its subscription is
//!   released.
//!
//! Failures of the notification stream itself are the platform's concern;
//! the bridge carries no retry, backoff, or error propagation of its own.

use std::sync::{Arc, Mutex, Weak};

use tokio::sync::watch;

use crate::principal::Identity;
use crate::source::{AuthEventSource, Subscription};

/// The bridged auth state. Written only by the subscription callback.
struct BridgeState {
    /// Latest identity value; `None` before the first notification and
    /// after an explicit signed-out notification.
    current_identity: Option<Identity>,
    /// Latched by the first notification, never reverts.
    ready: bool,
}

/// Coherent snapshot of the bridged state at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    /// Latest identity value, `None` when signed out or not yet ready.
    pub current_identity: Option<Identity>,
    /// Whether the first notification has arrived.
    pub ready: bool,
}

/// Error returned when reading auth state outside an active bridge scope.
///
/// This signals a programming error, not a recoverable runtime condition:
/// a consumer held an `AuthContext` past its bridge's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The bridge this context was taken from has been unmounted.
    NoActiveBridge,
    /// The bridge state lock was poisoned by a panicked writer.
    StatePoisoned,
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoActiveBridge => write!(f, "no auth bridge in scope"),
            Self::StatePoisoned => write!(f, "auth bridge state lock poisoned"),
        }
    }
}

impl std::error::Error for ContextError {}

/// Error returned when waiting for the bridge to become ready fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyError {
    /// The notification stream went away before the first notification.
    StreamClosed,
    /// The bounded wait expired before the first notification.
    TimedOut,
}

impl std::fmt::Display for ReadyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StreamClosed => {
                write!(f, "auth stream closed before the first notification")
            }
            Self::TimedOut => write!(f, "timed out waiting for the first auth notification"),
        }
    }
}

impl std::error::Error for ReadyError {}

/// Read accessor handed to descendants of a mounted bridge.
///
/// Holds only a weak reference: once the bridge is unmounted, every read
/// through the context signals `ContextError::NoActiveBridge` rather than
/// silently returning a default.
#[derive(Debug, Clone)]
pub struct AuthContext {
    state: Weak<Mutex<BridgeState>>,
}

impl AuthContext {
    /// Coherent `(current_identity, ready)` snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::NoActiveBridge` if the bridge has been
    /// unmounted.
    pub fn snapshot(&self) -> Result<AuthSnapshot, ContextError> {
        let state = self.state.upgrade().ok_or(ContextError::NoActiveBridge)?;
        let state = state.lock().map_err(|_| ContextError::StatePoisoned)?;
        Ok(AuthSnapshot {
            current_identity: state.current_identity.clone(),
            ready: state.ready,
        })
    }

    /// Latest identity value, `None` when signed out.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::NoActiveBridge` if the bridge has been
    /// unmounted.
    pub fn current_identity(&self) -> Result<Option<Identity>, ContextError> {
        Ok(self.snapshot()?.current_identity)
    }
}

/// A mounted auth bridge.
///
/// Owns exactly one subscription for its lifetime. Dropping the bridge
/// releases the subscription, so cleanup runs on every exit path, abnormal
/// unwinds included.
pub struct AuthBridge {
    state: Arc<Mutex<BridgeState>>,
    ready_rx: watch::Receiver<bool>,
    subscription: Option<Subscription>,
}

impl AuthBridge {
    /// Mount the bridge: open one subscription against `source` and begin
    /// mirroring its notifications.
    ///
    /// The bridge starts not-ready; nothing is exposed to consumers until
    /// the first notification arrives.
    #[must_use]
    pub fn mount(source: &dyn AuthEventSource) -> Self {
        let state = Arc::new(Mutex::new(BridgeState {
            current_identity: None,
            ready: false,
        }));
        let (ready_tx, ready_rx) = watch::channel(false);

        // The callback holds only a weak reference so a late delivery after
        // unmount cannot resurrect or mutate the state.
        let callback_state = Arc::downgrade(&state);
        let subscription = source.subscribe(Box::new(move |identity| {
            let Some(state) = callback_state.upgrade() else {
                tracing::debug!("discarding auth notification delivered after unmount");
                return;
            };
            if let Ok(mut state) = state.lock() {
                tracing::debug!(signed_in = identity.is_some(), "auth state changed");
                state.current_identity = identity;
                state.ready = true;
            }
            // Send only fails when no receiver is left, which means the
            // bridge itself is gone; nothing to signal then.
            let _ = ready_tx.send(true);
        }));

        tracing::debug!("auth bridge mounted");
        Self {
            state,
            ready_rx,
            subscription: Some(subscription),
        }
    }

    /// Whether the first notification has arrived.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.lock().is_ok_and(|state| state.ready)
    }

    /// Latest identity value.
    ///
    /// `None` both before the first notification and in the signed-out
    /// state; use `is_ready` or `view` to tell the two apart.
    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.current_identity.clone())
    }

    /// Run `render` against the current identity, but only once the bridge
    /// is ready.
    ///
    /// Returns `None` while the first notification is outstanding, which is
    /// how wrapped content stays suppressed during the initial load.
    #[must_use]
    pub fn view<R>(&self, render: impl FnOnce(Option<&Identity>) -> R) -> Option<R> {
        let snapshot = {
            let Ok(state) = self.state.lock() else {
                return None;
            };
            if !state.ready {
                return None;
            }
            state.current_identity.clone()
        };
        Some(render(snapshot.as_ref()))
    }

    /// Read accessor for descendants of this bridge.
    #[must_use]
    pub fn context(&self) -> AuthContext {
        AuthContext {
            state: Arc::downgrade(&self.state),
        }
    }

    /// Wait until the first notification arrives. No timeout: if the
    /// platform never emits, this waits indefinitely.
    ///
    /// # Errors
    ///
    /// Returns `ReadyError::StreamClosed` if the source dropped the
    /// subscription callback before any notification.
    pub async fn wait_ready(&self) -> Result<(), ReadyError> {
        let mut ready_rx = self.ready_rx.clone();
        ready_rx
            .wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| ReadyError::StreamClosed)
    }

    /// Bounded variant of `wait_ready`. The timeout never alters bridge
    /// state; a later notification still latches `ready` as usual.
    ///
    /// # Errors
    ///
    /// Returns `ReadyError::TimedOut` if nothing arrived within `timeout`,
    /// or `ReadyError::StreamClosed` as in `wait_ready`.
    pub async fn wait_ready_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<(), ReadyError> {
        tokio::time::timeout(timeout, self.wait_ready())
            .await
            .map_err(|_| ReadyError::TimedOut)?
    }

    /// Unmount the bridge, releasing its subscription.
    ///
    /// Dropping the bridge has the same effect; this form just makes the
    /// teardown point explicit.
    pub fn unmount(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        tracing::debug!("auth bridge unmounted");
    }
}
