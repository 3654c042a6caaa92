//! Identity platform client bootstrap.
//!
//! Constructs the process-wide handles to the external identity platform
//! from a `ClientConfig`: the base app handle, an analytics handle, a
//! document-store handle, and the identity-service handle. Pure
//! construction; all protocol work lives on the platform's side of the
//! boundary.
//!
//! # Pre-conditions
//! - `Client::initialize` is called at most once per process.
//!
//! # Post-conditions
//! - Handles are immutable once constructed and shared by reference for the
//!   process lifetime.
//!
//! # Invariants
//! - A second `Client::initialize` call fails; there is no re-initialization
//!   path.
//! - Initialization failure is fatal to the caller; there is no degraded
//!   mode for a misconfigured client.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use rand::distr::Alphanumeric;

use crate::config::{ClientConfig, ConfigError};
use crate::principal::Identity;
use crate::source::{AuthCallback, AuthEventSource, SubscriberRegistry, Subscription};

/// Process-wide guard so `Client::initialize` runs exactly once.
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Length of the generated per-process app instance id.
const APP_INSTANCE_ID_LENGTH: usize = 22;

/// Error returned when client bootstrap fails.
#[derive(Debug)]
pub enum InitError {
    /// `Client::initialize` was already called in this process.
    AlreadyInitialized,
    /// The configuration record failed validation.
    InvalidConfig(ConfigError),
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyInitialized => {
                write!(f, "identity client is already initialized in this process")
            }
            Self::InvalidConfig(e) => write!(f, "invalid client configuration: {e}"),
        }
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AlreadyInitialized => None,
            Self::InvalidConfig(e) => Some(e),
        }
    }
}

impl From<ConfigError> for InitError {
    fn from(e: ConfigError) -> Self {
        Self::InvalidConfig(e)
    }
}

/// Base handle for the platform client.
#[derive(Debug)]
pub struct App {
    config: ClientConfig,
    instance_id: String,
}

impl App {
    /// The configuration this app was constructed from.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The generated per-process instance id.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }
}

/// Analytics handle. Construction only; enabled iff the configuration
/// carries a measurement id.
#[derive(Debug)]
pub struct Analytics {
    measurement_id: Option<String>,
}

impl Analytics {
    /// Whether analytics collection is configured for this app.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.measurement_id.is_some()
    }

    /// The measurement id, when analytics is enabled.
    #[must_use]
    pub fn measurement_id(&self) -> Option<&str> {
        self.measurement_id.as_deref()
    }
}

/// Document-store handle, scoped to the configured project.
#[derive(Debug)]
pub struct DocumentStore {
    project_id: String,
}

impl DocumentStore {
    /// The project this store handle is scoped to.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

/// Identity-service handle.
///
/// The platform transport drives `notify_state_changed` with the latest
/// identity on every auth-state transition; this handle fans each value out
/// to live subscriptions. Stream establishment failures are the platform's
/// to surface; this handle performs no retry or recovery.
pub struct AuthService {
    registry: SubscriberRegistry,
}

impl AuthService {
    fn new() -> Self {
        Self {
            registry: SubscriberRegistry::new(),
        }
    }

    /// Entry point for the platform transport: deliver the latest identity
    /// (or explicit signed-out) to every live subscriber, in registration
    /// order.
    pub fn notify_state_changed(&self, identity: Option<&Identity>) {
        tracing::debug!(
            signed_in = identity.is_some(),
            subscribers = self.registry.len(),
            "auth state notification"
        );
        self.registry.notify(identity);
    }

    /// Number of live subscriptions, for introspection.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }
}

impl AuthEventSource for AuthService {
    fn subscribe(&self, on_change: AuthCallback) -> Subscription {
        self.registry.add(on_change)
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("subscribers", &self.registry.len())
            .finish()
    }
}

/// The four platform handles produced by bootstrap.
#[derive(Debug)]
pub struct Client {
    app: Arc<App>,
    analytics: Arc<Analytics>,
    db: Arc<DocumentStore>,
    auth: Arc<AuthService>,
}

impl Client {
    /// Bootstrap the platform client for this process.
    ///
    /// Runs exactly once per process; the handles it produces are long-lived
    /// shared references.
    ///
    /// # Errors
    ///
    /// Returns `InitError::AlreadyInitialized` on a repeat call, or
    /// `InitError::InvalidConfig` if a required field is empty. Both are
    /// fatal; callers are expected to abort startup.
    pub fn initialize(config: ClientConfig) -> Result<Self, InitError> {
        if INITIALIZED.swap(true, Ordering::SeqCst) {
            return Err(InitError::AlreadyInitialized);
        }
        let client = Self::new(config)?;
        tracing::info!(
            project_id = %client.app.config().project_id,
            instance_id = client.app.instance_id(),
            "identity client initialized"
        );
        Ok(client)
    }

    /// Construct the handles without touching the process-wide guard.
    ///
    /// This is the seam for substituting a freshly built client in tests;
    /// production code goes through `initialize`.
    ///
    /// # Errors
    ///
    /// Returns `InitError::InvalidConfig` if a required field is empty.
    pub fn new(config: ClientConfig) -> Result<Self, InitError> {
        config.validate()?;

        let analytics = Analytics {
            measurement_id: config.measurement_id.clone(),
        };
        if !analytics.is_enabled() {
            tracing::debug!("analytics disabled: no measurement id configured");
        }

        let db = DocumentStore {
            project_id: config.project_id.clone(),
        };

        let app = App {
            instance_id: generate_instance_id(),
            config,
        };

        Ok(Self {
            app: Arc::new(app),
            analytics: Arc::new(analytics),
            db: Arc::new(db),
            auth: Arc::new(AuthService::new()),
        })
    }

    /// The base app handle.
    #[must_use]
    pub const fn app(&self) -> &Arc<App> {
        &self.app
    }

    /// The analytics handle.
    #[must_use]
    pub const fn analytics(&self) -> &Arc<Analytics> {
        &self.analytics
    }

    /// The document-store handle.
    #[must_use]
    pub const fn db(&self) -> &Arc<DocumentStore> {
        &self.db
    }

    /// The identity-service handle.
    #[must_use]
    pub const fn auth(&self) -> &Arc<AuthService> {
        &self.auth
    }
}

/// Generate the per-process app instance id.
fn generate_instance_id() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(APP_INSTANCE_ID_LENGTH)
        .map(char::from)
        .collect()
}
