// Life of an auth state change:
// 1. The platform transport hands the latest identity (or none) to AuthService
// 2. AuthService fans the value out to every live subscription
// 3. A mounted AuthBridge overwrites its snapshot and latches ready
// 4. Consumers read { current_identity } through an AuthContext
//
// System components:
//  - Client bootstrap (app / analytics / document store / auth handles)
//  - Subscription boundary (AuthEventSource + Subscription)
//  - Auth bridge (ready gate + context accessors)

#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::disallowed_methods
    )
)]

mod bridge;
mod client;
mod config;
mod principal;
mod source;
#[cfg(test)]
mod testing;

pub use bridge::{AuthBridge, AuthContext, AuthSnapshot, ContextError, ReadyError};
pub use client::{Analytics, App, AuthService, Client, DocumentStore, InitError};
pub use config::{ClientConfig, ConfigError};
pub use principal::Identity;
pub use source::{AuthCallback, AuthEventSource, Subscription};
