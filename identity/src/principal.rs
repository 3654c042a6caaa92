//! The signed-in principal record.
//!
//! An `Identity` is owned by the external identity platform; this crate only
//! stores and republishes the latest value it was handed. "Signed out" is
//! represented as `Option<Identity>::None` everywhere, never as a sentinel
//! inside the record itself.
//!
//! # Invariants
//! - `uid` is never empty for a constructed `Identity`.
//! - The bridge never mutates an `Identity` after receiving it.

use serde::{Deserialize, Serialize};

/// An opaque record for a signed-in principal, as delivered by the external
/// identity platform.
///
/// Field names follow the platform's JSON payloads, so a raw notification
/// body deserializes directly into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable unique identifier assigned by the platform.
    pub uid: String,
    /// Primary email address, if the provider shared one.
    #[serde(default)]
    pub email: Option<String>,
    /// Human-readable name, if the provider shared one.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Avatar URL, if the provider shared one.
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl Identity {
    /// Create an identity with only the required `uid` set.
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
            photo_url: None,
        }
    }
}
