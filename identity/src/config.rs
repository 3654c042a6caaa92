//! Platform client configuration module.
//!
//! This module provides loading for the identity platform's configuration
//! record, either from environment variables or from the JSON object the
//! platform console hands out.
//!
//! # Environment Variables
//!
//! - `IDENTITY_API_KEY`: API key for the platform project (required)
//! - `IDENTITY_AUTH_DOMAIN`: Auth domain, e.g. `my-app.example.com` (required)
//! - `IDENTITY_PROJECT_ID`: Platform project id (required)
//! - `IDENTITY_STORAGE_BUCKET`: Storage bucket name (required)
//! - `IDENTITY_MESSAGING_SENDER_ID`: Messaging sender id (required)
//! - `IDENTITY_APP_ID`: Application id (required)
//! - `IDENTITY_MEASUREMENT_ID`: Analytics measurement id (optional)
//!
//! # Invariants
//!
//! - Required fields are non-empty strings once a config is loaded.
//! - No semantic validation happens locally; malformed values are rejected
//!   by the external platform at initialization.

use serde::Deserialize;

/// Configuration record for the external identity platform client.
///
/// All fields are plain strings. The record is immutable once loaded and is
/// shared read-only for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// API key for the platform project.
    pub api_key: String,
    /// Domain the auth flows are served from.
    pub auth_domain: String,
    /// Platform project id.
    pub project_id: String,
    /// Storage bucket name.
    pub storage_bucket: String,
    /// Messaging sender id.
    pub messaging_sender_id: String,
    /// Application id within the project.
    pub app_id: String,
    /// Analytics measurement id. Analytics is disabled when absent.
    #[serde(default)]
    pub measurement_id: Option<String>,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// A configuration field has an invalid value.
    InvalidValue { name: String, message: String },
    /// The JSON configuration object could not be parsed.
    MalformedJson(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
            Self::MalformedJson(message) => {
                write!(f, "malformed configuration JSON: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Required fields and the environment variables they load from.
/// Order matches the platform console's configuration object.
const REQUIRED_FIELDS: [(&str, &str); 6] = [
    ("apiKey", "IDENTITY_API_KEY"),
    ("authDomain", "IDENTITY_AUTH_DOMAIN"),
    ("projectId", "IDENTITY_PROJECT_ID"),
    ("storageBucket", "IDENTITY_STORAGE_BUCKET"),
    ("messagingSenderId", "IDENTITY_MESSAGING_SENDER_ID"),
    ("appId", "IDENTITY_APP_ID"),
];

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: load_required("IDENTITY_API_KEY")?,
            auth_domain: load_required("IDENTITY_AUTH_DOMAIN")?,
            project_id: load_required("IDENTITY_PROJECT_ID")?,
            storage_bucket: load_required("IDENTITY_STORAGE_BUCKET")?,
            messaging_sender_id: load_required("IDENTITY_MESSAGING_SENDER_ID")?,
            app_id: load_required("IDENTITY_APP_ID")?,
            measurement_id: load_optional("IDENTITY_MEASUREMENT_ID"),
        })
    }

    /// Parse the JSON configuration object handed out by the platform
    /// console.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MalformedJson` if the JSON does not parse, or
    /// `ConfigError::InvalidValue` if a required field is empty.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::MalformedJson(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every required field is non-empty.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first empty field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            &self.api_key,
            &self.auth_domain,
            &self.project_id,
            &self.storage_bucket,
            &self.messaging_sender_id,
            &self.app_id,
        ];
        for ((name, _), value) in REQUIRED_FIELDS.iter().zip(values) {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue {
                    name: (*name).to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Load a required environment variable.
///
/// # Errors
///
/// Returns an error if the variable is not set or is empty.
fn load_required(name: &str) -> Result<String, ConfigError> {
    let value =
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;

    if value.is_empty() {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: "must not be empty".to_string(),
        });
    }

    Ok(value)
}

/// Load an optional environment variable; unset or empty means absent.
fn load_optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json(measurement_id: bool) -> String {
        let tail = if measurement_id {
            ",\n  \"measurementId\": \"G-TEST123\""
        } else {
            ""
        };
        format!(
            r#"{{
  "apiKey": "test-api-key",
  "authDomain": "my-app.example.com",
  "projectId": "my-app",
  "storageBucket": "my-app.appspot.com",
  "messagingSenderId": "450400000000",
  "appId": "1:450400000000:web:abcdef"{tail}
}}"#
        )
    }

    #[test]
    fn test_from_json_full() {
        let config = ClientConfig::from_json(&sample_json(true)).expect("valid config");
        assert_eq!(config.api_key, "test-api-key");
        assert_eq!(config.auth_domain, "my-app.example.com");
        assert_eq!(config.project_id, "my-app");
        assert_eq!(config.storage_bucket, "my-app.appspot.com");
        assert_eq!(config.messaging_sender_id, "450400000000");
        assert_eq!(config.app_id, "1:450400000000:web:abcdef");
        assert_eq!(config.measurement_id.as_deref(), Some("G-TEST123"));
    }

    #[test]
    fn test_from_json_measurement_id_optional() {
        let config = ClientConfig::from_json(&sample_json(false)).expect("valid config");
        assert!(config.measurement_id.is_none());
    }

    #[test]
    fn test_from_json_rejects_empty_required_field() {
        let json = sample_json(false).replace("test-api-key", "");
        let result = ClientConfig::from_json(&json);
        assert_eq!(
            result,
            Err(ConfigError::InvalidValue {
                name: "apiKey".to_string(),
                message: "must not be empty".to_string(),
            })
        );
    }

    #[test]
    fn test_from_json_rejects_malformed_json() {
        let result = ClientConfig::from_json("{ not json");
        assert!(matches!(result, Err(ConfigError::MalformedJson(_))));
    }

    #[test]
    fn test_from_json_rejects_missing_field() {
        let result = ClientConfig::from_json(r#"{"apiKey": "k"}"#);
        assert!(matches!(result, Err(ConfigError::MalformedJson(_))));
    }

    #[test]
    fn test_config_error_display_missing() {
        let error = ConfigError::MissingEnvVar("IDENTITY_API_KEY".to_string());
        assert_eq!(
            error.to_string(),
            "missing required environment variable: IDENTITY_API_KEY"
        );
    }

    #[test]
    fn test_config_error_display_invalid() {
        let error = ConfigError::InvalidValue {
            name: "apiKey".to_string(),
            message: "must not be empty".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "invalid value for apiKey: must not be empty"
        );
    }

    #[test]
    fn test_config_error_display_malformed() {
        let error = ConfigError::MalformedJson("unexpected token".to_string());
        assert_eq!(
            error.to_string(),
            "malformed configuration JSON: unexpected token"
        );
    }
}
