// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the configuration crate.
//!
//! This module defines the error types that can occur while resolving configuration
//! sections, resolving type references and loading settings object graphs.
//! All errors use `thiserror` for proper error handling and conversion.

use std::sync::Arc;
use thiserror::Error;

/// The main error type for configuration operations.
///
/// The variants fall into three groups:
///
/// - [`ConfigError::Configuration`] is user-facing: a missing section, a bad type
///   reference, or a settings file holding the wrong root type. Fixing the
///   configuration fixes the error.
/// - [`ConfigError::InvalidArgument`] and [`ConfigError::DuplicateKey`] are
///   programmer-facing misuse of the API.
/// - [`ConfigError::Markup`], [`ConfigError::Member`], [`ConfigError::Construction`],
///   [`ConfigError::SourceError`] and [`ConfigError::IoError`] come from the markup engine or from a type's own
///   factory. They are propagated as-is and never rewrapped as configuration errors.
///
/// # Examples
///
/// ```
/// use graphcfg::domain::errors::ConfigError;
///
/// fn find_section(name: &str) -> Result<(), ConfigError> {
///     Err(ConfigError::configuration(format!(
///         "No configuration section has been defined having name '{}'.",
///         name
///     )))
/// }
///
/// assert!(find_section("app-settings").unwrap_err().is_configuration());
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration is missing or invalid.
    #[error("{message}")]
    Configuration {
        /// Human-readable message naming the offending section or entry
        message: String,
    },

    /// A required argument was absent or empty.
    #[error("Invalid argument '{name}': {message}")]
    InvalidArgument {
        /// The argument name
        name: String,
        /// Why the argument was rejected
        message: String,
    },

    /// A keyed collection already holds an entry with this key.
    #[error("An entry with the key '{key}' has already been added")]
    DuplicateKey {
        /// The duplicated key
        key: String,
    },

    /// The markup document could not be parsed or mapped onto types.
    #[error("Failed to parse markup: {message}")]
    Markup {
        /// The error message
        message: String,
        /// The underlying parsing error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A member could not be read or written.
    #[error("Member '{member}' of type '{type_name}': {message}")]
    Member {
        /// The declaring type
        type_name: String,
        /// The member name
        member: String,
        /// The error message
        message: String,
    },

    /// A type's factory failed or no suitable constructor exists.
    #[error("Failed to construct '{type_name}': {message}")]
    Construction {
        /// The type being constructed
        type_name: String,
        /// The error message
        message: String,
    },

    /// A section store or settings file could not be read.
    #[error("Source error in '{source_name}': {message}")]
    SourceError {
        /// Name of the store or reader that failed
        source_name: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An I/O error occurred while reading configuration.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A failure cached by a lazy loader and re-raised on every access.
    #[error(transparent)]
    Shared(Arc<ConfigError>),
}

impl ConfigError {
    /// Creates a [`ConfigError::Configuration`] error.
    pub fn configuration(message: impl Into<String>) -> Self {
        ConfigError::Configuration {
            message: message.into(),
        }
    }

    /// Creates a [`ConfigError::InvalidArgument`] error.
    pub fn invalid_argument(name: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a [`ConfigError::Markup`] error without an underlying cause.
    pub fn markup(message: impl Into<String>) -> Self {
        ConfigError::Markup {
            message: message.into(),
            source: None,
        }
    }

    /// Returns the error behind any number of [`ConfigError::Shared`] layers.
    pub fn root(&self) -> &ConfigError {
        match self {
            ConfigError::Shared(inner) => inner.root(),
            other => other,
        }
    }

    /// Returns `true` if the root error is a [`ConfigError::Configuration`].
    pub fn is_configuration(&self) -> bool {
        matches!(self.root(), ConfigError::Configuration { .. })
    }
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error() {
        let error = ConfigError::configuration("No configuration section 'app'");
        assert_eq!(error.to_string(), "No configuration section 'app'");
        assert!(error.is_configuration());
    }

    #[test]
    fn test_invalid_argument_error() {
        let error = ConfigError::invalid_argument("section_name", "must not be empty");
        assert_eq!(
            error.to_string(),
            "Invalid argument 'section_name': must not be empty"
        );
        assert!(!error.is_configuration());
    }

    #[test]
    fn test_duplicate_key_error() {
        let error = ConfigError::DuplicateKey {
            key: "disk".to_string(),
        };
        assert!(error.to_string().contains("'disk'"));
    }

    #[test]
    fn test_markup_error() {
        let error = ConfigError::markup("unexpected end of document");
        assert_eq!(
            error.to_string(),
            "Failed to parse markup: unexpected end of document"
        );
    }

    #[test]
    fn test_member_error() {
        let error = ConfigError::Member {
            type_name: "demo.AppSettings".to_string(),
            member: "RetryCount".to_string(),
            message: "member is not readable".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Member 'RetryCount' of type 'demo.AppSettings': member is not readable"
        );
    }

    #[test]
    fn test_source_error() {
        let error = ConfigError::SourceError {
            source_name: "yaml-sections".to_string(),
            message: "file too large".to_string(),
            source: None,
        };
        assert_eq!(
            error.to_string(),
            "Source error in 'yaml-sections': file too large"
        );
        assert!(!error.is_configuration());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = ConfigError::from(io_error);
        assert!(matches!(error, ConfigError::IoError(_)));
    }

    #[test]
    fn test_shared_error_is_transparent() {
        let inner = Arc::new(ConfigError::configuration("missing section"));
        let error = ConfigError::Shared(Arc::clone(&inner));
        assert_eq!(error.to_string(), "missing section");
        assert!(error.is_configuration());
        assert!(matches!(error.root(), ConfigError::Configuration { .. }));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConfigError>();
    }
}
