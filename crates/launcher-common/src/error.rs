//! Error types for the workload launcher
//!
//! Every failure aborts the whole mapping of a launch request. None of these
//! errors are retried by the launcher itself; the caller decides whether to
//! resubmit the request.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for launch input mapping and configuration
#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing or the configuration is invalid
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of what's missing or invalid
        message: String,
        /// The offending field path (e.g., "checkConnectionInput.connectionConfiguration")
        field: Option<String>,
    },

    /// A sub-object could not be converted to its file representation
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The kind of object being serialized (if known)
        kind: Option<String>,
    },

    /// The launch request variant has no mapping
    #[error("unsupported launch request variant: {variant}")]
    UnsupportedVariant {
        /// Name of the variant
        variant: String,
    },

    /// A configuration or request file could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Path that was being read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a configuration error with the given message
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a configuration error naming the missing or invalid field
    pub fn configuration_for_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a configuration error for a required field that is absent
    pub fn missing_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::Configuration {
            message: format!("required field '{}' is missing", field),
            field: Some(field),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with object kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create an unsupported variant error
    pub fn unsupported_variant(variant: impl Into<String>) -> Self {
        Self::UnsupportedVariant {
            variant: variant.into(),
        }
    }

    /// Create an I/O error for the given path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this error is retryable
    ///
    /// Mapping is a pure function of its inputs, so resubmitting the same
    /// request can only fail the same way. File reads may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Configuration { .. } => false,
            Error::Serialization { .. } => false,
            Error::UnsupportedVariant { .. } => false,
            Error::Io { .. } => true,
        }
    }

    /// Get the field path if this error is associated with one
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::Configuration { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::configuration(format!("invalid YAML: {}", e))
    }
}
