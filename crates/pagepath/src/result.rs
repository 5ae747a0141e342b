//! Result and error types for pagepath.

use thiserror::Error;

/// Result type for pagepath operations
pub type PathResult<T> = Result<T, PathError>;

/// Errors that can occur while parsing or resolving a page-object path
///
/// Structural errors abort the whole resolution. A collection member that
/// never appears within the timeout is not an error: the engine returns the
/// not-found sentinel instead (see [`crate::ElementHandle::not_found`]).
#[derive(Debug, Error)]
pub enum PathError {
    /// `init` was never called on the engine
    #[error("Driver is not attached. Call PathEngine::init(driver, options)")]
    DriverNotAttached,

    /// Malformed path syntax
    #[error("Cannot parse path {path:?}: {message}")]
    Parse {
        /// Full path being parsed
        path: String,
        /// What was wrong with it
        message: String,
    },

    /// Step name is not a child of the current node
    #[error("{name} is not found")]
    UnknownElement {
        /// Element name as written in the path
        name: String,
    },

    /// Structurally illegal step
    #[error("Unsupported operation. {message}")]
    InvalidOperation {
        /// Error message
        message: String,
    },

    /// An explicit wait never saw its condition hold
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// The driver collaborator failed a query
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Engine options could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl PathError {
    /// Create a parse error
    #[must_use]
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an unknown element error
    #[must_use]
    pub fn unknown_element(name: impl Into<String>) -> Self {
        Self::UnknownElement { name: name.into() }
    }

    /// Create an invalid operation error
    #[must_use]
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error means the path itself is wrong (as opposed to the
    /// driver or environment failing)
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::UnknownElement { .. } | Self::InvalidOperation { .. }
        )
    }
}
