//! Error types and handling for the Surge library.
//!
//! Note: a full or empty queue is NOT an error. `enqueue` and `dequeue`
//! report those outcomes through their return values; the variants here
//! cover construction and resource failures only.

use thiserror::Error;

/// Result type alias for Surge operations
pub type Result<T> = std::result::Result<T, SurgeError>;

/// Main error type for the Surge library
#[derive(Error, Debug)]
pub enum SurgeError {
    /// Invalid configuration parameter
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Memory allocation errors
    #[error("Memory allocation error: {message}")]
    Memory {
        /// Error message describing the memory issue
        message: String,
    },

    /// System resource errors (thread spawn, affinity, ...)
    #[error("System resource error: {message}")]
    SystemResource {
        /// Error message describing the system resource issue
        message: String,
    },
}

impl SurgeError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a new memory allocation error
    pub fn memory(message: impl Into<String>) -> Self {
        Self::Memory {
            message: message.into(),
        }
    }

    /// Create a new system resource error
    pub fn system_resource(message: impl Into<String>) -> Self {
        Self::SystemResource {
            message: message.into(),
        }
    }

    /// Check if this error is related to system resources
    pub fn is_system_resource_error(&self) -> bool {
        matches!(self, Self::Memory { .. } | Self::SystemResource { .. })
    }
}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::error::SurgeError::config(format!($($arg)*))
    };
}
