//! Standardized error handling
//!
//! Project-wide error type. Application and infrastructure code mostly works
//! with `anyhow::Result`; domain validation and storage return this type.

use thiserror::Error;

/// Main project error type
#[derive(Error, Debug)]
pub enum BeanstackError {
    /// Missing or invalid configuration (fatal at startup)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Record failed field-level validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Filesystem / persistence error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Unknown error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for BeanstackError {
    fn from(err: anyhow::Error) -> Self {
        BeanstackError::Unknown(err.to_string())
    }
}

impl From<std::io::Error> for BeanstackError {
    fn from(err: std::io::Error) -> Self {
        BeanstackError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for BeanstackError {
    fn from(err: serde_json::Error) -> Self {
        BeanstackError::StorageError(err.to_string())
    }
}

impl From<serde_yaml::Error> for BeanstackError {
    fn from(err: serde_yaml::Error) -> Self {
        BeanstackError::ConfigError(err.to_string())
    }
}

/// Project result type alias
pub type Result<T> = std::result::Result<T, BeanstackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BeanstackError::ValidationError("satisfaction out of range".to_string());
        assert_eq!(err.to_string(), "Validation error: satisfaction out of range");
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: BeanstackError = io.into();
        assert!(matches!(err, BeanstackError::StorageError(_)));
    }
}
