//! Error types for Geodelta stores and sessions.

use crate::crs::Crs;
use crate::types::DataType;
use alloc::string::String;
use thiserror::Error;

/// Result type alias for Geodelta operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for Geodelta operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Feature type is unknown to the store.
    #[error("Feature type not found: {name}")]
    TypeNotFound { name: String },
    /// Attribute is not declared by the feature type.
    #[error("Attribute {attribute} not found in feature type {type_name}")]
    AttributeNotFound { type_name: String, attribute: String },
    /// Value does not match the declared attribute type.
    #[error("Type mismatch on attribute {attribute}: expected {expected:?}, got {got:?}")]
    TypeMismatch {
        attribute: String,
        expected: DataType,
        got: DataType,
    },
    /// Invalid feature type definition.
    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },
    /// A required argument was missing or empty.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
    /// Mutation attempted on a session bound to a version.
    #[error("Session is read-only, it is bound to version {version}")]
    VersionedSession { version: String },
    /// Version label is unknown to the store.
    #[error("Version not found: {version}")]
    VersionNotFound { version: String },
    /// No coordinate operation between two reference systems.
    #[error("No coordinate operation from {from} to {to}")]
    OperationNotFound { from: Crs, to: Crs },
    /// A coordinate operation failed on some input.
    #[error("Transform failed: {message}")]
    Transform { message: String },
}

impl Error {
    /// Creates a type not found error.
    pub fn type_not_found(name: impl Into<String>) -> Self {
        Error::TypeNotFound { name: name.into() }
    }

    /// Creates an attribute not found error.
    pub fn attribute_not_found(type_name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Error::AttributeNotFound {
            type_name: type_name.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(attribute: impl Into<String>, expected: DataType, got: DataType) -> Self {
        Error::TypeMismatch {
            attribute: attribute.into(),
            expected,
            got,
        }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a versioned session error.
    pub fn versioned_session(version: impl Into<String>) -> Self {
        Error::VersionedSession {
            version: version.into(),
        }
    }

    /// Creates a version not found error.
    pub fn version_not_found(version: impl Into<String>) -> Self {
        Error::VersionNotFound {
            version: version.into(),
        }
    }

    /// Creates an operation not found error.
    pub fn operation_not_found(from: &Crs, to: &Crs) -> Self {
        Error::OperationNotFound {
            from: from.clone(),
            to: to.clone(),
        }
    }

    /// Creates a transform error.
    pub fn transform(message: impl Into<String>) -> Self {
        Error::Transform {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let err = Error::type_mismatch("status", DataType::String, DataType::Int64);
        assert!(err.to_string().contains("Type mismatch"));

        let err = Error::type_not_found("road");
        assert!(err.to_string().contains("road"));

        let err = Error::versioned_session("v1");
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_operation_not_found_display() {
        let err = Error::operation_not_found(&Crs::new("EPSG:4326"), &Crs::new("EPSG:3857"));
        let message = err.to_string();
        assert!(message.contains("EPSG:4326"));
        assert!(message.contains("EPSG:3857"));
    }

    #[test]
    fn test_error_constructors() {
        let err = Error::attribute_not_found("road", "width");
        match err {
            Error::AttributeNotFound { type_name, attribute } => {
                assert_eq!(type_name, "road");
                assert_eq!(attribute, "width");
            }
            _ => panic!("Wrong error type"),
        }
    }
}
