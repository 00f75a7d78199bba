//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They
//! are distinct from storage and HTTP errors, and always mean the input
//! record itself is unusable.

use super::{InvalidCoordinate, InvalidResourceId};

/// Domain-level errors for record validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// Latitude/longitude missing one half, non-finite, or out of range
    #[error(transparent)]
    InvalidCoordinate(#[from] InvalidCoordinate),

    /// Resource id is not a valid database id
    #[error(transparent)]
    InvalidResourceId(#[from] InvalidResourceId),

    /// Only one of latitude/longitude was supplied
    #[error("latitude and longitude must be supplied together")]
    PartialCoordinate,

    /// Resource type id is not in the configured catalog
    #[error("unknown resource type id {0}")]
    UnknownResourceType(i64),

    /// Resource name is blank
    #[error("resource name must not be empty")]
    EmptyName,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinate, ResourceId};

    #[test]
    fn error_display() {
        let err = DomainError::UnknownResourceType(99);
        assert_eq!(err.to_string(), "unknown resource type id 99");

        let err = DomainError::EmptyName;
        assert_eq!(err.to_string(), "resource name must not be empty");

        let err = DomainError::PartialCoordinate;
        assert_eq!(
            err.to_string(),
            "latitude and longitude must be supplied together"
        );

        let err: DomainError = Coordinate::new(100.0, 0.0).unwrap_err().into();
        assert!(err.to_string().contains("latitude must be within"));

        let err: DomainError = ResourceId::new(0).unwrap_err().into();
        assert_eq!(err.to_string(), "invalid resource id 0: must be positive");
    }
}
