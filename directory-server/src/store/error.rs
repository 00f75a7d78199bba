//! Resource store error types.

use crate::domain::ResourceId;

/// Errors from the resource store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database rejected a statement or transaction
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// No resource with this id exists
    #[error("resource {0} not found")]
    NotFound(ResourceId),
}

impl StoreError {
    /// Whether this error means the requested record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::NotFound(ResourceId::new(12).unwrap());
        assert_eq!(err.to_string(), "resource 12 not found");
        assert!(err.is_not_found());

        let err = StoreError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.to_string().starts_with("database error:"));
        assert!(!err.is_not_found());
    }
}
