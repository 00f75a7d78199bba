//! Resource identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when constructing an invalid resource id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid resource id {value}: {reason}")]
pub struct InvalidResourceId {
    value: i64,
    reason: &'static str,
}

/// Stable identity of a resource record.
///
/// Ids are assigned by the store when a resource is created and are never
/// reused, so ordering by id is ordering by creation. The lowest id in a
/// duplicate group is the one that survives a merge.
///
/// # Examples
///
/// ```
/// use directory_server::domain::ResourceId;
///
/// let id = ResourceId::new(7).unwrap();
/// assert_eq!(id.get(), 7);
///
/// // Ids start at 1
/// assert!(ResourceId::new(0).is_err());
/// assert!(ResourceId::new(-3).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ResourceId(i64);

impl ResourceId {
    /// Create a resource id from its raw database value.
    pub fn new(value: i64) -> Result<Self, InvalidResourceId> {
        if value <= 0 {
            return Err(InvalidResourceId {
                value,
                reason: "must be positive",
            });
        }
        Ok(ResourceId(value))
    }

    /// Returns the raw database value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for ResourceId {
    type Error = InvalidResourceId;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        ResourceId::new(value)
    }
}

impl From<ResourceId> for i64 {
    fn from(id: ResourceId) -> i64 {
        id.0
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({})", self.0)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
