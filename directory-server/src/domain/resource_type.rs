//! Provider category catalog.
//!
//! The set of resource types is fixed for the lifetime of the process. It is
//! loaded once at startup and handed to whatever needs it, rather than being
//! looked up from shared global state.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// One provider category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceType {
    pub id: i64,
    pub name: String,
}

/// Errors loading a catalog file.
#[derive(Debug, thiserror::Error)]
pub enum ResourceTypesError {
    #[error("failed to read resource types file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid resource types file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate resource type id {0}")]
    DuplicateId(i64),

    #[error("resource types file is empty")]
    Empty,
}

/// The fixed enumeration of provider categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTypes {
    by_id: BTreeMap<i64, String>,
}

impl ResourceTypes {
    /// Build a catalog from explicit entries.
    pub fn new(types: Vec<ResourceType>) -> Result<Self, ResourceTypesError> {
        if types.is_empty() {
            return Err(ResourceTypesError::Empty);
        }
        let mut by_id = BTreeMap::new();
        for t in types {
            if by_id.insert(t.id, t.name).is_some() {
                return Err(ResourceTypesError::DuplicateId(t.id));
            }
        }
        Ok(Self { by_id })
    }

    /// The categories the directory ships with.
    pub fn builtin() -> Self {
        let by_id = [
            (1, "Primary Care"),
            (2, "Dental"),
            (3, "Mental Health"),
            (4, "Pharmacy"),
            (5, "Urgent Care"),
            (6, "Women's Health"),
            (7, "Vision"),
            (8, "Substance Use Treatment"),
            (9, "Pediatrics"),
            (10, "Other"),
        ]
        .into_iter()
        .map(|(id, name)| (id, name.to_string()))
        .collect();
        Self { by_id }
    }

    /// Load a catalog from a JSON array of `{ "id", "name" }` objects.
    pub fn from_json_file(path: &Path) -> Result<Self, ResourceTypesError> {
        let contents = std::fs::read_to_string(path)?;
        let types: Vec<ResourceType> = serde_json::from_str(&contents)?;
        Self::new(types)
    }

    /// Look up a category name.
    pub fn name(&self, id: i64) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Accept `None` or a known id.
    pub fn validate(&self, id: Option<i64>) -> Result<(), DomainError> {
        match id {
            Some(id) if !self.contains(id) => Err(DomainError::UnknownResourceType(id)),
            _ => Ok(()),
        }
    }

    /// All categories in id order.
    pub fn iter(&self) -> impl Iterator<Item = ResourceType> + '_ {
        self.by_id.iter().map(|(id, name)| ResourceType {
            id: *id,
            name: name.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Default for ResourceTypes {
    fn default() -> Self {
        Self::builtin()
    }
}
