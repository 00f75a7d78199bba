//! Domain types for the resource directory.
//!
//! This module contains the core domain model types that represent
//! validated directory data. Types enforce their invariants at construction
//! time, so code that receives them can trust their validity.

mod coordinate;
mod error;
mod normalize;
mod resource;
mod resource_id;
mod resource_type;

pub use coordinate::{Coordinate, InvalidCoordinate, miles_to_lat_degrees, round_hundredths};
pub use error::DomainError;
pub use normalize::{non_blank, normalize_field};
pub use resource::{NewResource, Resource, ResourceUpdate};
pub use resource_id::{InvalidResourceId, ResourceId};
pub use resource_type::{ResourceType, ResourceTypes, ResourceTypesError};
