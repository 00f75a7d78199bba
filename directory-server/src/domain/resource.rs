//! Healthcare resource records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Coordinate, DomainError, ResourceId, non_blank};

/// A healthcare provider record in the directory.
///
/// `(name, address_line1)` is the natural duplicate key, but it is not a
/// uniqueness constraint: repeated ingestion can and does create several
/// records for the same provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub id: ResourceId,

    /// Legal/source name. Not editable through [`ResourceUpdate`].
    pub name: String,

    /// Human-facing name, derived during enrichment.
    pub display_name: Option<String>,

    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub hours: Option<String>,

    /// Null until geocoded.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub accepts_uninsured: bool,
    pub sliding_scale: bool,
    pub free_care_available: bool,

    pub notes: Option<String>,

    /// Provider category, see [`super::ResourceTypes`].
    pub resource_type_id: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// The geocoded position, if present and valid.
    pub fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::from_parts(self.latitude, self.longitude)
    }

    /// Name to show to people: the display name when set, else the source name.
    pub fn label(&self) -> &str {
        non_blank(self.display_name.as_deref()).unwrap_or(&self.name)
    }
}

/// Fields for creating a resource. The store assigns id and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewResource {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub accepts_uninsured: bool,
    #[serde(default)]
    pub sliding_scale: bool,
    #[serde(default)]
    pub free_care_available: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub resource_type_id: Option<i64>,
}

impl NewResource {
    /// Create a minimal record with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_address(mut self, line1: impl Into<String>) -> Self {
        self.address_line1 = Some(line1.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.latitude = Some(lat);
        self.longitude = Some(lon);
        self
    }

    /// Check the record is storable.
    ///
    /// The name must be non-blank and coordinates, if given, must be given
    /// as a valid pair. Resource type ids are checked separately against
    /// the catalog.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::EmptyName);
        }
        validate_location(self.latitude, self.longitude)
    }
}

/// A partial edit of a resource. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceUpdate {
    pub display_name: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub hours: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accepts_uninsured: Option<bool>,
    pub sliding_scale: Option<bool>,
    pub free_care_available: Option<bool>,
    pub notes: Option<String>,
    pub resource_type_id: Option<i64>,
}

impl ResourceUpdate {
    /// Check coordinates in the edit form a valid pair.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_location(self.latitude, self.longitude)
    }

    /// Apply the edit to an in-memory record.
    pub fn apply_to(&self, resource: &mut Resource) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        fn set_opt<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if let Some(v) = value {
                *slot = Some(v.clone());
            }
        }

        set_opt(&mut resource.display_name, &self.display_name);
        set_opt(&mut resource.address_line1, &self.address_line1);
        set_opt(&mut resource.address_line2, &self.address_line2);
        set_opt(&mut resource.city, &self.city);
        set_opt(&mut resource.state, &self.state);
        set_opt(&mut resource.zip, &self.zip);
        set_opt(&mut resource.phone, &self.phone);
        set_opt(&mut resource.website, &self.website);
        set_opt(&mut resource.hours, &self.hours);
        set_opt(&mut resource.latitude, &self.latitude);
        set_opt(&mut resource.longitude, &self.longitude);
        set(&mut resource.accepts_uninsured, &self.accepts_uninsured);
        set(&mut resource.sliding_scale, &self.sliding_scale);
        set(&mut resource.free_care_available, &self.free_care_available);
        set_opt(&mut resource.notes, &self.notes);
        set_opt(&mut resource.resource_type_id, &self.resource_type_id);
    }
}

fn validate_location(lat: Option<f64>, lon: Option<f64>) -> Result<(), DomainError> {
    match (lat, lon) {
        (None, None) => Ok(()),
        (Some(lat), Some(lon)) => {
            Coordinate::new(lat, lon)?;
            Ok(())
        }
        _ => Err(DomainError::PartialCoordinate),
    }
}
