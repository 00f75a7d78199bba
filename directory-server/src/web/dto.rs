//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Resource, ResourceTypes};

/// Request for transit options between a start point and a resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitRoutesRequest {
    /// Destination: the resource's location
    pub resource_lat: f64,
    pub resource_lon: f64,

    /// Where the patient sets out from
    pub start_lat: f64,
    pub start_lon: f64,

    /// Walking radius around each end, miles (server default when absent)
    #[serde(default)]
    pub max_walk_miles: Option<f64>,
}

/// A resource with its category name resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceResponse {
    #[serde(flatten)]
    pub resource: Resource,

    /// Category name, when the record has a known category
    pub resource_type: Option<String>,
}

impl ResourceResponse {
    pub fn new(resource: Resource, types: &ResourceTypes) -> Self {
        let resource_type = resource
            .resource_type_id
            .and_then(|id| types.name(id))
            .map(str::to_string);
        Self {
            resource,
            resource_type,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceId;
    use chrono::{TimeZone, Utc};

    fn resource(type_id: Option<i64>) -> Resource {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Resource {
            id: ResourceId::new(3).unwrap(),
            name: "Whitney Young Health".into(),
            display_name: None,
            address_line1: Some("920 Lark Dr".into()),
            address_line2: None,
            city: Some("Albany".into()),
            state: Some("NY".into()),
            zip: None,
            phone: None,
            website: None,
            hours: None,
            latitude: None,
            longitude: None,
            accepts_uninsured: true,
            sliding_scale: false,
            free_care_available: false,
            notes: None,
            resource_type_id: type_id,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn transit_request_is_camel_case() {
        let req: TransitRoutesRequest = serde_json::from_str(
            r#"{"resourceLat": 42.65, "resourceLon": -73.75, "startLat": 42.7, "startLon": -73.7}"#,
        )
        .unwrap();
        assert_eq!(req.resource_lat, 42.65);
        assert_eq!(req.start_lon, -73.7);
        assert!(req.max_walk_miles.is_none());

        let req: TransitRoutesRequest = serde_json::from_str(
            r#"{"resourceLat": 1, "resourceLon": 2, "startLat": 3, "startLon": 4, "maxWalkMiles": 0.8}"#,
        )
        .unwrap();
        assert_eq!(req.max_walk_miles, Some(0.8));
    }

    #[test]
    fn resource_response_resolves_type_name() {
        let types = ResourceTypes::builtin();

        let json = serde_json::to_value(ResourceResponse::new(resource(Some(2)), &types)).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["name"], "Whitney Young Health");
        assert_eq!(json["resource_type"], "Dental");

        let json = serde_json::to_value(ResourceResponse::new(resource(None), &types)).unwrap();
        assert!(json["resource_type"].is_null());
    }
}
