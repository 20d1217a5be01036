use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Moving,
    Idle,
    Breakdown,
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VehicleStatus::Moving => write!(f, "moving"),
            VehicleStatus::Idle => write!(f, "idle"),
            VehicleStatus::Breakdown => write!(f, "breakdown"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VehicleAlert {
    Idle,
    Breakdown,
}

/// One observed vehicle position. The backend replaces these wholesale on
/// every batch; only the accumulated routes outlive a batch.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub status: VehicleStatus,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<VehicleAlert>,
}

impl Vehicle {
    pub fn position(&self) -> LatLng {
        LatLng {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Geofence geometry as the backend stores it: polygon vertices and circle
/// centers are `[lng, lat]` pairs on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Polygon {
        coordinates: Vec<[f64; 2]>,
    },
    Circle {
        coordinates: [f64; 2],
        #[serde(default, skip_serializing_if = "Option::is_none")]
        radius: Option<f64>,
    },
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Polygon { .. } => "polygon",
            Shape::Circle { .. } => "circle",
        }
    }

    /// A representative point (first vertex or center), in map order.
    pub fn anchor(&self) -> Option<LatLng> {
        let [lng, lat] = match self {
            Shape::Polygon { coordinates } => *coordinates.first()?,
            Shape::Circle { coordinates, .. } => *coordinates,
        };
        Some(LatLng { lat, lng })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub shape: Shape,
    #[serde(default)]
    pub alert_on_entry: bool,
    #[serde(default)]
    pub alert_on_exit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Body of `POST /api/geofences`; the backend assigns the id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceDraft {
    pub name: String,
    #[serde(flatten)]
    pub shape: Shape,
    pub alert_on_entry: bool,
    pub alert_on_exit: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViolationKind {
    Entry,
    Exit,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    #[serde(rename = "_id")]
    pub id: String,
    pub vehicle_id: String,
    pub geofence_name: String,
    pub violation_type: ViolationKind,
    pub timestamp: String,
    #[serde(default)]
    pub resolved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_uses_camel_case_and_optional_alert() {
        let raw = r#"{
            "id": "truck-7",
            "lat": 53.35,
            "lng": -6.26,
            "status": "moving",
            "address": "O'Connell St",
            "lastUpdated": "2024-03-01T10:15:00Z"
        }"#;
        let v: Vehicle = serde_json::from_str(raw).unwrap();
        assert_eq!(v.id, "truck-7");
        assert_eq!(v.status, VehicleStatus::Moving);
        assert_eq!(v.last_updated, "2024-03-01T10:15:00Z");
        assert_eq!(v.alert, None);

        let raw = r#"{"id":"t","lat":0,"lng":0,"status":"breakdown","alert":"breakdown"}"#;
        let v: Vehicle = serde_json::from_str(raw).unwrap();
        assert_eq!(v.alert, Some(VehicleAlert::Breakdown));
        assert_eq!(v.address, "");
    }

    #[test]
    fn geofence_shape_is_tagged_on_type() {
        let raw = r#"{
            "_id": "gf1",
            "name": "Depot",
            "type": "polygon",
            "coordinates": [[-6.26, 53.35], [-6.25, 53.35], [-6.25, 53.36]],
            "alertOnEntry": true,
            "alertOnExit": false,
            "createdAt": "2024-03-01T00:00:00Z"
        }"#;
        let g: Geofence = serde_json::from_str(raw).unwrap();
        assert_eq!(g.id, "gf1");
        assert!(g.alert_on_entry);
        assert!(!g.alert_on_exit);
        let Shape::Polygon { coordinates } = &g.shape else {
            panic!("expected polygon");
        };
        assert_eq!(coordinates.len(), 3);
        assert_eq!(g.shape.anchor(), Some(LatLng { lat: 53.35, lng: -6.26 }));

        let raw = r#"{
            "_id": "gf2",
            "name": "Yard",
            "type": "circle",
            "coordinates": [-6.3, 53.4],
            "radius": 500
        }"#;
        let g: Geofence = serde_json::from_str(raw).unwrap();
        assert_eq!(g.shape.kind(), "circle");
        let Shape::Circle { radius, .. } = g.shape else {
            panic!("expected circle");
        };
        assert_eq!(radius, Some(500.0));
    }

    #[test]
    fn draft_serializes_flat_with_type_tag() {
        let draft = GeofenceDraft {
            name: "Depot".to_string(),
            shape: Shape::Circle {
                coordinates: [-6.3, 53.4],
                radius: Some(1000.0),
            },
            alert_on_entry: true,
            alert_on_exit: true,
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["name"], "Depot");
        assert_eq!(value["type"], "circle");
        assert_eq!(value["radius"], 1000.0);
        assert_eq!(value["alertOnEntry"], true);
        assert_eq!(value["alertOnExit"], true);
    }

    #[test]
    fn violation_parses_wire_names() {
        let raw = r#"{
            "_id": "v1",
            "vehicleId": "truck-7",
            "geofenceName": "Depot",
            "violationType": "exit",
            "timestamp": "2024-03-01T10:20:00Z",
            "resolved": false
        }"#;
        let v: Violation = serde_json::from_str(raw).unwrap();
        assert_eq!(v.vehicle_id, "truck-7");
        assert_eq!(v.violation_type, ViolationKind::Exit);
        assert!(!v.resolved);
    }
}
