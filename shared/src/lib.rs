pub mod domain;

use serde::{Deserialize, Serialize};

use crate::domain::{Vehicle, ViolationKind};

/// One frame on the realtime channel: `{"event": ..., "data": ...}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum Push {
    #[serde(rename = "vehicleUpdate")]
    VehicleUpdate(Vec<Vehicle>),
    #[serde(rename = "geofence_alert")]
    GeofenceAlert(Alert),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub message: String,
}
