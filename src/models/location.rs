use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Last reported position of an order while it is out for delivery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    pub lat: f64,
    pub lng: f64,
    pub recorded_at: DateTime<Utc>,
}

impl LocationSnapshot {
    pub fn at(point: GeoPoint, recorded_at: DateTime<Utc>) -> Self {
        Self {
            lat: point.lat,
            lng: point.lng,
            recorded_at,
        }
    }
}
