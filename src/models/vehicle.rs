use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::center::CenterTag;
use crate::models::user::ActiveStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VehicleType {
    Motorbike,
    Car,
    Van,
    Truck,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    /// Fleet code painted on the vehicle.
    pub identifier: String,
    pub model: String,
    pub license_plate: String,
    pub vehicle_type: VehicleType,
    pub active_status: ActiveStatus,
    pub center: Option<CenterTag>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn is_active(&self) -> bool {
        self.active_status == ActiveStatus::Active
    }
}
