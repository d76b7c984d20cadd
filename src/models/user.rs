use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::center::CenterTag;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    Customer,
    Driver,
    Sales,
    Logistics,
    Admin,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActiveStatus {
    Active,
    Inactive,
}

/// Account record. Drivers are users with [`UserRole::Driver`] and a home center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub center: Option<CenterTag>,
    pub approval_status: ApprovalStatus,
    pub active_status: ActiveStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_driver(&self) -> bool {
        self.role == UserRole::Driver
    }

    pub fn is_active(&self) -> bool {
        self.active_status == ActiveStatus::Active
    }

    /// Approved and active; busy/free is decided elsewhere from live assignments.
    pub fn is_dispatchable(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved && self.is_active()
    }
}
