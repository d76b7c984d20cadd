use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::center::CenterTag;
use crate::models::location::GeoPoint;
use crate::models::order::OrderStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AssignmentStatus {
    Assigned,
    PickedUp,
    InTransit,
    Delivered,
    Failed,
}

impl AssignmentStatus {
    fn rank(self) -> u8 {
        match self {
            Self::Assigned => 0,
            Self::PickedUp => 1,
            Self::InTransit => 2,
            Self::Delivered => 3,
            Self::Failed => 4,
        }
    }

    /// A live assignment holds its driver and vehicle.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Assigned | Self::PickedUp | Self::InTransit)
    }

    /// Forward-only progress. `Assigned` is creation-only; `Failed` is reachable
    /// from any live state; progress updates may repeat the current status.
    pub fn can_advance_to(self, next: AssignmentStatus) -> bool {
        if !self.is_live() || next == Self::Assigned {
            return false;
        }
        next == Self::Failed || next.rank() >= self.rank()
    }

    /// Order status requested when an assignment reaches this status.
    pub fn order_status(self) -> OrderStatus {
        match self {
            Self::Assigned => OrderStatus::Assigned,
            Self::PickedUp | Self::InTransit => OrderStatus::InTransit,
            Self::Delivered => OrderStatus::Delivered,
            Self::Failed => OrderStatus::ReadyForDispatch,
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub status: AssignmentStatus,
    pub at: DateTime<Utc>,
    pub note: Option<String>,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProofOfDelivery {
    pub recipient_name: String,
    pub photo_url: Option<String>,
    pub signature_url: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub assigned_by: Uuid,
    pub center: CenterTag,
    pub status: AssignmentStatus,
    pub timeline: Vec<TimelineEntry>,
    pub assigned_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub proof_of_delivery: Option<ProofOfDelivery>,
    pub verified: Option<bool>,
}

impl Assignment {
    pub fn new(
        order_id: Uuid,
        driver_id: Uuid,
        vehicle_id: Uuid,
        assigned_by: Uuid,
        center: CenterTag,
        assigned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            driver_id,
            vehicle_id,
            assigned_by,
            center,
            status: AssignmentStatus::Assigned,
            timeline: vec![TimelineEntry {
                status: AssignmentStatus::Assigned,
                at: assigned_at,
                note: None,
                location: None,
            }],
            assigned_at,
            completed_at: None,
            proof_of_delivery: None,
            verified: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    /// Appends a timeline entry and moves to `status`. Callers check
    /// [`AssignmentStatus::can_advance_to`] first.
    pub fn record(
        &mut self,
        status: AssignmentStatus,
        at: DateTime<Utc>,
        note: Option<String>,
        location: Option<GeoPoint>,
    ) {
        self.timeline.push(TimelineEntry {
            status,
            at,
            note,
            location,
        });
        self.status = status;
        if status == AssignmentStatus::Delivered {
            self.completed_at = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{Assignment, AssignmentStatus::*};
    use crate::models::center::CenterTag;
    use crate::models::order::OrderStatus;

    fn assignment() -> Assignment {
        Assignment::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            CenterTag::from("North"),
            Utc::now(),
        )
    }

    #[test]
    fn new_assignment_is_live_with_seeded_timeline() {
        let a = assignment();
        assert!(a.is_live());
        assert_eq!(a.timeline.len(), 1);
        assert_eq!(a.timeline[0].status, Assigned);
    }

    #[test]
    fn progress_is_forward_only() {
        assert!(Assigned.can_advance_to(PickedUp));
        assert!(PickedUp.can_advance_to(InTransit));
        assert!(InTransit.can_advance_to(InTransit));
        assert!(!InTransit.can_advance_to(PickedUp));
        assert!(!PickedUp.can_advance_to(Assigned));
    }

    #[test]
    fn finished_assignments_do_not_move() {
        for next in [PickedUp, InTransit, Delivered, Failed] {
            assert!(!Delivered.can_advance_to(next));
            assert!(!Failed.can_advance_to(next));
        }
    }

    #[test]
    fn delivered_sets_completion_and_releases() {
        let mut a = assignment();
        let at = Utc::now();
        a.record(Delivered, at, Some("left at door".to_string()), None);

        assert_eq!(a.completed_at, Some(at));
        assert!(!a.is_live());
        assert_eq!(a.timeline.len(), 2);
    }

    #[test]
    fn failed_does_not_set_completion() {
        let mut a = assignment();
        a.record(Failed, Utc::now(), None, None);

        assert!(a.completed_at.is_none());
        assert!(!a.is_live());
    }

    #[test]
    fn assignment_statuses_map_onto_order_statuses() {
        assert_eq!(PickedUp.order_status(), OrderStatus::InTransit);
        assert_eq!(Delivered.order_status(), OrderStatus::Delivered);
        assert_eq!(Failed.order_status(), OrderStatus::ReadyForDispatch);
    }
}
