use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::center::CenterTag;
use crate::models::location::LocationSnapshot;

/// Dispatch priority. Declaration order is significant: `High > Normal`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    #[default]
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Approved,
    Processing,
    Confirmed,
    #[serde(rename = "Ready for Delivery")]
    ReadyForDelivery,
    ReadyForDispatch,
    Assigned,
    #[serde(rename = "In Transit")]
    InTransit,
    Delivered,
    Cancelled,
    Paid,
}

impl OrderStatus {
    /// Position in the forward lifecycle. `Paid` and `Cancelled` sit outside it.
    fn rank(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Approved => Some(1),
            Self::Processing => Some(2),
            Self::Confirmed => Some(3),
            Self::ReadyForDelivery => Some(4),
            Self::ReadyForDispatch => Some(5),
            Self::Assigned => Some(6),
            Self::InTransit => Some(7),
            Self::Delivered => Some(8),
            Self::Cancelled | Self::Paid => None,
        }
    }

    /// States a sales or clerk action moves through before logistics takes over.
    pub fn is_pre_dispatch(self) -> bool {
        matches!(
            self,
            Self::Pending
                | Self::Approved
                | Self::Processing
                | Self::Confirmed
                | Self::ReadyForDelivery
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    pub fn is_cancellable(self) -> bool {
        self.can_transition_to(Self::Cancelled)
    }

    /// The single order state machine. Every status change, including the ones
    /// mirrored from an assignment, is checked here.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        if self.is_terminal() {
            return false;
        }

        match (self, next) {
            (InTransit, Cancelled) => false,
            (_, Cancelled) => true,
            (from, Paid) => from.is_pre_dispatch(),
            (Paid, to) if to.is_pre_dispatch() => to != Pending,
            (Paid, ReadyForDispatch) => true,
            (from, to) if from.is_pre_dispatch() && (to.is_pre_dispatch() || to == ReadyForDispatch) => {
                from.rank() < to.rank()
            }
            // a failed delivery hands the order back to dispatch
            (Assigned | InTransit, ReadyForDispatch) => true,
            (from, Assigned) => from.is_pre_dispatch() || matches!(from, Paid | ReadyForDispatch),
            (Assigned | InTransit, InTransit | Delivered) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Processing => "Processing",
            Self::Confirmed => "Confirmed",
            Self::ReadyForDelivery => "Ready for Delivery",
            Self::ReadyForDispatch => "ReadyForDispatch",
            Self::Assigned => "Assigned",
            Self::InTransit => "In Transit",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Paid => "Paid",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    Card,
    Wallet,
    CashOnDelivery,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Customer-facing order number, distinct from the storage key.
    pub order_number: String,
    pub customer_id: Uuid,
    pub delivery_address: String,
    pub items: Vec<LineItem>,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub center: CenterTag,
    #[serde(default)]
    pub priority: Priority,
    pub status: OrderStatus,
    /// Set while a driver holds the order (Assigned and later).
    pub driver: Option<Uuid>,
    pub current_location: Option<LocationSnapshot>,
    pub sent_to_logistics_by: Option<Uuid>,
    pub sent_to_logistics_at: Option<DateTime<Utc>>,
    /// When pre-payment was captured. Survives the order leaving `Paid`.
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_prepaid(&self) -> bool {
        self.paid_at.is_some() || self.status == OrderStatus::Paid
    }

    /// Captured payment to refund on cancellation, if any.
    pub fn refundable_reference(&self) -> Option<&str> {
        if self.is_prepaid() {
            self.payment_reference.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::{self, *};
    use super::Priority;

    const ALL: [OrderStatus; 11] = [
        Pending,
        Approved,
        Processing,
        Confirmed,
        ReadyForDelivery,
        ReadyForDispatch,
        Assigned,
        InTransit,
        Delivered,
        Cancelled,
        Paid,
    ];

    #[test]
    fn cancellation_is_blocked_once_in_transit_or_finished() {
        assert!(!Delivered.is_cancellable());
        assert!(!InTransit.is_cancellable());
        assert!(!Cancelled.is_cancellable());

        for status in [Pending, Approved, Paid, ReadyForDispatch, Assigned] {
            assert!(status.is_cancellable(), "{status} should be cancellable");
        }
    }

    #[test]
    fn cancelled_and_delivered_are_absorbing() {
        for next in ALL {
            assert!(!Cancelled.can_transition_to(next));
            assert!(!Delivered.can_transition_to(next));
        }
    }

    #[test]
    fn pre_dispatch_states_only_move_forward() {
        assert!(Pending.can_transition_to(Approved));
        assert!(Approved.can_transition_to(ReadyForDelivery));
        assert!(Confirmed.can_transition_to(ReadyForDispatch));
        assert!(!Confirmed.can_transition_to(Approved));
        assert!(!Processing.can_transition_to(Processing));
    }

    #[test]
    fn paid_orders_join_the_forward_flow() {
        assert!(Pending.can_transition_to(Paid));
        assert!(Paid.can_transition_to(Processing));
        assert!(Paid.can_transition_to(ReadyForDispatch));
        assert!(!Paid.can_transition_to(Pending));
        assert!(!ReadyForDispatch.can_transition_to(Paid));
    }

    #[test]
    fn assignment_only_from_dispatchable_states() {
        assert!(ReadyForDispatch.can_transition_to(Assigned));
        assert!(Paid.can_transition_to(Assigned));
        assert!(!Assigned.can_transition_to(Assigned));
        assert!(!InTransit.can_transition_to(Assigned));
    }

    #[test]
    fn delivery_progress_cannot_skip_assignment() {
        assert!(Assigned.can_transition_to(InTransit));
        assert!(InTransit.can_transition_to(InTransit));
        assert!(InTransit.can_transition_to(Delivered));
        assert!(!ReadyForDispatch.can_transition_to(Delivered));
        assert!(!Pending.can_transition_to(InTransit));
    }

    #[test]
    fn failed_delivery_returns_order_to_dispatch() {
        assert!(Assigned.can_transition_to(ReadyForDispatch));
        assert!(InTransit.can_transition_to(ReadyForDispatch));
    }

    #[test]
    fn high_priority_sorts_above_normal() {
        assert!(Priority::High > Priority::Normal);
    }

    #[test]
    fn statuses_serialize_with_display_labels() {
        let json = serde_json::to_string(&InTransit).unwrap();
        assert_eq!(json, "\"In Transit\"");
        assert_eq!(ReadyForDelivery.to_string(), "Ready for Delivery");
    }
}
