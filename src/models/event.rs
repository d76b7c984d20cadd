use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::assignment::Assignment;

/// Broadcast to websocket subscribers after each committed dispatch change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchEvent {
    AssignmentCreated {
        assignment: Assignment,
    },
    AssignmentAdvanced {
        assignment: Assignment,
    },
    OrderSentToLogistics {
        order_id: Uuid,
        sent_by: Uuid,
    },
    OrderCancelled {
        order_id: Uuid,
        refund_amount: Option<Decimal>,
    },
}
