use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::adapter::notify::{Notification, NotificationCategory};
use crate::error::{AppError, ResourceKind};
use crate::models::assignment::{Assignment, AssignmentStatus, ProofOfDelivery};
use crate::models::event::DispatchEvent;
use crate::models::location::{GeoPoint, LocationSnapshot};
use crate::models::order::OrderStatus;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct AdvanceRequest {
    pub status: AssignmentStatus,
    pub note: Option<String>,
    pub location: Option<GeoPoint>,
    pub proof_of_delivery: Option<ProofOfDelivery>,
}

impl AdvanceRequest {
    pub fn to(status: AssignmentStatus) -> Self {
        Self {
            status,
            note: None,
            location: None,
            proof_of_delivery: None,
        }
    }
}

/// Records driver progress on an assignment and mirrors it onto the order.
///
/// The order change is requested through the order state machine; if it is
/// refused nothing is written. Reaching Delivered or Failed releases the
/// driver and vehicle in the same commit.
pub async fn advance_assignment(
    state: &AppState,
    assignment_id: Uuid,
    request: AdvanceRequest,
) -> Result<Assignment, AppError> {
    let order_id = state
        .assignment(assignment_id)
        .map(|assignment| assignment.order_id)
        .ok_or_else(|| AppError::not_found(ResourceKind::Assignment, assignment_id))?;

    let next = request.status;
    if request.proof_of_delivery.is_some() && next != AssignmentStatus::Delivered {
        return Err(AppError::BadRequest(
            "proof of delivery can only accompany Delivered".to_string(),
        ));
    }

    let (updated, order_status) = {
        let _order_guard = state.lock_order(order_id).await;
        let _ledger = state.write_ledger().await;

        let mut assignment = state
            .assignment(assignment_id)
            .ok_or_else(|| AppError::not_found(ResourceKind::Assignment, assignment_id))?;
        if !assignment.status.can_advance_to(next) {
            return Err(AppError::InvalidStateTransition(format!(
                "assignment {assignment_id} cannot move from {} to {next}",
                assignment.status
            )));
        }

        let order = state
            .order(order_id)
            .ok_or_else(|| AppError::not_found(ResourceKind::Order, order_id))?;
        let order_status = next.order_status();
        if !order.status.can_transition_to(order_status) {
            return Err(AppError::InvalidStateTransition(format!(
                "order {order_id} cannot follow assignment to {order_status} from {}",
                order.status
            )));
        }

        let now = Utc::now();
        assignment.record(next, now, request.note, request.location);
        if request.proof_of_delivery.is_some() {
            assignment.proof_of_delivery = request.proof_of_delivery;
        }

        state.assignments.insert(assignment.id, assignment.clone());
        if let Some(mut stored) = state.orders.get_mut(&order_id) {
            stored.status = order_status;
            if order_status == OrderStatus::ReadyForDispatch {
                stored.driver = None;
            }
            if let Some(point) = request.location {
                stored.current_location = Some(LocationSnapshot::at(point, now));
            }
            stored.updated_at = now;
        }

        if !assignment.is_live() {
            state.release_resources(&assignment);
            state.metrics.live_assignments.dec();
        }

        (assignment, order_status)
    };

    info!(
        %assignment_id,
        %order_id,
        status = %updated.status,
        order_status = %order_status,
        "assignment advanced"
    );

    state.publish(DispatchEvent::AssignmentAdvanced {
        assignment: updated.clone(),
    });
    state
        .notify(Notification {
            recipient_id: updated.assigned_by,
            title: format!("Delivery {}", updated.status),
            message: format!("Assignment {} is now {}", updated.id, updated.status),
            category: NotificationCategory::DeliveryUpdate,
            related_id: updated.id,
        })
        .await;

    Ok(updated)
}

/// Operator sign-off on the proof of a delivered assignment.
pub async fn verify_delivery(
    state: &AppState,
    assignment_id: Uuid,
    verified: bool,
) -> Result<Assignment, AppError> {
    let _ledger = state.write_ledger().await;

    let mut assignment = state
        .assignments
        .get_mut(&assignment_id)
        .ok_or_else(|| AppError::not_found(ResourceKind::Assignment, assignment_id))?;

    if assignment.status != AssignmentStatus::Delivered {
        return Err(AppError::InvalidStateTransition(format!(
            "assignment {assignment_id} is {}, only Delivered assignments are verified",
            assignment.status
        )));
    }

    assignment.verified = Some(verified);
    info!(%assignment_id, verified, "delivery verification recorded");

    Ok(assignment.clone())
}
