use std::collections::HashSet;

use uuid::Uuid;

use crate::models::assignment::AssignmentStatus;
use crate::models::center::CenterTag;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

/// Orders waiting for a driver: ReadyForDispatch and never assigned.
///
/// An order with any assignment on record stays out, including a Failed one,
/// unless failed assignments are configured to re-queue. High priority first,
/// then oldest first. A pure read; call again to restart.
pub async fn dispatch_queue(state: &AppState, center: Option<&CenterTag>) -> Vec<Order> {
    let _ledger = state.read_ledger().await;
    let requeue_failed = state.config.requeue_failed_assignments;

    let attempted: HashSet<Uuid> = state
        .assignments
        .iter()
        .filter(|entry| !(requeue_failed && entry.status == AssignmentStatus::Failed))
        .map(|entry| entry.order_id)
        .collect();

    let mut queue: Vec<Order> = state
        .orders
        .iter()
        .filter(|entry| entry.status == OrderStatus::ReadyForDispatch)
        .filter(|entry| !attempted.contains(&entry.id))
        .filter(|entry| center.is_none_or(|center| entry.center.same_as(center)))
        .map(|entry| entry.value().clone())
        .collect();

    sort_for_dispatch(&mut queue);

    if center.is_none() {
        state.metrics.dispatch_queue_depth.set(queue.len() as i64);
    }

    queue
}

pub fn sort_for_dispatch(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
}
