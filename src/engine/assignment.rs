use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::adapter::notify::{Notification, NotificationCategory};
use crate::error::{AppError, ResourceKind};
use crate::models::assignment::{Assignment, AssignmentStatus};
use crate::models::center::CenterTag;
use crate::models::event::DispatchEvent;
use crate::models::order::OrderStatus;
use crate::models::page::Page;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct AssignRequest {
    pub order_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub center: CenterTag,
    pub operator_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentFilter {
    pub status: Option<AssignmentStatus>,
    pub center: Option<CenterTag>,
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Binds an order to a driver and a vehicle.
///
/// Validation short-circuits in a fixed order: order exists, driver exists and
/// is a driver, driver approved and active, vehicle active, center affinity of
/// order, driver and vehicle, then driver and vehicle not held by a live
/// assignment. On success the assignment and the order update are committed
/// together under the ledger lock.
pub async fn assign(state: &AppState, request: AssignRequest) -> Result<Assignment, AppError> {
    let start = Instant::now();
    let result = try_assign(state, &request).await;
    let elapsed = start.elapsed().as_secs_f64();

    let outcome = match &result {
        Ok(_) => "success",
        Err(AppError::Conflict { .. }) => "conflict",
        Err(_) => "rejected",
    };
    state
        .metrics
        .assignment_latency_seconds
        .with_label_values(&[outcome])
        .observe(elapsed);
    state
        .metrics
        .assignments_total
        .with_label_values(&[outcome])
        .inc();

    let (assignment, order_number) = match result {
        Ok(created) => created,
        Err(err) => {
            info!(
                order_id = %request.order_id,
                driver_id = %request.driver_id,
                vehicle_id = %request.vehicle_id,
                kind = err.kind(),
                error = %err,
                "assignment rejected"
            );
            return Err(err);
        }
    };

    info!(
        assignment_id = %assignment.id,
        order_id = %assignment.order_id,
        driver_id = %assignment.driver_id,
        vehicle_id = %assignment.vehicle_id,
        center = %assignment.center,
        "order assigned"
    );

    state.publish(DispatchEvent::AssignmentCreated {
        assignment: assignment.clone(),
    });
    state
        .notify(Notification {
            recipient_id: assignment.driver_id,
            title: "New delivery assigned".to_string(),
            message: format!("Order {order_number} from {} is yours", assignment.center),
            category: NotificationCategory::Assignment,
            related_id: assignment.id,
        })
        .await;

    Ok(assignment)
}

async fn try_assign(
    state: &AppState,
    request: &AssignRequest,
) -> Result<(Assignment, String), AppError> {
    let _order_guard = state.lock_order(request.order_id).await;
    let _ledger = state.write_ledger().await;
    let mode = state.config.center_matching;

    let order = state
        .order(request.order_id)
        .ok_or_else(|| AppError::not_found(ResourceKind::Order, request.order_id))?;

    let driver = state
        .users
        .get(&request.driver_id)
        .map(|entry| entry.value().clone())
        .filter(|user| user.is_driver())
        .ok_or_else(|| AppError::invalid(ResourceKind::Driver, request.driver_id))?;

    if !driver.is_dispatchable() {
        return Err(AppError::unavailable(ResourceKind::Driver, driver.id));
    }

    let vehicle = state
        .vehicles
        .get(&request.vehicle_id)
        .map(|entry| entry.value().clone())
        .filter(|vehicle| vehicle.is_active())
        .ok_or_else(|| AppError::unavailable(ResourceKind::Vehicle, request.vehicle_id))?;

    if !order.center.matches(&request.center, mode) {
        return Err(AppError::center_mismatch(ResourceKind::Order, order.id, &request.center));
    }

    let mismatched = |home: Option<&CenterTag>| {
        home.is_some_and(|home| !home.is_blank() && !home.matches(&request.center, mode))
    };
    if mismatched(driver.center.as_ref()) {
        return Err(AppError::center_mismatch(ResourceKind::Driver, driver.id, &request.center));
    }
    if mismatched(vehicle.center.as_ref()) {
        return Err(AppError::center_mismatch(ResourceKind::Vehicle, vehicle.id, &request.center));
    }

    if let Some(holder) = state.driver_holder(driver.id) {
        return Err(AppError::conflict(ResourceKind::Driver, driver.id, holder));
    }
    if let Some(holder) = state.vehicle_holder(vehicle.id) {
        return Err(AppError::conflict(ResourceKind::Vehicle, vehicle.id, holder));
    }

    if !order.status.can_transition_to(OrderStatus::Assigned) {
        return Err(AppError::InvalidStateTransition(format!(
            "order {} cannot be assigned from {}",
            order.id, order.status
        )));
    }

    let now = Utc::now();
    let assignment = Assignment::new(
        order.id,
        driver.id,
        vehicle.id,
        request.operator_id,
        request.center.clone(),
        now,
    );

    state.claim_resources(&assignment)?;
    state.assignments.insert(assignment.id, assignment.clone());
    if let Some(mut stored) = state.orders.get_mut(&order.id) {
        stored.status = OrderStatus::Assigned;
        stored.driver = Some(driver.id);
        stored.updated_at = now;
    }
    state.metrics.live_assignments.inc();

    Ok((assignment, order.order_number))
}

pub async fn list_assignments(state: &AppState, filter: AssignmentFilter) -> Page<Assignment> {
    let _ledger = state.read_ledger().await;
    let mode = state.config.center_matching;
    let needle = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut matched: Vec<Assignment> = state
        .assignments
        .iter()
        .filter(|entry| filter.status.is_none_or(|status| entry.status == status))
        .filter(|entry| {
            filter
                .center
                .as_ref()
                .is_none_or(|center| entry.center.matches(center, mode))
        })
        .filter(|entry| filter.from.is_none_or(|from| entry.assigned_at >= from))
        .filter(|entry| filter.to.is_none_or(|to| entry.assigned_at <= to))
        .filter(|entry| {
            needle
                .as_deref()
                .is_none_or(|needle| search_matches(state, entry.value(), needle))
        })
        .map(|entry| entry.value().clone())
        .collect();

    matched.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at).then_with(|| a.id.cmp(&b.id)));

    let page_size = state.config.page_size(filter.page_size);
    Page::slice(matched, filter.page.unwrap_or(1), page_size)
}

/// Free-text search over assignment id, order number, driver name and plate.
fn search_matches(state: &AppState, assignment: &Assignment, needle: &str) -> bool {
    let contains = |haystack: &str| haystack.to_lowercase().contains(needle);

    contains(&assignment.id.to_string())
        || state
            .orders
            .get(&assignment.order_id)
            .is_some_and(|order| contains(&order.order_number))
        || state
            .users
            .get(&assignment.driver_id)
            .is_some_and(|driver| contains(&driver.name))
        || state
            .vehicles
            .get(&assignment.vehicle_id)
            .is_some_and(|vehicle| contains(&vehicle.license_plate))
}

pub fn get_assignment(state: &AppState, id: Uuid) -> Result<Assignment, AppError> {
    state
        .assignment(id)
        .ok_or_else(|| AppError::not_found(ResourceKind::Assignment, id))
}
