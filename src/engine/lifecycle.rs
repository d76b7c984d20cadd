use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapter::notify::{Notification, NotificationCategory};
use crate::adapter::payment::PaymentError;
use crate::error::{AppError, ResourceKind};
use crate::models::assignment::AssignmentStatus;
use crate::models::center::CenterTag;
use crate::models::event::DispatchEvent;
use crate::models::order::{LineItem, Order, OrderStatus, PaymentMethod, Priority};
use crate::models::user::UserRole;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub customer_id: Uuid,
    pub delivery_address: String,
    pub items: Vec<LineItem>,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub center: CenterTag,
    #[serde(default)]
    pub priority: Priority,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CancelOutcome {
    pub order_id: Uuid,
    pub refund_amount: Option<Decimal>,
}

/// Checkout entry point: the only way orders come into existence.
pub fn create_order(state: &AppState, request: NewOrder) -> Result<Order, AppError> {
    if request.delivery_address.trim().is_empty() {
        return Err(AppError::BadRequest("delivery address cannot be empty".to_string()));
    }
    if request.items.is_empty() {
        return Err(AppError::BadRequest("order needs at least one line item".to_string()));
    }
    if request.items.iter().any(|item| item.quantity == 0) {
        return Err(AppError::BadRequest("line item quantity must be > 0".to_string()));
    }
    if request.items.iter().any(|item| item.unit_price.is_sign_negative()) {
        return Err(AppError::BadRequest("unit price cannot be negative".to_string()));
    }
    if request.center.is_blank() {
        return Err(AppError::BadRequest("center cannot be empty".to_string()));
    }

    let status = request.status.unwrap_or(OrderStatus::Pending);
    if !matches!(
        status,
        OrderStatus::Pending | OrderStatus::Paid | OrderStatus::Processing
    ) {
        return Err(AppError::BadRequest(format!(
            "orders start as Pending, Paid or Processing, not {status}"
        )));
    }

    let now = Utc::now();
    let id = Uuid::new_v4();
    let short_id: String = id.simple().to_string().chars().take(8).collect();
    let total_amount = request.items.iter().map(LineItem::subtotal).sum();

    let order = Order {
        id,
        order_number: format!("ORD-{}-{}", now.format("%Y%m%d"), short_id.to_uppercase()),
        customer_id: request.customer_id,
        delivery_address: request.delivery_address,
        items: request.items,
        total_amount,
        payment_method: request.payment_method,
        payment_reference: request.payment_reference,
        center: request.center,
        priority: request.priority,
        status,
        driver: None,
        current_location: None,
        sent_to_logistics_by: None,
        sent_to_logistics_at: None,
        paid_at: (status == OrderStatus::Paid).then_some(now),
        created_at: now,
        updated_at: now,
    };

    state.insert_order(order.clone());
    info!(order_id = %order.id, order_number = %order.order_number, %status, "order created");
    Ok(order)
}

pub fn get_order(state: &AppState, id: Uuid) -> Result<Order, AppError> {
    state
        .order(id)
        .ok_or_else(|| AppError::not_found(ResourceKind::Order, id))
}

/// Sales and clerk moves through the pre-dispatch states.
///
/// Dispatch-owned statuses have their own operations: ReadyForDispatch goes
/// through [`send_to_logistics`], Cancelled through [`cancel_order`], and
/// Assigned onwards through the assignment engine.
pub async fn transition_order(
    state: &AppState,
    order_id: Uuid,
    next: OrderStatus,
) -> Result<Order, AppError> {
    if !(next.is_pre_dispatch() || next == OrderStatus::Paid) {
        return Err(AppError::InvalidStateTransition(format!(
            "{next} is not set directly on an order"
        )));
    }

    let _order_guard = state.lock_order(order_id).await;
    let _ledger = state.write_ledger().await;

    let mut order = state
        .orders
        .get_mut(&order_id)
        .ok_or_else(|| AppError::not_found(ResourceKind::Order, order_id))?;

    let current = order.status;
    if !current.can_transition_to(next) {
        return Err(AppError::InvalidStateTransition(format!(
            "order {order_id} cannot move from {current} to {next}"
        )));
    }

    let now = Utc::now();
    order.status = next;
    if next == OrderStatus::Paid {
        order.paid_at = Some(now);
    }
    order.updated_at = now;
    info!(%order_id, from = %current, to = %next, "order status changed");

    Ok(order.clone())
}

/// Hands an order to logistics: it becomes ReadyForDispatch and shows up in the queue.
pub async fn send_to_logistics(
    state: &AppState,
    order_id: Uuid,
    sender_id: Uuid,
) -> Result<Order, AppError> {
    let order = {
        let _order_guard = state.lock_order(order_id).await;
        let _ledger = state.write_ledger().await;

        let mut order = state
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::not_found(ResourceKind::Order, order_id))?;

        let current = order.status;
        if !current.can_transition_to(OrderStatus::ReadyForDispatch)
            || !(current.is_pre_dispatch() || current == OrderStatus::Paid)
        {
            return Err(AppError::InvalidStateTransition(format!(
                "order {order_id} cannot be sent to logistics from {current}"
            )));
        }

        let now = Utc::now();
        order.status = OrderStatus::ReadyForDispatch;
        order.sent_to_logistics_by = Some(sender_id);
        order.sent_to_logistics_at = Some(now);
        order.updated_at = now;
        order.clone()
    };

    info!(%order_id, %sender_id, "order sent to logistics");
    state.publish(DispatchEvent::OrderSentToLogistics {
        order_id,
        sent_by: sender_id,
    });

    let operators: Vec<Uuid> = state
        .users
        .iter()
        .filter(|entry| entry.role == UserRole::Logistics && entry.is_active())
        .map(|entry| entry.id)
        .collect();

    for operator_id in operators {
        state
            .notify(Notification {
                recipient_id: operator_id,
                title: "Order ready for dispatch".to_string(),
                message: format!(
                    "Order {} ({}) is waiting for a driver",
                    order.order_number, order.center
                ),
                category: NotificationCategory::Dispatch,
                related_id: order_id,
            })
            .await;
    }

    Ok(order)
}

/// Cancels an order, refunding first when it was paid up front.
///
/// The refund runs while the order lock is held, so no assignment can land on
/// the order in between; a failed refund leaves the order untouched.
pub async fn cancel_order(state: &AppState, order_id: Uuid) -> Result<CancelOutcome, AppError> {
    let _order_guard = state.lock_order(order_id).await;

    let order = state
        .order(order_id)
        .ok_or_else(|| AppError::not_found(ResourceKind::Order, order_id))?;

    if !order.status.is_cancellable() {
        return Err(AppError::InvalidStateTransition(format!(
            "order {order_id} cannot be cancelled from {}",
            order.status
        )));
    }

    let refund_amount = match order.refundable_reference() {
        Some(reference) => Some(refund(state, order_id, reference).await?),
        None => None,
    };

    let released = {
        let _ledger = state.write_ledger().await;
        let now = Utc::now();

        let released = state.live_assignment_for_order(order_id).and_then(|assignment_id| {
            let mut assignment = state.assignments.get_mut(&assignment_id)?;
            assignment.record(
                AssignmentStatus::Failed,
                now,
                Some("order cancelled".to_string()),
                None,
            );
            Some(assignment.clone())
        });
        if let Some(assignment) = &released {
            state.release_resources(assignment);
            state.metrics.live_assignments.dec();
        }

        if let Some(mut stored) = state.orders.get_mut(&order_id) {
            stored.status = OrderStatus::Cancelled;
            stored.driver = None;
            stored.updated_at = now;
        }

        released
    };

    info!(%order_id, refund_amount = ?refund_amount, "order cancelled");
    if let Some(assignment) = released {
        info!(assignment_id = %assignment.id, driver_id = %assignment.driver_id, "live assignment failed by cancellation");
        state
            .notify(Notification {
                recipient_id: assignment.driver_id,
                title: "Delivery cancelled".to_string(),
                message: format!("Order {} was cancelled", order.order_number),
                category: NotificationCategory::OrderCancelled,
                related_id: assignment.id,
            })
            .await;
        state.publish(DispatchEvent::AssignmentAdvanced { assignment });
    }

    state.publish(DispatchEvent::OrderCancelled {
        order_id,
        refund_amount,
    });
    state
        .notify(Notification {
            recipient_id: order.customer_id,
            title: "Order cancelled".to_string(),
            message: match refund_amount {
                Some(amount) => format!("Order {} was cancelled, {amount} refunded", order.order_number),
                None => format!("Order {} was cancelled", order.order_number),
            },
            category: NotificationCategory::OrderCancelled,
            related_id: order_id,
        })
        .await;

    Ok(CancelOutcome {
        order_id,
        refund_amount,
    })
}

async fn refund(state: &AppState, order_id: Uuid, reference: &str) -> Result<Decimal, AppError> {
    let limit = state.config.refund_timeout;
    let result = match tokio::time::timeout(limit, state.payments.create_refund(reference)).await {
        Ok(result) => result,
        Err(_elapsed) => Err(PaymentError::Timeout(limit)),
    };

    match result {
        Ok(amount) => {
            state.metrics.refunds_total.with_label_values(&["success"]).inc();
            info!(%order_id, payment_reference = %reference, %amount, "refund issued");
            Ok(amount)
        }
        Err(err) => {
            state.metrics.refunds_total.with_label_values(&["error"]).inc();
            warn!(%order_id, payment_reference = %reference, error = %err, "refund failed; cancellation aborted");
            Err(AppError::RefundFailed(err))
        }
    }
}
