#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use order_dispatch::adapter::notify::{Notification, Notifier, NotifyError, RecordingNotifier};
use order_dispatch::adapter::payment::{PaymentError, PaymentGateway, SandboxPaymentGateway};
use order_dispatch::config::Config;
use order_dispatch::engine::assignment::AssignRequest;
use order_dispatch::models::center::CenterTag;
use order_dispatch::models::order::{LineItem, Order, OrderStatus, PaymentMethod, Priority};
use order_dispatch::models::user::{ActiveStatus, ApprovalStatus, User, UserRole};
use order_dispatch::models::vehicle::{Vehicle, VehicleType};
use order_dispatch::state::AppState;
use rust_decimal::Decimal;
use uuid::Uuid;

pub struct Harness {
    pub state: Arc<AppState>,
    pub payments: Arc<SandboxPaymentGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub operator: Uuid,
}

pub fn harness() -> Harness {
    harness_with(Config::default())
}

pub fn harness_with(config: Config) -> Harness {
    let payments = Arc::new(SandboxPaymentGateway::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let state = Arc::new(AppState::new(config, payments.clone(), notifier.clone()));
    let operator = add_user(&state, "Lena Logistics", UserRole::Logistics, None);

    Harness {
        state,
        payments,
        notifier,
        operator,
    }
}

pub fn state_with(payments: Arc<dyn PaymentGateway>, notifier: Arc<dyn Notifier>) -> Arc<AppState> {
    let config = Config {
        refund_timeout: Duration::from_millis(100),
        notify_timeout: Duration::from_millis(100),
        ..Config::default()
    };
    Arc::new(AppState::new(config, payments, notifier))
}

pub fn add_user(state: &AppState, name: &str, role: UserRole, center: Option<&str>) -> Uuid {
    let user = User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        phone: None,
        role,
        center: center.map(CenterTag::from),
        approval_status: ApprovalStatus::Approved,
        active_status: ActiveStatus::Active,
        created_at: Utc::now(),
    };
    let id = user.id;
    state.insert_user(user);
    id
}

pub fn add_driver(state: &AppState, name: &str, center: &str) -> Uuid {
    add_user(state, name, UserRole::Driver, Some(center))
}

pub fn set_driver_status(state: &AppState, id: Uuid, approval: ApprovalStatus, active: ActiveStatus) {
    if let Some(mut driver) = state.users.get_mut(&id) {
        driver.approval_status = approval;
        driver.active_status = active;
    }
}

pub fn add_vehicle(state: &AppState, identifier: &str, center: Option<&str>) -> Uuid {
    let vehicle = Vehicle {
        id: Uuid::new_v4(),
        identifier: identifier.to_string(),
        model: "Sprinter".to_string(),
        license_plate: format!("PL-{identifier}"),
        vehicle_type: VehicleType::Van,
        active_status: ActiveStatus::Active,
        center: center.map(CenterTag::from),
        created_at: Utc::now(),
    };
    let id = vehicle.id;
    state.insert_vehicle(vehicle);
    id
}

pub fn add_order(state: &AppState, center: &str, status: OrderStatus) -> Uuid {
    add_order_with(state, center, status, Priority::Normal, None)
}

pub fn add_order_with(
    state: &AppState,
    center: &str,
    status: OrderStatus,
    priority: Priority,
    payment_reference: Option<&str>,
) -> Uuid {
    let now = Utc::now();
    let id = Uuid::new_v4();
    let items = vec![LineItem {
        product_id: "sku-olive-oil".to_string(),
        quantity: 2,
        unit_price: Decimal::new(1250, 2),
    }];
    let order = Order {
        id,
        order_number: format!("ORD-TEST-{}", &id.simple().to_string()[..8]),
        customer_id: Uuid::new_v4(),
        delivery_address: "12 Quay Street".to_string(),
        total_amount: Decimal::new(2500, 2),
        items,
        payment_method: PaymentMethod::Card,
        payment_reference: payment_reference.map(str::to_string),
        center: CenterTag::from(center),
        priority,
        status,
        driver: None,
        current_location: None,
        sent_to_logistics_by: None,
        sent_to_logistics_at: None,
        paid_at: (status == OrderStatus::Paid).then_some(now),
        created_at: now,
        updated_at: now,
    };
    state.insert_order(order);
    id
}

pub fn assign_request(order_id: Uuid, driver_id: Uuid, vehicle_id: Uuid, center: &str, operator_id: Uuid) -> AssignRequest {
    AssignRequest {
        order_id,
        driver_id,
        vehicle_id,
        center: CenterTag::from(center),
        operator_id,
    }
}

/// Payment provider that always declines.
pub struct DecliningGateway;

#[async_trait]
impl PaymentGateway for DecliningGateway {
    async fn create_refund(&self, _payment_reference: &str) -> Result<Decimal, PaymentError> {
        Err(PaymentError::Provider("card network unavailable".to_string()))
    }
}

/// Payment provider that never answers in time.
pub struct StalledGateway;

#[async_trait]
impl PaymentGateway for StalledGateway {
    async fn create_refund(&self, _payment_reference: &str) -> Result<Decimal, PaymentError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Decimal::ONE)
    }
}

/// Notification channel that is always down.
pub struct BrokenNotifier;

#[async_trait]
impl Notifier for BrokenNotifier {
    async fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Unavailable("push gateway offline".to_string()))
    }
}
