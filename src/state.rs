use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;
use uuid::Uuid;

use crate::adapter::notify::{self, Notification, Notifier};
use crate::adapter::payment::PaymentGateway;
use crate::config::Config;
use crate::error::{AppError, ResourceKind};
use crate::models::assignment::Assignment;
use crate::models::event::DispatchEvent;
use crate::models::order::Order;
use crate::models::user::User;
use crate::models::vehicle::Vehicle;
use crate::observability::metrics::Metrics;

/// Shared storage and collaborators.
///
/// Records live in `DashMap` tables. The `live_by_*` indexes are the
/// one-live-assignment-per-resource constraint: a resource is claimed through
/// the map's entry API, so two racing claims cannot both win. Multi-record
/// writes hold the ledger lock exclusively so readers never see an assignment
/// without its order update, or the reverse.
pub struct AppState {
    pub config: Config,
    pub orders: DashMap<Uuid, Order>,
    pub users: DashMap<Uuid, User>,
    pub vehicles: DashMap<Uuid, Vehicle>,
    pub assignments: DashMap<Uuid, Assignment>,
    live_by_driver: DashMap<Uuid, Uuid>,
    live_by_vehicle: DashMap<Uuid, Uuid>,
    live_by_order: DashMap<Uuid, Uuid>,
    ledger: RwLock<()>,
    order_locks: DashMap<Uuid, Arc<Mutex<()>>>,
    pub payments: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn Notifier>,
    pub events_tx: broadcast::Sender<DispatchEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        config: Config,
        payments: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size.max(1));

        Self {
            config,
            orders: DashMap::new(),
            users: DashMap::new(),
            vehicles: DashMap::new(),
            assignments: DashMap::new(),
            live_by_driver: DashMap::new(),
            live_by_vehicle: DashMap::new(),
            live_by_order: DashMap::new(),
            ledger: RwLock::new(()),
            order_locks: DashMap::new(),
            payments,
            notifier,
            events_tx,
            metrics: Metrics::new(),
        }
    }

    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn insert_vehicle(&self, vehicle: Vehicle) {
        self.vehicles.insert(vehicle.id, vehicle);
    }

    pub fn insert_order(&self, order: Order) {
        self.orders.insert(order.id, order);
    }

    pub fn order(&self, id: Uuid) -> Option<Order> {
        self.orders.get(&id).map(|entry| entry.value().clone())
    }

    pub fn assignment(&self, id: Uuid) -> Option<Assignment> {
        self.assignments.get(&id).map(|entry| entry.value().clone())
    }

    /// Shared view for reads spanning several tables.
    pub async fn read_ledger(&self) -> RwLockReadGuard<'_, ()> {
        self.ledger.read().await
    }

    /// Exclusive access for a multi-record commit. Never held across collaborator calls.
    pub async fn write_ledger(&self) -> RwLockWriteGuard<'_, ()> {
        self.ledger.write().await
    }

    /// Serializes every status-changing operation on one order.
    pub async fn lock_order(&self, order_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self.order_locks.entry(order_id).or_default().clone();
        lock.lock_owned().await
    }

    pub fn live_assignment_for_order(&self, order_id: Uuid) -> Option<Uuid> {
        self.live_by_order.get(&order_id).map(|entry| *entry.value())
    }

    pub fn driver_holder(&self, driver_id: Uuid) -> Option<Uuid> {
        self.live_by_driver.get(&driver_id).map(|entry| *entry.value())
    }

    pub fn vehicle_holder(&self, vehicle_id: Uuid) -> Option<Uuid> {
        self.live_by_vehicle.get(&vehicle_id).map(|entry| *entry.value())
    }

    /// Claims driver, vehicle and order for a new assignment, all or nothing.
    pub(crate) fn claim_resources(&self, assignment: &Assignment) -> Result<(), AppError> {
        if let Err(holder) = claim(&self.live_by_driver, assignment.driver_id, assignment.id) {
            return Err(AppError::conflict(ResourceKind::Driver, assignment.driver_id, holder));
        }

        if let Err(holder) = claim(&self.live_by_vehicle, assignment.vehicle_id, assignment.id) {
            self.release_resources(assignment);
            return Err(AppError::conflict(ResourceKind::Vehicle, assignment.vehicle_id, holder));
        }

        if let Err(holder) = claim(&self.live_by_order, assignment.order_id, assignment.id) {
            self.release_resources(assignment);
            return Err(AppError::conflict(ResourceKind::Order, assignment.order_id, holder));
        }

        Ok(())
    }

    /// Drops whatever claims this assignment holds; claims held by others stay.
    pub(crate) fn release_resources(&self, assignment: &Assignment) {
        let held_by_us = |_: &Uuid, holder: &Uuid| *holder == assignment.id;
        self.live_by_driver.remove_if(&assignment.driver_id, held_by_us);
        self.live_by_vehicle.remove_if(&assignment.vehicle_id, held_by_us);
        self.live_by_order.remove_if(&assignment.order_id, held_by_us);
    }

    pub fn publish(&self, event: DispatchEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Delivers a notification; failures are logged and counted, never returned.
    pub async fn notify(&self, notification: Notification) {
        let recipient_id = notification.recipient_id;
        let category = notification.category;

        if let Err(err) =
            notify::deliver(self.notifier.as_ref(), notification, self.config.notify_timeout).await
        {
            self.metrics.notifications_failed_total.inc();
            warn!(%recipient_id, ?category, error = %err, "notification delivery failed");
        }
    }
}

fn claim(index: &DashMap<Uuid, Uuid>, key: Uuid, assignment_id: Uuid) -> Result<(), Uuid> {
    match index.entry(key) {
        Entry::Occupied(held) => Err(*held.get()),
        Entry::Vacant(slot) => {
            slot.insert(assignment_id);
            Ok(())
        }
    }
}
