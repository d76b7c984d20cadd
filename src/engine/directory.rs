use std::collections::HashSet;

use uuid::Uuid;

use crate::models::center::CenterTag;
use crate::models::user::User;
use crate::models::vehicle::Vehicle;
use crate::state::AppState;

/// Drivers and vehicles referenced by a live assignment, computed fresh per call.
struct BusyResources {
    drivers: HashSet<Uuid>,
    vehicles: HashSet<Uuid>,
}

fn busy_resources(state: &AppState) -> BusyResources {
    let mut busy = BusyResources {
        drivers: HashSet::new(),
        vehicles: HashSet::new(),
    };

    for entry in state.assignments.iter().filter(|entry| entry.is_live()) {
        busy.drivers.insert(entry.driver_id);
        busy.vehicles.insert(entry.vehicle_id);
    }

    busy
}

fn serves(home: Option<&CenterTag>, center: &CenterTag, state: &AppState) -> bool {
    home.is_some_and(|home| home.matches(center, state.config.center_matching))
}

/// Approved, active drivers of `center` that no live assignment holds, by name.
pub async fn available_drivers(state: &AppState, center: &CenterTag) -> Vec<User> {
    let _ledger = state.read_ledger().await;
    let busy = busy_resources(state);

    let mut drivers: Vec<User> = state
        .users
        .iter()
        .filter(|entry| {
            entry.is_driver()
                && entry.is_dispatchable()
                && serves(entry.center.as_ref(), center, state)
                && !busy.drivers.contains(&entry.id)
        })
        .map(|entry| entry.value().clone())
        .collect();

    drivers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    drivers
}

/// Active vehicles of `center` that no live assignment holds, by fleet code.
pub async fn available_vehicles(state: &AppState, center: &CenterTag) -> Vec<Vehicle> {
    let _ledger = state.read_ledger().await;
    let busy = busy_resources(state);

    let mut vehicles: Vec<Vehicle> = state
        .vehicles
        .iter()
        .filter(|entry| {
            entry.is_active()
                && serves(entry.center.as_ref(), center, state)
                && !busy.vehicles.contains(&entry.id)
        })
        .map(|entry| entry.value().clone())
        .collect();

    vehicles.sort_by(|a, b| a.identifier.cmp(&b.identifier).then_with(|| a.id.cmp(&b.id)));
    vehicles
}
