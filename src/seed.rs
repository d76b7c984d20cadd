//! JSON fixtures for local runs: users, vehicles, orders and captured payments.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::adapter::payment::SandboxPaymentGateway;
use crate::error::AppError;
use crate::models::order::Order;
use crate::models::user::User;
use crate::models::vehicle::Vehicle;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub captures: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
pub struct Capture {
    pub payment_reference: String,
    pub amount: Decimal,
}

pub fn load(path: &Path) -> Result<Fixture, AppError> {
    let raw = fs::read_to_string(path).map_err(|err| {
        AppError::Internal(format!("failed to read seed file {}: {err}", path.display()))
    })?;

    serde_json::from_str(&raw).map_err(|err| {
        AppError::Internal(format!("invalid seed file {}: {err}", path.display()))
    })
}

pub fn apply(state: &AppState, payments: &SandboxPaymentGateway, fixture: Fixture) {
    info!(
        users = fixture.users.len(),
        vehicles = fixture.vehicles.len(),
        orders = fixture.orders.len(),
        captures = fixture.captures.len(),
        "applying seed fixture"
    );

    for user in fixture.users {
        state.insert_user(user);
    }
    for vehicle in fixture.vehicles {
        state.insert_vehicle(vehicle);
    }
    for order in fixture.orders {
        state.insert_order(order);
    }
    for capture in fixture.captures {
        payments.record_capture(capture.payment_reference, capture.amount);
    }
}

#[cfg(test)]
mod tests {
    use super::Fixture;

    #[test]
    fn fixture_sections_are_optional() {
        let fixture: Fixture = serde_json::from_str(
            r#"{
                "vehicles": [{
                    "id": "7f1f2a8e-65a4-4c0f-9f55-2d2f0a3c9b10",
                    "identifier": "VAN-07",
                    "model": "Transit",
                    "license_plate": "NB-2231",
                    "vehicle_type": "Van",
                    "active_status": "Active",
                    "center": "North"
                }],
                "captures": [{ "payment_reference": "pi_1", "amount": "19.99" }]
            }"#,
        )
        .unwrap();

        assert!(fixture.users.is_empty());
        assert_eq!(fixture.vehicles.len(), 1);
        assert_eq!(fixture.captures[0].amount.to_string(), "19.99");
    }
}
