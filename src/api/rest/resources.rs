use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::engine::directory::{available_drivers, available_vehicles};
use crate::error::AppError;
use crate::models::center::CenterTag;
use crate::models::user::User;
use crate::models::vehicle::Vehicle;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers/available", get(list_available_drivers))
        .route("/vehicles/available", get(list_available_vehicles))
}

#[derive(Deserialize)]
pub struct CenterQuery {
    pub center: CenterTag,
}

fn required_center(query: CenterQuery) -> Result<CenterTag, AppError> {
    if query.center.is_blank() {
        return Err(AppError::BadRequest("center cannot be empty".to_string()));
    }
    Ok(query.center)
}

async fn list_available_drivers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CenterQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    let center = required_center(query)?;
    Ok(Json(available_drivers(&state, &center).await))
}

async fn list_available_vehicles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CenterQuery>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let center = required_center(query)?;
    Ok(Json(available_vehicles(&state, &center).await))
}
