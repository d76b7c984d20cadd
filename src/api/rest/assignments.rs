use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::assignment::{self, AssignRequest, AssignmentFilter};
use crate::engine::sync::{self, AdvanceRequest};
use crate::error::AppError;
use crate::models::assignment::Assignment;
use crate::models::page::Page;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/assignments", post(create_assignment).get(list_assignments))
        .route("/assignments/:id", get(get_assignment))
        .route("/assignments/:id/status", patch(advance_assignment))
        .route("/assignments/:id/verify", post(verify_delivery))
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub verified: bool,
}

async fn create_assignment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<Assignment>, AppError> {
    let created = assignment::assign(&state, payload).await?;
    Ok(Json(created))
}

async fn list_assignments(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AssignmentFilter>,
) -> Json<Page<Assignment>> {
    Json(assignment::list_assignments(&state, filter).await)
}

async fn get_assignment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Assignment>, AppError> {
    Ok(Json(assignment::get_assignment(&state, id)?))
}

async fn advance_assignment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdvanceRequest>,
) -> Result<Json<Assignment>, AppError> {
    let updated = sync::advance_assignment(&state, id, payload).await?;
    Ok(Json(updated))
}

async fn verify_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<Assignment>, AppError> {
    let updated = sync::verify_delivery(&state, id, payload.verified).await?;
    Ok(Json(updated))
}
