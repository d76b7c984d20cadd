use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::lifecycle::{self, CancelOutcome, NewOrder};
use crate::engine::queue::dispatch_queue;
use crate::error::AppError;
use crate::models::center::CenterTag;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", patch(transition_order))
        .route("/orders/:id/logistics", post(send_to_logistics))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/dispatch/queue", get(get_dispatch_queue))
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub status: OrderStatus,
}

#[derive(Deserialize)]
pub struct LogisticsRequest {
    pub sender_id: Uuid,
}

#[derive(Deserialize)]
pub struct QueueQuery {
    pub center: Option<String>,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewOrder>,
) -> Result<Json<Order>, AppError> {
    let order = lifecycle::create_order(&state, payload)?;
    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(lifecycle::get_order(&state, id)?))
}

async fn transition_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<Order>, AppError> {
    let order = lifecycle::transition_order(&state, id, payload.status).await?;
    Ok(Json(order))
}

async fn send_to_logistics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LogisticsRequest>,
) -> Result<Json<Order>, AppError> {
    let order = lifecycle::send_to_logistics(&state, id, payload.sender_id).await?;
    Ok(Json(order))
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CancelOutcome>, AppError> {
    let outcome = lifecycle::cancel_order(&state, id).await?;
    Ok(Json(outcome))
}

async fn get_dispatch_queue(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QueueQuery>,
) -> Json<Vec<Order>> {
    let center = query
        .center
        .filter(|raw| !raw.trim().is_empty())
        .map(CenterTag::from);

    Json(dispatch_queue(&state, center.as_ref()).await)
}
