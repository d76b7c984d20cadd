use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::adapter::payment::PaymentError;

/// Which record an error is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Order,
    Driver,
    Vehicle,
    Assignment,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Order => "order",
            Self::Driver => "driver",
            Self::Vehicle => "vehicle",
            Self::Assignment => "assignment",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: String },

    #[error("{kind} {id} is not a valid {kind}")]
    InvalidResource { kind: ResourceKind, id: String },

    #[error("{kind} {id} is not available for assignment")]
    ResourceUnavailable { kind: ResourceKind, id: String },

    #[error("{kind} {id} does not serve center {center}")]
    CenterMismatch {
        kind: ResourceKind,
        id: String,
        center: String,
    },

    #[error("{kind} {id} is already held by live assignment {holder}")]
    Conflict {
        kind: ResourceKind,
        id: String,
        holder: String,
    },

    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("refund failed: {0}")]
    RefundFailed(#[from] PaymentError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(kind: ResourceKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn invalid(kind: ResourceKind, id: impl ToString) -> Self {
        Self::InvalidResource {
            kind,
            id: id.to_string(),
        }
    }

    pub fn unavailable(kind: ResourceKind, id: impl ToString) -> Self {
        Self::ResourceUnavailable {
            kind,
            id: id.to_string(),
        }
    }

    pub fn center_mismatch(kind: ResourceKind, id: impl ToString, center: impl ToString) -> Self {
        Self::CenterMismatch {
            kind,
            id: id.to_string(),
            center: center.to_string(),
        }
    }

    pub fn conflict(kind: ResourceKind, id: impl ToString, holder: impl ToString) -> Self {
        Self::Conflict {
            kind,
            id: id.to_string(),
            holder: holder.to_string(),
        }
    }

    /// Stable machine-readable name, also used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidResource { .. } => "invalid_resource",
            Self::ResourceUnavailable { .. } => "resource_unavailable",
            Self::CenterMismatch { .. } => "center_mismatch",
            Self::Conflict { .. } => "conflict",
            Self::InvalidStateTransition(_) => "invalid_state_transition",
            Self::RefundFailed(_) => "refund_failed",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidResource { .. } | Self::CenterMismatch { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::ResourceUnavailable { .. }
            | Self::Conflict { .. }
            | Self::InvalidStateTransition(_) => StatusCode::CONFLICT,
            Self::RefundFailed(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));

        (self.status_code(), body).into_response()
    }
}
