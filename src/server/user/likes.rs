use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::auth::{Gate, LikeHandle, ResourceKind};
use crate::server::AppState;
use crate::server::dto::MessageResponse;
use crate::server::response::{ApiError, ApiResponse, ResourceResultExt};

pub async fn like_project(
    gate: Gate<LikeHandle>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let created = gate
        .handle
        .like(state.store.as_ref())
        .or_resource_err(ResourceKind::Like)?;

    let (status, message) = if created {
        (StatusCode::CREATED, "Project liked")
    } else {
        (StatusCode::OK, "Project already liked")
    };

    Ok::<_, ApiError>((status, Json(ApiResponse::success(MessageResponse { message }))))
}

pub async fn unlike_project(
    gate: Gate<LikeHandle>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let removed = gate
        .handle
        .unlike(state.store.as_ref())
        .or_resource_err(ResourceKind::Like)?;

    if !removed {
        tracing::debug!(
            "User {} had not liked project {}",
            gate.identity.username,
            gate.handle.project().id
        );
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
