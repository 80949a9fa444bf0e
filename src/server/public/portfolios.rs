use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::auth::{OptionalIdentity, ResourceKind, resolve_public_portfolio};
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, ResourceResultExt};

pub async fn get_public_portfolio(
    OptionalIdentity(viewer): OptionalIdentity,
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    let view = resolve_public_portfolio(state.store.as_ref(), &username, viewer.as_ref())
        .or_resource_err(ResourceKind::Portfolio)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(view)))
}
