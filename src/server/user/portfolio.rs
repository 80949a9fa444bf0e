use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::{Gate, Owned, ResourceKind};
use crate::server::AppState;
use crate::server::dto::UpdatePortfolioRequest;
use crate::server::response::{ApiError, ApiResponse, ResourceResultExt};
use crate::server::validation::validate_title;
use crate::types::Portfolio;

pub async fn update_portfolio(
    gate: Gate<Owned<Portfolio>>,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdatePortfolioRequest>,
) -> impl IntoResponse {
    if let Some(title) = &req.title {
        validate_title(title)?;
    }

    let portfolio = gate
        .handle
        .update_portfolio(state.store.as_ref(), state.clock.now(), |portfolio| {
            if let Some(title) = req.title {
                portfolio.title = title;
            }
            if let Some(description) = req.description {
                portfolio.description = Some(description);
            }
            if let Some(about_me) = req.about_me {
                portfolio.about_me = Some(about_me);
            }
            if let Some(contact_info) = req.contact_info {
                portfolio.contact_info = Some(contact_info);
            }
            if let Some(layout) = req.layout {
                portfolio.layout = Some(layout);
            }
        })
        .or_resource_err(ResourceKind::Portfolio)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(portfolio)))
}
