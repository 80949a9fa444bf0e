use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::auth::{Gate, Owned, ResourceKind};
use crate::server::AppState;
use crate::server::dto::{CreateAchievementRequest, UpdateAchievementRequest};
use crate::server::response::{ApiError, ApiResponse, ResourceResultExt};
use crate::server::validation::validate_title;
use crate::types::{Achievement, NewAchievement, Portfolio};

pub async fn list_achievements(
    gate: Gate<Owned<Portfolio>>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let achievements = gate
        .handle
        .achievements(state.store.as_ref())
        .or_resource_err(ResourceKind::Achievement)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(achievements)))
}

pub async fn create_achievement(
    gate: Gate<Owned<Portfolio>>,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAchievementRequest>,
) -> impl IntoResponse {
    validate_title(&req.title)?;

    let achievement = gate
        .handle
        .create_achievement(
            state.store.as_ref(),
            &NewAchievement {
                title: req.title,
                description: req.description,
                date: req.date,
            },
        )
        .or_resource_err(ResourceKind::Achievement)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(achievement))))
}

pub async fn update_achievement(
    gate: Gate<Owned<Achievement>>,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateAchievementRequest>,
) -> impl IntoResponse {
    if let Some(title) = &req.title {
        validate_title(title)?;
    }

    let achievement = gate
        .handle
        .update(state.store.as_ref(), state.clock.now(), |achievement| {
            if let Some(title) = req.title {
                achievement.title = title;
            }
            if let Some(description) = req.description {
                achievement.description = Some(description);
            }
            if let Some(date) = req.date {
                achievement.date = Some(date);
            }
        })
        .or_resource_err(ResourceKind::Achievement)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(achievement)))
}

pub async fn delete_achievement(
    gate: Gate<Owned<Achievement>>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    gate.handle
        .delete(state.store.as_ref())
        .or_resource_err(ResourceKind::Achievement)?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
