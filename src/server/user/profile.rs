use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequireIdentity;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{ChangePasswordRequest, MessageResponse, UpdateUserRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_email, validate_password, validate_username};

pub async fn get_user(
    RequireIdentity(identity): RequireIdentity,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user(identity.user_id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(user)))
}

pub async fn update_user(
    RequireIdentity(identity): RequireIdentity,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateUserRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut user = store
        .get_user(identity.user_id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    if let Some(username) = req.username {
        validate_username(&username)?;
        user.username = username;
    }
    if let Some(email) = req.email {
        validate_email(&email)?;
        user.email = email;
    }
    if let Some(bio) = req.bio {
        user.bio = Some(bio);
    }
    if let Some(links) = req.social_media_links {
        user.social_media_links = Some(links);
    }
    if let Some(url) = req.profile_picture_url {
        user.profile_picture_url = Some(url);
    }
    user.updated_at = state.clock.now();

    match store.update_user(&user) {
        Ok(()) => {}
        Err(Error::AlreadyExists) => {
            return Err(ApiError::conflict("Username or email already exists"));
        }
        Err(Error::NotFound) => return Err(ApiError::not_found("User not found")),
        Err(e) => {
            tracing::error!("Failed to update user: {e}");
            return Err(ApiError::internal("Failed to update user"));
        }
    }

    Ok::<_, ApiError>(Json(ApiResponse::success(user)))
}

pub async fn change_password(
    RequireIdentity(identity): RequireIdentity,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChangePasswordRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let user = store
        .get_user(identity.user_id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    if !state
        .credentials
        .verify(&req.old_password, &user.password_hash)
    {
        tracing::debug!("Password change for {} rejected", user.username);
        return Err(ApiError::unauthorized("Invalid current password"));
    }

    validate_password(&req.new_password)?;

    let password_hash = state.credentials.hash(&req.new_password).map_err(|e| {
        tracing::error!("Failed to hash password: {e}");
        ApiError::internal("Failed to update password")
    })?;

    store
        .update_user_password(user.id, &password_hash)
        .api_err("Failed to update password")?;

    tracing::info!("User {} changed their password", user.username);

    Ok::<_, ApiError>(Json(ApiResponse::success(MessageResponse {
        message: "Password updated",
    })))
}
