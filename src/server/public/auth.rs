use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::auth::Identity;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{LoginRequest, LoginResponse, RegisterRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{validate_email, validate_password, validate_username};
use crate::types::{NewPortfolio, NewUser};

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    validate_username(&req.username)?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let password_hash = state.credentials.hash(&req.password).map_err(|e| {
        tracing::error!("Failed to hash password: {e}");
        ApiError::internal("Failed to create user")
    })?;

    let new_user = NewUser {
        username: req.username,
        email: req.email,
        password_hash,
        bio: req.bio,
        social_media_links: req.social_media_links,
        profile_picture_url: req.profile_picture_url,
    };
    let portfolio = NewPortfolio::default_for(&new_user.username);

    let (user, _) = match state
        .store
        .create_user_with_portfolio(&new_user, &portfolio)
    {
        Ok(created) => created,
        Err(Error::AlreadyExists) => {
            return Err(ApiError::conflict("Username or email already exists"));
        }
        Err(e) => {
            tracing::error!("Failed to create user: {e}");
            return Err(ApiError::internal("Failed to create user"));
        }
    };

    tracing::info!("Registered user {}", user.username);

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user_by_username(&req.username)
        .api_err("Failed to look up user")?;

    // Unknown users and wrong passwords get the same answer, after the same work.
    let verified = match &user {
        Some(u) => state.credentials.verify(&req.password, &u.password_hash),
        None => state.credentials.verify_absent(&req.password),
    };
    let Some(user) = user.filter(|_| verified) else {
        tracing::debug!("Failed login for {}", req.username);
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    let issued = state
        .tokens
        .issue(&Identity::from(&user), state.clock.now())
        .api_err("Failed to issue token")?;

    tracing::info!("User {} logged in", user.username);

    Ok::<_, ApiError>(Json(ApiResponse::success(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
    })))
}
