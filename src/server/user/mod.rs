mod achievements;
mod likes;
mod portfolio;
mod profile;
mod projects;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::server::AppState;

/// Routes mounted under `/api/auth`. The caller layers identity
/// enforcement on top; handlers that touch a specific record also go
/// through the ownership gate.
pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        // Profile
        .route("/user", get(profile::get_user).put(profile::update_user))
        .route("/user/password", put(profile::change_password))
        // Portfolio
        .route("/portfolio", put(portfolio::update_portfolio))
        // Projects
        .route(
            "/portfolio/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/portfolio/projects/{id}",
            put(projects::update_project).delete(projects::delete_project),
        )
        // Likes
        .route(
            "/portfolio/projects/{id}/like",
            post(likes::like_project).delete(likes::unlike_project),
        )
        // Achievements
        .route(
            "/portfolio/achievements",
            get(achievements::list_achievements).post(achievements::create_achievement),
        )
        .route(
            "/portfolio/achievements/{id}",
            put(achievements::update_achievement).delete(achievements::delete_achievement),
        )
}
