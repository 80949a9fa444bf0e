mod auth;
mod portfolios;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::auth::optional_identity;
use crate::server::AppState;

/// Routes that need no credentials. The portfolio view attaches the
/// caller's identity when one is presented so it can mark their likes.
pub fn public_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route(
            "/portfolio/{username}",
            get(portfolios::get_public_portfolio)
                .route_layer(from_fn_with_state(state, optional_identity)),
        )
}
