use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};
use chrono::Duration;

use super::public::public_router;
use super::user::user_router;
use crate::auth::{Clock, CredentialHasher, SystemClock, TokenService, require_identity};
use crate::config::SigningKey;
use crate::store::Store;

/// Process-wide collaborators shared by every request.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub credentials: CredentialHasher,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, signing_key: &SigningKey, token_ttl: Duration) -> Self {
        Self {
            store,
            tokens: TokenService::new(signing_key, token_ttl),
            credentials: CredentialHasher::new(),
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let authenticated = user_router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_identity,
    ));

    Router::new()
        .route("/health", get(health))
        .nest("/api", public_router(state.clone()))
        .nest("/api/auth", authenticated)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
