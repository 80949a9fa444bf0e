use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{Extensions, HeaderValue, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use super::helpers::authenticate;
use super::{Identity, TokenError};
use crate::server::AppState;

/// Extractor for handlers that require a verified caller.
///
/// Uses the identity attached by [`require_identity`] or
/// [`optional_identity`] when present, otherwise validates the
/// `Authorization` header itself.
pub struct RequireIdentity(pub Identity);

/// Extractor for handlers whose output depends on whether the caller is
/// known. Missing or invalid credentials yield `None`, never a rejection.
pub struct OptionalIdentity(pub Option<Identity>);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredentials,

    #[error("unsupported authorization header")]
    InvalidScheme,

    #[error("invalid token: {0}")]
    InvalidToken(TokenError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingCredentials => "Authentication required",
            AuthError::InvalidScheme => "Invalid authorization header",
            AuthError::InvalidToken(TokenError::Expired) => "Token expired",
            AuthError::InvalidToken(_) => "Invalid token",
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        response.headers_mut().insert(
            "WWW-Authenticate",
            HeaderValue::from_static("Bearer realm=\"folio\""),
        );

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireIdentity {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = current_identity(&parts.extensions) {
            return Ok(RequireIdentity(identity.clone()));
        }

        authenticate(state, &parts.headers).map(RequireIdentity)
    }
}

impl FromRequestParts<Arc<AppState>> for OptionalIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = current_identity(&parts.extensions) {
            return Ok(OptionalIdentity(Some(identity.clone())));
        }

        Ok(OptionalIdentity(authenticate(state, &parts.headers).ok()))
    }
}

/// Returns the identity attached to a request by the identity middleware.
#[must_use]
pub fn current_identity(extensions: &Extensions) -> Option<&Identity> {
    extensions.get::<Identity>()
}

/// Middleware that rejects the request with 401 unless it carries a valid
/// bearer token. The downstream service is never called on rejection.
pub async fn require_identity(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = authenticate(&state, request.headers()).inspect_err(|e| {
        tracing::debug!("Rejecting {} {}: {e}", request.method(), request.uri().path());
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Middleware that attaches the caller's identity when a valid bearer token
/// is present and otherwise passes the request through untouched.
pub async fn optional_identity(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
        }
        Err(AuthError::MissingCredentials) => {}
        Err(e) => tracing::debug!("Ignoring credentials on optional route: {e}"),
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{
        Router,
        body::Body,
        http::{Request, header::AUTHORIZATION},
        middleware::from_fn_with_state,
        routing::get,
    };
    use chrono::Duration;
    use tower::ServiceExt;

    use super::*;
    use crate::testing::{TestContext, bearer};

    fn probe_router(ctx: &TestContext, calls: Arc<AtomicUsize>) -> Router {
        let required = {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    StatusCode::NO_CONTENT
                }
            }
        };

        let optional = move |OptionalIdentity(identity): OptionalIdentity| async move {
            match identity {
                Some(identity) => identity.username,
                None => "anonymous".to_string(),
            }
        };

        Router::new()
            .route(
                "/required",
                get(required).route_layer(from_fn_with_state(ctx.state.clone(), require_identity)),
            )
            .route(
                "/optional",
                get(optional).route_layer(from_fn_with_state(ctx.state.clone(), optional_identity)),
            )
            .with_state(ctx.state.clone())
    }

    fn get_request(uri: &str, authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_required_rejects_without_calling_downstream() {
        let ctx = TestContext::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let router = probe_router(&ctx, calls.clone());

        for auth in [None, Some("Bearer"), Some("Basic abc"), Some("Bearer not.a.token")] {
            let response = router
                .clone()
                .oneshot(get_request("/required", auth))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "auth {auth:?}");
            assert!(response.headers().contains_key("WWW-Authenticate"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_required_passes_valid_token() {
        let ctx = TestContext::new();
        let (alice, _) = ctx.register("alice");
        let calls = Arc::new(AtomicUsize::new(0));
        let router = probe_router(&ctx, calls.clone());

        let response = router
            .oneshot(get_request("/required", Some(&bearer(&ctx, &alice))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_required_rejects_expired_token() {
        let ctx = TestContext::new();
        let (alice, _) = ctx.register("alice");
        let calls = Arc::new(AtomicUsize::new(0));
        let router = probe_router(&ctx, calls.clone());

        let header = bearer(&ctx, &alice);
        ctx.clock
            .advance(ctx.state.tokens.ttl() + Duration::seconds(1));

        let response = router
            .oneshot(get_request("/required", Some(&header)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("Token expired"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_optional_attaches_identity_when_valid() {
        let ctx = TestContext::new();
        let (alice, _) = ctx.register("alice");
        let router = probe_router(&ctx, Arc::new(AtomicUsize::new(0)));

        let response = router
            .oneshot(get_request("/optional", Some(&bearer(&ctx, &alice))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "alice");
    }

    #[tokio::test]
    async fn test_optional_proceeds_anonymously_on_bad_credentials() {
        let ctx = TestContext::new();
        let router = probe_router(&ctx, Arc::new(AtomicUsize::new(0)));

        for auth in [None, Some("Bearer garbage"), Some("Token abc"), Some("Bearer a b")] {
            let response = router
                .clone()
                .oneshot(get_request("/optional", auth))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK, "auth {auth:?}");
            assert_eq!(body_text(response).await, "anonymous");
        }
    }
}
