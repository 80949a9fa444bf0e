use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::auth::{ResourceError, ResourceKind};
use crate::error::{Error, Result as StoreResult};

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }
}

/// API error that converts to a proper HTTP response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "data": null, "error": self.message });
        let mut response = (self.status, Json(body)).into_response();

        if self.status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                "WWW-Authenticate",
                axum::http::HeaderValue::from_static("Bearer realm=\"folio\""),
            );
        }

        response
    }
}

/// Maps an ownership failure to a response. Foreign and missing resources
/// share the same 404; storage failures are logged and reported generically.
#[must_use]
pub fn resource_error(kind: ResourceKind, err: ResourceError) -> ApiError {
    match err {
        ResourceError::PortfolioMissing => ApiError::not_found("Portfolio not found"),
        ResourceError::NotFound => ApiError::not_found(format!("{} not found", kind.label())),
        ResourceError::Storage(e) => {
            tracing::error!("Storage error resolving {}: {e}", kind.label());
            ApiError::internal("Internal server error")
        }
    }
}

/// Extension trait for converting store results to API errors with a custom message.
pub trait StoreResultExt<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e: Error| {
            tracing::error!("{message}: {e}");
            ApiError::internal(message)
        })
    }
}

/// Extension for Option types from store operations.
pub trait StoreOptionExt<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreOptionExt<T> for Option<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(message))
    }
}

/// Extension for results of ownership-scoped operations.
pub trait ResourceResultExt<T> {
    fn or_resource_err(self, kind: ResourceKind) -> Result<T, ApiError>;
}

impl<T> ResourceResultExt<T> for Result<T, ResourceError> {
    fn or_resource_err(self, kind: ResourceKind) -> Result<T, ApiError> {
        self.map_err(|e| resource_error(kind, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_and_missing_share_status() {
        let missing = resource_error(ResourceKind::Project, ResourceError::NotFound);
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.message, "Project not found");

        let no_portfolio = resource_error(ResourceKind::Project, ResourceError::PortfolioMissing);
        assert_eq!(no_portfolio.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_storage_error_is_not_leaked() {
        let err = resource_error(
            ResourceKind::Achievement,
            ResourceError::Storage(Error::Config("secret detail".to_string())),
        );
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("secret detail"));
    }

    #[test]
    fn test_unauthorized_sets_challenge_header() {
        let response = ApiError::unauthorized("Invalid credentials").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("WWW-Authenticate").unwrap(),
            "Bearer realm=\"folio\""
        );
    }
}
