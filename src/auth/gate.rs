use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::middleware::{AuthError, RequireIdentity};
use super::ownership::{
    LikeHandle, Owned, OwnedResource, ResourceError, ResourceKind, ResourceLocator,
    authorize_ownership,
};
use super::Identity;
use crate::server::AppState;
use crate::server::response::{ApiError, resource_error};
use crate::types::{Achievement, Portfolio, Project};

/// A handle type a [`Gate`] can produce.
pub trait GateTarget: Sized {
    const KIND: ResourceKind;

    fn take(resource: OwnedResource) -> Option<Self>;
}

impl GateTarget for Owned<Portfolio> {
    const KIND: ResourceKind = ResourceKind::Portfolio;

    fn take(resource: OwnedResource) -> Option<Self> {
        match resource {
            OwnedResource::Portfolio(portfolio) => Some(portfolio),
            _ => None,
        }
    }
}

impl GateTarget for Owned<Project> {
    const KIND: ResourceKind = ResourceKind::Project;

    fn take(resource: OwnedResource) -> Option<Self> {
        match resource {
            OwnedResource::Project(project) => Some(project),
            _ => None,
        }
    }
}

impl GateTarget for Owned<Achievement> {
    const KIND: ResourceKind = ResourceKind::Achievement;

    fn take(resource: OwnedResource) -> Option<Self> {
        match resource {
            OwnedResource::Achievement(achievement) => Some(achievement),
            _ => None,
        }
    }
}

impl GateTarget for LikeHandle {
    const KIND: ResourceKind = ResourceKind::Like;

    fn take(resource: OwnedResource) -> Option<Self> {
        match resource {
            OwnedResource::Like(handle) => Some(handle),
            _ => None,
        }
    }
}

/// Extractor that authenticates the caller, reads the `{id}` path
/// parameter when the target needs one, and resolves the target within the
/// caller's own portfolio.
///
/// A handler taking a `Gate` only runs once all three steps succeed.
pub struct Gate<H> {
    pub identity: Identity,
    pub handle: H,
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("invalid resource id")]
    InvalidId,

    #[error("{0:?}: {1}")]
    Resource(ResourceKind, ResourceError),
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        match self {
            GateError::Auth(err) => err.into_response(),
            GateError::InvalidId => ApiError::bad_request("Invalid id").into_response(),
            GateError::Resource(kind, err) => resource_error(kind, err).into_response(),
        }
    }
}

impl<H: GateTarget + Send> FromRequestParts<Arc<AppState>> for Gate<H> {
    type Rejection = GateError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let RequireIdentity(identity) = RequireIdentity::from_request_parts(parts, state).await?;

        let locator = match H::KIND {
            ResourceKind::Portfolio => ResourceLocator::Portfolio,
            kind => {
                let Path(id) = Path::<i64>::from_request_parts(parts, state)
                    .await
                    .map_err(|_| GateError::InvalidId)?;
                match kind {
                    ResourceKind::Project => ResourceLocator::Project(id),
                    ResourceKind::Achievement => ResourceLocator::Achievement(id),
                    _ => ResourceLocator::Like { project_id: id },
                }
            }
        };

        let resource = authorize_ownership(state.store.as_ref(), &identity, locator)
            .map_err(|e| GateError::Resource(H::KIND, e))?;

        let handle =
            H::take(resource).ok_or(GateError::Resource(H::KIND, ResourceError::NotFound))?;

        Ok(Gate { identity, handle })
    }
}
