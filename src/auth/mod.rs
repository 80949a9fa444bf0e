//! Authentication and ownership authorization.
//!
//! Requests flow through three layers: the identity middleware turns a
//! bearer token into an [`Identity`], the ownership resolver walks
//! user → portfolio → resource in storage, and the [`Gate`] extractor
//! composes both so a handler body only runs once both have passed.

mod clock;
mod gate;
mod helpers;
mod middleware;
mod ownership;
mod password;
mod token;

use serde::Serialize;

use crate::types::User;

pub use clock::{Clock, FixedClock, SystemClock};
pub use gate::{Gate, GateError, GateTarget};
pub use helpers::{authenticate, extract_bearer_token};
pub use middleware::{
    AuthError, OptionalIdentity, RequireIdentity, current_identity, optional_identity,
    require_identity,
};
pub use ownership::{
    LikeHandle, Owned, OwnedRecord, OwnedResource, ResourceError, ResourceKind, ResourceLocator,
    authorize_ownership, resolve_like, resolve_owned, resolve_portfolio, resolve_public_portfolio,
};
pub use password::{CredentialError, CredentialHasher};
pub use token::{DEFAULT_TOKEN_TTL_HOURS, IssuedToken, TokenError, TokenService};

/// A verified caller, as carried by a valid token.
///
/// `username` is the name at the time the token was issued and is for
/// display only; ownership checks use `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
        }
    }
}
