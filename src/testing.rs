//! Shared fixtures for unit tests.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

use crate::auth::{DEFAULT_TOKEN_TTL_HOURS, FixedClock, Identity};
use crate::config::SigningKey;
use crate::server::AppState;
use crate::store::{SqliteStore, Store};
use crate::types::{NewPortfolio, NewUser, Portfolio, User};

pub const TEST_SECRET: &str = "unit-test-signing-key-at-least-32-bytes";

pub struct TestContext {
    _temp: TempDir,
    pub state: Arc<AppState>,
    pub clock: Arc<FixedClock>,
}

impl TestContext {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();

        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        ));
        let state = AppState::new(
            Arc::new(store),
            &SigningKey::new(TEST_SECRET).unwrap(),
            Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
        )
        .with_clock(clock.clone());

        Self {
            _temp: temp,
            state: Arc::new(state),
            clock,
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.state.store.as_ref()
    }

    /// Creates a user and their default portfolio. The password hash is a
    /// placeholder; use the HTTP tests for login flows.
    pub fn register(&self, username: &str) -> (User, Portfolio) {
        self.store()
            .create_user_with_portfolio(
                &NewUser {
                    username: username.to_string(),
                    email: format!("{username}@example.com"),
                    password_hash: "unused".to_string(),
                    bio: None,
                    social_media_links: None,
                    profile_picture_url: None,
                },
                &NewPortfolio::default_for(username),
            )
            .unwrap()
    }
}

/// Returns an `Authorization` header value for `user` issued at the
/// context's current time.
pub fn bearer(ctx: &TestContext, user: &User) -> String {
    let issued = ctx
        .state
        .tokens
        .issue(&Identity::from(user), ctx.state.clock.now())
        .unwrap();
    format!("Bearer {}", issued.token)
}
