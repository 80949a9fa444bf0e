use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::task::JoinHandle;

use folio::auth::{DEFAULT_TOKEN_TTL_HOURS, FixedClock};
use folio::config::SigningKey;
use folio::server::{AppState, create_router};
use folio::store::{SqliteStore, Store};

pub const TEST_SECRET: &str = "integration-test-signing-key-0123456789";

/// An in-process server on an ephemeral port with a controllable clock.
pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub clock: Arc<FixedClock>,
    pub client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");

        let store = SqliteStore::new(temp_dir.path().join("folio.db")).expect("open store");
        store.initialize().expect("initialize store");

        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        ));
        let state = AppState::new(
            Arc::new(store),
            &SigningKey::new(TEST_SECRET).expect("signing key"),
            Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
        )
        .with_clock(clock.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let app = create_router(Arc::new(state));

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            temp_dir,
            base_url: format!("http://127.0.0.1:{port}"),
            clock,
            client: reqwest::Client::new(),
            handle,
        }
    }

    pub fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/register"))
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": password,
            }))
            .send()
            .await
            .expect("register request")
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("login request")
    }

    /// Registers `username` and returns a bearer token for them.
    pub async fn signup(&self, username: &str) -> String {
        let password = format!("{username}-password");
        let resp = self.register(username, &password).await;
        assert_eq!(resp.status(), 201, "register {username}");

        let resp = self.login(username, &password).await;
        assert_eq!(resp.status(), 200, "login {username}");

        let body: Value = resp.json().await.expect("login body");
        body["data"]["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
