//! CLI integration tests for folio admin commands.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use folio::config::{MIN_SECRET_LEN, SIGNING_KEY_FILE, SigningKey};
use folio::store::{SqliteStore, Store};
use predicates::prelude::*;

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("folio").expect("failed to find binary");
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("FOLIO_JWT_SECRET");
        cmd.env_remove("FOLIO_TOKEN_TTL_HOURS");
        cmd
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.cmd()
            .args(["admin", "init", "--data-dir", &self.data_dir_str()])
            .assert()
    }
}

#[test]
fn test_init_creates_database_and_signing_key() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Signing key written to"));

    assert!(ctx.data_dir().join("folio.db").exists());

    let key_path = ctx.data_dir().join(SIGNING_KEY_FILE);
    let secret = std::fs::read_to_string(&key_path).expect("read signing key");
    assert!(secret.trim().len() >= MIN_SECRET_LEN);
    assert!(SigningKey::resolve(None, ctx.data_dir()).is_ok());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&key_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    let store = SqliteStore::new(ctx.data_dir().join("folio.db")).expect("open store");
    assert!(store.get_user_by_username("anyone").unwrap().is_none());
}

#[test]
fn test_init_refuses_to_overwrite_key() {
    let ctx = TestContext::new();
    ctx.init().success();

    let key_path = ctx.data_dir().join(SIGNING_KEY_FILE);
    let original = std::fs::read_to_string(&key_path).unwrap();

    ctx.init()
        .failure()
        .stderr(predicate::str::contains("already initialized"));

    assert_eq!(std::fs::read_to_string(&key_path).unwrap(), original);
}

#[test]
fn test_serve_without_signing_key_fails() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args(["serve", "--port", "0", "--data-dir", &ctx.data_dir_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("folio admin init"));
}

#[test]
fn test_serve_rejects_short_secret() {
    let ctx = TestContext::new();

    ctx.cmd()
        .env("FOLIO_JWT_SECRET", "too-short")
        .args(["serve", "--port", "0", "--data-dir", &ctx.data_dir_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least"));
}

#[test]
fn test_serve_rejects_non_positive_ttl() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.cmd()
        .args([
            "serve",
            "--port",
            "0",
            "--data-dir",
            &ctx.data_dir_str(),
            "--token-ttl-hours",
            "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Token lifetime must be positive"));
}
