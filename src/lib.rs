//! # Folio
//!
//! A personal portfolio backend, usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! folio = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chrono::Duration;
//! use folio::config::SigningKey;
//! use folio::server::{AppState, create_router};
//! use folio::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/folio.db").unwrap();
//! store.initialize().unwrap();
//!
//! let key = SigningKey::new(std::env::var("FOLIO_JWT_SECRET").unwrap()).unwrap();
//! let state = Arc::new(AppState::new(Arc::new(store), &key, Duration::hours(24)));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `folio` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
#[cfg(test)]
mod testing;
pub mod types;
