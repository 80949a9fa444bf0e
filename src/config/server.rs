use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;

use crate::auth::DEFAULT_TOKEN_TTL_HOURS;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Lifetime of issued identity tokens.
    pub token_ttl: Duration,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("folio.db")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
        }
    }
}
