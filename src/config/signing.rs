use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;

use crate::error::{Error, Result};

/// Environment variable holding the token signing secret.
pub const JWT_SECRET_ENV: &str = "FOLIO_JWT_SECRET";

/// File under the data directory that `folio admin init` writes the secret to.
pub const SIGNING_KEY_FILE: &str = ".signing_key";

pub const MIN_SECRET_LEN: usize = 32;

const GENERATED_SECRET_BYTES: usize = 32;

/// Process-wide HMAC secret for identity tokens. Rotating it invalidates
/// every token issued under the previous value.
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_LEN {
            return Err(Error::Config(format!(
                "signing secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        Ok(Self(secret.to_vec()))
    }

    /// Generates a random secret suitable for `SigningKey::new`.
    #[must_use]
    pub fn generate_secret() -> String {
        let mut bytes = [0u8; GENERATED_SECRET_BYTES];
        rand::thread_rng().fill(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    #[must_use]
    pub fn key_path(data_dir: &Path) -> PathBuf {
        data_dir.join(SIGNING_KEY_FILE)
    }

    /// Loads the key from an explicit secret (usually `FOLIO_JWT_SECRET`),
    /// falling back to the key file in `data_dir`.
    pub fn resolve(secret: Option<&str>, data_dir: &Path) -> Result<Self> {
        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            return Self::new(secret);
        }

        let path = Self::key_path(data_dir);
        if !path.exists() {
            return Err(Error::Config(format!(
                "no signing key: set {JWT_SECRET_ENV} or run 'folio admin init' to create {}",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(&path)?;
        Self::new(contents.trim())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}
