mod server;
mod signing;

pub use server::ServerConfig;
pub use signing::{JWT_SECRET_ENV, MIN_SECRET_LEN, SIGNING_KEY_FILE, SigningKey};
