pub mod dto;
mod public;
pub mod response;
mod router;
pub mod user;
pub mod validation;

pub use public::public_router;
pub use router::{AppState, create_router};
pub use user::user_router;
