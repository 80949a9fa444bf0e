mod models;
mod public;

pub use models::*;
pub use public::*;
