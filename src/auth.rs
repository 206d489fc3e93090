//! Auth-domain token models and secret handling.

pub mod secret;
pub mod token;

pub use secret::*;
pub use token::*;
