//! Plugin authentication: access-manager configuration, redacted secrets, and the token manager.

pub mod config;
pub mod manager;
pub mod secret;

mod token;

pub use config::*;
pub use manager::*;
pub use secret::*;
