//! Configuration structures and loading utilities.
//!
//! Every structure loads from environment variables and falls back to
//! defaults when a variable is missing or malformed.

pub mod auth;
pub mod server;

pub use auth::*;
pub use server::*;
