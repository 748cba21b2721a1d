//! Data models for the signed API.
//!
//! This module contains request/response models, the internal
//! authentication failure taxonomy, and audit event types.

pub mod api;
pub mod audit;
pub mod auth;

pub use api::*;
pub use audit::*;
pub use auth::*;
