//! HTTP request handlers for API endpoints.
//!
//! Handlers run only after the authentication middleware admitted the
//! request; none of them re-checks signatures.

pub mod contacts;
pub mod health;
pub mod metrics;
pub mod openapi;
pub mod values;

pub use contacts::*;
pub use health::*;
pub use metrics::*;
pub use openapi::*;
pub use values::*;
