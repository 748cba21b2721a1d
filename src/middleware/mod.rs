//! Request pipeline middleware.
//!
//! [`HmacAuthentication`] gates every non-bypassed route; the
//! [`BodySchemaRegistry`] tells it how JSON bodies take part in signing.

pub mod body_schema;
pub mod hmac_auth;

pub use body_schema::*;
pub use hmac_auth::*;
