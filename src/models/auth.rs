//! Authentication outcomes and the internal failure taxonomy.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

/// Why the gate denied a request.
///
/// The variants exist for logs and metrics only. Every variant renders the
/// same `401 Unauthorized` with an empty body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing or malformed Timestamp header")]
    MissingOrMalformedTimestamp,

    #[error("timestamp outside the accepted window")]
    TimestampOutOfWindow,

    #[error("missing or malformed Authentication header")]
    MissingOrMalformedAuthenticationHeader,

    #[error("signature has already been used")]
    ReplayedSignature,

    #[error("unknown user")]
    UnknownUser,

    #[error("signature mismatch")]
    SignatureMismatch,
}

impl AuthError {
    /// Stable label used as a metrics dimension and audit field
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingOrMalformedTimestamp => "missing_or_malformed_timestamp",
            AuthError::TimestampOutOfWindow => "timestamp_out_of_window",
            AuthError::MissingOrMalformedAuthenticationHeader => {
                "missing_or_malformed_authentication_header"
            }
            AuthError::ReplayedSignature => "replayed_signature",
            AuthError::UnknownUser => "unknown_user",
            AuthError::SignatureMismatch => "signature_mismatch",
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Unauthorized().finish()
    }
}

/// The authenticated caller of an admitted request.
///
/// Inserted into request extensions by the authentication middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
}
