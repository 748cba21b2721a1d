//! Client-side request signing.
//!
//! Produces the `Timestamp` and `Authentication` header values a client sends
//! so the gate can rebuild and check the same canonical message.

use crate::services::{
    canonical::{CanonicalMessageBuilder, RequestParameters},
    signature::{SignatureEncoding, SignatureError, compute_signature},
    timestamp::format_timestamp,
};
use chrono::Utc;

/// Header values for one signed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// Value of the `Timestamp` header
    pub timestamp: String,
    /// Value of the `Authentication` header, `username:signature`
    pub authentication: String,
    pub signature: String,
}

/// Signs requests on behalf of one user.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    username: String,
    secret: String,
    encoding: SignatureEncoding,
}

impl RequestSigner {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
            encoding: SignatureEncoding::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: SignatureEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sign with an explicit `Timestamp` header value
    pub fn sign(
        &self,
        method: &str,
        path: &str,
        timestamp: &str,
        parameters: &RequestParameters,
    ) -> Result<SignedHeaders, SignatureError> {
        let message = CanonicalMessageBuilder::new().compose(method, timestamp, path, parameters);
        let signature = compute_signature(&self.secret, message.as_ref(), self.encoding)?;

        Ok(SignedHeaders {
            timestamp: timestamp.to_string(),
            authentication: format!("{}:{}", self.username, signature),
            signature,
        })
    }

    /// Sign with the current time
    pub fn sign_now(
        &self,
        method: &str,
        path: &str,
        parameters: &RequestParameters,
    ) -> Result<SignedHeaders, SignatureError> {
        self.sign(method, path, &format_timestamp(Utc::now()), parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signature::SignatureVerifier;

    #[test]
    fn test_signed_headers_verify_against_canonical_message() {
        let signer = RequestSigner::new("alice", "s3cr3t");
        let parameters = RequestParameters {
            query: vec![("IcaoCode".to_string(), "ZPWS".to_string())],
            ..Default::default()
        };
        let headers = signer
            .sign("GET", "/api/values/cities", "2024-01-01 12:00:00Z", &parameters)
            .unwrap();

        assert_eq!(headers.timestamp, "2024-01-01 12:00:00Z");
        assert_eq!(headers.authentication, format!("alice:{}", headers.signature));

        let message = "GET\n2024-01-01 12:00:00Z\n/api/values/cities\nIcaoCode=ZPWS";
        assert!(SignatureVerifier::default().verify("s3cr3t", message.as_bytes(), &headers.signature));
    }

    #[test]
    fn test_hex_encoding() {
        let headers = RequestSigner::new("bob", "k")
            .with_encoding(SignatureEncoding::Hex)
            .sign("GET", "/", "2024-01-01 12:00:00Z", &RequestParameters::default())
            .unwrap();
        assert_eq!(headers.signature.len(), 64);
        assert!(headers.signature.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
