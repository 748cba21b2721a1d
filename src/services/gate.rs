//! The authentication gate: one admit/deny decision per request.
//!
//! ```text
//! Timestamp -> Authentication header -> replay check+record
//!           -> credential lookup -> canonical message -> HMAC verify
//! ```
//!
//! Every failure maps to an [`AuthError`]; callers render all of them as the
//! same `401`. A signature is recorded in the replay cache before it is
//! verified, so a rejected signature cannot be retried either.

use crate::{
    config::AuthConfig,
    models::{AuthError, Principal},
    services::{
        canonical::{CanonicalMessageBuilder, IncomingRequest},
        clock::Clock,
        credentials::CredentialProvider,
        replay::{InMemoryReplayCache, ReplayCache, ReplayGuard},
        signature::SignatureVerifier,
        timestamp::TimestampValidator,
    },
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

/// Split `username:signature`.
///
/// Exactly one colon and two non-empty parts; anything else is malformed.
pub fn parse_authentication_header(value: &str) -> Option<(&str, &str)> {
    let (username, signature) = value.split_once(':')?;
    if username.is_empty() || signature.is_empty() || signature.contains(':') {
        return None;
    }
    Some((username, signature))
}

/// Orchestrates the checks for one request
pub struct AuthenticationGate {
    timestamps: TimestampValidator,
    replay: ReplayGuard,
    credentials: Arc<dyn CredentialProvider>,
    builder: CanonicalMessageBuilder,
    verifier: SignatureVerifier,
    credential_timeout: Duration,
}

impl AuthenticationGate {
    pub fn new(
        timestamps: TimestampValidator,
        replay: ReplayGuard,
        credentials: Arc<dyn CredentialProvider>,
        verifier: SignatureVerifier,
        credential_timeout: Duration,
    ) -> Self {
        Self {
            timestamps,
            replay,
            credentials,
            builder: CanonicalMessageBuilder::new(),
            verifier,
            credential_timeout,
        }
    }

    /// Wire a gate from configuration with a fresh in-memory replay cache.
    pub fn from_config(
        config: &AuthConfig,
        clock: Arc<dyn Clock>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let cache: Arc<dyn ReplayCache> = Arc::new(InMemoryReplayCache::new(clock.clone()));
        Self::new(
            TimestampValidator::new(clock, config.timestamp_tolerance()),
            ReplayGuard::new(cache, config.replay_ttl()),
            credentials,
            SignatureVerifier::new(config.signature_encoding),
            config.credential_timeout(),
        )
    }

    pub fn replay_guard(&self) -> &ReplayGuard {
        &self.replay
    }

    /// Decide whether `request` is admitted.
    pub async fn authenticate(&self, request: &IncomingRequest) -> Result<Principal, AuthError> {
        let timestamp = request
            .timestamp
            .as_deref()
            .ok_or(AuthError::MissingOrMalformedTimestamp)?;
        self.timestamps.check(timestamp)?;

        let (username, signature) = request
            .authentication
            .as_deref()
            .and_then(parse_authentication_header)
            .ok_or(AuthError::MissingOrMalformedAuthenticationHeader)?;

        if !self.replay.check_and_record(signature) {
            return Err(AuthError::ReplayedSignature);
        }

        let secret = self.lookup_secret(username).await;
        let message = self.builder.build(request);
        debug!(%username, message = %message, "server side canonical message");

        if self.verifier.verify(&secret, message.as_ref(), signature) {
            Ok(Principal {
                username: username.to_string(),
            })
        } else if secret.is_empty() {
            Err(AuthError::UnknownUser)
        } else {
            Err(AuthError::SignatureMismatch)
        }
    }

    /// Resolve the secret; failures and timeouts resolve to the empty secret.
    async fn lookup_secret(&self, username: &str) -> String {
        match tokio::time::timeout(self.credential_timeout, self.credentials.get_secret(username))
            .await
        {
            Ok(Ok(secret)) => secret,
            Ok(Err(e)) => {
                warn!(%username, error = %e, "credential lookup failed");
                String::new()
            }
            Err(_) => {
                warn!(
                    %username,
                    timeout_ms = self.credential_timeout.as_millis() as u64,
                    "credential lookup timed out"
                );
                String::new()
            }
        }
    }
}
