//! Request authentication configuration.

use crate::services::signature::SignatureEncoding;
use std::{env, time::Duration};

const DEFAULT_BYPASS_PATHS: [&str; 3] = ["/api/health", "/api/metrics", "/api/spec/v2"];

/// Configuration for the HMAC authentication gate
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Accepted distance between the `Timestamp` header and the server clock
    pub timestamp_tolerance_seconds: u64,
    /// How long a seen signature stays in the replay cache
    pub replay_ttl_seconds: u64,
    /// Interval between background sweeps of the replay cache
    pub replay_sweep_interval_seconds: u64,
    pub signature_encoding: SignatureEncoding,
    /// Upper bound on a single credential lookup
    pub credential_timeout_ms: u64,
    /// Paths served without authentication (exact match)
    pub bypass_paths: Vec<String>,
    /// `(username, secret)` pairs seeding the in-memory credential store
    pub credentials: Vec<(String, String)>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            timestamp_tolerance_seconds: 300, // 5 minutes
            replay_ttl_seconds: 300,
            replay_sweep_interval_seconds: 60,
            signature_encoding: SignatureEncoding::Base64,
            credential_timeout_ms: 2000,
            bypass_paths: DEFAULT_BYPASS_PATHS.iter().map(|p| p.to_string()).collect(),
            credentials: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let timestamp_tolerance_seconds = env::var("HMAC_TIMESTAMP_TOLERANCE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timestamp_tolerance_seconds);

        let replay_ttl_seconds = env::var("HMAC_REPLAY_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.replay_ttl_seconds);

        let replay_sweep_interval_seconds = env::var("HMAC_REPLAY_SWEEP_INTERVAL")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v: &u64| *v > 0)
            .unwrap_or(defaults.replay_sweep_interval_seconds);

        let signature_encoding = env::var("HMAC_SIGNATURE_ENCODING")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.signature_encoding);

        let credential_timeout_ms = env::var("HMAC_CREDENTIAL_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.credential_timeout_ms);

        let bypass_paths = env::var("HMAC_BYPASS_PATHS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.bypass_paths);

        let credentials = env::var("HMAC_CREDENTIALS")
            .map(|v| parse_credentials(&v))
            .unwrap_or_default();

        Self {
            timestamp_tolerance_seconds,
            replay_ttl_seconds,
            replay_sweep_interval_seconds,
            signature_encoding,
            credential_timeout_ms,
            bypass_paths,
            credentials,
        }
    }

    pub fn timestamp_tolerance(&self) -> Duration {
        Duration::from_secs(self.timestamp_tolerance_seconds)
    }

    pub fn replay_ttl(&self) -> Duration {
        Duration::from_secs(self.replay_ttl_seconds)
    }

    pub fn replay_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.replay_sweep_interval_seconds)
    }

    pub fn credential_timeout(&self) -> Duration {
        Duration::from_millis(self.credential_timeout_ms)
    }
}

/// Parse `user:secret,user2:secret2` into pairs, skipping malformed entries.
///
/// The secret may itself contain colons; only the first one separates.
pub fn parse_credentials(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|entry| {
            let (user, secret) = entry.trim().split_once(':')?;
            if user.is_empty() || secret.is_empty() {
                return None;
            }
            Some((user.to_string(), secret.to_string()))
        })
        .collect()
}
