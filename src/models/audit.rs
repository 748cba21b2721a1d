//! Audit logging data structures and types.

use crate::models::AuthError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Outcome of a single gate decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcome {
    Admitted,
    Denied,
}

impl GateOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateOutcome::Admitted => "admitted",
            GateOutcome::Denied => "denied",
        }
    }
}

/// Structured audit log entry for one authenticated (or rejected) request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthAuditEvent {
    pub outcome: GateOutcome,
    /// Internal failure kind; never sent to the client
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub username: Option<String>,
    pub method: String,
    pub endpoint: String,
    pub request_id: Option<String>,
}

impl AuthAuditEvent {
    pub fn admitted(ip_address: String, method: String, endpoint: String) -> Self {
        Self::new(GateOutcome::Admitted, None, ip_address, method, endpoint)
    }

    pub fn denied(error: AuthError, ip_address: String, method: String, endpoint: String) -> Self {
        Self::new(
            GateOutcome::Denied,
            Some(error.kind().to_string()),
            ip_address,
            method,
            endpoint,
        )
    }

    fn new(
        outcome: GateOutcome,
        reason: Option<String>,
        ip_address: String,
        method: String,
        endpoint: String,
    ) -> Self {
        Self {
            outcome,
            reason,
            timestamp: Utc::now(),
            ip_address,
            user_agent: None,
            username: None,
            method,
            endpoint,
            request_id: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Log the audit event using structured logging
    pub fn log(&self) {
        match self.outcome {
            GateOutcome::Admitted => info!(
                target: "auth_audit",
                outcome = self.outcome.as_str(),
                timestamp = %self.timestamp,
                ip_address = %self.ip_address,
                user_agent = ?self.user_agent,
                username = ?self.username,
                method = %self.method,
                endpoint = %self.endpoint,
                request_id = ?self.request_id,
                "Request admitted"
            ),
            GateOutcome::Denied => warn!(
                target: "auth_audit",
                outcome = self.outcome.as_str(),
                reason = ?self.reason,
                timestamp = %self.timestamp,
                ip_address = %self.ip_address,
                user_agent = ?self.user_agent,
                username = ?self.username,
                method = %self.method,
                endpoint = %self.endpoint,
                request_id = ?self.request_id,
                "Request denied"
            ),
        }
    }
}
