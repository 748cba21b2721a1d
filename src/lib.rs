//! HMAC Gate - signed request authentication with replay protection
//!
//! Every protected request carries a `Timestamp` header and an
//! `Authentication: username:signature` header. The gate:
//! - checks the timestamp is within ±5 minutes of server time
//! - rejects any signature it has already seen in the last 5 minutes
//! - rebuilds the canonical message from method, timestamp, path and sorted parameters
//! - compares the HMAC-SHA256 of that message under the user's secret
//!
//! Any failure is a bare `401`; the reason is only logged.
//!
//! ## Architecture
//!
//! - `services/` - the pipeline: timestamp, canonical message, signature, replay, gate
//! - `middleware/` - the Actix Web interceptor and declared JSON body schemas
//! - `handlers/` - health, metrics, demo endpoints and the app factory
//! - `models/` - request/response models, failure taxonomy, audit events
//! - `config/` - environment-driven configuration
//!
//! ## Quick Start
//!
//! ```no_run
//! use hmac_gate::{AppState, AuthConfig, ServerConfig, create_app};
//! use actix_web::HttpServer;
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let state = AppState::from_config(AuthConfig::from_env(), ServerConfig::from_env())
//!         .map_err(std::io::Error::other)?;
//!     state.start_background_tasks();
//!     let app_state = state.clone();
//!     HttpServer::new(move || create_app(&app_state))
//!         .bind("127.0.0.1:8080")?
//!         .run()
//!         .await?;
//!     state.shutdown();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

pub use config::{AuthConfig, LogFormat, ServerConfig};
pub use handlers::{body_schemas, create_app, create_openapi_spec};
pub use middleware::{
    AUTHENTICATION_HEADER, BodySchemaRegistry, HmacAuthentication, TIMESTAMP_HEADER,
};
pub use models::{AuthAuditEvent, AuthError, City, Contact, GateOutcome, Principal};
pub use services::{
    AuthMetrics, AuthenticationGate, CanonicalMessage, CanonicalMessageBuilder, Clock,
    CredentialProvider, InMemoryCredentialStore, InMemoryReplayCache, IncomingRequest,
    ManualClock, ParameterEntry, ReplayCache, ReplayGuard, RequestParameters, RequestSigner,
    SignableBody, SignatureEncoding, SignatureVerifier, SignedHeaders, SystemClock,
    TimestampValidator,
};
pub use state::AppState;
