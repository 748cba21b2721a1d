//! Core request-authentication pipeline.
//!
//! Leaf components first: clock, timestamp freshness, canonical message,
//! signature, replay cache, credential lookup. [`gate`] ties them together.

pub mod canonical;
pub mod clock;
pub mod credentials;
pub mod gate;
pub mod metrics;
pub mod replay;
pub mod signature;
pub mod signer;
pub mod timestamp;

pub use canonical::{
    CanonicalMessage, CanonicalMessageBuilder, IncomingRequest, ParameterEntry,
    RequestParameters, SignableBody,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::{CredentialError, CredentialProvider, InMemoryCredentialStore};
pub use gate::{AuthenticationGate, parse_authentication_header};
pub use metrics::AuthMetrics;
pub use replay::{InMemoryReplayCache, ReplayCache, ReplayGuard};
pub use signature::{SignatureEncoding, SignatureError, SignatureVerifier, compute_signature};
pub use signer::{RequestSigner, SignedHeaders};
pub use timestamp::{TIMESTAMP_FORMAT, TimestampValidator, format_timestamp, parse_timestamp};
