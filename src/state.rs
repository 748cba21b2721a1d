//! Shared application state.
//!
//! Everything here is created once at startup and cloned into each Actix
//! worker. The replay cache belongs to the gate; its background sweeper is
//! started with [`AppState::start_background_tasks`] and stopped by
//! [`AppState::shutdown`].

use crate::{
    config::{AuthConfig, ServerConfig},
    handlers::{ContactBook, CityDirectory},
    services::{
        AuthMetrics, AuthenticationGate, Clock, CredentialProvider, InMemoryCredentialStore,
        SystemClock,
    },
};
use actix_web::web;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub auth_config: AuthConfig,
    pub server_config: ServerConfig,
    pub gate: Arc<AuthenticationGate>,
    pub metrics: AuthMetrics,
    pub cities: web::Data<CityDirectory>,
    pub contacts: web::Data<ContactBook>,
    sweeper: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AppState {
    pub fn new(
        auth_config: AuthConfig,
        server_config: ServerConfig,
        credentials: Arc<dyn CredentialProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, prometheus::Error> {
        let gate = Arc::new(AuthenticationGate::from_config(
            &auth_config,
            clock,
            credentials,
        ));

        Ok(Self {
            auth_config,
            server_config,
            gate,
            metrics: AuthMetrics::new()?,
            cities: web::Data::new(CityDirectory::new()),
            contacts: web::Data::new(ContactBook::new()),
            sweeper: Arc::new(Mutex::new(None)),
        })
    }

    /// State wired from configuration: in-memory credentials and the system clock.
    pub fn from_config(
        auth_config: AuthConfig,
        server_config: ServerConfig,
    ) -> Result<Self, prometheus::Error> {
        let credentials: InMemoryCredentialStore =
            auth_config.credentials.iter().cloned().collect();
        if credentials.is_empty() {
            tracing::warn!("no credentials configured; every signed request will be denied");
        }

        Self::new(
            auth_config,
            server_config,
            Arc::new(credentials),
            Arc::new(SystemClock),
        )
    }

    /// Start the replay-cache sweeper. Must run inside a Tokio runtime.
    pub fn start_background_tasks(&self) {
        let handle = self
            .gate
            .replay_guard()
            .start_sweeper(self.auth_config.replay_sweep_interval());

        let mut sweeper = match self.sweeper.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = sweeper.replace(handle) {
            previous.abort();
        }
        info!(
            interval_seconds = self.auth_config.replay_sweep_interval_seconds,
            "replay cache sweeper started"
        );
    }

    /// Stop background tasks.
    pub fn shutdown(&self) {
        let mut sweeper = match self.sweeper.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = sweeper.take() {
            handle.abort();
            info!("replay cache sweeper stopped");
        }
    }
}
