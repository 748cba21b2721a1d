//! HMAC authentication middleware.
//!
//! Runs the [`AuthenticationGate`] before any handler. A denied request gets
//! an empty `401`; an admitted one reaches the handler unchanged, with its
//! [`Principal`] in the request extensions.

use crate::{
    middleware::body_schema::BodySchemaRegistry,
    models::{AuthAuditEvent, Principal},
    services::{
        AuthMetrics,
        canonical::{IncomingRequest, RequestParameters, parse_pairs},
        gate::AuthenticationGate,
    },
    utils::http::{extract_client_ip, extract_user_agent, single_header},
};
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::{BoxBody, MessageBody},
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web::Bytes,
};
use std::{
    future::{Ready, ready},
    pin::Pin,
    rc::Rc,
    sync::Arc,
    time::Instant,
};
use uuid::Uuid;

pub const TIMESTAMP_HEADER: &str = "Timestamp";
pub const AUTHENTICATION_HEADER: &str = "Authentication";
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Middleware factory
#[derive(Clone)]
pub struct HmacAuthentication {
    gate: Arc<AuthenticationGate>,
    schemas: Arc<BodySchemaRegistry>,
    bypass_paths: Arc<Vec<String>>,
    metrics: Option<AuthMetrics>,
}

impl HmacAuthentication {
    pub fn new(gate: Arc<AuthenticationGate>, schemas: BodySchemaRegistry) -> Self {
        Self {
            gate,
            schemas: Arc::new(schemas),
            bypass_paths: Arc::new(Vec::new()),
            metrics: None,
        }
    }

    /// Paths served without authentication (exact match)
    pub fn with_bypass_paths(mut self, paths: Vec<String>) -> Self {
        self.bypass_paths = Arc::new(paths);
        self
    }

    pub fn with_metrics(mut self, metrics: AuthMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacAuthentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = HmacAuthenticationService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacAuthenticationService {
            service: Rc::new(service),
            config: self.clone(),
        }))
    }
}

pub struct HmacAuthenticationService<S> {
    service: Rc<S>,
    config: HmacAuthentication,
}

impl<S, B> Service<ServiceRequest> for HmacAuthenticationService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let config = self.config.clone();

        Box::pin(async move {
            if config.bypass_paths.iter().any(|p| p == req.path()) {
                return service.call(req).await.map(ServiceResponse::map_into_boxed_body);
            }

            let started = Instant::now();
            let body = req.extract::<Bytes>().await?;
            let incoming = incoming_request(&req, &body, &config.schemas);

            let result = config.gate.authenticate(&incoming).await;

            let request_id = single_header(req.headers(), REQUEST_ID_HEADER)
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let username = incoming
                .authentication
                .as_deref()
                .and_then(|v| v.split_once(':'))
                .map(|(user, _)| user.to_string());
            let ip_address = extract_client_ip(req.request());
            let user_agent = extract_user_agent(req.request());
            let method = incoming.method.clone();
            let endpoint = incoming.path.clone();

            if let Some(metrics) = &config.metrics {
                metrics.record_decision(result.as_ref().map(|_| ()).map_err(|e| *e), started.elapsed());
                metrics.set_replay_cache_entries(config.gate.replay_guard().len());
            }

            match result {
                Ok(principal) => {
                    AuthAuditEvent::admitted(ip_address, method, endpoint)
                        .with_username(username)
                        .with_user_agent(user_agent)
                        .with_request_id(Some(request_id))
                        .log();

                    req.extensions_mut().insert::<Principal>(principal);
                    req.set_payload(Payload::from(body));
                    service.call(req).await.map(ServiceResponse::map_into_boxed_body)
                }
                Err(error) => {
                    AuthAuditEvent::denied(error, ip_address, method, endpoint)
                        .with_username(username)
                        .with_user_agent(user_agent)
                        .with_request_id(Some(request_id))
                        .log();

                    Ok(req.into_response(error.error_response()))
                }
            }
        })
    }
}

/// Gather what the gate needs from the request.
///
/// Form pairs come from `application/x-www-form-urlencoded` bodies. A JSON
/// body is decoded through its declared schema, and only when there are no
/// query or form pairs.
fn incoming_request(
    req: &ServiceRequest,
    body: &Bytes,
    schemas: &BodySchemaRegistry,
) -> IncomingRequest {
    let content_type = req.content_type().to_ascii_lowercase();
    let query = parse_pairs(req.query_string());

    let form = if content_type == FORM_CONTENT_TYPE {
        parse_pairs(&String::from_utf8_lossy(body))
    } else {
        Vec::new()
    };

    let body_entries = if query.is_empty()
        && form.is_empty()
        && !body.is_empty()
        && content_type == JSON_CONTENT_TYPE
    {
        match schemas.decode(req.method(), req.path(), body) {
            Some(Ok(entries)) => entries,
            Some(Err(e)) => {
                tracing::debug!(error = %e, path = %req.path(), "body not signable");
                Vec::new()
            }
            None => {
                tracing::debug!(path = %req.path(), "no body schema declared, JSON body not signed");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    IncomingRequest {
        method: req.method().as_str().to_string(),
        timestamp: single_header(req.headers(), TIMESTAMP_HEADER),
        authentication: single_header(req.headers(), AUTHENTICATION_HEADER),
        path: req.path().to_string(),
        parameters: RequestParameters {
            query,
            form,
            body: body_entries,
        },
    }
}
