//! OpenAPI specification generation and app factory.

use crate::{
    handlers::{create_contact, get_metrics, health, list_cities, post_city},
    middleware::{BodySchemaRegistry, HmacAuthentication},
    models::Contact,
    state::AppState,
};
use actix_web::{App, http::Method};
use paperclip::actix::{OpenApiExt, web};
use paperclip::v2::models::{DefaultApiRaw, Info};

/// Creates the OpenAPI specification, including how to sign requests
pub fn create_openapi_spec() -> DefaultApiRaw {
    DefaultApiRaw {
        info: Info {
            title: "HMAC Gate".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            description: Some(
                "Signed API with replay protection.\n\n\
                ## Request signing\n\
                Every endpoint except health, metrics and this document requires two headers:\n\
                - `Timestamp`: UTC time as `yyyy-MM-dd HH:mm:ssZ`, within 5 minutes of server time\n\
                - `Authentication`: `username:signature`\n\
                \n\
                **Signature calculation:**\n\
                1. Collect parameters from the query string and form body. A JSON body is \
                used only when there are none, and only its declared non-null, non-identity fields.\n\
                2. URL-encode each value and sort entries by key (ordinal, stable).\n\
                3. Join as `key=value` pairs separated by `&`.\n\
                4. Message: `METHOD\\nTIMESTAMP\\nlowercased-decoded-path\\nPARAMETERS`\n\
                5. HMAC-SHA256 with the shared secret, Base64 encoded.\n\
                \n\
                A signature is accepted once. Any failure returns `401` with an empty body."
                    .into(),
            ),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// JSON bodies that take part in signing, per endpoint
pub fn body_schemas() -> BodySchemaRegistry {
    BodySchemaRegistry::new().register::<Contact>(Method::POST, "/api/contacts")
}

/// Creates the application with the authentication gate in front of every route.
///
/// Used by the binary and by integration tests.
pub fn create_app(
    state: &AppState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    let mut authentication = HmacAuthentication::new(state.gate.clone(), body_schemas())
        .with_bypass_paths(state.auth_config.bypass_paths.clone());
    if state.server_config.metrics_enabled {
        authentication = authentication.with_metrics(state.metrics.clone());
    }

    App::new()
        .wrap(authentication)
        .wrap_api_with_spec(create_openapi_spec())
        .app_data(web::Data::new(state.server_config.clone()))
        .app_data(web::Data::new(state.metrics.clone()))
        .app_data(state.cities.clone())
        .app_data(state.contacts.clone())
        .service(web::resource("/api/health").route(web::get().to(health)))
        .service(web::resource("/api/metrics").route(web::get().to(get_metrics)))
        .service(web::resource("/api/values/cities").route(web::get().to(list_cities)))
        .service(web::resource("/api/values/postcity").route(web::post().to(post_city)))
        .service(web::resource("/api/contacts").route(web::post().to(create_contact)))
        .with_json_spec_at("/api/spec/v2")
        .build()
}
