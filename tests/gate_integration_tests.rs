use actix_web::{body::MessageBody, dev::ServiceResponse, http::StatusCode, test};
use chrono::{Duration, Utc};
use hmac_gate::{
    AppState, AuthConfig, City, Contact, InMemoryCredentialStore, RequestParameters,
    RequestSigner, ServerConfig, SignableBody, SignatureEncoding, SignedHeaders, SystemClock,
    create_app, models::CityResponse, models::ContactResponse, services::format_timestamp,
};
use std::sync::Arc;

const POST_CITY: &str = "/api/values/postcity";

fn state_with(auth_config: AuthConfig) -> AppState {
    AppState::new(
        auth_config,
        ServerConfig::default(),
        Arc::new(InMemoryCredentialStore::new().with_credential("alice", "s3cr3t")),
        Arc::new(SystemClock),
    )
    .expect("Failed to create app state")
}

fn state() -> AppState {
    state_with(AuthConfig::default())
}

fn wenshan() -> City {
    City {
        icao_code: "ZPWS".to_string(),
        city_short_name: "文山".to_string(),
    }
}

fn city_parameters(city: &City) -> RequestParameters {
    RequestParameters {
        form: vec![
            ("IcaoCode".to_string(), city.icao_code.clone()),
            ("CityShortName".to_string(), city.city_short_name.clone()),
        ],
        ..Default::default()
    }
}

fn post_city(headers: &SignedHeaders, city: &City) -> test::TestRequest {
    test::TestRequest::post()
        .uri(POST_CITY)
        .insert_header(("Timestamp", headers.timestamp.clone()))
        .insert_header(("Authentication", headers.authentication.clone()))
        .set_form(city)
}

fn alice() -> RequestSigner {
    RequestSigner::new("alice", "s3cr3t")
}

/// Denials must look identical: status, headers and an empty body
async fn assert_bare_unauthorized(resp: ServiceResponse) {
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(
        resp.headers().get("content-type").is_none(),
        "Denial should not carry a content type"
    );
    let body = test::read_body(resp).await;
    assert!(body.is_empty(), "Denial body should be empty, got {body:?}");
}

#[actix_web::test]
async fn test_signed_form_post_admitted_then_replay_denied() {
    let app = test::init_service(create_app(&state())).await;
    let city = wenshan();
    let headers = alice()
        .sign_now("POST", POST_CITY, &city_parameters(&city))
        .unwrap();

    let resp = test::call_service(&app, post_city(&headers, &city).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK, "First submission should be admitted");
    let json: CityResponse = test::read_body_json(resp).await;
    assert_eq!(json.principal, "alice");
    assert_eq!(json.cities, vec![city.clone()]);

    let resp = test::call_service(&app, post_city(&headers, &city).to_request()).await;
    assert_bare_unauthorized(resp).await;
}

#[actix_web::test]
async fn test_form_field_order_does_not_matter() {
    let app = test::init_service(create_app(&state())).await;
    let city = wenshan();
    let mut parameters = city_parameters(&city);
    parameters.form.reverse();
    let headers = alice().sign_now("POST", POST_CITY, &parameters).unwrap();

    let resp = test::call_service(&app, post_city(&headers, &city).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_path_case_does_not_matter() {
    let app = test::init_service(create_app(&state())).await;
    let city = wenshan();
    // signed over the lowercased path, sent with the original casing
    let headers = alice()
        .sign_now("POST", "/api/Values/PostCity", &city_parameters(&city))
        .unwrap();

    let resp = test::call_service(&app, post_city(&headers, &city).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_tampered_form_denied() {
    let app = test::init_service(create_app(&state())).await;
    let city = wenshan();
    let headers = alice()
        .sign_now("POST", POST_CITY, &city_parameters(&city))
        .unwrap();

    let forged = City {
        icao_code: "ZUUU".to_string(),
        ..city
    };
    let resp = test::call_service(&app, post_city(&headers, &forged).to_request()).await;
    assert_bare_unauthorized(resp).await;
}

#[actix_web::test]
async fn test_signed_query_admitted() {
    let app = test::init_service(create_app(&state())).await;
    let parameters = RequestParameters {
        query: vec![("IcaoCode".to_string(), "ZPWS".to_string())],
        ..Default::default()
    };
    let headers = alice()
        .sign_now("GET", "/api/values/cities", &parameters)
        .unwrap();

    let req = test::TestRequest::get()
        .uri("/api/values/cities?IcaoCode=ZPWS")
        .insert_header(("Timestamp", headers.timestamp.clone()))
        .insert_header(("Authentication", headers.authentication.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json: CityResponse = test::read_body_json(resp).await;
    assert!(json.accepted);
    assert_eq!(json.principal, "alice");
}

#[actix_web::test]
async fn test_signed_json_body_admitted_without_identity_field() {
    let app = test::init_service(create_app(&state())).await;
    let contact: Contact = serde_json::from_value(serde_json::json!({
        "ContactID": 41,
        "FirstName": "Ada",
        "LastName": "Lovelace",
        "EmailAddress": "ada@example.com"
    }))
    .unwrap();

    // ContactID is not part of the signed message
    let unsigned_id = Contact {
        contact_id: None,
        ..contact.clone()
    };
    let parameters = RequestParameters {
        body: unsigned_id.signable_fields(),
        ..Default::default()
    };
    let headers = alice().sign_now("POST", "/api/contacts", &parameters).unwrap();

    let req = test::TestRequest::post()
        .uri("/api/contacts")
        .insert_header(("Timestamp", headers.timestamp.clone()))
        .insert_header(("Authentication", headers.authentication.clone()))
        .set_json(&contact)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json: ContactResponse = test::read_body_json(resp).await;
    assert_eq!(json.contact.first_name, "Ada");
    assert_eq!(json.contact.contact_id, Some(1));
    assert_eq!(json.principal, "alice");
}

#[actix_web::test]
async fn test_tampered_json_body_denied() {
    let app = test::init_service(create_app(&state())).await;
    let contact: Contact = serde_json::from_value(serde_json::json!({
        "FirstName": "Ada",
        "LastName": "Lovelace"
    }))
    .unwrap();
    let parameters = RequestParameters {
        body: contact.signable_fields(),
        ..Default::default()
    };
    let headers = alice().sign_now("POST", "/api/contacts", &parameters).unwrap();

    let forged = Contact {
        last_name: "Byron".to_string(),
        ..contact
    };
    let req = test::TestRequest::post()
        .uri("/api/contacts")
        .insert_header(("Timestamp", headers.timestamp.clone()))
        .insert_header(("Authentication", headers.authentication.clone()))
        .set_json(&forged)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_bare_unauthorized(resp).await;
}

#[actix_web::test]
async fn test_timestamps_outside_window_denied() {
    let app = test::init_service(create_app(&state())).await;
    let city = wenshan();

    for offset in [Duration::minutes(-6), Duration::minutes(6)] {
        let timestamp = format_timestamp(Utc::now() + offset);
        let headers = alice()
            .sign("POST", POST_CITY, &timestamp, &city_parameters(&city))
            .unwrap();
        let resp = test::call_service(&app, post_city(&headers, &city).to_request()).await;
        assert_bare_unauthorized(resp).await;
    }
}

#[actix_web::test]
async fn test_malformed_timestamp_denied() {
    let app = test::init_service(create_app(&state())).await;
    let city = wenshan();
    let headers = alice()
        .sign("POST", POST_CITY, "2024-01-01T12:00:00Z", &city_parameters(&city))
        .unwrap();
    let resp = test::call_service(&app, post_city(&headers, &city).to_request()).await;
    assert_bare_unauthorized(resp).await;
}

#[actix_web::test]
async fn test_missing_headers_denied() {
    let app = test::init_service(create_app(&state())).await;
    let req = test::TestRequest::get().uri("/api/values/cities").to_request();
    let resp = test::call_service(&app, req).await;
    assert_bare_unauthorized(resp).await;
}

#[actix_web::test]
async fn test_malformed_authentication_header_denied() {
    let app = test::init_service(create_app(&state())).await;
    let city = wenshan();
    let headers = alice()
        .sign_now("POST", POST_CITY, &city_parameters(&city))
        .unwrap();

    for authentication in [
        headers.signature.clone(),
        format!("alice:{}:extra", headers.signature),
        format!(":{}", headers.signature),
    ] {
        let malformed = SignedHeaders {
            authentication,
            ..headers.clone()
        };
        let resp = test::call_service(&app, post_city(&malformed, &city).to_request()).await;
        assert_bare_unauthorized(resp).await;
    }

    // the malformed attempts did not burn the signature
    let resp = test::call_service(&app, post_city(&headers, &city).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_repeated_timestamp_header_denied() {
    let app = test::init_service(create_app(&state())).await;
    let city = wenshan();
    let headers = alice()
        .sign_now("POST", POST_CITY, &city_parameters(&city))
        .unwrap();

    let req = post_city(&headers, &city)
        .append_header(("Timestamp", headers.timestamp.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_bare_unauthorized(resp).await;
}

#[actix_web::test]
async fn test_unknown_user_and_wrong_secret_look_identical() {
    let app = test::init_service(create_app(&state())).await;
    let city = wenshan();

    let unknown = RequestSigner::new("mallory", "s3cr3t")
        .sign_now("POST", POST_CITY, &city_parameters(&city))
        .unwrap();
    let wrong = RequestSigner::new("alice", "guess")
        .sign_now("POST", POST_CITY, &city_parameters(&city))
        .unwrap();

    let unknown_resp = test::call_service(&app, post_city(&unknown, &city).to_request()).await;
    let wrong_resp = test::call_service(&app, post_city(&wrong, &city).to_request()).await;

    assert_eq!(unknown_resp.status(), wrong_resp.status());
    assert_eq!(unknown_resp.headers().len(), wrong_resp.headers().len());
    let unknown_body = unknown_resp.into_body().try_into_bytes().unwrap();
    let wrong_body = wrong_resp.into_body().try_into_bytes().unwrap();
    assert_eq!(unknown_body, wrong_body);
    assert!(unknown_body.is_empty());
}

#[actix_web::test]
async fn test_hex_encoded_signatures() {
    let config = AuthConfig {
        signature_encoding: SignatureEncoding::Hex,
        ..AuthConfig::default()
    };
    let app = test::init_service(create_app(&state_with(config))).await;
    let city = wenshan();

    let base64 = alice()
        .sign_now("POST", POST_CITY, &city_parameters(&city))
        .unwrap();
    let resp = test::call_service(&app, post_city(&base64, &city).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let hex = alice()
        .with_encoding(SignatureEncoding::Hex)
        .sign_now("POST", POST_CITY, &city_parameters(&city))
        .unwrap();
    let resp = test::call_service(&app, post_city(&hex, &city).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_bypass_paths_need_no_signature() {
    let app = test::init_service(create_app(&state())).await;

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json, serde_json::json!({ "status": "healthy" }));

    let req = test::TestRequest::get().uri("/api/spec/v2").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_metrics_count_decisions() {
    let app = test::init_service(create_app(&state())).await;
    let city = wenshan();
    let headers = alice()
        .sign_now("POST", POST_CITY, &city_parameters(&city))
        .unwrap();

    test::call_service(&app, post_city(&headers, &city).to_request()).await;
    test::call_service(&app, post_city(&headers, &city).to_request()).await;

    let req = test::TestRequest::get().uri("/api/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let body_str = std::str::from_utf8(&body).unwrap();
    assert!(body_str.contains(r#"auth_decisions_total{outcome="admitted",reason="none"} 1"#));
    assert!(body_str.contains(
        r#"auth_decisions_total{outcome="denied",reason="replayed_signature"} 1"#
    ));
    assert!(body_str.contains("replay_cache_entries 1"));
}
