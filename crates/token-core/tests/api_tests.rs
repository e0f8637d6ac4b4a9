//! HTTP endpoint tests

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use tower::ServiceExt;
use voice_token_core::api::{create_router, ApiState, ErrorBody};
use voice_token_core::{
    ConfigSource, Error, IssuerConfig, Result, SigningAlgorithm, StaticConfigSource,
    TokenVerifier,
};

fn config() -> IssuerConfig {
    IssuerConfig::new("AC1", "SK1", "secret", "AP1")
}

fn app(config: IssuerConfig) -> Router {
    create_router(ApiState::new(StaticConfigSource(config)))
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

/// Fails every load, like a deployment with no signing material configured.
struct BrokenSource;

impl ConfigSource for BrokenSource {
    fn load(&self) -> Result<IssuerConfig> {
        Err(Error::Configuration("Missing required setting VOICE_API_SECRET".to_string()))
    }
}

#[tokio::test]
async fn test_token_for_requested_identity() {
    let (status, headers, body) = get(app(config()), "/access-token?clientid=200").await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/plain"));

    let claims = TokenVerifier::from_config(&config()).unwrap().verify(&body).unwrap();
    assert_eq!(claims.sub, "200");
    assert_eq!(claims.voice_application(), Some("AP1"));
}

#[tokio::test]
async fn test_token_for_default_identity() {
    let config = config().with_default_identity("100");
    let (status, _, body) = get(app(config.clone()), "/access-token").await;

    assert_eq!(status, StatusCode::OK);
    let claims = TokenVerifier::from_config(&config).unwrap().verify(&body).unwrap();
    assert_eq!(claims.sub, "100");
}

#[tokio::test]
async fn test_empty_clientid_uses_default() {
    let config = config().with_default_identity("100");
    let (status, _, body) = get(app(config.clone()), "/access-token?clientid=").await;

    assert_eq!(status, StatusCode::OK);
    let claims = TokenVerifier::from_config(&config).unwrap().verify(&body).unwrap();
    assert_eq!(claims.sub, "100");
}

#[tokio::test]
async fn test_no_identity_returns_configuration_error() {
    let (status, _, body) = get(app(config()), "/access-token").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorBody = serde_json::from_str(&body).unwrap();
    assert_eq!(error.error, "configuration_error");
    assert!(error.message.contains("clientid"), "{}", error.message);
}

#[tokio::test]
async fn test_blank_clientid_without_default_is_rejected() {
    let (status, _, body) = get(app(config()), "/access-token?clientid=%20%20").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorBody = serde_json::from_str(&body).unwrap();
    assert_eq!(error.error, "configuration_error");
}

#[tokio::test]
async fn test_broken_configuration_returns_error_without_token() {
    let router = create_router(ApiState::new(BrokenSource));
    let (status, _, body) = get(router, "/access-token?clientid=200").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorBody = serde_json::from_str(&body).unwrap();
    assert_eq!(error.error, "configuration_error");
    assert!(!error.message.contains("VOICE_API_SECRET"), "{}", error.message);
    assert!(!body.contains("VOICE_API_SECRET"));
}

#[tokio::test]
async fn test_signing_failure_reported() {
    let config = config().with_algorithm(voice_token_core::SigningAlgorithm::RS256);
    let (status, _, body) = get(app(config), "/access-token?clientid=200").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorBody = serde_json::from_str(&body).unwrap();
    assert_eq!(error.error, "signing_error");
    assert!(!error.message.contains("secret"));
    assert!(!error.message.contains("RSA"), "{}", error.message);
}

#[tokio::test]
async fn test_rs256_token_over_http() {
    static PEM: OnceLock<String> = OnceLock::new();
    let pem = PEM.get_or_init(|| {
        let key = RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).unwrap();
        key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string()
    });
    let config = IssuerConfig::new("AC1", "SK1", pem.as_str(), "AP1")
        .with_algorithm(SigningAlgorithm::RS256);

    let (status, _, body) = get(app(config.clone()), "/access-token?clientid=200").await;

    assert_eq!(status, StatusCode::OK);
    let claims = TokenVerifier::from_config(&config)
        .unwrap()
        .verify_for_application(&body, "AP1")
        .unwrap();
    assert_eq!(claims.sub, "200");
}

#[tokio::test]
async fn test_credential_headers_present() {
    let (_, headers, _) = get(app(config()), "/access-token?clientid=200").await;

    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::REFERRER_POLICY], "no-referrer");
    assert_eq!(
        headers[header::CONTENT_SECURITY_POLICY],
        "default-src 'none'; frame-ancestors 'none'"
    );
}

#[tokio::test]
async fn test_credential_headers_on_errors() {
    let (status, headers, _) = get(app(config()), "/access-token").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    assert_eq!(headers[header::REFERRER_POLICY], "no-referrer");
}

#[tokio::test]
async fn test_health() {
    let (status, _, body) = get(app(config()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let router = app(config());
    let mut handles = Vec::new();
    for i in 0..16 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            let (status, _, body) = get(router, &format!("/access-token?clientid=user{}", i)).await;
            assert_eq!(status, StatusCode::OK);
            (i, body)
        }));
    }

    let verifier = TokenVerifier::from_config(&config()).unwrap();
    for handle in handles {
        let (i, token) = handle.await.unwrap();
        assert_eq!(verifier.verify(&token).unwrap().sub, format!("user{}", i));
    }
}
