//! HTTP surface for token issuance
//!
//! `GET /access-token?clientid=<identity>` answers with the bare token string.
//! Failures return a JSON body `{"error": <kind>, "message": <text>}`.

pub mod headers;

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::{ConfigSource, ServerConfig};
use crate::{issuer, Error, Result};

pub use headers::credential_headers_middleware;

/// Shared state for request handlers
#[derive(Clone)]
pub struct ApiState {
    pub config_source: Arc<dyn ConfigSource>,
}

impl ApiState {
    pub fn new(config_source: impl ConfigSource + 'static) -> Self {
        Self {
            config_source: Arc::new(config_source),
        }
    }
}

/// Query parameters of the token endpoint
#[derive(Debug, Default, Deserialize)]
pub struct AccessTokenQuery {
    pub clientid: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Error returned by handlers
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidToken(_) | Error::TokenExpired | Error::GrantMismatch { .. } => {
                StatusCode::UNAUTHORIZED
            }
            Error::Configuration(_) | Error::Signing(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error!(kind = self.0.kind(), "Token request failed: {}", self.0);

        // Operator detail stays in the log; callers only learn the kind.
        let message = match &self.0 {
            Error::Configuration(msg) if msg == issuer::NO_IDENTITY => {
                "No identity available: pass `clientid` with the request".to_string()
            }
            Error::Configuration(_) => "Token service is not configured".to_string(),
            Error::Signing(_) => "Token could not be signed".to_string(),
            Error::Io(_) => "Internal error".to_string(),
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: self.0.kind().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Create the REST API router
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/access-token", get(access_token))
        .route("/health", get(health))
        .layer(middleware::from_fn(credential_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn access_token(
    State(state): State<ApiState>,
    Query(query): Query<AccessTokenQuery>,
) -> std::result::Result<String, ApiError> {
    let config = state.config_source.load()?;

    // Signing is CPU-bound (RSA especially); keep it off the async workers.
    let token = tokio::task::spawn_blocking(move || {
        issuer::issue(query.clientid.as_deref(), &config)
    })
    .await
    .map_err(|e| Error::Signing(format!("Issuance task failed: {}", e)))??;
    Ok(token)
}

async fn health() -> &'static str {
    "ok"
}

/// Serve the API until ctrl-c
pub async fn serve(config: ServerConfig, state: ApiState) -> Result<()> {
    let listener = TcpListener::bind(config.bind_address).await?;
    info!("Token API listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Token API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
