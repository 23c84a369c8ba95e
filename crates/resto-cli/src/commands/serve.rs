use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use resto_core::cache::{CacheWorker, HttpAssetFetcher, Intercepted};
use serde::Serialize;
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::commands::common::Session;
use crate::error::CliError;

pub const SERVED_FROM_HEADER: &str = "x-served-from";

type SharedWorker = Arc<CacheWorker<HttpAssetFetcher>>;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Asset unavailable offline: {0}")]
    Offline(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl From<resto_core::Error> for ServeError {
    fn from(error: resto_core::Error) -> Self {
        match error {
            resto_core::Error::Transport(transport) if transport.is_offline() => {
                Self::Offline(transport.to_string())
            }
            resto_core::Error::Transport(transport) => Self::Upstream(transport.to_string()),
            resto_core::Error::Config(message) => Self::BadRequest(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Offline(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(worker: SharedWorker) -> Router {
    Router::new()
        .fallback(intercept)
        .with_state(worker)
        .layer(TraceLayer::new_for_http())
}

/// Origin-form requests resolve against the app origin; absolute-form
/// (proxy) requests keep their own origin.
async fn intercept(
    State(worker): State<SharedWorker>,
    uri: Uri,
) -> Result<Response, ServeError> {
    let intercepted = worker.intercept(&uri.to_string()).await?;
    Ok(asset_response(intercepted))
}

pub fn asset_response(intercepted: Intercepted) -> Response {
    let Intercepted {
        response: asset,
        served_from,
    } = intercepted;
    let status = StatusCode::from_u16(asset.status).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut response = (status, asset.body).into_response();
    let headers = response.headers_mut();
    if let Some(content_type) = asset
        .content_type
        .as_deref()
        .and_then(|value| HeaderValue::from_str(value).ok())
    {
        headers.insert(CONTENT_TYPE, content_type);
    }
    headers.insert(
        SERVED_FROM_HEADER,
        HeaderValue::from_static(served_from.label()),
    );
    response
}

pub async fn run_serve(bind: &str, session: &Session) -> Result<(), CliError> {
    let addr = bind
        .parse::<SocketAddr>()
        .map_err(|_| CliError::InvalidBind(bind.to_string()))?;
    let worker = session.cache_worker()?;

    if !worker.storage().has(&worker.config().static_cache).await? {
        match worker.install().await {
            Ok(report) => tracing::info!("Precached {} asset(s)", report.assets),
            Err(error) => tracing::warn!("Precaching failed, serving from network: {error}"),
        }
    }
    worker.activate().await?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        "resto serving {} on http://{addr}",
        session.config.app_origin
    );
    axum::serve(listener, router(Arc::new(worker))).await?;
    Ok(())
}
