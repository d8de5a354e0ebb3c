//! HTTP surface of the update service
//!
//! One endpoint: `GET /dynamic_dns`. The client address comes from the
//! first `x-forwarded-for` entry when the header is present and non-empty,
//! else from the socket peer; the bearer token comes from `x-token`.
//! Every error in the core taxonomy maps to a structured JSON response.

use axum::Router;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use serde::Serialize;
use serde_json::json;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use dyndns_core::traits::RecordType;
use dyndns_core::{Authenticator, Error, ReconcileOutcome, Reconciler};

/// Shared handler state, constructed once at startup
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub reconciler: Arc<Reconciler>,
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/dynamic_dns", get(dynamic_dns))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Successful update responses
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum UpdateResponse {
    Unchanged { message: &'static str },
    Updated { record_type: RecordType, ip: String },
}

impl From<ReconcileOutcome> for UpdateResponse {
    fn from(outcome: ReconcileOutcome) -> Self {
        match outcome {
            ReconcileOutcome::Unchanged => UpdateResponse::Unchanged {
                message: "already up to date",
            },
            ReconcileOutcome::Updated { record_type, ip } => {
                UpdateResponse::Updated { record_type, ip }
            }
        }
    }
}

/// Core errors carried out of a handler
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid auth token"),
            Error::MissingToken => (StatusCode::BAD_REQUEST, "missing auth token"),
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid client address"),
            Error::ZoneNotFound(_) => (StatusCode::BAD_GATEWAY, "zone not found"),
            Error::ChangeSubmission(_) => (StatusCode::BAD_GATEWAY, "change submission failed"),
            Error::PropagationTimeout { .. } => {
                (StatusCode::GATEWAY_TIMEOUT, "propagation timed out")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
        };

        if status.is_server_error() {
            error!(error = %self.0, %status, "request failed");
        } else {
            debug!(error = %self.0, %status, "request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Handle a client update report
async fn dynamic_dns(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<UpdateResponse>, ApiError> {
    let token = headers
        .get("x-token")
        .and_then(|value| value.to_str().ok())
        .ok_or(Error::MissingToken)?;

    let addr = client_address(&headers, peer.ip())?;

    let credential = state.authenticator.authenticate(token).await?;
    let outcome = state.reconciler.reconcile(&credential, addr).await?;

    Ok(Json(outcome.into()))
}

/// Client address for a request
///
/// The first `x-forwarded-for` entry wins when the header is present and
/// non-empty; otherwise the socket peer address is used. A present but
/// unparseable entry is a request error, not a fallback case.
fn client_address(headers: &HeaderMap, peer: IpAddr) -> Result<IpAddr, Error> {
    let Some(value) = headers.get("x-forwarded-for") else {
        return Ok(peer);
    };

    let raw = value
        .to_str()
        .map_err(|_| Error::invalid_input("x-forwarded-for is not valid UTF-8"))?;
    if raw.trim().is_empty() {
        return Ok(peer);
    }

    let first = raw.split(',').next().unwrap_or(raw).trim();
    first
        .parse()
        .map_err(|_| Error::invalid_input(format!("'{first}' is not an IP address")))
}
