// src/server/http.rs

//! The HTTP facade: routes requests to the relay core and maps its errors to
//! stable JSON responses.

use crate::core::dispatcher;
use crate::core::inventory;
use crate::core::metrics::gather_metrics;
use crate::core::state::RelayState;
use crate::core::{ErrorKind, RelayError};
use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Builds the relay's router over the given state.
pub fn router(state: Arc<RelayState>) -> Router {
    let mut router = Router::new()
        .route("/", get(status))
        .route("/sendCommand", get(send_command))
        .route("/post-inventory", get(post_inventory).post(post_inventory))
        .route("/get-inventory", get(get_inventory));

    if state.config.metrics.enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router
        .layer(middleware::map_response(allow_any_origin))
        .with_state(state)
}

/// Serves `router` on `listener` until a shutdown signal arrives.
pub async fn serve(
    listener: TcpListener,
    state: Arc<RelayState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let app = router(state);
    if let Ok(addr) = listener.local_addr() {
        info!("rconnect HTTP server listening on http://{}", addr);
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_rx.recv().await.ok();
            info!("HTTP server shutting down.");
        })
        .await?;
    Ok(())
}

async fn allow_any_origin(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct StatusBody {
    pub server: bool,
    pub connected: bool,
}

async fn status(State(state): State<Arc<RelayState>>) -> Json<StatusBody> {
    Json(StatusBody {
        server: true,
        connected: state.session.is_connected(),
    })
}

#[derive(Deserialize, Debug)]
struct CommandQuery {
    command: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CommandOutput {
    pub command: String,
    pub output: String,
}

async fn send_command(
    State(state): State<Arc<RelayState>>,
    Query(query): Query<CommandQuery>,
) -> Result<Json<CommandOutput>, ApiError> {
    let raw = query.command.unwrap_or_default();
    let command = dispatcher::normalize(&raw).ok_or(RelayError::EmptyCommand)?;
    let packet = state.dispatcher.dispatch(command).await?;
    Ok(Json(CommandOutput {
        command: command.to_string(),
        output: packet.body_text(),
    }))
}

#[derive(Deserialize, Debug)]
struct InventoryPostQuery {
    inv: Option<String>,
}

async fn post_inventory(
    State(state): State<Arc<RelayState>>,
    Query(query): Query<InventoryPostQuery>,
) -> Result<String, ApiError> {
    let raw = query.inv.ok_or(RelayError::MissingField("inv"))?;
    let items = inventory::parse_payload(&raw, state.config.inventory.max_payload_bytes)?;
    let id = state.inventory.append(items);
    debug!("Stored inventory {}", id);
    Ok(id.to_string())
}

#[derive(Deserialize, Debug)]
struct InventoryGetQuery {
    id: Option<String>,
}

async fn get_inventory(
    State(state): State<Arc<RelayState>>,
    Query(query): Query<InventoryGetQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    let raw = query.id.ok_or(RelayError::MissingField("id"))?;
    let id = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| RelayError::InvalidField {
            field: "id",
            reason: "must be a non-negative integer".to_string(),
        })?;
    let items = state
        .inventory
        .get(id)
        .ok_or(RelayError::NotFound("Inventory"))?;
    Ok(Json(items.as_ref().clone()))
}

async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}

/// The JSON body of every error response.
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

/// Wraps a `RelayError` at the request boundary. Only fixed messages and the
/// error kind are exposed; socket errors and other internals are not.
#[derive(Debug)]
pub struct ApiError(pub RelayError);

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let (status, message) = match (&self.0, kind) {
            (RelayError::EmptyCommand, _) => (StatusCode::BAD_REQUEST, "Missing command".to_string()),
            (_, ErrorKind::Validation) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            (_, ErrorKind::MalformedPayload) => (
                StatusCode::BAD_REQUEST,
                "Malformed inventory payload".to_string(),
            ),
            (_, ErrorKind::NotFound) => (StatusCode::NOT_FOUND, self.0.to_string()),
            (_, ErrorKind::Dispatch) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "RCON command failed".to_string(),
            ),
            (_, ErrorKind::Config | ErrorKind::Connection | ErrorKind::Internal) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };
        let body = ErrorBody {
            error: message,
            kind: kind.as_str().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
