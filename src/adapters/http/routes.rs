use axum::{
    http::{Request, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::Level;

use crate::adapters::websocket::{websocket_router, WebSocketState};

/// Body of `GET /`.
pub const WELCOME_MESSAGE: &str = "Welcome to the API";

/// `GET /` - liveness/welcome probe.
pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

/// Build the full application router with request tracing.
pub fn app_router(state: WebSocketState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .merge(websocket_router())
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().path().to_string();
                    tracing::span!(Level::INFO, "http", %method, %uri)
                })
                .on_response(
                    |res: &Response<_>, latency: std::time::Duration, _span: &tracing::Span| {
                        tracing::debug!(
                            status = %res.status(),
                            elapsed_ms = latency.as_millis() as u64,
                            "response"
                        );
                    },
                ),
        )
}
