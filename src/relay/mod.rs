//! Relay server — HTTP surface for the cursor channel.
//!
//! SYSTEM CONTEXT
//! ==============
//! One axum router exposes a single shared `Hub` over `/ws`, plus `/healthz`
//! for load balancers. The relay holds no persistent state: restarting it
//! drops every subscriber and clears presence.

pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::transport::Hub;

/// Build the relay router around `hub`.
pub fn app(hub: Hub) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(hub)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "relay_test.rs"]
mod tests;
