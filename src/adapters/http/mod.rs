//! HTTP adapters - REST API implementations.
//!
//! - `billing` - checkout, Stripe webhook and admin endpoints
//! - `health` - liveness probe
//! - `middleware` - admin token guard

pub mod billing;
pub mod health;
pub mod middleware;

use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub use billing::{billing_router, BillingAppState};
pub use health::health_routes;
pub use middleware::AdminAuthState;

/// Builds the full application router mounted under `/api`.
///
/// Layers, outermost first: request timeout, CORS, request tracing.
pub fn app_router(state: BillingAppState, server: &ServerConfig) -> Router {
    let admin_token: AdminAuthState = server.admin_token().map(Arc::from);

    let api = billing_router(admin_token).merge(health_routes());

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&server.cors_origins_list()))
        .layer(TimeoutLayer::new(server.request_timeout()))
}

/// CORS for the landing page. No configured origins allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-admin-token"),
        ]);

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(parsed))
    }
}
