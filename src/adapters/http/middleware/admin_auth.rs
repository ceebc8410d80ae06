//! Admin token middleware for axum.
//!
//! When an admin token is configured, requests must carry it in the
//! `X-Admin-Token` header. Without a configured token the routes are open.
//!
//! ```ignore
//! let admin = Router::new()
//!     .route("/subscribers", get(list_subscribers))
//!     .layer(middleware::from_fn_with_state(token, admin_auth_middleware));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Middleware state: the configured token, if any.
pub type AdminAuthState = Option<Arc<str>>;

/// Rejects admin requests whose token does not match the configured one.
pub async fn admin_auth_middleware(
    State(expected): State<AdminAuthState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = expected else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if tokens_match(expected.as_bytes(), provided.as_bytes()) {
        next.run(request).await
    } else {
        tracing::warn!(path = %request.uri().path(), "Rejected admin request");
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "Admin token required",
                "code": "UNAUTHORIZED"
            })),
        )
            .into_response()
    }
}

fn tokens_match(expected: &[u8], provided: &[u8]) -> bool {
    expected.len() == provided.len() && bool::from(expected.ct_eq(provided))
}
