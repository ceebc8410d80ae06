//! Axum router configuration for billing endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::adapters::http::middleware::{admin_auth_middleware, AdminAuthState};

use super::handlers::{
    create_checkout_session, handle_stripe_webhook, list_subscribers, subscription_history,
    webhook_failures, BillingAppState,
};

/// Create the public billing routes.
///
/// # Routes
/// - `POST /create-checkout-session` - Start a Stripe checkout
/// - `POST /webhook` - Stripe webhooks (no auth, signature verified)
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/webhook", post(handle_stripe_webhook))
}

/// Create the admin routes, guarded by the optional admin token.
///
/// # Routes
/// - `GET /subscribers` - Active subscribers and plan breakdown
/// - `GET /subscription/:user_id` - Subscription history for one user
/// - `GET /webhook-failures` - Failed or redelivered webhook events
pub fn admin_routes(admin_token: AdminAuthState) -> Router<BillingAppState> {
    Router::new()
        .route("/subscribers", get(list_subscribers))
        .route("/subscription/:user_id", get(subscription_history))
        .route("/webhook-failures", get(webhook_failures))
        .layer(middleware::from_fn_with_state(
            admin_token,
            admin_auth_middleware,
        ))
}

/// Create the complete billing router, suitable for mounting at `/api`.
pub fn billing_router(admin_token: AdminAuthState) -> Router<BillingAppState> {
    Router::new()
        .merge(billing_routes())
        .nest("/admin", admin_routes(admin_token))
}
