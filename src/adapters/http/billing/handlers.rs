//! HTTP handlers for billing endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::body::Bytes;

use crate::application::handlers::billing::{
    CreateCheckoutSessionCommand, CreateCheckoutSessionHandler, GetSubscriptionHistoryHandler,
    GetSubscriptionHistoryQuery, HandleStripeWebhookCommand, HandleStripeWebhookHandler,
    ListActiveSubscribersHandler, ListActiveSubscribersQuery, ListWebhookFailuresHandler,
    ListWebhookFailuresQuery,
};
use crate::domain::billing::{BillingError, PlanCatalog};
use crate::ports::{
    NotificationSender, PaymentGateway, SubscriptionRecordRepository, UserRepository,
    WebhookEventLog,
};

use super::dto::{
    CheckoutSessionResponse, CreateCheckoutSessionRequest, ErrorResponse, SubscribersResponse,
    SubscriptionHistoryResponse, UserResponse, WebhookAckResponse, WebhookEventEntryResponse,
    WebhookFailuresParams, WebhookFailuresResponse,
};

pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned for each request; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct BillingAppState {
    pub catalog: Arc<PlanCatalog>,
    pub users: Arc<dyn UserRepository>,
    pub records: Arc<dyn SubscriptionRecordRepository>,
    pub payment_gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn NotificationSender>,
    pub event_log: Arc<dyn WebhookEventLog>,
    pub frontend_url: String,
}

impl BillingAppState {
    /// Create handlers on demand from the shared state.
    pub fn checkout_handler(&self) -> CreateCheckoutSessionHandler {
        CreateCheckoutSessionHandler::new(
            self.catalog.clone(),
            self.users.clone(),
            self.payment_gateway.clone(),
            self.frontend_url.clone(),
        )
    }

    pub fn webhook_handler(&self) -> HandleStripeWebhookHandler {
        HandleStripeWebhookHandler::new(
            self.catalog.clone(),
            self.users.clone(),
            self.records.clone(),
            self.payment_gateway.clone(),
            self.notifier.clone(),
            self.event_log.clone(),
        )
    }

    pub fn subscribers_handler(&self) -> ListActiveSubscribersHandler {
        ListActiveSubscribersHandler::new(self.users.clone())
    }

    pub fn history_handler(&self) -> GetSubscriptionHistoryHandler {
        GetSubscriptionHistoryHandler::new(self.users.clone(), self.records.clone())
    }

    pub fn webhook_failures_handler(&self) -> ListWebhookFailuresHandler {
        ListWebhookFailuresHandler::new(self.event_log.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/create-checkout-session - Start a Stripe checkout for a plan
pub async fn create_checkout_session(
    State(state): State<BillingAppState>,
    body: Result<Json<CreateCheckoutSessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BillingApiError> {
    let Json(request) =
        body.map_err(|e| BillingError::validation("body", e.body_text()))?;

    let cmd = CreateCheckoutSessionCommand {
        plan: request.plan,
        email: request.email,
        telegram_username: request.telegram_username,
        telegram_chat_id: request.telegram_chat_id,
    };

    let result = state.checkout_handler().handle(cmd).await?;

    Ok(Json(CheckoutSessionResponse {
        session_id: result.session_id,
    }))
}

/// POST /api/webhook - Handle Stripe webhook events
///
/// The raw body is verified byte-for-byte, so it must not pass through a
/// JSON extractor first.
pub async fn handle_stripe_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, BillingApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let cmd = HandleStripeWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    state.webhook_handler().handle(cmd).await?;

    Ok(Json(WebhookAckResponse { received: true }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/admin/subscribers - Active subscribers with plan breakdown
pub async fn list_subscribers(
    State(state): State<BillingAppState>,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state
        .subscribers_handler()
        .handle(ListActiveSubscribersQuery)
        .await?;

    Ok(Json(SubscribersResponse {
        users: result.users.into_iter().map(UserResponse::from).collect(),
        stats: result.stats,
    }))
}

/// GET /api/admin/subscription/:user_id - One user's subscription history
pub async fn subscription_history(
    State(state): State<BillingAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state
        .history_handler()
        .handle(GetSubscriptionHistoryQuery { user_id })
        .await?;

    Ok(Json(SubscriptionHistoryResponse {
        user: result.user.into(),
        subscriptions: result.subscriptions.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/admin/webhook-failures?limit=N - Failed or redelivered webhook events
pub async fn webhook_failures(
    State(state): State<BillingAppState>,
    params: Result<Query<WebhookFailuresParams>, QueryRejection>,
) -> Result<impl IntoResponse, BillingApiError> {
    let Query(params) =
        params.map_err(|e| BillingError::validation("limit", e.body_text()))?;

    let entries = state
        .webhook_failures_handler()
        .handle(ListWebhookFailuresQuery {
            limit: params.limit,
        })
        .await?;

    Ok(Json(WebhookFailuresResponse {
        entries: entries
            .into_iter()
            .map(WebhookEventEntryResponse::from)
            .collect(),
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
#[derive(Debug)]
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl BillingApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BillingError::UnknownPlan(_)
            | BillingError::SignatureInvalid(_)
            | BillingError::MalformedEvent(_)
            | BillingError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            BillingError::NotFound(_) => StatusCode::NOT_FOUND,
            BillingError::Gateway(_) | BillingError::Infrastructure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();

        // Server-side detail stays in the logs
        let message = if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.code(), "Request failed");
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        let body = ErrorResponse::new(self.0.code(), message);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn client_errors_map_to_400() {
        for err in [
            BillingError::UnknownPlan("gold".to_string()),
            BillingError::SignatureInvalid("bad".to_string()),
            BillingError::MalformedEvent("eof".to_string()),
            BillingError::validation("email", "bad"),
        ] {
            assert_eq!(BillingApiError(err).status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = BillingApiError(BillingError::not_found("User"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_plan_body_carries_message_and_code() {
        let response =
            BillingApiError(BillingError::UnknownPlan("gold".to_string())).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid plan selected: gold");
        assert_eq!(json["code"], "UNKNOWN_PLAN");
    }

    #[tokio::test]
    async fn server_errors_hide_detail() {
        let response =
            BillingApiError(BillingError::Infrastructure("password=hunter2".to_string()))
                .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Internal server error");
        assert_eq!(json["code"], "INTERNAL_ERROR");
    }
}
