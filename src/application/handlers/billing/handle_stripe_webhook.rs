//! HandleStripeWebhookHandler - Command handler for reconciling Stripe webhooks.
//!
//! Once an event's signature checks out, Stripe always receives a 200.
//! Reconciliation failures are logged and written to the webhook event log
//! instead of being returned, so Stripe does not retry them blindly.

use std::sync::Arc;

use tracing::Instrument;

use crate::domain::billing::{
    cancellation_message, payment_failed_message, welcome_message, BillingError,
    CheckoutSessionObject, InvoiceObject, PlanCatalog, StripeEvent, StripeEventType,
    SubscriptionChange, SubscriptionObject, SubscriptionRecord, SubscriptionStatus,
    SubscriptionSummary,
};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{
    EventOutcome, NotificationSender, PaymentGateway, SubscriptionRecordRepository,
    UserRepository, WebhookEventEntry, WebhookEventLog,
};

use super::create_checkout_session::{METADATA_PLAN, METADATA_TELEGRAM_CHAT_ID, METADATA_USER_ID};

/// Command to handle one webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleStripeWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value.
    pub signature: String,
}

/// What happened to an accepted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookOutcome {
    pub event_id: String,
    pub event_type: String,
    pub disposition: EventOutcome,
    pub failures: Vec<String>,
    pub redelivery: bool,
}

/// Failures collected while reconciling one event.
///
/// A step that cannot continue returns `Err`; steps that fail without
/// blocking the rest (notifications, duplicate records) are noted here.
#[derive(Default)]
struct Reconciliation {
    failures: Vec<String>,
}

impl Reconciliation {
    fn note(&mut self, failure: impl Into<String>) {
        self.failures.push(failure.into());
    }
}

/// Handler for Stripe webhook deliveries.
pub struct HandleStripeWebhookHandler {
    catalog: Arc<PlanCatalog>,
    users: Arc<dyn UserRepository>,
    records: Arc<dyn SubscriptionRecordRepository>,
    payment_gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn NotificationSender>,
    event_log: Arc<dyn WebhookEventLog>,
}

impl HandleStripeWebhookHandler {
    pub fn new(
        catalog: Arc<PlanCatalog>,
        users: Arc<dyn UserRepository>,
        records: Arc<dyn SubscriptionRecordRepository>,
        payment_gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationSender>,
        event_log: Arc<dyn WebhookEventLog>,
    ) -> Self {
        Self {
            catalog,
            users,
            records,
            payment_gateway,
            notifier,
            event_log,
        }
    }

    /// Verifies, routes and reconciles one delivery.
    ///
    /// Returns `Err` only when the signature or event envelope is rejected;
    /// nothing is stored in that case.
    pub async fn handle(&self, cmd: HandleStripeWebhookCommand) -> Result<WebhookOutcome, BillingError> {
        // 1. Verify signature and parse event
        let event = self
            .payment_gateway
            .verify_webhook(&cmd.payload, &cmd.signature)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected Stripe webhook");
                BillingError::from(e)
            })?;

        let span = tracing::info_span!(
            "stripe_webhook",
            event_id = %event.id,
            event_type = %event.event_type,
            livemode = event.is_live()
        );

        self.reconcile_event(event).instrument(span).await
    }

    /// Routes a verified event and records the delivery.
    ///
    /// Every verified delivery gets a webhook event log entry, ignored ones
    /// included. The log is not part of the user and subscription store:
    /// an ignored event leaves users and records untouched, and the entry is
    /// what lets a later redelivery of the same event id be flagged.
    async fn reconcile_event(&self, event: StripeEvent) -> Result<WebhookOutcome, BillingError> {
        let mut reconciliation = Reconciliation::default();

        // 2. Redelivery check
        let redelivery = match self.event_log.deliveries_of(&event.id).await {
            Ok(count) => count > 0,
            Err(e) => {
                tracing::error!(error = %e, "Failed to look up previous deliveries");
                reconciliation.note(format!("delivery history unavailable: {}", e));
                false
            }
        };
        if redelivery {
            tracing::warn!("Stripe event redelivered; processing again");
        }

        // 3. Route by type
        let routed = match event.parsed_type() {
            StripeEventType::CheckoutSessionCompleted => {
                self.handle_checkout_completed(&event, &mut reconciliation).await
            }
            StripeEventType::CustomerSubscriptionUpdated => {
                self.handle_subscription_updated(&event).await
            }
            StripeEventType::CustomerSubscriptionDeleted => {
                self.handle_subscription_deleted(&event, &mut reconciliation).await
            }
            StripeEventType::InvoicePaymentFailed => {
                self.handle_payment_failed(&event, &mut reconciliation).await
            }
            StripeEventType::Other => {
                tracing::debug!("Unhandled Stripe event type");
                Ok(EventOutcome::Ignored)
            }
        };

        let disposition = match routed {
            Ok(outcome) if reconciliation.failures.is_empty() => outcome,
            Ok(_) => EventOutcome::Failed,
            Err(e) => {
                tracing::error!(error = %e, "Stripe webhook reconciliation failed");
                reconciliation.note(e.to_string());
                EventOutcome::Failed
            }
        };

        // 4. Record the delivery
        let entry = WebhookEventEntry::new(
            event.id.clone(),
            event.event_type.clone(),
            disposition,
            reconciliation.failures.clone(),
            redelivery,
        );
        if let Err(e) = self.event_log.append(entry).await {
            tracing::error!(error = %e, "Failed to record webhook outcome");
        }

        tracing::info!(disposition = disposition.as_str(), redelivery, "Stripe webhook handled");

        Ok(WebhookOutcome {
            event_id: event.id,
            event_type: event.event_type,
            disposition,
            failures: reconciliation.failures,
            redelivery,
        })
    }

    async fn handle_checkout_completed(
        &self,
        event: &StripeEvent,
        reconciliation: &mut Reconciliation,
    ) -> Result<EventOutcome, BillingError> {
        let session: CheckoutSessionObject = event
            .deserialize_object()
            .map_err(|e| BillingError::MalformedEvent(format!("checkout session: {}", e)))?;

        let user_id: UserId = session
            .metadata_value(METADATA_USER_ID)
            .ok_or_else(|| missing_metadata(METADATA_USER_ID))?
            .parse()
            .map_err(|_| BillingError::MalformedEvent("metadata userId is not a valid id".to_string()))?;
        let plan = self
            .catalog
            .lookup(session.metadata_value(METADATA_PLAN).ok_or_else(|| missing_metadata(METADATA_PLAN))?)?;
        let subscription_id = session.subscription.clone().ok_or_else(|| {
            BillingError::MalformedEvent("checkout session has no subscription".to_string())
        })?;

        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| BillingError::not_found(format!("User {}", user_id)))?;

        let subscription = self
            .payment_gateway
            .retrieve_subscription(&subscription_id)
            .await?;
        let period_start = Timestamp::from_unix_secs(subscription.current_period_start);
        let period_end = Timestamp::from_unix_secs(subscription.current_period_end);

        let existing = self.records.count_for_subscription(&subscription_id).await?;
        if existing > 0 {
            tracing::warn!(subscription_id = %subscription_id, existing, "Duplicate subscription record created");
            reconciliation.note(format!(
                "subscription {} already had {} record(s); duplicate created",
                subscription_id, existing
            ));
        }

        self.users
            .set_subscription(
                &user.id,
                SubscriptionSummary {
                    plan: plan.tag,
                    status: SubscriptionStatus::Active,
                    stripe_customer_id: session.customer.clone().or(subscription.customer_id),
                    stripe_subscription_id: subscription_id.clone(),
                    current_period_end: period_end,
                    created_at: Timestamp::now(),
                },
            )
            .await?;

        self.records
            .create(&SubscriptionRecord::activated(
                user.id,
                plan.tag,
                subscription_id.clone(),
                period_start,
                period_end,
            ))
            .await?;

        tracing::info!(user_id = %user.id, subscription_id = %subscription_id, plan = %plan.tag, "Subscription activated");

        let chat_id = session
            .metadata_value(METADATA_TELEGRAM_CHAT_ID)
            .unwrap_or(user.telegram_chat_id.as_str());
        self.notify(chat_id, &welcome_message(plan), reconciliation).await;

        Ok(EventOutcome::Processed)
    }

    async fn handle_subscription_updated(&self, event: &StripeEvent) -> Result<EventOutcome, BillingError> {
        let subscription: SubscriptionObject = event
            .deserialize_object()
            .map_err(|e| BillingError::MalformedEvent(format!("subscription: {}", e)))?;

        let Some(user) = self.users.find_by_subscription_id(&subscription.id).await? else {
            tracing::debug!(subscription_id = %subscription.id, "No subscriber for updated subscription");
            return Ok(EventOutcome::Ignored);
        };

        let status = SubscriptionStatus::from_stripe(&subscription.status);
        let period_end = subscription
            .current_period_end
            .and_then(Timestamp::from_unix_secs);

        self.users
            .update_subscription_status(&user.id, status, period_end)
            .await?;
        self.records
            .apply_change(
                &subscription.id,
                &SubscriptionChange {
                    status,
                    current_period_end: period_end,
                    cancel_at_period_end: subscription.cancel_at_period_end,
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, subscription_id = %subscription.id, status = %status, "Subscription updated");
        Ok(EventOutcome::Processed)
    }

    async fn handle_subscription_deleted(
        &self,
        event: &StripeEvent,
        reconciliation: &mut Reconciliation,
    ) -> Result<EventOutcome, BillingError> {
        let subscription: SubscriptionObject = event
            .deserialize_object()
            .map_err(|e| BillingError::MalformedEvent(format!("subscription: {}", e)))?;

        let Some(user) = self.users.find_by_subscription_id(&subscription.id).await? else {
            tracing::debug!(subscription_id = %subscription.id, "No subscriber for deleted subscription");
            return Ok(EventOutcome::Ignored);
        };

        self.users
            .update_subscription_status(&user.id, SubscriptionStatus::Cancelled, None)
            .await?;
        self.records
            .set_status(&subscription.id, SubscriptionStatus::Cancelled)
            .await?;

        tracing::info!(user_id = %user.id, subscription_id = %subscription.id, "Subscription cancelled");

        self.notify(&user.telegram_chat_id, &cancellation_message(), reconciliation)
            .await;

        Ok(EventOutcome::Processed)
    }

    async fn handle_payment_failed(
        &self,
        event: &StripeEvent,
        reconciliation: &mut Reconciliation,
    ) -> Result<EventOutcome, BillingError> {
        let invoice: InvoiceObject = event
            .deserialize_object()
            .map_err(|e| BillingError::MalformedEvent(format!("invoice: {}", e)))?;

        let Some(subscription_id) = invoice.subscription.as_deref() else {
            return Ok(EventOutcome::Ignored);
        };
        let Some(user) = self.users.find_by_subscription_id(subscription_id).await? else {
            tracing::debug!(subscription_id, "No subscriber for failed invoice");
            return Ok(EventOutcome::Ignored);
        };

        tracing::info!(user_id = %user.id, subscription_id, invoice_id = %invoice.id, "Invoice payment failed");

        self.notify(&user.telegram_chat_id, &payment_failed_message(), reconciliation)
            .await;

        Ok(EventOutcome::Processed)
    }

    async fn notify(&self, chat_id: &str, text: &str, reconciliation: &mut Reconciliation) {
        if let Err(e) = self.notifier.send(chat_id, text).await {
            tracing::warn!(error = %e, chat_id, "Notification not delivered");
            reconciliation.note(e.to_string());
        }
    }
}

fn missing_metadata(key: &str) -> BillingError {
    BillingError::MalformedEvent(format!("checkout session metadata is missing {}", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::{
        InMemorySubscriptionRecordRepository, InMemoryUserRepository, InMemoryWebhookEventLog,
    };
    use crate::adapters::stripe::MockPaymentGateway;
    use crate::adapters::telegram::RecordingNotificationSender;
    use crate::domain::billing::{sign_payload, NewUser, PlanTag, User};
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::ports::PaymentError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    const SECRET: &str = "whsec_test_secret";
    const PERIOD_START: i64 = 1_704_067_200;

    // ════════════════════════════════════════════════════════════════════════════
    // Fixture
    // ════════════════════════════════════════════════════════════════════════════

    struct Fixture {
        users: Arc<InMemoryUserRepository>,
        records: Arc<InMemorySubscriptionRecordRepository>,
        gateway: MockPaymentGateway,
        notifier: RecordingNotificationSender,
        event_log: Arc<InMemoryWebhookEventLog>,
        handler: HandleStripeWebhookHandler,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        fixture_with_users(users.clone(), users)
    }

    fn fixture_with_users(
        users: Arc<InMemoryUserRepository>,
        user_port: Arc<dyn UserRepository>,
    ) -> Fixture {
        let records = Arc::new(InMemorySubscriptionRecordRepository::new());
        let gateway = MockPaymentGateway::new(SECRET);
        let notifier = RecordingNotificationSender::new();
        let event_log = Arc::new(InMemoryWebhookEventLog::new());
        let handler = HandleStripeWebhookHandler::new(
            Arc::new(PlanCatalog::default()),
            user_port,
            records.clone(),
            Arc::new(gateway.clone()),
            Arc::new(notifier.clone()),
            event_log.clone(),
        );
        Fixture {
            users,
            records,
            gateway,
            notifier,
            event_log,
            handler,
        }
    }

    fn signed(event: serde_json::Value) -> HandleStripeWebhookCommand {
        let payload = serde_json::to_vec(&event).unwrap();
        let signature = sign_payload(SECRET, chrono::Utc::now().timestamp(), &payload);
        HandleStripeWebhookCommand { payload, signature }
    }

    fn event(id: &str, event_type: &str, object: serde_json::Value) -> serde_json::Value {
        json!({
            "id": id,
            "type": event_type,
            "created": chrono::Utc::now().timestamp(),
            "data": { "object": object },
            "livemode": false
        })
    }

    fn checkout_completed(id: &str, user: &User, plan: &str, sub_id: &str) -> serde_json::Value {
        event(
            id,
            "checkout.session.completed",
            json!({
                "id": "cs_test_1",
                "customer": "cus_1",
                "subscription": sub_id,
                "metadata": {
                    "userId": user.id.to_string(),
                    "plan": plan,
                    "telegramUsername": user.telegram_username,
                    "telegramChatId": user.telegram_chat_id
                }
            }),
        )
    }

    fn subscription_event(id: &str, event_type: &str, sub_id: &str, status: &str) -> serde_json::Value {
        event(
            id,
            event_type,
            json!({
                "id": sub_id,
                "customer": "cus_1",
                "status": status,
                "current_period_start": PERIOD_START,
                "current_period_end": PERIOD_START + 86_400 * 60,
                "cancel_at_period_end": true
            }),
        )
    }

    async fn registered_user(f: &Fixture) -> User {
        f.users
            .upsert_by_email(NewUser::new("a@x.com", "alice", "12345").unwrap())
            .await
            .unwrap()
    }

    async fn activated_user(f: &Fixture, sub_id: &str) -> User {
        let user = registered_user(f).await;
        f.gateway.add_active_subscription(sub_id, PERIOD_START);
        f.handler
            .handle(signed(checkout_completed("evt_checkout", &user, "professional", sub_id)))
            .await
            .unwrap();
        user
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Signature Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn invalid_signature_is_rejected_without_side_effects() {
        let f = fixture();
        let user = registered_user(&f).await;
        f.gateway.add_active_subscription("sub_1", PERIOD_START);

        let mut cmd = signed(checkout_completed("evt_1", &user, "starter", "sub_1"));
        cmd.signature = sign_payload("whsec_other", chrono::Utc::now().timestamp(), &cmd.payload);

        let err = f.handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, BillingError::SignatureInvalid(_)));
        assert!(f.records.all().await.is_empty());
        assert!(f.event_log.entries().await.is_empty());
        assert!(f.notifier.messages().is_empty());
        let stored = f.users.find_by_id(&user.id).await.unwrap().unwrap();
        assert!(stored.subscription.is_none());
    }

    #[tokio::test]
    async fn verified_but_malformed_body_is_rejected() {
        let f = fixture();
        let payload = b"{\"not\":\"an event\"}".to_vec();
        let signature = sign_payload(SECRET, chrono::Utc::now().timestamp(), &payload);

        let err = f
            .handler
            .handle(HandleStripeWebhookCommand { payload, signature })
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::MalformedEvent(_)));
        assert!(f.event_log.entries().await.is_empty());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Checkout Completed Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn checkout_completed_activates_subscription() {
        let f = fixture();
        let user = activated_user(&f, "sub_1").await;

        let stored = f.users.find_by_id(&user.id).await.unwrap().unwrap();
        let summary = stored.subscription.unwrap();
        assert_eq!(summary.plan, PlanTag::Professional);
        assert_eq!(summary.status, SubscriptionStatus::Active);
        assert_eq!(summary.stripe_customer_id.as_deref(), Some("cus_1"));
        assert_eq!(summary.stripe_subscription_id, "sub_1");
        assert_eq!(
            summary.current_period_end,
            Timestamp::from_unix_secs(PERIOD_START + 2_592_000)
        );

        let records = f.records.all().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, SubscriptionStatus::Active);
        assert_eq!(records[0].current_period_start, Timestamp::from_unix_secs(PERIOD_START));

        let welcome = f.notifier.messages_to("12345");
        assert_eq!(welcome.len(), 1);
        assert!(welcome[0].starts_with("🎉 Welcome to Trading Genie PROFESSIONAL Plan!"));

        let entries = f.event_log.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].outcome, EventOutcome::Processed);
    }

    #[tokio::test]
    async fn checkout_for_unknown_user_is_recorded_as_failure() {
        let f = fixture();
        let ghost = User::register(NewUser::new("ghost@x.com", "ghost", "999").unwrap());
        f.gateway.add_active_subscription("sub_1", PERIOD_START);

        let outcome = f
            .handler
            .handle(signed(checkout_completed("evt_1", &ghost, "starter", "sub_1")))
            .await
            .unwrap();

        assert_eq!(outcome.disposition, EventOutcome::Failed);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].contains("not found"));
        assert!(f.records.all().await.is_empty());
        assert!(f.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn checkout_with_missing_metadata_is_recorded_as_failure() {
        let f = fixture();
        let cmd = signed(event(
            "evt_1",
            "checkout.session.completed",
            json!({"id": "cs_1", "subscription": "sub_1", "metadata": {"plan": "starter"}}),
        ));

        let outcome = f.handler.handle(cmd).await.unwrap();

        assert_eq!(outcome.disposition, EventOutcome::Failed);
        assert!(outcome.failures[0].contains("userId"));
        let entries = f.event_log.entries().await;
        assert_eq!(entries[0].outcome, EventOutcome::Failed);
    }

    #[tokio::test]
    async fn gateway_failure_during_checkout_is_recorded() {
        let f = fixture();
        let user = registered_user(&f).await;
        f.gateway.fail_next(PaymentError::network("timeout"));

        let outcome = f
            .handler
            .handle(signed(checkout_completed("evt_1", &user, "starter", "sub_1")))
            .await
            .unwrap();

        assert_eq!(outcome.disposition, EventOutcome::Failed);
        let stored = f.users.find_by_id(&user.id).await.unwrap().unwrap();
        assert!(stored.subscription.is_none());
    }

    #[tokio::test]
    async fn redelivered_checkout_is_flagged_not_deduplicated() {
        let f = fixture();
        let user = activated_user(&f, "sub_1").await;

        let outcome = f
            .handler
            .handle(signed(checkout_completed("evt_checkout", &user, "professional", "sub_1")))
            .await
            .unwrap();

        assert!(outcome.redelivery);
        assert_eq!(outcome.disposition, EventOutcome::Failed);
        assert!(outcome.failures[0].contains("duplicate"));
        assert_eq!(f.records.all().await.len(), 2);
        assert!(f.event_log.entries().await[1].needs_attention());
    }

    #[tokio::test]
    async fn notification_failure_does_not_undo_activation() {
        let f = fixture();
        f.notifier.set_failing(true);

        let user = activated_user(&f, "sub_1").await;

        let stored = f.users.find_by_id(&user.id).await.unwrap().unwrap();
        assert!(stored.is_active_subscriber());
        let entries = f.event_log.entries().await;
        assert_eq!(entries[0].outcome, EventOutcome::Failed);
        assert!(entries[0].failures[0].contains("Notification delivery failed"));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Subscription Lifecycle Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn subscription_updated_sets_status_and_period() {
        let f = fixture();
        let user = activated_user(&f, "sub_1").await;

        let outcome = f
            .handler
            .handle(signed(subscription_event(
                "evt_2",
                "customer.subscription.updated",
                "sub_1",
                "past_due",
            )))
            .await
            .unwrap();

        assert_eq!(outcome.disposition, EventOutcome::Processed);
        let summary = f
            .users
            .find_by_id(&user.id)
            .await
            .unwrap()
            .unwrap()
            .subscription
            .unwrap();
        assert_eq!(summary.status, SubscriptionStatus::PastDue);
        assert_eq!(
            summary.current_period_end,
            Timestamp::from_unix_secs(PERIOD_START + 86_400 * 60)
        );
        let record = &f.records.all().await[0];
        assert_eq!(record.status, SubscriptionStatus::PastDue);
        assert!(record.cancel_at_period_end);
    }

    #[tokio::test]
    async fn subscription_updated_for_unknown_id_is_ignored() {
        let f = fixture();
        let user = activated_user(&f, "sub_1").await;
        let summary_before = f.users.find_by_id(&user.id).await.unwrap().unwrap().subscription;
        let records_before = f.records.all().await;
        let sent_before = f.notifier.messages().len();

        let outcome = f
            .handler
            .handle(signed(subscription_event(
                "evt_2",
                "customer.subscription.updated",
                "sub_unknown",
                "past_due",
            )))
            .await
            .unwrap();

        assert_eq!(outcome.disposition, EventOutcome::Ignored);
        assert!(outcome.failures.is_empty());
        let stored = f.users.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.subscription, summary_before);
        assert_eq!(f.records.all().await, records_before);
        assert_eq!(f.notifier.messages().len(), sent_before);

        let entries = f.event_log.entries().await;
        let logged = entries.iter().find(|e| e.event_id == "evt_2").unwrap();
        assert_eq!(logged.outcome, EventOutcome::Ignored);
        assert!(!logged.needs_attention());
    }

    #[tokio::test]
    async fn subscription_deleted_cancels_and_notifies() {
        let f = fixture();
        let user = activated_user(&f, "sub_1").await;

        f.handler
            .handle(signed(subscription_event(
                "evt_3",
                "customer.subscription.deleted",
                "sub_1",
                "canceled",
            )))
            .await
            .unwrap();

        let stored = f.users.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.subscription.unwrap().status, SubscriptionStatus::Cancelled);
        assert_eq!(f.records.all().await[0].status, SubscriptionStatus::Cancelled);
        let messages = f.notifier.messages_to("12345");
        assert_eq!(messages.last(), Some(&cancellation_message()));
    }

    #[tokio::test]
    async fn subscription_deleted_for_unknown_id_is_ignored() {
        let f = fixture();
        let user = activated_user(&f, "sub_1").await;
        let sent_before = f.notifier.messages().len();

        let outcome = f
            .handler
            .handle(signed(subscription_event(
                "evt_3",
                "customer.subscription.deleted",
                "sub_unknown",
                "canceled",
            )))
            .await
            .unwrap();

        assert_eq!(outcome.disposition, EventOutcome::Ignored);
        assert_eq!(f.notifier.messages().len(), sent_before);
        let stored = f.users.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.subscription.unwrap().status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn payment_failed_notifies_without_state_change() {
        let f = fixture();
        let user = activated_user(&f, "sub_1").await;

        let outcome = f
            .handler
            .handle(signed(event(
                "evt_4",
                "invoice.payment_failed",
                json!({"id": "in_1", "customer": "cus_1", "subscription": "sub_1"}),
            )))
            .await
            .unwrap();

        assert_eq!(outcome.disposition, EventOutcome::Processed);
        assert_eq!(
            f.notifier.messages_to("12345").last(),
            Some(&payment_failed_message())
        );
        let stored = f.users.find_by_id(&user.id).await.unwrap().unwrap();
        assert!(stored.is_active_subscriber());
    }

    #[tokio::test]
    async fn payment_failed_without_subscription_is_ignored() {
        let f = fixture();

        let outcome = f
            .handler
            .handle(signed(event(
                "evt_4",
                "invoice.payment_failed",
                json!({"id": "in_1", "subscription": null}),
            )))
            .await
            .unwrap();

        assert_eq!(outcome.disposition, EventOutcome::Ignored);
        assert!(f.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn unhandled_event_type_is_acknowledged() {
        let f = fixture();

        let outcome = f
            .handler
            .handle(signed(event("evt_5", "customer.created", json!({"id": "cus_1"}))))
            .await
            .unwrap();

        assert_eq!(outcome.disposition, EventOutcome::Ignored);
        assert_eq!(outcome.event_type, "customer.created");
        assert_eq!(f.event_log.entries().await.len(), 1);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Store Failure Tests
    // ════════════════════════════════════════════════════════════════════════════

    /// Delegates to an in-memory store but fails lookups by subscription id.
    struct FailingLookupRepository {
        inner: Arc<InMemoryUserRepository>,
        lookups: Mutex<u32>,
    }

    #[async_trait]
    impl UserRepository for FailingLookupRepository {
        async fn upsert_by_email(&self, new_user: NewUser) -> Result<User, DomainError> {
            self.inner.upsert_by_email(new_user).await
        }

        async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_subscription_id(&self, _id: &str) -> Result<Option<User>, DomainError> {
            *self.lookups.lock().unwrap() += 1;
            Err(DomainError::new(ErrorCode::DatabaseError, "connection reset"))
        }

        async fn set_subscription(
            &self,
            id: &UserId,
            summary: SubscriptionSummary,
        ) -> Result<(), DomainError> {
            self.inner.set_subscription(id, summary).await
        }

        async fn update_subscription_status(
            &self,
            id: &UserId,
            status: SubscriptionStatus,
            current_period_end: Option<Timestamp>,
        ) -> Result<(), DomainError> {
            self.inner
                .update_subscription_status(id, status, current_period_end)
                .await
        }

        async fn list_active(&self) -> Result<Vec<User>, DomainError> {
            self.inner.list_active().await
        }
    }

    #[tokio::test]
    async fn store_failure_is_swallowed_and_recorded() {
        let inner = Arc::new(InMemoryUserRepository::new());
        let failing = Arc::new(FailingLookupRepository {
            inner: inner.clone(),
            lookups: Mutex::new(0),
        });
        let f = fixture_with_users(inner, failing.clone());

        let outcome = f
            .handler
            .handle(signed(subscription_event(
                "evt_6",
                "customer.subscription.deleted",
                "sub_1",
                "canceled",
            )))
            .await
            .unwrap();

        assert_eq!(*failing.lookups.lock().unwrap(), 1);
        assert_eq!(outcome.disposition, EventOutcome::Failed);
        assert!(outcome.failures[0].contains("connection reset"));
        assert_eq!(f.event_log.entries().await[0].outcome, EventOutcome::Failed);
    }
}
