//! CreateCheckoutSessionHandler - Command handler for starting a subscription checkout.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::billing::{BillingError, NewUser, PlanCatalog};
use crate::domain::foundation::UserId;
use crate::ports::{CreateCheckoutRequest, PaymentGateway, UserRepository};

/// Metadata keys echoed back by Stripe on `checkout.session.completed`.
pub const METADATA_USER_ID: &str = "userId";
pub const METADATA_PLAN: &str = "plan";
pub const METADATA_TELEGRAM_USERNAME: &str = "telegramUsername";
pub const METADATA_TELEGRAM_CHAT_ID: &str = "telegramChatId";

/// Command to start a checkout for a plan.
#[derive(Debug, Clone)]
pub struct CreateCheckoutSessionCommand {
    pub plan: String,
    pub email: String,
    pub telegram_username: String,
    pub telegram_chat_id: String,
}

/// Result of a successfully created checkout session.
#[derive(Debug, Clone)]
pub struct CreateCheckoutSessionResult {
    pub session_id: String,
    pub user_id: UserId,
}

/// Handler for starting a hosted Stripe checkout.
///
/// The subscriber row is created (or reused) before the session exists; it
/// gains a subscription only once the checkout-completed webhook arrives.
pub struct CreateCheckoutSessionHandler {
    catalog: Arc<PlanCatalog>,
    users: Arc<dyn UserRepository>,
    payment_gateway: Arc<dyn PaymentGateway>,
    frontend_url: String,
}

impl CreateCheckoutSessionHandler {
    pub fn new(
        catalog: Arc<PlanCatalog>,
        users: Arc<dyn UserRepository>,
        payment_gateway: Arc<dyn PaymentGateway>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            users,
            payment_gateway,
            frontend_url: frontend_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutSessionCommand,
    ) -> Result<CreateCheckoutSessionResult, BillingError> {
        // 1. Plan must exist before anything is stored
        let plan = self.catalog.lookup(&cmd.plan)?;

        // 2. Validate contact details
        let new_user = NewUser::new(&cmd.email, &cmd.telegram_username, &cmd.telegram_chat_id)?;

        // 3. Find or create the subscriber
        let user = self.users.upsert_by_email(new_user.clone()).await?;

        // 4. Create the hosted session
        let mut metadata = BTreeMap::new();
        metadata.insert(METADATA_USER_ID.to_string(), user.id.to_string());
        metadata.insert(METADATA_PLAN.to_string(), plan.tag.as_str().to_string());
        metadata.insert(
            METADATA_TELEGRAM_USERNAME.to_string(),
            new_user.telegram_username,
        );
        metadata.insert(
            METADATA_TELEGRAM_CHAT_ID.to_string(),
            new_user.telegram_chat_id,
        );

        let session = self
            .payment_gateway
            .create_checkout_session(CreateCheckoutRequest {
                price_id: plan.stripe_price_id.clone(),
                customer_email: new_user.email,
                success_url: format!(
                    "{}/success?session_id={{CHECKOUT_SESSION_ID}}",
                    self.frontend_url
                ),
                cancel_url: format!("{}/pricing", self.frontend_url),
                metadata,
            })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %user.id, plan = %plan.tag, "Checkout session creation failed");
                BillingError::from(e)
            })?;

        tracing::info!(
            user_id = %user.id,
            plan = %plan.tag,
            session_id = %session.id,
            "Checkout session created"
        );

        Ok(CreateCheckoutSessionResult {
            session_id: session.id,
            user_id: user.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryUserRepository;
    use crate::adapters::stripe::MockPaymentGateway;
    use crate::domain::billing::PlanTag;
    use crate::ports::PaymentError;

    struct Fixture {
        users: Arc<InMemoryUserRepository>,
        gateway: MockPaymentGateway,
        handler: CreateCheckoutSessionHandler,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        let gateway = MockPaymentGateway::new("whsec_test");
        let handler = CreateCheckoutSessionHandler::new(
            Arc::new(PlanCatalog::default()),
            users.clone(),
            Arc::new(gateway.clone()),
            "https://tg.example/",
        );
        Fixture {
            users,
            gateway,
            handler,
        }
    }

    fn command(plan: &str, email: &str) -> CreateCheckoutSessionCommand {
        CreateCheckoutSessionCommand {
            plan: plan.to_string(),
            email: email.to_string(),
            telegram_username: "alice".to_string(),
            telegram_chat_id: "12345".to_string(),
        }
    }

    #[tokio::test]
    async fn every_plan_yields_a_session() {
        let f = fixture();

        for tag in PlanTag::ALL {
            let result = f.handler.handle(command(tag.as_str(), "a@x.com")).await;
            assert!(result.is_ok(), "plan {} failed", tag);
        }

        let prices: Vec<String> = f
            .gateway
            .checkout_requests()
            .into_iter()
            .map(|r| r.price_id)
            .collect();
        assert_eq!(
            prices,
            vec![
                "price_starter_monthly",
                "price_professional_monthly",
                "price_enterprise_monthly"
            ]
        );
    }

    #[tokio::test]
    async fn repeated_email_reuses_user() {
        let f = fixture();

        let first = f.handler.handle(command("starter", "a@x.com")).await.unwrap();
        let second = f
            .handler
            .handle(command("professional", "a@x.com"))
            .await
            .unwrap();

        assert_eq!(first.user_id, second.user_id);
        assert_ne!(first.session_id, second.session_id);
        assert_eq!(f.users.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_plan_creates_nothing() {
        let f = fixture();

        let err = f.handler.handle(command("gold", "a@x.com")).await.unwrap_err();

        assert_eq!(err, BillingError::UnknownPlan("gold".to_string()));
        assert!(f.users.is_empty().await);
        assert!(f.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn plan_tag_is_case_sensitive() {
        let f = fixture();

        let err = f.handler.handle(command("Starter", "a@x.com")).await.unwrap_err();

        assert!(matches!(err, BillingError::UnknownPlan(_)));
    }

    #[tokio::test]
    async fn invalid_email_is_rejected_before_storage() {
        let f = fixture();

        let err = f.handler.handle(command("starter", "not-an-email")).await.unwrap_err();

        assert!(matches!(
            err,
            BillingError::ValidationFailed { ref field, .. } if field == "email"
        ));
        assert!(f.users.is_empty().await);
    }

    #[tokio::test]
    async fn session_request_carries_metadata_and_urls() {
        let f = fixture();

        let result = f
            .handler
            .handle(command("professional", "a@x.com"))
            .await
            .unwrap();

        let request = f.gateway.checkout_requests().remove(0);
        assert_eq!(request.customer_email, "a@x.com");
        assert_eq!(
            request.success_url,
            "https://tg.example/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(request.cancel_url, "https://tg.example/pricing");
        assert_eq!(
            request.metadata.get(METADATA_USER_ID),
            Some(&result.user_id.to_string())
        );
        assert_eq!(
            request.metadata.get(METADATA_PLAN).map(String::as_str),
            Some("professional")
        );
        assert_eq!(
            request
                .metadata
                .get(METADATA_TELEGRAM_CHAT_ID)
                .map(String::as_str),
            Some("12345")
        );
    }

    #[tokio::test]
    async fn gateway_failure_is_gateway_error() {
        let f = fixture();
        f.gateway.fail_next(PaymentError::network("connection refused"));

        let err = f.handler.handle(command("starter", "a@x.com")).await.unwrap_err();

        assert!(matches!(err, BillingError::Gateway(_)));
        assert!(!err.is_client_error());
    }
}
