//! Telegram message texts sent on subscription lifecycle changes.

use super::plan_catalog::PlanDefinition;

/// Sent after a checkout completes.
pub fn welcome_message(plan: &PlanDefinition) -> String {
    format!(
        "🎉 Welcome to Trading Genie {} Plan!\n\n\
         Your subscription is now active. You'll start receiving trading signals immediately.\n\n\
         📊 Plan Features:\n{}",
        plan.tag.as_str().to_uppercase(),
        plan.features_text()
    )
}

/// Sent after Stripe deletes a subscription.
pub fn cancellation_message() -> String {
    "❌ Your Trading Genie subscription has been cancelled.\n\n\
     You can resubscribe anytime to continue receiving trading signals."
        .to_string()
}

/// Sent when an invoice payment fails.
pub fn payment_failed_message() -> String {
    "⚠️ Payment Failed\n\n\
     Your Trading Genie subscription payment has failed. \
     Please update your payment method to continue receiving signals."
        .to_string()
}
