//! GetSubscriptionHistoryHandler - Query handler for one user's subscription records.

use std::sync::Arc;

use crate::domain::billing::{BillingError, SubscriptionRecord, User};
use crate::domain::foundation::UserId;
use crate::ports::{SubscriptionRecordRepository, UserRepository};

/// Query by raw user id, as received on the admin route.
#[derive(Debug, Clone)]
pub struct GetSubscriptionHistoryQuery {
    pub user_id: String,
}

#[derive(Debug, Clone)]
pub struct GetSubscriptionHistoryResult {
    pub user: User,
    /// Newest first.
    pub subscriptions: Vec<SubscriptionRecord>,
}

pub struct GetSubscriptionHistoryHandler {
    users: Arc<dyn UserRepository>,
    records: Arc<dyn SubscriptionRecordRepository>,
}

impl GetSubscriptionHistoryHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        records: Arc<dyn SubscriptionRecordRepository>,
    ) -> Self {
        Self { users, records }
    }

    /// An id that does not parse is reported the same as an unknown id.
    pub async fn handle(
        &self,
        query: GetSubscriptionHistoryQuery,
    ) -> Result<GetSubscriptionHistoryResult, BillingError> {
        let user_id: UserId = query
            .user_id
            .trim()
            .parse()
            .map_err(|_| BillingError::not_found("User"))?;

        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| BillingError::not_found("User"))?;

        let subscriptions = self.records.list_for_user(&user.id).await?;

        Ok(GetSubscriptionHistoryResult {
            user,
            subscriptions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::{InMemorySubscriptionRecordRepository, InMemoryUserRepository};
    use crate::domain::billing::{NewUser, PlanTag};

    struct Fixture {
        users: Arc<InMemoryUserRepository>,
        records: Arc<InMemorySubscriptionRecordRepository>,
        handler: GetSubscriptionHistoryHandler,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        let records = Arc::new(InMemorySubscriptionRecordRepository::new());
        let handler = GetSubscriptionHistoryHandler::new(users.clone(), records.clone());
        Fixture {
            users,
            records,
            handler,
        }
    }

    #[tokio::test]
    async fn returns_user_with_records() {
        let f = fixture();
        let user = f
            .users
            .upsert_by_email(NewUser::new("a@x.com", "alice", "1").unwrap())
            .await
            .unwrap();
        f.records
            .create(&SubscriptionRecord::activated(user.id, PlanTag::Starter, "sub_1", None, None))
            .await
            .unwrap();
        f.records
            .create(&SubscriptionRecord::activated(
                UserId::new(),
                PlanTag::Enterprise,
                "sub_other",
                None,
                None,
            ))
            .await
            .unwrap();

        let result = f
            .handler
            .handle(GetSubscriptionHistoryQuery {
                user_id: user.id.to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.user.email, "a@x.com");
        assert_eq!(result.subscriptions.len(), 1);
        assert_eq!(result.subscriptions[0].stripe_subscription_id, "sub_1");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let f = fixture();

        let err = f
            .handler
            .handle(GetSubscriptionHistoryQuery {
                user_id: UserId::new().to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err, BillingError::NotFound("User".to_string()));
    }

    #[tokio::test]
    async fn unparsable_id_is_not_found() {
        let f = fixture();

        let err = f
            .handler
            .handle(GetSubscriptionHistoryQuery {
                user_id: "not-a-uuid".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err, BillingError::NotFound("User".to_string()));
    }
}
