use async_trait::async_trait;
use time::OffsetDateTime;
use web_push::SubscriptionInfo;

use crate::{
    errors::AppError,
    storage::{memory::InMemoryStore, models::StoredSubscription, traits::NotificationStore},
};

#[async_trait]
impl NotificationStore for InMemoryStore {
    async fn upsert_subscription(
        &self,
        uid: &str,
        subscription: &SubscriptionInfo,
        user_agent: Option<&str>,
    ) -> Result<(StoredSubscription, bool), AppError> {
        let mut tables = self.write();
        let existing = tables
            .subscriptions
            .values_mut()
            .find(|s| s.endpoint == subscription.endpoint);
        if let Some(stored) = existing {
            stored.uid = uid.to_string();
            stored.p256dh = subscription.keys.p256dh.clone();
            stored.auth = subscription.keys.auth.clone();
            stored.user_agent = user_agent.map(str::to_string);
            return Ok((stored.clone(), false));
        }

        let stored = StoredSubscription {
            id: tables.next_id(),
            uid: uid.to_string(),
            endpoint: subscription.endpoint.clone(),
            p256dh: subscription.keys.p256dh.clone(),
            auth: subscription.keys.auth.clone(),
            user_agent: user_agent.map(str::to_string),
            created_at: OffsetDateTime::now_utc(),
        };
        tables.subscriptions.insert(stored.id, stored.clone());
        Ok((stored, true))
    }

    async fn subscriptions_for(
        &self,
        uids: &[String],
    ) -> Result<Vec<StoredSubscription>, AppError> {
        Ok(self
            .read()
            .subscriptions
            .values()
            .filter(|s| uids.contains(&s.uid))
            .cloned()
            .collect())
    }

    async fn delete_endpoint(&self, endpoint: &str) -> Result<bool, AppError> {
        let mut tables = self.write();
        let before = tables.subscriptions.len();
        tables.subscriptions.retain(|_, s| s.endpoint != endpoint);
        Ok(tables.subscriptions.len() != before)
    }

    async fn delete_user_endpoint(&self, uid: &str, endpoint: &str) -> Result<bool, AppError> {
        let mut tables = self.write();
        let before = tables.subscriptions.len();
        tables
            .subscriptions
            .retain(|_, s| !(s.uid == uid && s.endpoint == endpoint));
        Ok(tables.subscriptions.len() != before)
    }
}
