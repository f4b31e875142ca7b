use std::sync::Arc;

use anyhow::Context;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use web_push::{
    ContentEncoding, PartialVapidSignatureBuilder, SubscriptionInfo, VapidSignatureBuilder,
    WebPushError, WebPushMessage, WebPushMessageBuilder,
};

use crate::{
    auth::{Role, roles::has_role},
    errors::AppError,
    notifications::{
        sender::{PushFailure, PushSender},
        vapid::VapidKeys,
    },
    storage::{
        Storage,
        models::{StoredSubscription, StoredUser},
    },
};

/// Push services may drop undelivered messages after a day.
pub const PUSH_TTL: u32 = 60 * 60 * 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl NotificationPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
    pub pruned: usize,
}

enum Outcome {
    Sent,
    Failed,
    Pruned,
}

pub struct NotificationService {
    storage: Arc<Storage>,
    sender: Arc<dyn PushSender>,
    vapid: PartialVapidSignatureBuilder,
    subject: String,
    pub public_key: String,
}

impl NotificationService {
    pub fn new(
        storage: Arc<Storage>,
        sender: Arc<dyn PushSender>,
        keys: &VapidKeys,
        subject: &str,
    ) -> anyhow::Result<Self> {
        let vapid = VapidSignatureBuilder::from_pem_no_sub(keys.pem.as_bytes())
            .context("Failed to parse VAPID private key")?;
        Ok(NotificationService {
            storage,
            sender,
            vapid,
            subject: subject.to_string(),
            public_key: keys.public_key.chars().filter(|c| !c.is_whitespace()).collect(),
        })
    }

    /// Stores the subscription for `uid`, re-binding the endpoint if another
    /// user had registered it.
    pub async fn register(
        &self,
        uid: &str,
        subscription: &SubscriptionInfo,
        user_agent: Option<&str>,
    ) -> Result<(StoredSubscription, bool), AppError> {
        let complete = !subscription.endpoint.trim().is_empty()
            && !subscription.keys.p256dh.trim().is_empty()
            && !subscription.keys.auth.trim().is_empty();
        if !complete {
            return Err(AppError::BadRequest(
                "Incomplete subscription (endpoint/keys)".to_string(),
            ));
        }

        let (stored, created) = self
            .storage
            .notifications
            .upsert_subscription(uid, subscription, user_agent)
            .await?;
        info!(
            "Push subscription {} for {} ({})",
            stored.id,
            uid,
            if created { "created" } else { "updated" }
        );
        Ok((stored, created))
    }

    pub async fn unsubscribe(&self, uid: &str, endpoint: &str) -> Result<bool, AppError> {
        self.storage
            .notifications
            .delete_user_endpoint(uid, endpoint)
            .await
    }

    fn build_message(
        &self,
        subscription: &SubscriptionInfo,
        body: &[u8],
    ) -> Result<WebPushMessage, WebPushError> {
        let mut signature = self.vapid.clone().add_sub_info(subscription);
        signature.add_claim("sub", self.subject.as_str());
        let signature = signature.build()?;

        let mut message = WebPushMessageBuilder::new(subscription);
        message.set_ttl(PUSH_TTL);
        message.set_vapid_signature(signature);
        message.set_payload(ContentEncoding::Aes128Gcm, body);
        message.build()
    }

    async fn deliver(&self, subscription: StoredSubscription, body: &[u8]) -> Outcome {
        let info = subscription.subscription_info();
        let message = match self.build_message(&info, body) {
            Ok(message) => message,
            Err(e) => {
                error!("Failed to build push message for {}: {}", subscription.id, e);
                return Outcome::Failed;
            }
        };

        match self.sender.send(&subscription.endpoint, message).await {
            Ok(()) => {
                debug!("Sent notification to subscription {}", subscription.id);
                Outcome::Sent
            }
            Err(PushFailure::Gone) => {
                warn!(
                    "Push endpoint gone, pruning subscription {}",
                    subscription.id
                );
                if let Err(e) = self
                    .storage
                    .notifications
                    .delete_endpoint(&subscription.endpoint)
                    .await
                {
                    error!("Failed to prune subscription {}: {:?}", subscription.id, e);
                }
                Outcome::Pruned
            }
            Err(PushFailure::Failed(reason)) => {
                error!("Push to subscription {} failed: {}", subscription.id, reason);
                Outcome::Failed
            }
        }
    }

    /// Sends `payload` to every subscription of `uids` concurrently.
    pub async fn notify_users(
        &self,
        uids: &[String],
        payload: &NotificationPayload,
    ) -> Result<DispatchReport, AppError> {
        let subscriptions = self.storage.notifications.subscriptions_for(uids).await?;
        let body = serde_json::to_vec(payload)?;
        info!(
            "Sending {} notifications to {} users",
            subscriptions.len(),
            uids.len()
        );

        let outcomes = join_all(
            subscriptions
                .into_iter()
                .map(|subscription| self.deliver(subscription, &body)),
        )
        .await;

        let mut report = DispatchReport {
            attempted: outcomes.len(),
            ..DispatchReport::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Sent => report.sent += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::Pruned => report.pruned += 1,
            }
        }
        Ok(report)
    }

    pub async fn users_with_role(&self, role: Role) -> Result<Vec<StoredUser>, AppError> {
        let users = self.storage.users.list_users().await?;
        Ok(users.into_iter().filter(|u| has_role(u, role)).collect())
    }

    pub async fn notify_role(
        &self,
        role: Role,
        payload: &NotificationPayload,
    ) -> Result<DispatchReport, AppError> {
        let uids: Vec<String> = self
            .users_with_role(role)
            .await?
            .into_iter()
            .map(|u| u.uid)
            .collect();
        self.notify_users(&uids, payload).await
    }

    pub async fn notify_all(
        &self,
        payload: &NotificationPayload,
    ) -> Result<DispatchReport, AppError> {
        let uids: Vec<String> = self
            .storage
            .users
            .list_users()
            .await?
            .into_iter()
            .map(|u| u.uid)
            .collect();
        self.notify_users(&uids, payload).await
    }
}
