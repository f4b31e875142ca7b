use async_trait::async_trait;
use web_push::{HyperWebPushClient, WebPushClient, WebPushError, WebPushMessage};

#[derive(Debug)]
pub enum PushFailure {
    /// The push service no longer knows the endpoint (404/410).
    Gone,
    Failed(String),
}

/// Delivers an already signed and encrypted message to a push service.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, endpoint: &str, message: WebPushMessage) -> Result<(), PushFailure>;
}

pub struct HyperPushSender {
    client: HyperWebPushClient,
}

impl HyperPushSender {
    pub fn new() -> Self {
        Self {
            client: HyperWebPushClient::new(),
        }
    }
}

impl Default for HyperPushSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushSender for HyperPushSender {
    async fn send(&self, _endpoint: &str, message: WebPushMessage) -> Result<(), PushFailure> {
        self.client.send(message).await.map_err(|e| match e {
            WebPushError::EndpointNotFound { .. } | WebPushError::EndpointNotValid { .. } => {
                PushFailure::Gone
            }
            other => PushFailure::Failed(other.to_string()),
        })
    }
}
