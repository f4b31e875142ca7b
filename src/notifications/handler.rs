use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use axum_extra::{TypedHeader, headers::UserAgent};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use web_push::{SubscriptionInfo, SubscriptionKeys};

use crate::{
    AppState,
    auth::{Claims, Role},
    errors::AppError,
    notifications::service::{DispatchReport, NotificationPayload},
};

#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionKeysRequest {
    #[serde(default)]
    pub p256dh: Option<String>,
    #[serde(default)]
    pub auth: Option<String>,
}

/// Shape of `PushSubscription.toJSON()`; every piece optional so that
/// incomplete bodies get a precise error.
#[derive(Debug, Default, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub keys: Option<SubscriptionKeysRequest>,
}

impl From<SubscribeRequest> for SubscriptionInfo {
    fn from(req: SubscribeRequest) -> Self {
        let keys = req.keys.unwrap_or_default();
        SubscriptionInfo {
            endpoint: req.endpoint.unwrap_or_default(),
            keys: SubscriptionKeys {
                p256dh: keys.p256dh.unwrap_or_default(),
                auth: keys.auth.unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub ok: bool,
    pub created: bool,
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    All,
    Admins,
    Workers,
    Users,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub audience: Audience,
    #[serde(default)]
    pub uids: Vec<String>,
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON: {}", e.body_text())))
}

/// GET /dashboard/push/public-key
pub async fn public_key_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "publicKey": state.notification_service.public_key }))
}

/// POST /dashboard/push/subscribe
pub async fn subscribe_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    user_agent: Option<TypedHeader<UserAgent>>,
    body: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Json<SubscribeResponse>, AppError> {
    let subscription = SubscriptionInfo::from(json_body(body)?);
    tracing::info!("Received subscription for {}", subscription.endpoint);
    let user_agent = user_agent.map(|TypedHeader(ua)| ua.as_str().to_string());

    let (stored, created) = state
        .notification_service
        .register(&claims.sub, &subscription, user_agent.as_deref())
        .await?;
    Ok(Json(SubscribeResponse {
        ok: true,
        created,
        id: stored.id,
    }))
}

/// POST /dashboard/push/unsubscribe
pub async fn unsubscribe_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    body: Result<Json<UnsubscribeRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let req = json_body(body)?;
    let deleted = state
        .notification_service
        .unsubscribe(&claims.sub, &req.endpoint)
        .await?;
    Ok(Json(json!({ "ok": true, "deleted": deleted })))
}

/// POST /dashboard/push/test
pub async fn test_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
) -> Result<Json<DispatchReport>, AppError> {
    let payload = NotificationPayload::new("Prueba", "Notificaciones activas en este dispositivo")
        .with_url("/dashboard/");
    let report = state
        .notification_service
        .notify_users(std::slice::from_ref(&claims.sub), &payload)
        .await?;
    Ok(Json(report))
}

/// POST /dashboard/push/send
pub async fn send_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    body: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<DispatchReport>, AppError> {
    claims.require_admin()?;
    let req = json_body(body)?;
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }

    let payload = NotificationPayload {
        title: req.title,
        body: req.body,
        url: req.url,
    };
    let service = &state.notification_service;
    let report = match req.audience {
        Audience::All => service.notify_all(&payload).await?,
        Audience::Admins => service.notify_role(Role::Admin, &payload).await?,
        Audience::Workers => service.notify_role(Role::Worker, &payload).await?,
        Audience::Users => {
            if req.uids.is_empty() {
                return Err(AppError::BadRequest(
                    "uids is required for audience 'users'".to_string(),
                ));
            }
            service.notify_users(&req.uids, &payload).await?
        }
    };
    Ok(Json(report))
}
