use crate::{
    auth::{
        jwt::{Claims, JwtHelper},
        local::verify_password,
        roles::roles_for,
        types::{LoginResponse, RefreshResponse},
    },
    errors::AppError,
    storage::{
        Storage,
        models::{StoredSession, StoredUser},
    },
};
use std::sync::Arc;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, info};
use uuid::Uuid;

pub const REFRESH_EXPIRATION: i64 = 60 * 60 * 24 * 31;
pub const JWT_LIFESPAN: time::Duration = time::Duration::minutes(15);

pub struct SessionManager {
    storage: Arc<Storage>,
    jwt_helper: JwtHelper,
}

impl SessionManager {
    pub fn new(jwt_secret: &str, storage: Arc<Storage>) -> Self {
        Self {
            storage,
            jwt_helper: JwtHelper::new(jwt_secret),
        }
    }

    /// Verify JWT access token and return claims
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let data = self.jwt_helper.decrypt_jwt(token);
        match data {
            Ok(token_data) => Ok(token_data.claims),
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    Err(AppError::Unauthorized("Token has expired".to_string()))
                }
                _ => Err(AppError::Unauthorized("Invalid token".to_string())),
            },
        }
    }

    fn access_token(&self, user: &StoredUser) -> Result<(String, String), AppError> {
        let access_token = self
            .jwt_helper
            .create_jwt(user)
            .map_err(|e| anyhow::anyhow!(e))?;
        let expires_at = (OffsetDateTime::now_utc() + JWT_LIFESPAN).format(&Rfc3339)?;
        Ok((access_token, expires_at))
    }

    /// Check credentials and open a refresh session.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        user_agent: &str,
    ) -> Result<LoginResponse, AppError> {
        let invalid = || AppError::Unauthorized("Invalid username or password".to_string());

        let user = self
            .storage
            .users
            .get_user_by_username(username)
            .await?
            .ok_or_else(invalid)?;
        verify_password(password, &user.password_hash)?;

        let session = StoredSession {
            token: Uuid::new_v4(),
            uid: user.uid.clone(),
            user_agent: user_agent.to_string(),
            expires_at: OffsetDateTime::now_utc() + time::Duration::seconds(REFRESH_EXPIRATION),
        };
        self.storage.sessions.create_session(&session).await?;

        let (access_token, expires_at) = self.access_token(&user)?;
        info!("User {} logged in", user.username);

        Ok(LoginResponse {
            roles: roles_for(&user),
            uid: user.uid,
            username: user.username,
            access_token,
            refresh_token: session.token,
            expires_at,
        })
    }

    /// Refresh access token using refresh token
    pub async fn refresh_token(
        &self,
        old_refresh_token: &Uuid,
        user_agent: &str,
    ) -> Result<RefreshResponse, AppError> {
        let new_token = Uuid::new_v4();
        let expires_at = OffsetDateTime::now_utc() + time::Duration::seconds(REFRESH_EXPIRATION);
        let uid = self
            .storage
            .sessions
            .rotate_session(old_refresh_token, &new_token, user_agent, expires_at)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".into()))?;

        let user = self
            .storage
            .users
            .get_user_by_uid(&uid)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".into()))?;
        let (access_token, expires_at) = self.access_token(&user)?;

        Ok(RefreshResponse {
            access_token,
            refresh_token: new_token,
            expires_at,
        })
    }

    /// Logout and invalidate refresh token
    /// Revokes one of `uid`'s refresh tokens. Tokens of other users are left alone.
    pub async fn logout(&self, refresh_token: &Uuid, uid: &str) -> Result<(), AppError> {
        if !self.storage.sessions.delete_session(refresh_token, uid).await? {
            debug!("Logout for {} did not match a session", uid);
        }
        Ok(())
    }
}
