use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    errors::AppError,
    storage::{
        memory::{InMemoryStore, Tables},
        models::{NewUser, StoredSession, StoredUser},
        traits::{SessionStore, UserStore},
    },
};

impl Tables {
    pub(super) fn check_username(&self, username: &str) -> Result<(), AppError> {
        if self.users.values().any(|u| u.username == username) {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        Ok(())
    }

    pub(super) fn insert_user(&mut self, user: &NewUser) -> StoredUser {
        let stored = StoredUser {
            uid: user.uid.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            is_superuser: user.is_superuser,
            groups: user.groups.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.users.insert(stored.uid.clone(), stored.clone());
        stored
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get_user_by_uid(&self, uid: &str) -> Result<Option<StoredUser>, AppError> {
        Ok(self.read().users.get(uid).cloned())
    }

    async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<StoredUser>, AppError> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: &NewUser) -> Result<StoredUser, AppError> {
        let mut tables = self.write();
        tables.check_username(&user.username)?;
        Ok(tables.insert_user(user))
    }

    async fn reset_superuser(
        &self,
        uid: &str,
        password_hash: &str,
        email: Option<&str>,
    ) -> Result<(), AppError> {
        let mut tables = self.write();
        let user = tables
            .users
            .get_mut(uid)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.password_hash = password_hash.to_string();
        user.is_superuser = true;
        if let Some(email) = email {
            user.email = Some(email.to_string());
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<StoredUser>, AppError> {
        let mut users: Vec<_> = self.read().users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn create_session(&self, session: &StoredSession) -> Result<(), AppError> {
        self.write().sessions.insert(session.token, session.clone());
        Ok(())
    }

    async fn rotate_session(
        &self,
        old_token: &Uuid,
        new_token: &Uuid,
        user_agent: &str,
        expires_at: OffsetDateTime,
    ) -> Result<Option<String>, AppError> {
        let mut tables = self.write();
        let Some(old) = tables.sessions.remove(old_token) else {
            return Ok(None);
        };
        if old.expires_at <= OffsetDateTime::now_utc() {
            return Ok(None);
        }
        tables.sessions.insert(
            *new_token,
            StoredSession {
                token: *new_token,
                uid: old.uid.clone(),
                user_agent: user_agent.to_string(),
                expires_at,
            },
        );
        Ok(Some(old.uid))
    }

    async fn delete_session(&self, token: &Uuid, uid: &str) -> Result<bool, AppError> {
        let mut tables = self.write();
        if tables.sessions.get(token).is_some_and(|s| s.uid == uid) {
            tables.sessions.remove(token);
            return Ok(true);
        }
        Ok(false)
    }
}
