use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    auth::{
        roles::{Role, roles_for},
        session::JWT_LIFESPAN,
    },
    errors::AppError,
    storage::models::StoredUser,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub exp: usize,
    pub iat: usize,
    pub roles: Vec<Role>,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    pub fn is_worker(&self) -> bool {
        self.roles.contains(&Role::Worker)
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Administrator role required".to_string()))
        }
    }
}

pub struct JwtHelper {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtHelper {
    pub fn new(secret: &str) -> Self {
        JwtHelper {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }

    pub fn create_jwt(&self, user: &StoredUser) -> Result<String, jsonwebtoken::errors::Error> {
        let now = OffsetDateTime::now_utc();
        let iat = now.unix_timestamp() as usize;
        let exp = (now + JWT_LIFESPAN).unix_timestamp() as usize;

        let claims = Claims {
            sub: user.uid.clone(),
            username: user.username.clone(),
            exp,
            iat,
            roles: roles_for(user),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    pub fn decrypt_jwt(
        &self,
        token: &str,
    ) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
    }
}
