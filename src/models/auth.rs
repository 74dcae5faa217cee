//! Token claims and the authenticated request extractor.

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::permission::Permission;
use crate::domain::types::{TenantId, UserId};
use crate::domain::user::{Role, User};
use crate::models::config::ServerConfig;
use crate::repository::{DieselRepository, UserReader};
use crate::services::ServiceError;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: i32,
    pub tenant_id: i32,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token. `jti` keeps tokens issued within the
/// same second distinct.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshClaims {
    pub sub: i32,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_access_token(user: &User, config: &ServerConfig) -> Result<String, ServiceError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id.get(),
        tenant_id: user.tenant_id.get(),
        email: user.email.to_string(),
        role: user.role.as_str().to_string(),
        iat: now,
        exp: now + config.access_token_ttl_secs,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ServiceError::Internal(format!("JWT encode: {e}")))
}

pub fn decode_access_token(token: &str, config: &ServerConfig) -> Result<Claims, ServiceError> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|_| ServiceError::Unauthorized)
}

/// Issues a refresh token and returns it with its expiry timestamp.
pub fn issue_refresh_token(
    user_id: UserId,
    config: &ServerConfig,
) -> Result<(String, i64), ServiceError> {
    let now = Utc::now().timestamp();
    let claims = RefreshClaims {
        sub: user_id.get(),
        jti: Uuid::new_v4().to_string(),
        iat: now,
        exp: now + config.refresh_token_ttl_secs,
    };

    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_refresh_secret.as_bytes()),
    )
    .map_err(|e| ServiceError::Internal(format!("JWT encode: {e}")))?;

    Ok((token, claims.exp))
}

pub fn decode_refresh_token(
    token: &str,
    config: &ServerConfig,
) -> Result<RefreshClaims, ServiceError> {
    jsonwebtoken::decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_refresh_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|_| ServiceError::Unauthorized)
}

/// SHA-256 hex digest stored instead of the raw refresh token.
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// Argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(format!("Password hashing failed: {e}")))
}

/// A malformed stored hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            log::error!("Stored password hash is malformed: {err}");
            false
        }
    }
}

/// Caller resolved from a bearer token whose user is still active.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub email: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            tenant_id: user.tenant_id,
            email: user.email.to_string(),
            role: user.role,
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, ServiceError> {
    let config = req
        .app_data::<web::Data<ServerConfig>>()
        .ok_or_else(|| ServiceError::Internal("Server config is not registered".to_string()))?;
    let repo = req
        .app_data::<web::Data<DieselRepository>>()
        .ok_or_else(|| ServiceError::Internal("Repository is not registered".to_string()))?;

    let token = bearer_token(req).ok_or(ServiceError::Unauthorized)?;
    let claims = decode_access_token(token, config)?;

    let user_id = UserId::new(claims.sub).map_err(|_| ServiceError::Unauthorized)?;
    let tenant_id = TenantId::new(claims.tenant_id).map_err(|_| ServiceError::Unauthorized)?;

    let user = repo
        .get_user_by_id(user_id, tenant_id)
        .map_err(|err| {
            log::error!("Failed to load authenticated user: {err}");
            ServiceError::from(err)
        })?
        .filter(User::is_active)
        .ok_or(ServiceError::Unauthorized)?;

    Ok(AuthenticatedUser::from(&user))
}

impl FromRequest for AuthenticatedUser {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            address: "127.0.0.1".into(),
            port: 8080,
            database_url: ":memory:".into(),
            jwt_secret: "access-secret".into(),
            jwt_refresh_secret: "refresh-secret".into(),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 3600,
            payment_webhook_secret: None,
            public_url: "http://localhost".into(),
            notification_poll_secs: 4,
        }
    }

    #[test]
    fn refresh_tokens_are_not_access_tokens() {
        let config = config();
        let (token, _) = issue_refresh_token(UserId::new(5).unwrap(), &config).unwrap();

        assert_eq!(decode_refresh_token(&token, &config).unwrap().sub, 5);
        assert!(matches!(
            decode_access_token(&token, &config),
            Err(ServiceError::Unauthorized)
        ));
    }

    #[test]
    fn refresh_tokens_are_unique() {
        let config = config();
        let user = UserId::new(5).unwrap();
        let (first, _) = issue_refresh_token(user, &config).unwrap();
        let (second, _) = issue_refresh_token(user, &config).unwrap();
        assert_ne!(hash_token(&first), hash_token(&second));
    }

    #[test]
    fn token_hash_is_hex_sha256() {
        let digest = hash_token("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn passwords_verify_against_their_hash() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
