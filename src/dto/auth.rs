//! Payloads returned by the authentication endpoints.

use serde::Serialize;

use crate::domain::types::{TenantId, UserId};
use crate::domain::user::{Role, User};

/// User summary embedded in a login response.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub tenant_id: TenantId,
    pub tenant_name: String,
}

impl SessionUser {
    pub fn new(user: &User, tenant_name: String) -> Self {
        Self {
            id: user.id,
            email: user.email.to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            tenant_id: user.tenant_id,
            tenant_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: SessionUser,
}

/// Result of a credential check.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Authenticated(LoginResponse),
    /// The caller used a temporary password and must choose a new one.
    PasswordChangeRequired { user_id: UserId },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsResponse {
    pub role: Role,
    pub permissions: Vec<&'static str>,
}

impl PermissionsResponse {
    pub fn for_role(role: Role) -> Self {
        Self {
            role,
            permissions: role.permissions().iter().map(|p| p.as_str()).collect(),
        }
    }
}

