use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{EmailAddress, TenantId, UserId, string_enum};

string_enum!(
    /// Staff role determining the default permission set.
    Role {
        Admin => "ADMIN",
        Office => "OFFICE",
        Field => "FIELD",
        Sales => "SALES",
        Accounting => "ACCOUNTING",
    }
);

string_enum!(
    /// Lifecycle of a staff account.
    UserStatus {
        Active => "ACTIVE",
        Invited => "INVITED",
        Inactive => "INACTIVE",
    }
);

/// Days a temporary password stays valid after an invite.
pub const TEMPORARY_PASSWORD_TTL_DAYS: i64 = 7;
/// Minimum length accepted for a chosen password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub email: EmailAddress,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    #[serde(skip)]
    pub password_hash: Option<String>,
    #[serde(skip)]
    pub temporary_password_hash: Option<String>,
    #[serde(skip)]
    pub temporary_password_expires_at: Option<NaiveDateTime>,
    pub last_login_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// A temporary password that has not yet expired at `now`.
    pub fn active_temporary_password(&self, now: NaiveDateTime) -> Option<&str> {
        match (
            self.temporary_password_hash.as_deref(),
            self.temporary_password_expires_at,
        ) {
            (Some(hash), Some(expires_at)) if expires_at > now => Some(hash),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub tenant_id: TenantId,
    pub email: EmailAddress,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub password_hash: Option<String>,
    pub temporary_password_hash: Option<String>,
    pub temporary_password_expires_at: Option<NaiveDateTime>,
}

impl NewUser {
    /// An ACTIVE administrator of `tenant_id`.
    pub fn admin(tenant_id: TenantId, account: &AdminAccount) -> Self {
        Self {
            tenant_id,
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            phone: None,
            role: Role::Admin,
            status: UserStatus::Active,
            password_hash: Some(account.password_hash.clone()),
            temporary_password_hash: None,
            temporary_password_expires_at: None,
        }
    }
}

/// First administrator, created before any tenant exists.
#[derive(Clone, Debug)]
pub struct AdminAccount {
    pub email: EmailAddress,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

/// Stored refresh token; only the digest of the raw token is kept.
#[derive(Clone, Debug, PartialEq)]
pub struct RefreshToken {
    pub id: i32,
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct NewRefreshToken {
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn sample_user() -> User {
        let now = Utc::now().naive_utc();
        User {
            id: UserId::new(1).unwrap(),
            tenant_id: TenantId::new(1).unwrap(),
            email: EmailAddress::new("tech@example.com").unwrap(),
            first_name: "Ada".into(),
            last_name: "".into(),
            phone: None,
            role: Role::Field,
            status: UserStatus::Invited,
            password_hash: None,
            temporary_password_hash: Some("hash".into()),
            temporary_password_expires_at: Some(now + Duration::days(1)),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn temporary_password_expires() {
        let user = sample_user();
        let now = Utc::now().naive_utc();
        assert_eq!(user.active_temporary_password(now), Some("hash"));
        assert_eq!(
            user.active_temporary_password(now + Duration::days(2)),
            None
        );
    }

    #[test]
    fn full_name_trims_missing_parts() {
        assert_eq!(sample_user().full_name(), "Ada");
    }

    #[test]
    fn role_codes_parse() {
        assert_eq!("ACCOUNTING".parse::<Role>(), Ok(Role::Accounting));
        assert!("OWNER".parse::<Role>().is_err());
        assert_eq!(UserStatus::Invited.as_str(), "INVITED");
    }
}
