//! Diesel models for staff users and their refresh tokens.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::{
    types::{EmailAddress, TenantId, TypeConstraintError, UserId},
    user::{
        NewRefreshToken as DomainNewRefreshToken, NewUser as DomainNewUser,
        RefreshToken as DomainRefreshToken, User as DomainUser,
    },
};

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: i32,
    pub tenant_id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    pub password_hash: Option<String>,
    pub temporary_password_hash: Option<String>,
    pub temporary_password_expires_at: Option<NaiveDateTime>,
    pub last_login_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub tenant_id: i32,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: Option<&'a str>,
    pub role: &'a str,
    pub status: &'a str,
    pub password_hash: Option<&'a str>,
    pub temporary_password_hash: Option<&'a str>,
    pub temporary_password_expires_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::refresh_tokens)]
pub struct RefreshToken {
    pub id: i32,
    pub user_id: i32,
    pub token_hash: String,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::refresh_tokens)]
pub struct NewRefreshToken<'a> {
    pub user_id: i32,
    pub token_hash: &'a str,
    pub expires_at: NaiveDateTime,
}

impl TryFrom<User> for DomainUser {
    type Error = TypeConstraintError;

    fn try_from(user: User) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(user.id)?,
            tenant_id: TenantId::new(user.tenant_id)?,
            email: EmailAddress::new(user.email)?,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            role: user.role.parse()?,
            status: user.status.parse()?,
            password_hash: user.password_hash,
            temporary_password_hash: user.temporary_password_hash,
            temporary_password_expires_at: user.temporary_password_expires_at,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewUser> for NewUser<'a> {
    fn from(user: &'a DomainNewUser) -> Self {
        Self {
            tenant_id: user.tenant_id.get(),
            email: user.email.as_str(),
            first_name: user.first_name.as_str(),
            last_name: user.last_name.as_str(),
            phone: user.phone.as_deref(),
            role: user.role.as_str(),
            status: user.status.as_str(),
            password_hash: user.password_hash.as_deref(),
            temporary_password_hash: user.temporary_password_hash.as_deref(),
            temporary_password_expires_at: user.temporary_password_expires_at,
        }
    }
}

impl TryFrom<RefreshToken> for DomainRefreshToken {
    type Error = TypeConstraintError;

    fn try_from(token: RefreshToken) -> Result<Self, Self::Error> {
        Ok(Self {
            id: token.id,
            user_id: UserId::new(token.user_id)?,
            token_hash: token.token_hash,
            expires_at: token.expires_at,
            created_at: token.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewRefreshToken> for NewRefreshToken<'a> {
    fn from(token: &'a DomainNewRefreshToken) -> Self {
        Self {
            user_id: token.user_id.get(),
            token_hash: token.token_hash.as_str(),
            expires_at: token.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::user::{Role, UserStatus};

    fn db_user(role: &str) -> User {
        let now = Utc::now().naive_utc();
        User {
            id: 5,
            tenant_id: 2,
            email: "Crew@Example.com".into(),
            first_name: "Sam".into(),
            last_name: "Reed".into(),
            phone: None,
            role: role.into(),
            status: "ACTIVE".into(),
            password_hash: Some("$argon2id$...".into()),
            temporary_password_hash: None,
            temporary_password_expires_at: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn user_into_domain_parses_codes() {
        let user = DomainUser::try_from(db_user("FIELD")).unwrap();
        assert_eq!(user.role, Role::Field);
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.email.as_str(), "crew@example.com");
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(DomainUser::try_from(db_user("OWNER")).is_err());
    }
}
