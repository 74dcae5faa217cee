//! Login, token rotation and password management.

use chrono::{DateTime, NaiveDateTime, Utc};
use validator::Validate;

use crate::domain::tenant::{NewTenant, Tenant};
use crate::domain::types::{EmailAddress, UserId};
use crate::domain::user::{AdminAccount, NewRefreshToken, User, UserStatus};
use crate::dto::auth::{LoginOutcome, LoginResponse, PermissionsResponse, SessionUser, TokenPair};
use crate::forms::FormError;
use crate::forms::auth::{BootstrapAdminForm, LoginForm, LogoutForm, RefreshForm, SetPasswordForm};
use crate::models::auth::{
    AuthenticatedUser, decode_refresh_token, hash_password, hash_token, issue_access_token,
    issue_refresh_token, verify_password,
};
use crate::models::config::ServerConfig;
use crate::repository::{
    RefreshTokenReader, RefreshTokenWriter, TenantReader, UserReader, UserWriter,
};
use crate::services::{ServiceError, ServiceResult, log_failure};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

fn expiry(timestamp: i64) -> ServiceResult<NaiveDateTime> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|at| at.naive_utc())
        .ok_or_else(|| ServiceError::Internal(format!("Invalid token expiry {timestamp}")))
}

fn new_tokens(user: &User, config: &ServerConfig) -> ServiceResult<(TokenPair, NewRefreshToken)> {
    let access_token = issue_access_token(user, config)?;
    let (refresh_token, expires_at) = issue_refresh_token(user.id, config)?;
    let stored = NewRefreshToken {
        user_id: user.id,
        token_hash: hash_token(&refresh_token),
        expires_at: expiry(expires_at)?,
    };
    Ok((
        TokenPair {
            access_token,
            refresh_token,
        },
        stored,
    ))
}

/// Checks credentials and opens a session.
///
/// Invited users signing in with their temporary password are told to
/// choose a password instead of receiving tokens.
pub fn login<R>(repo: &R, config: &ServerConfig, form: LoginForm) -> ServiceResult<LoginOutcome>
where
    R: UserReader + UserWriter + TenantReader + RefreshTokenWriter + ?Sized,
{
    form.validate().map_err(FormError::from)?;

    let invalid = ServiceError::AuthenticationFailed(INVALID_CREDENTIALS);
    let Ok(email) = EmailAddress::new(form.email) else {
        return Err(invalid);
    };

    let user = repo
        .get_user_by_email(&email)
        .map_err(log_failure("load user for login"))?
        .filter(|user| user.status != UserStatus::Inactive)
        .ok_or(ServiceError::AuthenticationFailed(INVALID_CREDENTIALS))?;

    let now = Utc::now().naive_utc();
    if let Some(temporary) = user.active_temporary_password(now) {
        if verify_password(&form.password, temporary) {
            return Ok(LoginOutcome::PasswordChangeRequired { user_id: user.id });
        }
    }

    let password_ok = user.is_active()
        && user
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(&form.password, hash));
    if !password_ok {
        log::warn!("Rejected login for user {}", user.id);
        return Err(invalid);
    }

    let (tokens, stored) = new_tokens(&user, config)?;
    repo.create_refresh_token(&stored)
        .map_err(log_failure("store refresh token"))?;
    repo.record_login(user.id, now)
        .map_err(log_failure("record login"))?;

    let tenant_name = repo
        .get_tenant_by_id(user.tenant_id)
        .map_err(log_failure("load tenant"))?
        .map(|tenant| tenant.name)
        .unwrap_or_default();

    log::info!("User {} logged in", user.id);

    Ok(LoginOutcome::Authenticated(LoginResponse {
        tokens,
        user: SessionUser::new(&user, tenant_name),
    }))
}

/// Exchanges a refresh token for a new token pair. The presented token is
/// consumed either way.
pub fn refresh<R>(repo: &R, config: &ServerConfig, form: RefreshForm) -> ServiceResult<TokenPair>
where
    R: UserReader + RefreshTokenReader + RefreshTokenWriter + ?Sized,
{
    let claims = decode_refresh_token(&form.refresh_token, config)
        .map_err(|_| ServiceError::AuthenticationFailed("Invalid refresh token"))?;
    let token_hash = hash_token(&form.refresh_token);
    let now = Utc::now().naive_utc();

    let stored = repo
        .get_refresh_token(&token_hash)
        .map_err(log_failure("load refresh token"))?
        .filter(|token| token.expires_at > now && token.user_id.get() == claims.sub);
    let Some(stored) = stored else {
        repo.delete_refresh_token(&token_hash)
            .map_err(log_failure("delete refresh token"))?;
        return Err(ServiceError::AuthenticationFailed("Refresh token expired"));
    };

    let user = repo
        .find_user(stored.user_id)
        .map_err(log_failure("load user for refresh"))?
        .filter(User::is_active);
    let Some(user) = user else {
        repo.delete_refresh_token(&token_hash)
            .map_err(log_failure("delete refresh token"))?;
        return Err(ServiceError::AuthenticationFailed("User is not active"));
    };

    let (tokens, replacement) = new_tokens(&user, config)?;
    repo.rotate_refresh_token(&token_hash, &replacement)
        .map_err(log_failure("rotate refresh token"))?;

    Ok(tokens)
}

pub fn logout<R>(repo: &R, form: LogoutForm) -> ServiceResult<()>
where
    R: RefreshTokenWriter + ?Sized,
{
    if let Some(token) = form.refresh_token {
        repo.delete_refresh_token(&hash_token(&token))
            .map_err(log_failure("delete refresh token"))?;
    }
    Ok(())
}

/// Replaces a temporary or existing password. A pending temporary password
/// must be presented and still valid.
pub fn set_password<R>(repo: &R, form: SetPasswordForm) -> ServiceResult<()>
where
    R: UserReader + UserWriter + ?Sized,
{
    form.validate().map_err(FormError::from)?;

    let user_id = UserId::new(form.user_id).map_err(|_| ServiceError::NotFound)?;
    let user = repo
        .find_user(user_id)
        .map_err(log_failure("load user"))?
        .ok_or(ServiceError::NotFound)?;

    if let Some(temporary_hash) = user.temporary_password_hash.as_deref() {
        let Some(supplied) = form.temporary_password.as_deref() else {
            return Err(ServiceError::Forbidden);
        };
        if !verify_password(supplied, temporary_hash) {
            return Err(ServiceError::AuthenticationFailed(
                "Invalid temporary password",
            ));
        }
        let expired = user
            .temporary_password_expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now().naive_utc());
        if expired {
            return Err(ServiceError::AuthenticationFailed(
                "Temporary password has expired",
            ));
        }
    }

    let password_hash = hash_password(&form.new_password)?;
    repo.set_user_password(user.id, &password_hash)
        .map_err(log_failure("store password"))?;

    log::info!("User {} set a new password", user.id);
    Ok(())
}

pub fn permissions(user: &AuthenticatedUser) -> PermissionsResponse {
    PermissionsResponse::for_role(user.role)
}

/// Creates the first administrator. Refused once any admin exists.
pub fn bootstrap_admin<R>(repo: &R, form: BootstrapAdminForm) -> ServiceResult<(Tenant, User)>
where
    R: UserReader + UserWriter + ?Sized,
{
    form.validate().map_err(FormError::from)?;

    if repo
        .admin_exists()
        .map_err(log_failure("check for admin"))?
    {
        return Err(ServiceError::Validation(
            "Admin user already exists".to_string(),
        ));
    }

    let account = AdminAccount {
        email: EmailAddress::new(form.email).map_err(|_| FormError::InvalidEmail)?,
        first_name: non_blank(form.first_name, "Admin"),
        last_name: non_blank(form.last_name, "User"),
        password_hash: hash_password(&form.password)?,
    };

    let (tenant, admin) = repo
        .bootstrap_admin(&NewTenant::default_tenant(), &account)
        .map_err(log_failure("bootstrap admin"))?;

    log::info!("Bootstrapped admin {} in tenant {}", admin.id, tenant.id);
    Ok((tenant, admin))
}

fn non_blank(value: Option<String>, fallback: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::domain::user::{RefreshToken, Role};
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{admin_user, server_config, stored_user, tenant};

    fn login_form(password: &str) -> LoginForm {
        LoginForm {
            email: "User2@Example.com".into(),
            password: password.into(),
        }
    }

    fn active_with_password(password: &str) -> User {
        let mut user = stored_user(2, Role::Office, UserStatus::Active);
        user.password_hash = Some(hash_password(password).unwrap());
        user
    }

    #[test]
    fn login_issues_tokens_and_records_login() {
        let mut repo = MockRepository::new();
        let user = active_with_password("s3cret-pass");
        repo.expect_get_user_by_email()
            .withf(|email| email.as_str() == "user2@example.com")
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_create_refresh_token()
            .times(1)
            .returning(|token| {
                Ok(RefreshToken {
                    id: 1,
                    user_id: token.user_id,
                    token_hash: token.token_hash.clone(),
                    expires_at: token.expires_at,
                    created_at: Utc::now().naive_utc(),
                })
            });
        repo.expect_record_login().times(1).returning(|_, _| Ok(()));
        repo.expect_get_tenant_by_id().times(1).returning(|id| {
            Ok(Some(Tenant {
                id,
                name: "Acme Trim".into(),
                subdomain: "acme".into(),
                is_active: true,
                created_at: Utc::now().naive_utc(),
            }))
        });

        let outcome = login(&repo, &server_config(), login_form("s3cret-pass")).unwrap();

        match outcome {
            LoginOutcome::Authenticated(response) => {
                assert_eq!(response.user.tenant_name, "Acme Trim");
                assert!(!response.tokens.access_token.is_empty());
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn wrong_password_is_rejected() {
        let mut repo = MockRepository::new();
        let user = active_with_password("s3cret-pass");
        repo.expect_get_user_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_create_refresh_token().times(0);

        let result = login(&repo, &server_config(), login_form("nope-nope"));

        assert!(matches!(
            result,
            Err(ServiceError::AuthenticationFailed(INVALID_CREDENTIALS))
        ));
    }

    #[test]
    fn temporary_password_requires_change() {
        let mut repo = MockRepository::new();
        let mut user = stored_user(2, Role::Field, UserStatus::Invited);
        user.temporary_password_hash = Some(hash_password("Temp-1234567").unwrap());
        user.temporary_password_expires_at = Some(Utc::now().naive_utc() + Duration::days(3));
        repo.expect_get_user_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let outcome = login(&repo, &server_config(), login_form("Temp-1234567")).unwrap();

        assert_eq!(
            outcome,
            LoginOutcome::PasswordChangeRequired {
                user_id: UserId::new(2).unwrap()
            }
        );
    }

    #[test]
    fn inactive_user_cannot_log_in() {
        let mut repo = MockRepository::new();
        let mut user = stored_user(2, Role::Field, UserStatus::Inactive);
        user.temporary_password_hash = Some(hash_password("Temp-1234567").unwrap());
        user.temporary_password_expires_at = Some(Utc::now().naive_utc() + Duration::days(3));
        repo.expect_get_user_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_create_refresh_token().times(0);

        let result = login(&repo, &server_config(), login_form("Temp-1234567"));

        assert!(matches!(
            result,
            Err(ServiceError::AuthenticationFailed(INVALID_CREDENTIALS))
        ));
    }

    #[test]
    fn expired_refresh_token_is_deleted() {
        let config = server_config();
        let (token, _) = issue_refresh_token(UserId::new(2).unwrap(), &config).unwrap();
        let expected_hash = hash_token(&token);

        let mut repo = MockRepository::new();
        repo.expect_get_refresh_token().returning(|hash| {
            Ok(Some(RefreshToken {
                id: 1,
                user_id: UserId::new(2).unwrap(),
                token_hash: hash.to_string(),
                expires_at: Utc::now().naive_utc() - Duration::minutes(1),
                created_at: Utc::now().naive_utc(),
            }))
        });
        repo.expect_delete_refresh_token()
            .withf(move |hash| hash == expected_hash)
            .times(1)
            .returning(|_| Ok(1));
        repo.expect_rotate_refresh_token().times(0);

        let result = refresh(&repo, &config, RefreshForm {
            refresh_token: token,
        });

        assert!(matches!(
            result,
            Err(ServiceError::AuthenticationFailed("Refresh token expired"))
        ));
    }

    #[test]
    fn refresh_rotates_the_stored_token() {
        let config = server_config();
        let (token, _) = issue_refresh_token(UserId::new(2).unwrap(), &config).unwrap();
        let old_hash = hash_token(&token);

        let mut repo = MockRepository::new();
        repo.expect_get_refresh_token().returning(|hash| {
            Ok(Some(RefreshToken {
                id: 1,
                user_id: UserId::new(2).unwrap(),
                token_hash: hash.to_string(),
                expires_at: Utc::now().naive_utc() + Duration::days(1),
                created_at: Utc::now().naive_utc(),
            }))
        });
        repo.expect_find_user()
            .returning(|_| Ok(Some(stored_user(2, Role::Office, UserStatus::Active))));
        repo.expect_rotate_refresh_token()
            .withf(move |old, new| old == old_hash && new.token_hash != old_hash)
            .times(1)
            .returning(|_, new| {
                Ok(RefreshToken {
                    id: 2,
                    user_id: new.user_id,
                    token_hash: new.token_hash.clone(),
                    expires_at: new.expires_at,
                    created_at: Utc::now().naive_utc(),
                })
            });

        let tokens = refresh(&repo, &config, RefreshForm {
            refresh_token: token.clone(),
        })
        .unwrap();

        assert_ne!(tokens.refresh_token, token);
    }

    #[test]
    fn pending_temporary_password_must_be_supplied() {
        let mut repo = MockRepository::new();
        let mut user = stored_user(2, Role::Field, UserStatus::Invited);
        user.temporary_password_hash = Some(hash_password("Temp-1234567").unwrap());
        repo.expect_find_user()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_set_user_password().times(0);

        let result = set_password(&repo, SetPasswordForm {
            user_id: 2,
            temporary_password: None,
            new_password: "brand-new-pass".into(),
        });

        assert!(matches!(result, Err(ServiceError::Forbidden)));
    }

    #[test]
    fn bootstrap_is_refused_once_an_admin_exists() {
        let mut repo = MockRepository::new();
        repo.expect_admin_exists().returning(|| Ok(true));
        repo.expect_bootstrap_admin().times(0);

        let result = bootstrap_admin(&repo, BootstrapAdminForm {
            email: "owner@example.com".into(),
            password: "long-enough".into(),
            first_name: None,
            last_name: None,
        });

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn bootstrap_creates_default_tenant_admin() {
        let mut repo = MockRepository::new();
        repo.expect_admin_exists().returning(|| Ok(false));
        repo.expect_bootstrap_admin()
            .withf(|new_tenant, account| {
                new_tenant.subdomain == "default"
                    && account.first_name == "Admin"
                    && account.email.as_str() == "owner@example.com"
            })
            .times(1)
            .returning(|new_tenant, account| {
                let now = Utc::now().naive_utc();
                let tenant = Tenant {
                    id: tenant(),
                    name: new_tenant.name.clone(),
                    subdomain: new_tenant.subdomain.clone(),
                    is_active: true,
                    created_at: now,
                };
                let mut admin = stored_user(1, Role::Admin, UserStatus::Active);
                admin.email = account.email.clone();
                Ok((tenant, admin))
            });

        let (tenant, admin) = bootstrap_admin(&repo, BootstrapAdminForm {
            email: "Owner@Example.com".into(),
            password: "long-enough".into(),
            first_name: Some("  ".into()),
            last_name: None,
        })
        .unwrap();

        assert_eq!(tenant.name, "Default Tenant");
        assert_eq!(admin.role, Role::Admin);
    }

    #[test]
    fn permissions_follow_the_role() {
        let response = permissions(&admin_user());
        assert_eq!(response.role, Role::Admin);
        assert!(response.permissions.contains(&"users:invite"));
    }
}
