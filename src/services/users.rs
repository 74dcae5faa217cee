use chrono::{Duration, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;

use crate::domain::permission::Permission;
use crate::domain::user::{NewUser, TEMPORARY_PASSWORD_TTL_DAYS, User, UserStatus};
use crate::dto::users::InvitedUser;
use crate::forms::users::{InviteUserForm, InviteUserPayload};
use crate::models::auth::{AuthenticatedUser, hash_password};
use crate::repository::{UserReader, UserWriter};
use crate::services::{ServiceError, ServiceResult, ensure_permission, log_failure};

const TEMPORARY_PASSWORD_LENGTH: usize = 12;

fn temporary_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TEMPORARY_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

pub fn list_users<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<User>>
where
    R: UserReader + ?Sized,
{
    ensure_permission(user, Permission::UsersEdit)?;
    repo.list_users(user.tenant_id)
        .map_err(log_failure("list users"))
}

/// Creates an INVITED user holding a temporary password that is returned
/// exactly once.
pub fn invite_user<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: InviteUserForm,
) -> ServiceResult<InvitedUser>
where
    R: UserReader + UserWriter + ?Sized,
{
    ensure_permission(user, Permission::UsersInvite)?;
    let payload = InviteUserPayload::try_from(form)?;

    if repo
        .get_user_by_email(&payload.email)
        .map_err(log_failure("check existing user"))?
        .is_some()
    {
        return Err(ServiceError::Conflict("User already exists".to_string()));
    }

    let password = temporary_password();
    let new_user = NewUser {
        tenant_id: user.tenant_id,
        email: payload.email,
        first_name: payload.first_name,
        last_name: payload.last_name,
        phone: payload.phone,
        role: payload.role,
        status: UserStatus::Invited,
        password_hash: None,
        temporary_password_hash: Some(hash_password(&password)?),
        temporary_password_expires_at: Some(
            Utc::now().naive_utc() + Duration::days(TEMPORARY_PASSWORD_TTL_DAYS),
        ),
    };

    let created = repo
        .create_user(&new_user)
        .map_err(log_failure("create invited user"))?;

    log::info!("User {} invited user {}", user.id, created.id);

    Ok(InvitedUser {
        user: created,
        temporary_password: password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::Role;
    use crate::models::auth::verify_password;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{admin_user, stored_user, user_with_role};

    fn invite_form() -> InviteUserForm {
        InviteUserForm {
            email: "new.tech@example.com".into(),
            first_name: "New".into(),
            last_name: "Tech".into(),
            phone: None,
            role: Role::Field,
        }
    }

    #[test]
    fn temporary_passwords_are_alphanumeric() {
        let password = temporary_password();
        assert_eq!(password.len(), TEMPORARY_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn invite_returns_temporary_password_once() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_email().returning(|_| Ok(None));
        repo.expect_create_user()
            .withf(|new_user| {
                new_user.status == UserStatus::Invited
                    && new_user.password_hash.is_none()
                    && new_user.temporary_password_expires_at.is_some()
            })
            .times(1)
            .returning(|new_user| {
                let mut user = stored_user(9, new_user.role, new_user.status);
                user.temporary_password_hash = new_user.temporary_password_hash.clone();
                Ok(user)
            });

        let invited = invite_user(&repo, &admin_user(), invite_form()).unwrap();

        let hash = invited.user.temporary_password_hash.clone().unwrap();
        assert!(verify_password(&invited.temporary_password, &hash));
    }

    #[test]
    fn duplicate_email_conflicts() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_email()
            .returning(|_| Ok(Some(stored_user(3, Role::Field, UserStatus::Active))));
        repo.expect_create_user().times(0);

        let result = invite_user(&repo, &admin_user(), invite_form());

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[test]
    fn invite_requires_permission() {
        let repo = MockRepository::new();
        let result = invite_user(&repo, &user_with_role(Role::Office), invite_form());
        assert!(matches!(result, Err(ServiceError::Forbidden)));
    }
}
