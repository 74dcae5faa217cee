use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::{
        tenant::{NewTenant, Tenant},
        types::{EmailAddress, TenantId, UserId},
        user::{AdminAccount, NewRefreshToken, NewUser, RefreshToken, Role, User, UserStatus},
    },
    models::user::{
        NewRefreshToken as DbNewRefreshToken, NewUser as DbNewUser,
        RefreshToken as DbRefreshToken, User as DbUser,
    },
    repository::{
        DieselRepository, RefreshTokenReader, RefreshTokenWriter, UserReader, UserWriter,
        errors::{RepositoryError, RepositoryResult},
        tenant::get_or_create_tenant,
    },
};

fn into_users(rows: Vec<DbUser>) -> RepositoryResult<Vec<User>> {
    rows.into_iter()
        .map(|row| User::try_from(row).map_err(RepositoryError::from))
        .collect()
}

/// Active users of the tenant holding one of `roles`.
pub(crate) fn active_users_with_roles(
    conn: &mut SqliteConnection,
    tenant_id: TenantId,
    roles: &[Role],
) -> RepositoryResult<Vec<User>> {
    use crate::schema::users;

    let roles: Vec<&str> = roles.iter().map(|role| role.as_str()).collect();

    let rows = users::table
        .filter(users::tenant_id.eq(tenant_id.get()))
        .filter(users::status.eq(UserStatus::Active.as_str()))
        .filter(users::role.eq_any(roles))
        .order(users::id.asc())
        .load::<DbUser>(conn)?;

    into_users(rows)
}

impl UserReader for DieselRepository {
    fn get_user_by_id(&self, id: UserId, tenant_id: TenantId) -> RepositoryResult<Option<User>> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let user = users::table
            .filter(users::id.eq(id.get()))
            .filter(users::tenant_id.eq(tenant_id.get()))
            .first::<DbUser>(&mut conn)
            .optional()?;

        user.map(User::try_from).transpose().map_err(RepositoryError::from)
    }

    fn get_user_by_email(&self, email: &EmailAddress) -> RepositoryResult<Option<User>> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let user = users::table
            .filter(users::email.eq(email.as_str()))
            .first::<DbUser>(&mut conn)
            .optional()?;

        user.map(User::try_from).transpose().map_err(RepositoryError::from)
    }

    fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let user = users::table
            .find(id.get())
            .first::<DbUser>(&mut conn)
            .optional()?;

        user.map(User::try_from).transpose().map_err(RepositoryError::from)
    }

    fn list_users(&self, tenant_id: TenantId) -> RepositoryResult<Vec<User>> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let rows = users::table
            .filter(users::tenant_id.eq(tenant_id.get()))
            .order((users::last_name.asc(), users::first_name.asc(), users::id.asc()))
            .load::<DbUser>(&mut conn)?;

        into_users(rows)
    }

    fn admin_exists(&self) -> RepositoryResult<bool> {
        use crate::schema::users;
        use diesel::dsl::exists;

        let mut conn = self.conn()?;

        let found = diesel::select(exists(
            users::table.filter(users::role.eq(Role::Admin.as_str())),
        ))
        .get_result::<bool>(&mut conn)?;

        Ok(found)
    }
}

impl UserWriter for DieselRepository {
    fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let created = diesel::insert_into(users::table)
            .values(&DbNewUser::from(new_user))
            .get_result::<DbUser>(&mut conn)?;

        Ok(User::try_from(created)?)
    }

    fn bootstrap_admin(
        &self,
        tenant: &NewTenant,
        admin: &AdminAccount,
    ) -> RepositoryResult<(Tenant, User)> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let tenant = get_or_create_tenant(conn, tenant)?;

            let new_user = NewUser::admin(tenant.id, admin);

            let created = diesel::insert_into(users::table)
                .values(&DbNewUser::from(&new_user))
                .get_result::<DbUser>(conn)?;

            Ok((tenant, User::try_from(created)?))
        })
    }

    fn set_user_password(&self, user_id: UserId, password_hash: &str) -> RepositoryResult<User> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let current = users::table
                .find(user_id.get())
                .first::<DbUser>(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;

            let status = if current.status == UserStatus::Invited.as_str() {
                UserStatus::Active.as_str()
            } else {
                current.status.as_str()
            };

            let updated = diesel::update(users::table.find(current.id))
                .set((
                    users::password_hash.eq(Some(password_hash)),
                    users::temporary_password_hash.eq(None::<String>),
                    users::temporary_password_expires_at.eq(None::<NaiveDateTime>),
                    users::status.eq(status),
                    users::updated_at.eq(Utc::now().naive_utc()),
                ))
                .get_result::<DbUser>(conn)?;

            Ok(User::try_from(updated)?)
        })
    }

    fn record_login(&self, user_id: UserId, at: NaiveDateTime) -> RepositoryResult<()> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        diesel::update(users::table.find(user_id.get()))
            .set(users::last_login_at.eq(Some(at)))
            .execute(&mut conn)?;

        Ok(())
    }
}

impl RefreshTokenReader for DieselRepository {
    fn get_refresh_token(&self, token_hash: &str) -> RepositoryResult<Option<RefreshToken>> {
        use crate::schema::refresh_tokens;

        let mut conn = self.conn()?;

        let token = refresh_tokens::table
            .filter(refresh_tokens::token_hash.eq(token_hash))
            .first::<DbRefreshToken>(&mut conn)
            .optional()?;

        token
            .map(RefreshToken::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }
}

impl RefreshTokenWriter for DieselRepository {
    fn create_refresh_token(&self, token: &NewRefreshToken) -> RepositoryResult<RefreshToken> {
        use crate::schema::refresh_tokens;

        let mut conn = self.conn()?;

        let created = diesel::insert_into(refresh_tokens::table)
            .values(&DbNewRefreshToken::from(token))
            .get_result::<DbRefreshToken>(&mut conn)?;

        Ok(RefreshToken::try_from(created)?)
    }

    fn delete_refresh_token(&self, token_hash: &str) -> RepositoryResult<usize> {
        use crate::schema::refresh_tokens;

        let mut conn = self.conn()?;

        let deleted = diesel::delete(
            refresh_tokens::table.filter(refresh_tokens::token_hash.eq(token_hash)),
        )
        .execute(&mut conn)?;

        Ok(deleted)
    }

    fn rotate_refresh_token(
        &self,
        old_hash: &str,
        token: &NewRefreshToken,
    ) -> RepositoryResult<RefreshToken> {
        use crate::schema::refresh_tokens;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            diesel::delete(refresh_tokens::table.filter(refresh_tokens::token_hash.eq(old_hash)))
                .execute(conn)?;

            let created = diesel::insert_into(refresh_tokens::table)
                .values(&DbNewRefreshToken::from(token))
                .get_result::<DbRefreshToken>(conn)?;

            Ok(RefreshToken::try_from(created)?)
        })
    }
}
