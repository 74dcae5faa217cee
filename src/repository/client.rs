use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::{
        client::{Client, ClientMatchCriteria, NewClient, UpdateClient},
        types::{ClientId, TenantId},
    },
    models::client::{
        Client as DbClient, NewClient as DbNewClient, UpdateClient as DbUpdateClient,
    },
    repository::{
        ClientListQuery, ClientReader, ClientWriter, DieselRepository,
        errors::{RepositoryError, RepositoryResult},
    },
};

/// Looks for an existing client of the tenant matching the criteria.
///
/// Email wins over phone, phone over name. A name match also requires the
/// company when one is given.
pub(crate) fn find_matching_client(
    conn: &mut SqliteConnection,
    criteria: &ClientMatchCriteria,
) -> RepositoryResult<Option<Client>> {
    use crate::schema::clients;

    let tenant_id = criteria.tenant_id.get();

    if let Some(email) = &criteria.email {
        let found = clients::table
            .filter(clients::tenant_id.eq(tenant_id))
            .filter(clients::email.eq(email.as_str()))
            .order(clients::id.asc())
            .first::<DbClient>(conn)
            .optional()?;
        if let Some(found) = found {
            return Ok(Some(Client::try_from(found)?));
        }
    }

    if let Some(phone) = &criteria.phone_normalized {
        let found = clients::table
            .filter(clients::tenant_id.eq(tenant_id))
            .filter(clients::phone_normalized.eq(phone))
            .order(clients::id.asc())
            .first::<DbClient>(conn)
            .optional()?;
        if let Some(found) = found {
            return Ok(Some(Client::try_from(found)?));
        }
    }

    let mut by_name = clients::table
        .filter(clients::tenant_id.eq(tenant_id))
        .filter(clients::name.eq(criteria.name.as_str()))
        .into_boxed();
    if let Some(company) = &criteria.company_name {
        by_name = by_name.filter(clients::company_name.eq(company));
    }
    let found = by_name
        .order(clients::id.asc())
        .first::<DbClient>(conn)
        .optional()?;

    found.map(Client::try_from).transpose().map_err(RepositoryError::from)
}

pub(crate) fn insert_client(
    conn: &mut SqliteConnection,
    new_client: &NewClient,
) -> RepositoryResult<Client> {
    use crate::schema::clients;

    let insertable = DbNewClient::from(new_client);
    let created = diesel::insert_into(clients::table)
        .values(&insertable)
        .get_result::<DbClient>(conn)?;

    Ok(Client::try_from(created)?)
}

pub(crate) fn find_client(
    conn: &mut SqliteConnection,
    id: i32,
    tenant_id: i32,
) -> RepositoryResult<Option<Client>> {
    use crate::schema::clients;

    let client = clients::table
        .filter(clients::id.eq(id))
        .filter(clients::tenant_id.eq(tenant_id))
        .first::<DbClient>(conn)
        .optional()?;

    client.map(Client::try_from).transpose().map_err(RepositoryError::from)
}

impl ClientReader for DieselRepository {
    fn get_client_by_id(
        &self,
        id: ClientId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Client>> {
        let mut conn = self.conn()?;
        find_client(&mut conn, id.get(), tenant_id.get())
    }

    fn list_clients(&self, query: ClientListQuery) -> RepositoryResult<(usize, Vec<Client>)> {
        use crate::schema::clients;

        let mut conn = self.conn()?;

        let filtered = || {
            let mut items = clients::table
                .filter(clients::tenant_id.eq(query.tenant_id.get()))
                .into_boxed();

            if let Some(is_active) = query.is_active {
                items = items.filter(clients::is_active.eq(is_active));
            }

            if let Some(term) = &query.search {
                let pattern = format!("%{term}%");
                items = items.filter(
                    clients::name
                        .like(pattern.clone())
                        .or(clients::company_name.like(pattern.clone()))
                        .or(clients::email.like(pattern.clone()))
                        .or(clients::phone.like(pattern.clone()))
                        .or(clients::address.like(pattern)),
                );
            }

            items
        };

        let total = filtered().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = filtered().order((clients::updated_at.desc(), clients::id.desc()));

        if let Some(page) = &query.pagination {
            items = items.limit(page.limit as i64).offset(page.offset() as i64);
        }

        let items = items
            .load::<DbClient>(&mut conn)?
            .into_iter()
            .map(|db_client| Client::try_from(db_client).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total, items))
    }

    fn find_matching_client(
        &self,
        criteria: &ClientMatchCriteria,
    ) -> RepositoryResult<Option<Client>> {
        let mut conn = self.conn()?;
        find_matching_client(&mut conn, criteria)
    }
}

impl ClientWriter for DieselRepository {
    fn create_client(&self, new_client: &NewClient) -> RepositoryResult<Client> {
        let mut conn = self.conn()?;
        insert_client(&mut conn, new_client)
    }

    fn update_client(
        &self,
        id: ClientId,
        tenant_id: TenantId,
        updates: &UpdateClient,
    ) -> RepositoryResult<Client> {
        use crate::schema::clients;

        let mut conn = self.conn()?;
        let changes = DbUpdateClient::from_domain(updates, Utc::now().naive_utc());

        let updated = diesel::update(
            clients::table
                .filter(clients::id.eq(id.get()))
                .filter(clients::tenant_id.eq(tenant_id.get())),
        )
        .set(&changes)
        .get_result::<DbClient>(&mut conn)?;

        Ok(Client::try_from(updated)?)
    }

    fn delete_client(&self, id: ClientId, tenant_id: TenantId) -> RepositoryResult<()> {
        use crate::schema::clients;

        let mut conn = self.conn()?;

        let deleted = diesel::delete(
            clients::table
                .filter(clients::id.eq(id.get()))
                .filter(clients::tenant_id.eq(tenant_id.get())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
