use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::{
        tenant::{NewTenant, Tenant},
        types::TenantId,
    },
    models::tenant::{NewTenant as DbNewTenant, Tenant as DbTenant},
    repository::{
        DieselRepository, TenantReader,
        errors::{RepositoryError, RepositoryResult},
    },
};

/// Returns the tenant with the subdomain of `tenant`, creating it first
/// when it does not exist.
pub(crate) fn get_or_create_tenant(
    conn: &mut SqliteConnection,
    tenant: &NewTenant,
) -> RepositoryResult<Tenant> {
    use crate::schema::tenants;

    let existing = tenants::table
        .filter(tenants::subdomain.eq(tenant.subdomain.as_str()))
        .first::<DbTenant>(conn)
        .optional()?;

    let row = match existing {
        Some(row) => row,
        None => diesel::insert_into(tenants::table)
            .values(&DbNewTenant::from(tenant))
            .get_result::<DbTenant>(conn)?,
    };

    Ok(Tenant::try_from(row)?)
}

impl TenantReader for DieselRepository {
    fn get_tenant_by_id(&self, id: TenantId) -> RepositoryResult<Option<Tenant>> {
        use crate::schema::tenants;

        let mut conn = self.conn()?;

        let tenant = tenants::table
            .find(id.get())
            .first::<DbTenant>(&mut conn)
            .optional()?;

        tenant.map(Tenant::try_from).transpose().map_err(RepositoryError::from)
    }
}
