use crate::domain::client::Client;
use crate::domain::permission::Permission;
use crate::domain::types::ClientId;
use crate::dto::{CsvFile, Listing};
use crate::forms::clients::{ClientForm, ClientListParams};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{ClientListQuery, ClientReader, ClientWriter};
use crate::services::{
    ServiceError, ServiceResult, ensure_permission, log_failure, write_csv, yes_no,
};

pub const CLIENT_CSV_HEADERS: [&str; 8] = [
    "Name", "Company", "Email", "Phone", "Address", "Notes", "Active", "Created",
];

pub fn list_clients<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: ClientListParams,
) -> ServiceResult<Listing<Client>>
where
    R: ClientReader + ?Sized,
{
    ensure_permission(user, Permission::ClientsViewAll)?;

    let page = params.page_request();
    let mut query = ClientListQuery::new(user.tenant_id).paginate(page);
    if let Some(term) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.search(term);
    }
    if let Some(active) = params.active {
        query = query.active(active);
    }

    let (total, clients) = repo
        .list_clients(query)
        .map_err(log_failure("list clients"))?;
    Ok(Listing::new(total, clients, page))
}

pub fn get_client<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<Client>
where
    R: ClientReader + ?Sized,
{
    ensure_permission(user, Permission::ClientsViewAll)?;
    let id = ClientId::new(id).map_err(|_| ServiceError::NotFound)?;
    repo.get_client_by_id(id, user.tenant_id)
        .map_err(log_failure("load client"))?
        .ok_or(ServiceError::NotFound)
}

pub fn create_client<R>(repo: &R, user: &AuthenticatedUser, form: ClientForm) -> ServiceResult<Client>
where
    R: ClientWriter + ?Sized,
{
    ensure_permission(user, Permission::ClientsCreate)?;
    let new_client = form.into_new_client(user.tenant_id)?;
    let client = repo
        .create_client(&new_client)
        .map_err(log_failure("create client"))?;
    log::info!("User {} created client {}", user.id, client.id);
    Ok(client)
}

pub fn update_client<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: ClientForm,
) -> ServiceResult<Client>
where
    R: ClientWriter + ?Sized,
{
    ensure_permission(user, Permission::ClientsEdit)?;
    let id = ClientId::new(id).map_err(|_| ServiceError::NotFound)?;
    let updates = form.into_update()?;
    repo.update_client(id, user.tenant_id, &updates)
        .map_err(log_failure("update client"))
}

pub fn delete_client<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: ClientWriter + ?Sized,
{
    ensure_permission(user, Permission::ClientsDelete)?;
    let id = ClientId::new(id).map_err(|_| ServiceError::NotFound)?;
    repo.delete_client(id, user.tenant_id)
        .map_err(log_failure("delete client"))?;
    log::info!("User {} deleted client {}", user.id, id);
    Ok(())
}

/// Every client of the tenant as CSV.
pub fn export_clients<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<CsvFile>
where
    R: ClientReader + ?Sized,
{
    ensure_permission(user, Permission::ClientsViewAll)?;

    let (_, clients) = repo
        .list_clients(ClientListQuery::new(user.tenant_id))
        .map_err(log_failure("export clients"))?;

    let rows = clients.into_iter().map(|client| {
        vec![
            client.name.into_inner(),
            client.company_name.unwrap_or_default(),
            client.email.map(|e| e.into_inner()).unwrap_or_default(),
            client.phone.unwrap_or_default(),
            client.address.unwrap_or_default(),
            client.notes.unwrap_or_default(),
            yes_no(client.is_active),
            client.created_at.format("%Y-%m-%d").to_string(),
        ]
    });

    write_csv("clients", &CLIENT_CSV_HEADERS, rows)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::types::{ClientName, EmailAddress};
    use crate::domain::user::Role;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{admin_user, tenant, user_with_role};

    fn sample_client(id: i32, name: &str) -> Client {
        let now = Utc::now().naive_utc();
        Client {
            id: ClientId::new(id).unwrap(),
            tenant_id: tenant(),
            name: ClientName::new(name).unwrap(),
            company_name: Some("Oak, Pine & Co".into()),
            email: Some(EmailAddress::new("home@example.com").unwrap()),
            phone: None,
            address: None,
            notes: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn list_passes_filters_and_page() {
        let mut repo = MockRepository::new();
        repo.expect_list_clients()
            .withf(|query| {
                query.search.as_deref() == Some("oak")
                    && query.is_active == Some(true)
                    && query.pagination.map(|p| p.page) == Some(2)
            })
            .times(1)
            .returning(|_| Ok((51, vec![sample_client(1, "Oak House")])));

        let params = ClientListParams {
            page: Some(2),
            limit: None,
            search: Some("  oak ".into()),
            active: Some(true),
        };
        let listing = list_clients(&repo, &admin_user(), params).unwrap();

        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.pagination.total, 51);
        assert!(!listing.pagination.has_more);
    }

    #[test]
    fn missing_client_is_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_get_client_by_id().returning(|_, _| Ok(None));

        assert!(matches!(
            get_client(&repo, &admin_user(), 7),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn field_staff_cannot_create_clients() {
        let repo = MockRepository::new();
        let form = ClientForm {
            name: "New".into(),
            company_name: None,
            email: None,
            phone: None,
            address: None,
            notes: None,
            is_active: None,
        };

        let result = create_client(&repo, &user_with_role(Role::Field), form);

        assert!(matches!(result, Err(ServiceError::Forbidden)));
    }

    #[test]
    fn export_quotes_fields_with_commas() {
        let mut repo = MockRepository::new();
        repo.expect_list_clients()
            .withf(|query| query.pagination.is_none())
            .returning(|_| Ok((1, vec![sample_client(1, "Oak House")])));

        let file = export_clients(&repo, &admin_user()).unwrap();
        let text = String::from_utf8(file.content).unwrap();

        assert!(file.filename.starts_with("clients-export-"));
        assert!(text.starts_with("Name,Company,Email,Phone,Address,Notes,Active,Created\n"));
        assert!(text.contains("Oak House,\"Oak, Pine & Co\",home@example.com,,,,Yes,"));
    }
}
