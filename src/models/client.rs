use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::{
    client::{Client as DomainClient, NewClient as DomainNewClient, UpdateClient as DomainUpdateClient},
    types::{ClientId, ClientName, EmailAddress, TenantId, TypeConstraintError},
};

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::clients)]
/// Diesel model for [`crate::domain::client::Client`].
pub struct Client {
    pub id: i32,
    pub tenant_id: i32,
    pub name: String,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub phone_normalized: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::clients)]
/// Insertable form of [`Client`].
pub struct NewClient<'a> {
    pub tenant_id: i32,
    pub name: &'a str,
    pub company_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub phone_normalized: Option<&'a str>,
    pub address: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub is_active: bool,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::clients)]
#[diesel(treat_none_as_null = true)]
/// Data used when updating a [`Client`] record.
pub struct UpdateClient<'a> {
    pub name: &'a str,
    pub company_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub phone_normalized: Option<&'a str>,
    pub address: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub is_active: bool,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Client> for DomainClient {
    type Error = TypeConstraintError;

    fn try_from(client: Client) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ClientId::new(client.id)?,
            tenant_id: TenantId::new(client.tenant_id)?,
            name: ClientName::new(client.name)?,
            company_name: client.company_name,
            // Rows imported before validation may carry junk; treat as absent.
            email: client.email.and_then(|e| EmailAddress::new(e).ok()),
            phone: client.phone,
            address: client.address,
            notes: client.notes,
            is_active: client.is_active,
            created_at: client.created_at,
            updated_at: client.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewClient> for NewClient<'a> {
    fn from(client: &'a DomainNewClient) -> Self {
        Self {
            tenant_id: client.tenant_id.get(),
            name: client.name.as_str(),
            company_name: client.company_name.as_deref(),
            email: client.email.as_ref().map(|e| e.as_str()),
            phone: client.phone.as_deref(),
            phone_normalized: client.phone_normalized.as_deref(),
            address: client.address.as_deref(),
            notes: client.notes.as_deref(),
            is_active: client.is_active,
        }
    }
}

impl<'a> UpdateClient<'a> {
    pub fn from_domain(client: &'a DomainUpdateClient, updated_at: NaiveDateTime) -> Self {
        Self {
            name: client.name.as_str(),
            company_name: client.company_name.as_deref(),
            email: client.email.as_ref().map(|e| e.as_str()),
            phone: client.phone.as_deref(),
            phone_normalized: client.phone_normalized.as_deref(),
            address: client.address.as_deref(),
            notes: client.notes.as_deref(),
            is_active: client.is_active,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn row(email: Option<&str>) -> Client {
        let now = Utc::now().naive_utc();
        Client {
            id: 7,
            tenant_id: 2,
            name: "Harbor Homes".to_string(),
            company_name: Some("Harbor Homes LLC".to_string()),
            email: email.map(str::to_string),
            phone: Some("(555) 010-4477".to_string()),
            phone_normalized: Some("5550104477".to_string()),
            address: Some("4 Pier Rd".to_string()),
            notes: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn insert_row_carries_normalized_phone() {
        let client = DomainNewClient::new(
            TenantId::new(3).unwrap(),
            ClientName::new("Harbor Homes").unwrap(),
            None,
            Some(EmailAddress::new("Office@Harbor.test").unwrap()),
            Some("(555) 123-0000".to_string()),
            Some("4 Pier Rd".to_string()),
            None,
        );

        let insert = NewClient::from(&client);

        assert_eq!(insert.tenant_id, 3);
        assert_eq!(insert.email, Some("office@harbor.test"));
        assert_eq!(insert.phone_normalized, Some("5551230000"));
        assert!(insert.is_active);
    }

    #[test]
    fn malformed_stored_email_is_dropped() {
        let client = DomainClient::try_from(row(Some("not an email"))).unwrap();

        assert_eq!(client.id.get(), 7);
        assert_eq!(client.tenant_id.get(), 2);
        assert_eq!(client.email, None);
        assert_eq!(client.company_name.as_deref(), Some("Harbor Homes LLC"));
    }

    #[test]
    fn blank_stored_name_is_rejected() {
        let mut stored = row(None);
        stored.name = "  ".to_string();

        assert_eq!(
            DomainClient::try_from(stored).unwrap_err(),
            TypeConstraintError::EmptyString
        );
    }
}
