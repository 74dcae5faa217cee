use serde::Deserialize;
use validator::Validate;

use crate::domain::client::{NewClient, UpdateClient};
use crate::domain::types::{ClientName, TenantId};
use crate::forms::{FormError, optional_email};
use crate::pagination::PageRequest;

/// Create and update payload for a client.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClientForm {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Only honoured on update; new clients start active.
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl ClientForm {
    pub fn into_new_client(self, tenant_id: TenantId) -> Result<NewClient, FormError> {
        self.validate()?;
        Ok(NewClient::new(
            tenant_id,
            ClientName::new(self.name).map_err(|_| FormError::Missing("Name"))?,
            self.company_name,
            optional_email(self.email)?,
            self.phone,
            self.address,
            self.notes,
        ))
    }

    pub fn into_update(self) -> Result<UpdateClient, FormError> {
        self.validate()?;
        Ok(UpdateClient::new(
            ClientName::new(self.name).map_err(|_| FormError::Missing("Name"))?,
            self.company_name,
            optional_email(self.email)?,
            self.phone,
            self.address,
            self.notes,
            self.is_active.unwrap_or(true),
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
    pub active: Option<bool>,
}

impl ClientListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}
