use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    ClientId, ClientName, EmailAddress, TenantId, normalize_phone_digits, sanitize_text,
    trim_optional,
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub tenant_id: TenantId,
    pub name: ClientName,
    pub company_name: Option<String>,
    pub email: Option<EmailAddress>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct NewClient {
    pub tenant_id: TenantId,
    pub name: ClientName,
    pub company_name: Option<String>,
    pub email: Option<EmailAddress>,
    pub phone: Option<String>,
    pub phone_normalized: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
}

impl NewClient {
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        name: ClientName,
        company_name: Option<String>,
        email: Option<EmailAddress>,
        phone: Option<String>,
        address: Option<String>,
        notes: Option<String>,
    ) -> Self {
        let phone = trim_optional(phone);
        Self {
            tenant_id,
            name,
            company_name: trim_optional(company_name),
            email,
            phone_normalized: phone.as_deref().and_then(normalize_phone_digits),
            phone,
            address: trim_optional(address),
            notes: notes.as_deref().and_then(sanitize_text),
            is_active: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct UpdateClient {
    pub name: ClientName,
    pub company_name: Option<String>,
    pub email: Option<EmailAddress>,
    pub phone: Option<String>,
    pub phone_normalized: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
}

impl UpdateClient {
    #[must_use]
    pub fn new(
        name: ClientName,
        company_name: Option<String>,
        email: Option<EmailAddress>,
        phone: Option<String>,
        address: Option<String>,
        notes: Option<String>,
        is_active: bool,
    ) -> Self {
        let phone = trim_optional(phone);
        Self {
            name,
            company_name: trim_optional(company_name),
            email,
            phone_normalized: phone.as_deref().and_then(normalize_phone_digits),
            phone,
            address: trim_optional(address),
            notes: notes.as_deref().and_then(sanitize_text),
            is_active,
        }
    }
}

/// Keys used to find an existing client before creating one from a lead.
///
/// Matching is attempted in field order: email, then phone digits, then
/// name (together with the company when one is known).
#[derive(Clone, Debug, PartialEq)]
pub struct ClientMatchCriteria {
    pub tenant_id: TenantId,
    pub email: Option<EmailAddress>,
    pub phone_normalized: Option<String>,
    pub name: ClientName,
    pub company_name: Option<String>,
}
