use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::client::{ClientMatchCriteria, NewClient};
use crate::domain::types::{
    Cents, ClientId, ClientName, EmailAddress, LeadId, PersonName, TenantId, UserId,
    TypeConstraintError, normalize_phone_digits, string_enum,
};

string_enum!(
    LeadSource {
        Website => "WEBSITE",
        Referral => "REFERRAL",
        Phone => "PHONE",
        Email => "EMAIL",
        SocialMedia => "SOCIAL_MEDIA",
        Advertising => "ADVERTISING",
        WalkIn => "WALK_IN",
        Other => "OTHER",
    }
);

string_enum!(
    LeadStatus {
        New => "NEW",
        Contacted => "CONTACTED",
        Qualified => "QUALIFIED",
        EstimateSent => "ESTIMATE_SENT",
        Converted => "CONVERTED",
        Lost => "LOST",
    }
);

pub const DEFAULT_PROBABILITY: i32 = 50;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: LeadId,
    pub tenant_id: TenantId,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: Option<EmailAddress>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_site_address: Option<String>,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub value: Option<Cents>,
    pub probability: i32,
    pub notes: Option<String>,
    pub assigned_to_id: Option<UserId>,
    pub converted_to_client_id: Option<ClientId>,
    pub converted_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Lead {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_converted(&self) -> bool {
        self.status == LeadStatus::Converted || self.converted_to_client_id.is_some()
    }

    /// Label used on documents created from the lead.
    pub fn display_name(&self) -> String {
        match self.company.as_deref() {
            Some(company) => company.to_string(),
            None => self.full_name(),
        }
    }

    /// Keys used to look for an existing client before converting.
    pub fn match_criteria(&self) -> Result<ClientMatchCriteria, TypeConstraintError> {
        Ok(ClientMatchCriteria {
            tenant_id: self.tenant_id,
            email: self.email.clone(),
            phone_normalized: self.phone.as_deref().and_then(normalize_phone_digits),
            name: ClientName::new(self.full_name())?,
            company_name: self.company.clone(),
        })
    }

    /// Client record created when no existing client matches.
    pub fn to_new_client(&self) -> Result<NewClient, TypeConstraintError> {
        Ok(NewClient::new(
            self.tenant_id,
            ClientName::new(self.full_name())?,
            self.company.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.job_site_address.clone(),
            self.notes.clone(),
        ))
    }
}

#[derive(Clone, Debug)]
pub struct NewLead {
    pub tenant_id: TenantId,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: Option<EmailAddress>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_site_address: Option<String>,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub value: Option<Cents>,
    pub probability: i32,
    pub notes: Option<String>,
    pub assigned_to_id: Option<UserId>,
    pub converted_to_client_id: Option<ClientId>,
}

#[derive(Clone, Debug)]
pub struct UpdateLead {
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: Option<EmailAddress>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_site_address: Option<String>,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub value: Option<Cents>,
    pub probability: i32,
    pub notes: Option<String>,
    pub assigned_to_id: Option<UserId>,
}
