use serde::Deserialize;
use validator::Validate;

use crate::domain::lead::{DEFAULT_PROBABILITY, LeadSource, LeadStatus, NewLead, UpdateLead};
use crate::domain::types::{
    Cents, ClientId, EmailAddress, PersonName, TenantId, UserId, sanitize_text, trim_optional,
};
use crate::forms::{FormError, optional_email, optional_id};
use crate::pagination::PageRequest;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LeadForm {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub job_site_address: Option<String>,
    #[serde(default)]
    pub source: Option<LeadSource>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
    /// Estimated value in cents.
    #[serde(default)]
    #[validate(range(min = 0, message = "Value cannot be negative"))]
    pub value: Option<i64>,
    #[serde(default)]
    #[validate(range(min = 0, max = 100, message = "Probability must be between 0 and 100"))]
    pub probability: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub assigned_to_id: Option<i32>,
    #[serde(default)]
    pub converted_to_client_id: Option<i32>,
}

/// Lead fields after validation; the references still need a tenant check.
#[derive(Debug, Clone)]
pub struct LeadPayload {
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

impl TryFrom<LeadForm> for LeadPayload {
    type Error = FormError;

    fn try_from(form: LeadForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            first_name: PersonName::new(form.first_name)
                .map_err(|_| FormError::Missing("First name"))?,
            last_name: PersonName::new(form.last_name)
                .map_err(|_| FormError::Missing("Last name"))?,
            email: optional_email(form.email)?,
            phone: trim_optional(form.phone),
            company: trim_optional(form.company),
            job_site_address: trim_optional(form.job_site_address),
            source: form.source.unwrap_or(LeadSource::Other),
            status: form.status.unwrap_or(LeadStatus::New),
            value: form.value.map(Cents::new),
            probability: form.probability.unwrap_or(DEFAULT_PROBABILITY),
            notes: form.notes.as_deref().and_then(sanitize_text),
            assigned_to_id: optional_id(form.assigned_to_id, "assignedToId")?,
            converted_to_client_id: optional_id(
                form.converted_to_client_id,
                "convertedToClientId",
            )?,
        })
    }
}

impl LeadPayload {
    pub fn into_new_lead(self, tenant_id: TenantId) -> NewLead {
        NewLead {
            tenant_id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            job_site_address: self.job_site_address,
            source: self.source,
            status: self.status,
            value: self.value,
            probability: self.probability,
            notes: self.notes,
            assigned_to_id: self.assigned_to_id,
            converted_to_client_id: self.converted_to_client_id,
        }
    }

    pub fn into_update(self) -> UpdateLead {
        UpdateLead {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            job_site_address: self.job_site_address,
            source: self.source,
            status: self.status,
            value: self.value,
            probability: self.probability,
            notes: self.notes,
            assigned_to_id: self.assigned_to_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub assigned_to_id: Option<i32>,
}

impl LeadListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<LeadPayload, FormError> {
        LeadPayload::try_from(serde_json::from_str::<LeadForm>(json).unwrap())
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let payload = parse(r#"{"firstName":"Ana","lastName":"Ruiz"}"#).unwrap();
        assert_eq!(payload.source, LeadSource::Other);
        assert_eq!(payload.status, LeadStatus::New);
        assert_eq!(payload.probability, DEFAULT_PROBABILITY);
        assert_eq!(payload.assigned_to_id, None);
    }

    #[test]
    fn names_are_required() {
        assert!(matches!(
            parse(r#"{"firstName":" ","lastName":"Ruiz"}"#),
            Err(FormError::Missing("First name"))
        ));
    }

    #[test]
    fn probability_is_bounded() {
        assert!(matches!(
            parse(r#"{"firstName":"Ana","lastName":"Ruiz","probability":140}"#),
            Err(FormError::Validation(_))
        ));
    }

    #[test]
    fn enum_codes_are_accepted() {
        let payload = parse(
            r#"{"firstName":"Ana","lastName":"Ruiz","source":"WALK_IN","status":"QUALIFIED","value":125000,"assignedToId":4}"#,
        )
        .unwrap();
        assert_eq!(payload.source, LeadSource::WalkIn);
        assert_eq!(payload.status, LeadStatus::Qualified);
        assert_eq!(payload.value, Some(Cents::new(125_000)));
        assert_eq!(payload.assigned_to_id.map(UserId::get), Some(4));
    }
}
