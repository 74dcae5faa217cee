use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::{
    lead::{Lead as DomainLead, NewLead as DomainNewLead, UpdateLead as DomainUpdateLead},
    types::{Cents, EmailAddress, LeadId, PersonName, TenantId, TypeConstraintError},
};
use crate::models::opt_id;

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::leads)]
pub struct Lead {
    pub id: i32,
    pub tenant_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_site_address: Option<String>,
    pub source: String,
    pub status: String,
    pub value_cents: Option<i64>,
    pub probability: i32,
    pub notes: Option<String>,
    pub assigned_to_id: Option<i32>,
    pub converted_to_client_id: Option<i32>,
    pub converted_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::leads)]
pub struct NewLead<'a> {
    pub tenant_id: i32,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub company: Option<&'a str>,
    pub job_site_address: Option<&'a str>,
    pub source: &'a str,
    pub status: &'a str,
    pub value_cents: Option<i64>,
    pub probability: i32,
    pub notes: Option<&'a str>,
    pub assigned_to_id: Option<i32>,
    pub converted_to_client_id: Option<i32>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::leads)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateLead<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub company: Option<&'a str>,
    pub job_site_address: Option<&'a str>,
    pub source: &'a str,
    pub status: &'a str,
    pub value_cents: Option<i64>,
    pub probability: i32,
    pub notes: Option<&'a str>,
    pub assigned_to_id: Option<i32>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Lead> for DomainLead {
    type Error = TypeConstraintError;

    fn try_from(lead: Lead) -> Result<Self, Self::Error> {
        Ok(Self {
            id: LeadId::new(lead.id)?,
            tenant_id: TenantId::new(lead.tenant_id)?,
            first_name: PersonName::new(lead.first_name)?,
            last_name: PersonName::new(lead.last_name)?,
            email: lead.email.and_then(|e| EmailAddress::new(e).ok()),
            phone: lead.phone,
            company: lead.company,
            job_site_address: lead.job_site_address,
            source: lead.source.parse()?,
            status: lead.status.parse()?,
            value: lead.value_cents.map(Cents::new),
            probability: lead.probability,
            notes: lead.notes,
            assigned_to_id: opt_id(lead.assigned_to_id)?,
            converted_to_client_id: opt_id(lead.converted_to_client_id)?,
            converted_at: lead.converted_at,
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewLead> for NewLead<'a> {
    fn from(lead: &'a DomainNewLead) -> Self {
        Self {
            tenant_id: lead.tenant_id.get(),
            first_name: lead.first_name.as_str(),
            last_name: lead.last_name.as_str(),
            email: lead.email.as_ref().map(|e| e.as_str()),
            phone: lead.phone.as_deref(),
            company: lead.company.as_deref(),
            job_site_address: lead.job_site_address.as_deref(),
            source: lead.source.as_str(),
            status: lead.status.as_str(),
            value_cents: lead.value.map(Cents::get),
            probability: lead.probability,
            notes: lead.notes.as_deref(),
            assigned_to_id: lead.assigned_to_id.map(|id| id.get()),
            converted_to_client_id: lead.converted_to_client_id.map(|id| id.get()),
        }
    }
}

impl<'a> UpdateLead<'a> {
    pub fn from_domain(lead: &'a DomainUpdateLead, updated_at: NaiveDateTime) -> Self {
        Self {
            first_name: lead.first_name.as_str(),
            last_name: lead.last_name.as_str(),
            email: lead.email.as_ref().map(|e| e.as_str()),
            phone: lead.phone.as_deref(),
            company: lead.company.as_deref(),
            job_site_address: lead.job_site_address.as_deref(),
            source: lead.source.as_str(),
            status: lead.status.as_str(),
            value_cents: lead.value.map(Cents::get),
            probability: lead.probability,
            notes: lead.notes.as_deref(),
            assigned_to_id: lead.assigned_to_id.map(|id| id.get()),
            updated_at,
        }
    }
}
