use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::{
    estimate::{Estimate as DomainEstimate, NewEstimate as DomainNewEstimate, UpdateEstimate as DomainUpdateEstimate},
    types::{Cents, EstimateId, TenantId, TypeConstraintError},
};
use crate::models::opt_id;

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::estimates)]
pub struct Estimate {
    pub id: i32,
    pub tenant_id: i32,
    pub client_id: Option<i32>,
    pub lead_id: Option<i32>,
    pub job_id: Option<i32>,
    pub estimate_number: String,
    pub title: String,
    pub status: String,
    pub subtotal_cents: i64,
    pub tax_rate: f64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
    pub created_by_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::estimates)]
pub struct NewEstimate<'a> {
    pub tenant_id: i32,
    pub client_id: Option<i32>,
    pub lead_id: Option<i32>,
    pub estimate_number: &'a str,
    pub title: &'a str,
    pub status: &'a str,
    pub tax_rate: f64,
    pub discount_cents: i64,
    pub notes: Option<&'a str>,
    pub created_by_id: Option<i32>,
}

impl<'a> NewEstimate<'a> {
    pub fn new(estimate: &'a DomainNewEstimate, estimate_number: &'a str) -> Self {
        Self {
            tenant_id: estimate.tenant_id.get(),
            client_id: estimate.client_id.map(|id| id.get()),
            lead_id: estimate.lead_id.map(|id| id.get()),
            estimate_number,
            title: estimate.title.as_str(),
            status: estimate.status.as_str(),
            tax_rate: estimate.tax_rate,
            discount_cents: estimate.discount.get(),
            notes: estimate.notes.as_deref(),
            created_by_id: estimate.created_by_id.map(|id| id.get()),
        }
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::estimates)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateEstimate<'a> {
    pub client_id: Option<i32>,
    pub title: &'a str,
    pub status: &'a str,
    pub tax_rate: f64,
    pub discount_cents: i64,
    pub notes: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

impl<'a> UpdateEstimate<'a> {
    pub fn from_domain(estimate: &'a DomainUpdateEstimate, updated_at: NaiveDateTime) -> Self {
        Self {
            client_id: estimate.client_id.map(|id| id.get()),
            title: estimate.title.as_str(),
            status: estimate.status.as_str(),
            tax_rate: estimate.tax_rate,
            discount_cents: estimate.discount.get(),
            notes: estimate.notes.as_deref(),
            updated_at,
        }
    }
}

impl TryFrom<Estimate> for DomainEstimate {
    type Error = TypeConstraintError;

    fn try_from(estimate: Estimate) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EstimateId::new(estimate.id)?,
            tenant_id: TenantId::new(estimate.tenant_id)?,
            client_id: opt_id(estimate.client_id)?,
            lead_id: opt_id(estimate.lead_id)?,
            job_id: opt_id(estimate.job_id)?,
            estimate_number: estimate.estimate_number,
            title: estimate.title,
            status: estimate.status.parse()?,
            subtotal: Cents::new(estimate.subtotal_cents),
            tax_rate: estimate.tax_rate,
            tax: Cents::new(estimate.tax_cents),
            discount: Cents::new(estimate.discount_cents),
            total: Cents::new(estimate.total_cents),
            notes: estimate.notes,
            created_by_id: opt_id(estimate.created_by_id)?,
            created_at: estimate.created_at,
            updated_at: estimate.updated_at,
        })
    }
}
