use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::{
    job::{Job as DomainJob, NewJob as DomainNewJob, UpdateJob as DomainUpdateJob},
    types::{Cents, ClientId, JobId, TenantId, TypeConstraintError},
};

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::jobs)]
pub struct Job {
    pub id: i32,
    pub tenant_id: i32,
    pub client_id: i32,
    pub job_number: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: i32,
    pub scheduled_start: Option<NaiveDateTime>,
    pub scheduled_end: Option<NaiveDateTime>,
    pub estimate_amount_cents: Option<i64>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::jobs)]
pub struct NewJob<'a> {
    pub tenant_id: i32,
    pub client_id: i32,
    pub job_number: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub status: &'a str,
    pub priority: i32,
    pub scheduled_start: Option<NaiveDateTime>,
    pub scheduled_end: Option<NaiveDateTime>,
    pub estimate_amount_cents: Option<i64>,
}

impl<'a> NewJob<'a> {
    pub fn new(job: &'a DomainNewJob, job_number: &'a str) -> Self {
        Self {
            tenant_id: job.tenant_id.get(),
            client_id: job.client_id.get(),
            job_number,
            title: job.title.as_str(),
            description: job.description.as_deref(),
            status: job.status.as_str(),
            priority: job.priority,
            scheduled_start: job.scheduled_start,
            scheduled_end: job.scheduled_end,
            estimate_amount_cents: job.estimate_amount.map(Cents::get),
        }
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::jobs)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateJob<'a> {
    pub client_id: i32,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub priority: i32,
    pub scheduled_start: Option<NaiveDateTime>,
    pub scheduled_end: Option<NaiveDateTime>,
    pub estimate_amount_cents: Option<i64>,
    pub updated_at: NaiveDateTime,
}

impl<'a> UpdateJob<'a> {
    pub fn from_domain(job: &'a DomainUpdateJob, updated_at: NaiveDateTime) -> Self {
        Self {
            client_id: job.client_id.get(),
            title: job.title.as_str(),
            description: job.description.as_deref(),
            priority: job.priority,
            scheduled_start: job.scheduled_start,
            scheduled_end: job.scheduled_end,
            estimate_amount_cents: job.estimate_amount.map(Cents::get),
            updated_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::job_assignments)]
pub struct NewJobAssignment {
    pub job_id: i32,
    pub user_id: i32,
}

impl TryFrom<Job> for DomainJob {
    type Error = TypeConstraintError;

    fn try_from(job: Job) -> Result<Self, Self::Error> {
        Ok(Self {
            id: JobId::new(job.id)?,
            tenant_id: TenantId::new(job.tenant_id)?,
            client_id: ClientId::new(job.client_id)?,
            job_number: job.job_number,
            title: job.title,
            description: job.description,
            status: job.status.parse()?,
            priority: job.priority,
            scheduled_start: job.scheduled_start,
            scheduled_end: job.scheduled_end,
            estimate_amount: job.estimate_amount_cents.map(Cents::new),
            completed_at: job.completed_at,
            created_at: job.created_at,
            updated_at: job.updated_at,
        })
    }
}
