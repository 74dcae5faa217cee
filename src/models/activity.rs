use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::{
    activity::{Activity as DomainActivity, NewActivity as DomainNewActivity},
    types::{ActivityId, TenantId, TypeConstraintError},
};
use crate::models::opt_id;

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::activities)]
pub struct Activity {
    pub id: i32,
    pub tenant_id: i32,
    pub user_id: Option<i32>,
    pub kind: String,
    pub description: String,
    pub client_id: Option<i32>,
    pub lead_id: Option<i32>,
    pub estimate_id: Option<i32>,
    pub invoice_id: Option<i32>,
    pub job_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::activities)]
pub struct NewActivity<'a> {
    pub tenant_id: i32,
    pub user_id: Option<i32>,
    pub kind: &'a str,
    pub description: &'a str,
    pub client_id: Option<i32>,
    pub lead_id: Option<i32>,
    pub estimate_id: Option<i32>,
    pub invoice_id: Option<i32>,
    pub job_id: Option<i32>,
}

impl TryFrom<Activity> for DomainActivity {
    type Error = TypeConstraintError;

    fn try_from(activity: Activity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ActivityId::new(activity.id)?,
            tenant_id: TenantId::new(activity.tenant_id)?,
            user_id: opt_id(activity.user_id)?,
            kind: activity.kind.parse()?,
            description: activity.description,
            client_id: opt_id(activity.client_id)?,
            lead_id: opt_id(activity.lead_id)?,
            estimate_id: opt_id(activity.estimate_id)?,
            invoice_id: opt_id(activity.invoice_id)?,
            job_id: opt_id(activity.job_id)?,
            created_at: activity.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewActivity> for NewActivity<'a> {
    fn from(activity: &'a DomainNewActivity) -> Self {
        Self {
            tenant_id: activity.tenant_id.get(),
            user_id: activity.user_id.map(|id| id.get()),
            kind: activity.kind.as_str(),
            description: activity.description.as_str(),
            client_id: activity.client_id.map(|id| id.get()),
            lead_id: activity.lead_id.map(|id| id.get()),
            estimate_id: activity.estimate_id.map(|id| id.get()),
            invoice_id: activity.invoice_id.map(|id| id.get()),
            job_id: activity.job_id.map(|id| id.get()),
        }
    }
}
