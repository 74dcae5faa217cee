use serde::Deserialize;
use validator::Validate;

use crate::domain::job::{Job, JobStatus, NewJob, UpdateJob, clamp_priority};
use crate::domain::types::{Cents, ClientId, TenantId, UserId, sanitize_text};
use crate::forms::{FormError, optional_datetime, optional_id};
use crate::pagination::PageRequest;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JobForm {
    #[serde(default)]
    pub client_id: Option<i32>,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub scheduled_start: Option<String>,
    #[serde(default)]
    pub scheduled_end: Option<String>,
    /// Cents.
    #[serde(default)]
    #[validate(range(min = 0, message = "Estimate amount cannot be negative"))]
    pub estimate_amount: Option<i64>,
}

impl JobForm {
    pub fn into_new_job(self, tenant_id: TenantId) -> Result<NewJob, FormError> {
        self.validate()?;
        let client_id = optional_id::<ClientId>(self.client_id, "clientId")?
            .ok_or(FormError::Missing("Client"))?;
        let scheduled_start = optional_datetime(self.scheduled_start, "scheduledStart")?;
        let scheduled_end = optional_datetime(self.scheduled_end, "scheduledEnd")?;
        check_window(scheduled_start, scheduled_end)?;

        Ok(NewJob {
            tenant_id,
            client_id,
            title: self.title.trim().to_string(),
            description: self.description.as_deref().and_then(sanitize_text),
            status: self.status.unwrap_or(JobStatus::Quote),
            priority: clamp_priority(self.priority),
            scheduled_start,
            scheduled_end,
            estimate_amount: self.estimate_amount.map(Cents::new),
        })
    }

    /// Status changes go through the status endpoint, so `status` is ignored.
    pub fn into_update(self, current: &Job) -> Result<UpdateJob, FormError> {
        self.validate()?;
        let scheduled_start = optional_datetime(self.scheduled_start, "scheduledStart")?;
        let scheduled_end = optional_datetime(self.scheduled_end, "scheduledEnd")?;
        check_window(scheduled_start, scheduled_end)?;

        Ok(UpdateJob {
            client_id: optional_id(self.client_id, "clientId")?.unwrap_or(current.client_id),
            title: self.title.trim().to_string(),
            description: self.description.as_deref().and_then(sanitize_text),
            priority: clamp_priority(self.priority.or(Some(current.priority))),
            scheduled_start,
            scheduled_end,
            estimate_amount: self
                .estimate_amount
                .map(Cents::new)
                .or(current.estimate_amount),
        })
    }
}

pub(crate) fn check_window(
    start: Option<chrono::NaiveDateTime>,
    end: Option<chrono::NaiveDateTime>,
) -> Result<(), FormError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(FormError::InvalidValue {
            field: "scheduledEnd",
            reason: "must not be before scheduledStart".to_string(),
        }),
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
pub struct JobStatusForm {
    pub status: JobStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentsForm {
    #[serde(default)]
    pub user_ids: Vec<i32>,
}

impl AssignmentsForm {
    pub fn user_ids(&self) -> Result<Vec<UserId>, FormError> {
        self.user_ids
            .iter()
            .map(|id| UserId::new(*id).map_err(FormError::invalid("userIds")))
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
    pub status: Option<JobStatus>,
    pub client_id: Option<i32>,
    pub assigned_to: Option<i32>,
}

impl JobListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}
