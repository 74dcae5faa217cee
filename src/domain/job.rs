use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{Cents, ClientId, JobId, TenantId, UserId, string_enum};
use crate::domain::user::User;

string_enum!(
    JobStatus {
        Quote => "QUOTE",
        Scheduled => "SCHEDULED",
        InProgress => "IN_PROGRESS",
        OnHold => "ON_HOLD",
        Completed => "COMPLETED",
        Invoiced => "INVOICED",
        Cancelled => "CANCELLED",
    }
);

pub const JOB_NUMBER_PREFIX: &str = "JOB";
pub const DEFAULT_PRIORITY: i32 = 3;
pub const MIN_PRIORITY: i32 = 1;
pub const MAX_PRIORITY: i32 = 5;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub tenant_id: TenantId,
    pub client_id: ClientId,
    pub job_number: String,
    pub title: String,
    pub description: Option<String>,
    pub status: JobStatus,
    pub priority: i32,
    pub scheduled_start: Option<NaiveDateTime>,
    pub scheduled_end: Option<NaiveDateTime>,
    pub estimate_amount: Option<Cents>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    pub assignees: Vec<User>,
}

#[derive(Clone, Debug)]
pub struct NewJob {
    pub tenant_id: TenantId,
    pub client_id: ClientId,
    pub title: String,
    pub description: Option<String>,
    pub status: JobStatus,
    pub priority: i32,
    pub scheduled_start: Option<NaiveDateTime>,
    pub scheduled_end: Option<NaiveDateTime>,
    pub estimate_amount: Option<Cents>,
}

#[derive(Clone, Debug)]
pub struct UpdateJob {
    pub client_id: ClientId,
    pub title: String,
    pub description: Option<String>,
    pub priority: i32,
    pub scheduled_start: Option<NaiveDateTime>,
    pub scheduled_end: Option<NaiveDateTime>,
    pub estimate_amount: Option<Cents>,
}

/// Users added by an assignment change, in the order they were requested.
pub fn newly_assigned(current: &[UserId], requested: &[UserId]) -> Vec<UserId> {
    let mut added = Vec::new();
    for user_id in requested {
        if !current.contains(user_id) && !added.contains(user_id) {
            added.push(*user_id);
        }
    }
    added
}

/// Clamps a requested priority into the supported range.
pub fn clamp_priority(priority: Option<i32>) -> i32 {
    priority
        .unwrap_or(DEFAULT_PRIORITY)
        .clamp(MIN_PRIORITY, MAX_PRIORITY)
}
