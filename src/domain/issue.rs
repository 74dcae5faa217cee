//! Customer issues: complaints, warranty claims and other problems raised
//! against a client, lead or job, tracked until they are resolved.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    ClientId, IssueId, IssueNoteId, JobId, LeadId, TenantId, UserId, string_enum,
};

string_enum!(
    IssueType {
        Billing => "BILLING",
        Scheduling => "SCHEDULING",
        Warranty => "WARRANTY",
        Quality => "QUALITY",
        Safety => "SAFETY",
        Complaint => "COMPLAINT",
        Support => "SUPPORT",
        Other => "OTHER",
    }
);

string_enum!(
    IssueStatus {
        Open => "OPEN",
        InProgress => "IN_PROGRESS",
        Resolved => "RESOLVED",
        Closed => "CLOSED",
        Cancelled => "CANCELLED",
    }
);

string_enum!(
    /// Urgency shared by issues and tasks.
    Priority {
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
        Urgent => "URGENT",
    }
);

impl Priority {
    /// Position used when sorting most urgent first.
    pub const fn rank(self) -> i32 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Urgent => 4,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: IssueId,
    pub tenant_id: TenantId,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub status: IssueStatus,
    pub priority: Priority,
    pub assignee_id: Option<UserId>,
    pub created_by_id: Option<UserId>,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    pub job_id: Option<JobId>,
    pub first_response_at: Option<NaiveDateTime>,
    pub resolved_at: Option<NaiveDateTime>,
    pub closed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Issue {
    /// Timestamps after moving from the current status to `next` at `now`.
    ///
    /// The first move away from OPEN records the first response; entering
    /// RESOLVED or CLOSED stamps it and leaving clears it again.
    pub fn timeline_after(&self, next: IssueStatus, now: NaiveDateTime) -> IssueTimeline {
        let stamp = |status: IssueStatus, current: Option<NaiveDateTime>| {
            match (self.status == status, next == status) {
                (false, true) => Some(now),
                (true, false) => None,
                _ => current,
            }
        };

        let first_response_at = match self.first_response_at {
            None if self.status == IssueStatus::Open && next != IssueStatus::Open => Some(now),
            current => current,
        };

        IssueTimeline {
            first_response_at,
            resolved_at: stamp(IssueStatus::Resolved, self.resolved_at),
            closed_at: stamp(IssueStatus::Closed, self.closed_at),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IssueTimeline {
    pub first_response_at: Option<NaiveDateTime>,
    pub resolved_at: Option<NaiveDateTime>,
    pub closed_at: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueNote {
    pub id: IssueNoteId,
    pub issue_id: IssueId,
    pub content: String,
    pub is_internal: bool,
    pub created_by_id: Option<UserId>,
    pub created_at: NaiveDateTime,
}

/// An issue with its watchers and conversation.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueDetail {
    #[serde(flatten)]
    pub issue: Issue,
    pub watcher_ids: Vec<UserId>,
    pub notes: Vec<IssueNote>,
}

#[derive(Clone, Debug)]
pub struct NewIssue {
    pub tenant_id: TenantId,
    pub title: String,
    pub description: Option<String>,
    pub issue_type: IssueType,
    pub status: IssueStatus,
    pub priority: Priority,
    pub assignee_id: Option<UserId>,
    pub created_by_id: Option<UserId>,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    pub job_id: Option<JobId>,
    /// The creator is always added on top of these.
    pub watcher_ids: Vec<UserId>,
}

#[derive(Clone, Debug)]
pub struct UpdateIssue {
    pub title: String,
    pub description: Option<String>,
    pub issue_type: IssueType,
    pub status: IssueStatus,
    pub priority: Priority,
    pub assignee_id: Option<UserId>,
    pub timeline: IssueTimeline,
    /// `None` leaves the watcher list untouched.
    pub watcher_ids: Option<Vec<UserId>>,
}

#[derive(Clone, Debug)]
pub struct NewIssueNote {
    pub issue_id: IssueId,
    pub content: String,
    pub is_internal: bool,
    pub created_by_id: Option<UserId>,
}
