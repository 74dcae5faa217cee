use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::issue::Priority;
use crate::domain::types::{
    ClientId, InvoiceId, IssueId, JobId, LeadId, SubtaskId, TaskId, TenantId, UserId, string_enum,
};

string_enum!(
    TaskStatus {
        Todo => "TODO",
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
);

impl TaskStatus {
    /// Statuses of work that still needs doing.
    pub const PENDING: [TaskStatus; 2] = [TaskStatus::Todo, TaskStatus::InProgress];
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: SubtaskId,
    pub title: String,
    pub is_completed: bool,
    pub sort_order: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub tenant_id: TenantId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: Option<NaiveDateTime>,
    pub assignee_id: UserId,
    pub created_by_id: Option<UserId>,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    pub job_id: Option<JobId>,
    pub invoice_id: Option<InvoiceId>,
    pub issue_id: Option<IssueId>,
    pub completed_at: Option<NaiveDateTime>,
    pub subtasks: Vec<Subtask>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Task {
    /// Completion stamp after moving to `next` at `now`.
    pub fn completed_at_after(&self, next: TaskStatus, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match (self.status == TaskStatus::Completed, next == TaskStatus::Completed) {
            (false, true) => Some(now),
            (true, false) => None,
            _ => self.completed_at,
        }
    }
}

/// Checklist entry as submitted; its position comes from the list order.
#[derive(Clone, Debug, PartialEq)]
pub struct NewSubtask {
    pub title: String,
    pub is_completed: bool,
}

#[derive(Clone, Debug)]
pub struct NewTask {
    pub tenant_id: TenantId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: Option<NaiveDateTime>,
    pub assignee_id: UserId,
    pub created_by_id: Option<UserId>,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    pub job_id: Option<JobId>,
    pub invoice_id: Option<InvoiceId>,
    pub issue_id: Option<IssueId>,
    pub subtasks: Vec<NewSubtask>,
}

#[derive(Clone, Debug)]
pub struct UpdateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: Option<NaiveDateTime>,
    pub assignee_id: UserId,
    pub completed_at: Option<NaiveDateTime>,
    /// `None` keeps the checklist, `Some` replaces it.
    pub subtasks: Option<Vec<NewSubtask>>,
}
