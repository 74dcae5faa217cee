use chrono::NaiveDateTime;
use serde::Deserialize;
use validator::Validate;

use crate::domain::issue::Priority;
use crate::domain::task::{NewSubtask, NewTask, Task, TaskStatus, UpdateTask};
use crate::domain::types::{TenantId, UserId, sanitize_text};
use crate::forms::{FormError, optional_datetime, optional_id};
use crate::pagination::PageRequest;

/// Status filter value meaning "anything still to do".
pub const PLANNING_PENDING: &str = "PLANNING_PENDING";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskForm {
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
}

/// Blank checklist entries are dropped.
fn checklist(subtasks: Vec<SubtaskForm>) -> Vec<NewSubtask> {
    subtasks
        .into_iter()
        .filter_map(|subtask| {
            let title = subtask.title.trim();
            (!title.is_empty()).then(|| NewSubtask {
                title: title.to_string(),
                is_completed: subtask.is_completed,
            })
        })
        .collect()
}

fn required_assignee(value: Option<i32>) -> Result<UserId, FormError> {
    optional_id(value, "assigneeId")?.ok_or(FormError::Missing("Assignee"))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskForm {
    #[validate(length(max = 200, message = "Title is too long"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<i32>,
    #[serde(default)]
    pub client_id: Option<i32>,
    #[serde(default)]
    pub lead_id: Option<i32>,
    #[serde(default)]
    pub job_id: Option<i32>,
    #[serde(default)]
    pub invoice_id: Option<i32>,
    #[serde(default)]
    pub issue_id: Option<i32>,
    #[serde(default)]
    pub subtasks: Vec<SubtaskForm>,
}

impl TaskForm {
    pub fn into_new_task(self, tenant_id: TenantId, created_by: UserId) -> Result<NewTask, FormError> {
        self.validate()?;
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormError::Missing("Title"));
        }

        Ok(NewTask {
            tenant_id,
            title: title.to_string(),
            description: self.description.as_deref().and_then(sanitize_text),
            status: self.status.unwrap_or(TaskStatus::Todo),
            priority: self.priority.unwrap_or(Priority::Medium),
            due_date: optional_datetime(self.due_date, "dueDate")?,
            assignee_id: required_assignee(self.assignee_id)?,
            created_by_id: Some(created_by),
            client_id: optional_id(self.client_id, "clientId")?,
            lead_id: optional_id(self.lead_id, "leadId")?,
            job_id: optional_id(self.job_id, "jobId")?,
            invoice_id: optional_id(self.invoice_id, "invoiceId")?,
            issue_id: optional_id(self.issue_id, "issueId")?,
            subtasks: checklist(self.subtasks),
        })
    }
}

/// Partial edit: absent fields keep their current value and a present
/// `subtasks` list replaces the checklist.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdateForm {
    #[serde(default)]
    #[validate(length(max = 200, message = "Title is too long"))]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<i32>,
    #[serde(default)]
    pub subtasks: Option<Vec<SubtaskForm>>,
}

impl TaskUpdateForm {
    pub fn into_update(self, current: &Task, now: NaiveDateTime) -> Result<UpdateTask, FormError> {
        self.validate()?;
        let status = self.status.unwrap_or(current.status);
        let title = match self.title {
            Some(title) if title.trim().is_empty() => return Err(FormError::Missing("Title")),
            Some(title) => title.trim().to_string(),
            None => current.title.clone(),
        };
        let due_date = match self.due_date {
            Some(raw) => optional_datetime(Some(raw), "dueDate")?,
            None => current.due_date,
        };

        Ok(UpdateTask {
            title,
            description: match self.description {
                Some(description) => sanitize_text(&description),
                None => current.description.clone(),
            },
            status,
            priority: self.priority.unwrap_or(current.priority),
            due_date,
            assignee_id: optional_id(self.assignee_id, "assigneeId")?.unwrap_or(current.assignee_id),
            completed_at: current.completed_at_after(status, now),
            subtasks: self.subtasks.map(checklist),
        })
    }
}

/// Whose tasks a list shows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    /// Created by or assigned to the caller.
    My,
    Assigned,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
    /// A task status code, `PLANNING_PENDING` or `all`.
    pub status: Option<String>,
    pub assignee_id: Option<i32>,
    #[serde(default)]
    pub filter: TaskFilter,
}

impl TaskListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    /// Statuses to match; empty means any.
    pub fn statuses(&self) -> Result<Vec<TaskStatus>, FormError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(Vec::new()),
            Some(raw) if raw.eq_ignore_ascii_case("all") => Ok(Vec::new()),
            Some(PLANNING_PENDING) => Ok(TaskStatus::PENDING.to_vec()),
            Some(raw) => raw
                .parse::<TaskStatus>()
                .map(|status| vec![status])
                .map_err(FormError::invalid("status")),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::domain::types::TaskId;

    fn current() -> Task {
        let now = Utc::now().naive_utc();
        Task {
            id: TaskId::new(7).unwrap(),
            tenant_id: TenantId::new(1).unwrap(),
            title: "Pick up casing stock".into(),
            description: None,
            status: TaskStatus::InProgress,
            priority: Priority::High,
            due_date: Some(now + Duration::days(2)),
            assignee_id: UserId::new(3).unwrap(),
            created_by_id: Some(UserId::new(1).unwrap()),
            client_id: None,
            lead_id: None,
            job_id: None,
            invoice_id: None,
            issue_id: None,
            completed_at: None,
            subtasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn assignee_is_required() {
        let form: TaskForm = serde_json::from_str(r#"{"title":"Measure stairs"}"#).unwrap();
        assert!(matches!(
            form.into_new_task(TenantId::new(1).unwrap(), UserId::new(1).unwrap()),
            Err(FormError::Missing("Assignee"))
        ));
    }

    #[test]
    fn blank_subtasks_are_dropped() {
        let form: TaskForm = serde_json::from_str(
            r#"{"title":"Measure stairs","assigneeId":3,"subtasks":[{"title":"Treads"},{"title":" "},{"title":"Risers","isCompleted":true}]}"#,
        )
        .unwrap();
        let task = form
            .into_new_task(TenantId::new(1).unwrap(), UserId::new(1).unwrap())
            .unwrap();

        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.subtasks.len(), 2);
        assert!(task.subtasks[1].is_completed);
    }

    #[test]
    fn completing_stamps_completion() {
        let now = Utc::now().naive_utc();
        let form: TaskUpdateForm = serde_json::from_str(r#"{"status":"COMPLETED"}"#).unwrap();

        let update = form.into_update(&current(), now).unwrap();

        assert_eq!(update.completed_at, Some(now));
        assert_eq!(update.title, "Pick up casing stock");
        assert_eq!(update.subtasks, None);
    }

    #[test]
    fn pending_status_expands() {
        let params = TaskListParams {
            status: Some("PLANNING_PENDING".into()),
            ..Default::default()
        };
        assert_eq!(params.statuses().unwrap(), TaskStatus::PENDING.to_vec());

        let params = TaskListParams {
            status: Some("all".into()),
            ..Default::default()
        };
        assert!(params.statuses().unwrap().is_empty());

        let params = TaskListParams {
            status: Some("LATER".into()),
            ..Default::default()
        };
        assert!(params.statuses().is_err());
    }
}
