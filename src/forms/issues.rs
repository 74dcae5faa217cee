use chrono::NaiveDateTime;
use serde::Deserialize;
use validator::Validate;

use crate::domain::issue::{
    Issue, IssueStatus, IssueType, NewIssue, NewIssueNote, Priority, UpdateIssue,
};
use crate::domain::types::{IssueId, TenantId, UserId, sanitize_text};
use crate::forms::{FormError, optional_id};
use crate::pagination::PageRequest;

fn watcher_ids(ids: Vec<i32>) -> Result<Vec<UserId>, FormError> {
    ids.into_iter()
        .map(|id| UserId::new(id).map_err(FormError::invalid("watcherIds")))
        .collect()
}

fn required_title(title: &str) -> Result<String, FormError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(FormError::Missing("Title"));
    }
    Ok(title.to_string())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueForm {
    #[validate(length(max = 200, message = "Title is too long"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub issue_type: Option<IssueType>,
    #[serde(default)]
    pub status: Option<IssueStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assignee_id: Option<i32>,
    #[serde(default)]
    pub client_id: Option<i32>,
    #[serde(default)]
    pub lead_id: Option<i32>,
    #[serde(default)]
    pub job_id: Option<i32>,
    #[serde(default, alias = "watchers")]
    pub watcher_ids: Vec<i32>,
}

impl IssueForm {
    pub fn into_new_issue(
        self,
        tenant_id: TenantId,
        created_by: UserId,
    ) -> Result<NewIssue, FormError> {
        self.validate()?;
        Ok(NewIssue {
            tenant_id,
            title: required_title(&self.title)?,
            description: self.description.as_deref().and_then(sanitize_text),
            issue_type: self.issue_type.unwrap_or(IssueType::Other),
            status: self.status.unwrap_or(IssueStatus::Open),
            priority: self.priority.unwrap_or(Priority::Medium),
            assignee_id: optional_id(self.assignee_id, "assigneeId")?,
            created_by_id: Some(created_by),
            client_id: optional_id(self.client_id, "clientId")?,
            lead_id: optional_id(self.lead_id, "leadId")?,
            job_id: optional_id(self.job_id, "jobId")?,
            watcher_ids: watcher_ids(self.watcher_ids)?,
        })
    }
}

/// Partial edit: absent fields keep their current value.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueUpdateForm {
    #[serde(default)]
    #[validate(length(max = 200, message = "Title is too long"))]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub issue_type: Option<IssueType>,
    #[serde(default)]
    pub status: Option<IssueStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assignee_id: Option<i32>,
    #[serde(default, alias = "watchers")]
    pub watcher_ids: Option<Vec<i32>>,
}

impl IssueUpdateForm {
    pub fn into_update(self, current: &Issue, now: NaiveDateTime) -> Result<UpdateIssue, FormError> {
        self.validate()?;
        let status = self.status.unwrap_or(current.status);

        Ok(UpdateIssue {
            title: match self.title {
                Some(title) => required_title(&title)?,
                None => current.title.clone(),
            },
            description: match self.description {
                Some(description) => sanitize_text(&description),
                None => current.description.clone(),
            },
            issue_type: self.issue_type.unwrap_or(current.issue_type),
            status,
            priority: self.priority.unwrap_or(current.priority),
            assignee_id: optional_id(self.assignee_id, "assigneeId")?.or(current.assignee_id),
            timeline: current.timeline_after(status, now),
            watcher_ids: self.watcher_ids.map(watcher_ids).transpose()?,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueNoteForm {
    #[validate(length(max = 10000, message = "Note is too long"))]
    pub content: String,
    #[serde(default)]
    pub is_internal: bool,
}

impl IssueNoteForm {
    pub fn into_new_note(self, issue_id: IssueId, author: UserId) -> Result<NewIssueNote, FormError> {
        self.validate()?;
        let content = sanitize_text(&self.content).ok_or(FormError::Missing("Note content"))?;
        Ok(NewIssueNote {
            issue_id,
            content,
            is_internal: self.is_internal,
            created_by_id: Some(author),
        })
    }
}

/// Whose issues a list shows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueFilter {
    #[default]
    All,
    /// Created by the caller.
    My,
    Assigned,
    Watched,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
    pub status: Option<IssueStatus>,
    #[serde(rename = "type")]
    pub issue_type: Option<IssueType>,
    pub assignee_id: Option<i32>,
    #[serde(default)]
    pub filter: IssueFilter,
}

impl IssueListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::types::TenantId;

    fn current() -> Issue {
        let now = Utc::now().naive_utc();
        Issue {
            id: IssueId::new(3).unwrap(),
            tenant_id: TenantId::new(1).unwrap(),
            title: "Scratched door casing".into(),
            description: Some("Left side".into()),
            issue_type: IssueType::Quality,
            status: IssueStatus::Open,
            priority: Priority::Medium,
            assignee_id: Some(UserId::new(4).unwrap()),
            created_by_id: Some(UserId::new(1).unwrap()),
            client_id: None,
            lead_id: None,
            job_id: None,
            first_response_at: None,
            resolved_at: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn new_issue_defaults() {
        let form: IssueForm =
            serde_json::from_str(r#"{"title":" Leaky caulk ","watchers":[5]}"#).unwrap();
        let issue = form
            .into_new_issue(TenantId::new(1).unwrap(), UserId::new(2).unwrap())
            .unwrap();

        assert_eq!(issue.title, "Leaky caulk");
        assert_eq!(issue.issue_type, IssueType::Other);
        assert_eq!(issue.status, IssueStatus::Open);
        assert_eq!(issue.priority, Priority::Medium);
        assert_eq!(issue.watcher_ids, vec![UserId::new(5).unwrap()]);
    }

    #[test]
    fn blank_title_is_rejected() {
        let form: IssueForm = serde_json::from_str(r#"{"title":"  "}"#).unwrap();
        assert!(matches!(
            form.into_new_issue(TenantId::new(1).unwrap(), UserId::new(2).unwrap()),
            Err(FormError::Missing("Title"))
        ));
    }

    #[test]
    fn partial_update_keeps_current_fields() {
        let now = Utc::now().naive_utc();
        let form: IssueUpdateForm = serde_json::from_str(r#"{"status":"IN_PROGRESS"}"#).unwrap();

        let update = form.into_update(&current(), now).unwrap();

        assert_eq!(update.title, "Scratched door casing");
        assert_eq!(update.description.as_deref(), Some("Left side"));
        assert_eq!(update.assignee_id, Some(UserId::new(4).unwrap()));
        assert_eq!(update.timeline.first_response_at, Some(now));
        assert_eq!(update.watcher_ids, None);
    }

    #[test]
    fn empty_note_is_rejected() {
        let form: IssueNoteForm = serde_json::from_str(r#"{"content":" "}"#).unwrap();
        assert!(matches!(
            form.into_new_note(IssueId::new(1).unwrap(), UserId::new(1).unwrap()),
            Err(FormError::Missing("Note content"))
        ));
    }

    #[test]
    fn list_filter_is_lowercase() {
        let params: IssueListParams =
            serde_json::from_str(r#"{"filter":"watched","type":"SAFETY"}"#).unwrap();
        assert_eq!(params.filter, IssueFilter::Watched);
        assert_eq!(params.issue_type, Some(IssueType::Safety));
    }
}
