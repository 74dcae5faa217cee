use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::{
    issue::{
        Issue as DomainIssue, IssueNote as DomainIssueNote, NewIssue as DomainNewIssue,
        NewIssueNote as DomainNewIssueNote, UpdateIssue as DomainUpdateIssue,
    },
    types::{IssueId, IssueNoteId, TenantId, TypeConstraintError},
};
use crate::models::opt_id;

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::issues)]
pub struct Issue {
    pub id: i32,
    pub tenant_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub issue_type: String,
    pub status: String,
    pub priority: String,
    pub assignee_id: Option<i32>,
    pub created_by_id: Option<i32>,
    pub client_id: Option<i32>,
    pub lead_id: Option<i32>,
    pub job_id: Option<i32>,
    pub first_response_at: Option<NaiveDateTime>,
    pub resolved_at: Option<NaiveDateTime>,
    pub closed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::issues)]
pub struct NewIssue<'a> {
    pub tenant_id: i32,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub issue_type: &'a str,
    pub status: &'a str,
    pub priority: &'a str,
    pub assignee_id: Option<i32>,
    pub created_by_id: Option<i32>,
    pub client_id: Option<i32>,
    pub lead_id: Option<i32>,
    pub job_id: Option<i32>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::issues)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateIssue<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub issue_type: &'a str,
    pub status: &'a str,
    pub priority: &'a str,
    pub assignee_id: Option<i32>,
    pub first_response_at: Option<NaiveDateTime>,
    pub resolved_at: Option<NaiveDateTime>,
    pub closed_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::issue_watchers)]
pub struct NewIssueWatcher {
    pub issue_id: i32,
    pub user_id: i32,
}

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::issue_notes)]
pub struct IssueNote {
    pub id: i32,
    pub issue_id: i32,
    pub content: String,
    pub is_internal: bool,
    pub created_by_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::issue_notes)]
pub struct NewIssueNote<'a> {
    pub issue_id: i32,
    pub content: &'a str,
    pub is_internal: bool,
    pub created_by_id: Option<i32>,
}

impl TryFrom<Issue> for DomainIssue {
    type Error = TypeConstraintError;

    fn try_from(issue: Issue) -> Result<Self, Self::Error> {
        Ok(Self {
            id: IssueId::new(issue.id)?,
            tenant_id: TenantId::new(issue.tenant_id)?,
            title: issue.title,
            description: issue.description,
            issue_type: issue.issue_type.parse()?,
            status: issue.status.parse()?,
            priority: issue.priority.parse()?,
            assignee_id: opt_id(issue.assignee_id)?,
            created_by_id: opt_id(issue.created_by_id)?,
            client_id: opt_id(issue.client_id)?,
            lead_id: opt_id(issue.lead_id)?,
            job_id: opt_id(issue.job_id)?,
            first_response_at: issue.first_response_at,
            resolved_at: issue.resolved_at,
            closed_at: issue.closed_at,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
        })
    }
}

impl TryFrom<IssueNote> for DomainIssueNote {
    type Error = TypeConstraintError;

    fn try_from(note: IssueNote) -> Result<Self, Self::Error> {
        Ok(Self {
            id: IssueNoteId::new(note.id)?,
            issue_id: IssueId::new(note.issue_id)?,
            content: note.content,
            is_internal: note.is_internal,
            created_by_id: opt_id(note.created_by_id)?,
            created_at: note.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewIssue> for NewIssue<'a> {
    fn from(issue: &'a DomainNewIssue) -> Self {
        Self {
            tenant_id: issue.tenant_id.get(),
            title: issue.title.as_str(),
            description: issue.description.as_deref(),
            issue_type: issue.issue_type.as_str(),
            status: issue.status.as_str(),
            priority: issue.priority.as_str(),
            assignee_id: issue.assignee_id.map(|id| id.get()),
            created_by_id: issue.created_by_id.map(|id| id.get()),
            client_id: issue.client_id.map(|id| id.get()),
            lead_id: issue.lead_id.map(|id| id.get()),
            job_id: issue.job_id.map(|id| id.get()),
        }
    }
}

impl<'a> From<&'a DomainNewIssueNote> for NewIssueNote<'a> {
    fn from(note: &'a DomainNewIssueNote) -> Self {
        Self {
            issue_id: note.issue_id.get(),
            content: note.content.as_str(),
            is_internal: note.is_internal,
            created_by_id: note.created_by_id.map(|id| id.get()),
        }
    }
}

impl<'a> UpdateIssue<'a> {
    pub fn from_domain(issue: &'a DomainUpdateIssue, updated_at: NaiveDateTime) -> Self {
        Self {
            title: issue.title.as_str(),
            description: issue.description.as_deref(),
            issue_type: issue.issue_type.as_str(),
            status: issue.status.as_str(),
            priority: issue.priority.as_str(),
            assignee_id: issue.assignee_id.map(|id| id.get()),
            first_response_at: issue.timeline.first_response_at,
            resolved_at: issue.timeline.resolved_at,
            closed_at: issue.timeline.closed_at,
            updated_at,
        }
    }
}
