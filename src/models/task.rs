use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::{
    task::{
        NewSubtask as DomainNewSubtask, NewTask as DomainNewTask, Subtask as DomainSubtask,
        Task as DomainTask, UpdateTask as DomainUpdateTask,
    },
    types::{SubtaskId, TaskId, TenantId, TypeConstraintError, UserId},
};
use crate::models::opt_id;

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::tasks)]
pub struct Task {
    pub id: i32,
    pub tenant_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub due_date: Option<NaiveDateTime>,
    pub assignee_id: i32,
    pub created_by_id: Option<i32>,
    pub client_id: Option<i32>,
    pub lead_id: Option<i32>,
    pub job_id: Option<i32>,
    pub invoice_id: Option<i32>,
    pub issue_id: Option<i32>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::tasks)]
pub struct NewTask<'a> {
    pub tenant_id: i32,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub status: &'a str,
    pub priority: &'a str,
    pub due_date: Option<NaiveDateTime>,
    pub assignee_id: i32,
    pub created_by_id: Option<i32>,
    pub client_id: Option<i32>,
    pub lead_id: Option<i32>,
    pub job_id: Option<i32>,
    pub invoice_id: Option<i32>,
    pub issue_id: Option<i32>,
    pub completed_at: Option<NaiveDateTime>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::tasks)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateTask<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub status: &'a str,
    pub priority: &'a str,
    pub due_date: Option<NaiveDateTime>,
    pub assignee_id: i32,
    pub completed_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::subtasks)]
pub struct Subtask {
    pub id: i32,
    pub task_id: i32,
    pub title: String,
    pub is_completed: bool,
    pub sort_order: i32,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::subtasks)]
pub struct NewSubtask<'a> {
    pub task_id: i32,
    pub title: &'a str,
    pub is_completed: bool,
    pub sort_order: i32,
}

impl<'a> NewSubtask<'a> {
    pub fn new(task_id: i32, sort_order: i32, subtask: &'a DomainNewSubtask) -> Self {
        Self {
            task_id,
            title: subtask.title.as_str(),
            is_completed: subtask.is_completed,
            sort_order,
        }
    }
}

impl TryFrom<Subtask> for DomainSubtask {
    type Error = TypeConstraintError;

    fn try_from(subtask: Subtask) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SubtaskId::new(subtask.id)?,
            title: subtask.title,
            is_completed: subtask.is_completed,
            sort_order: subtask.sort_order,
        })
    }
}

impl Task {
    /// Builds the domain task with its already loaded checklist.
    pub fn into_domain(self, subtasks: Vec<DomainSubtask>) -> Result<DomainTask, TypeConstraintError> {
        Ok(DomainTask {
            id: TaskId::new(self.id)?,
            tenant_id: TenantId::new(self.tenant_id)?,
            title: self.title,
            description: self.description,
            status: self.status.parse()?,
            priority: self.priority.parse()?,
            due_date: self.due_date,
            assignee_id: UserId::new(self.assignee_id)?,
            created_by_id: opt_id(self.created_by_id)?,
            client_id: opt_id(self.client_id)?,
            lead_id: opt_id(self.lead_id)?,
            job_id: opt_id(self.job_id)?,
            invoice_id: opt_id(self.invoice_id)?,
            issue_id: opt_id(self.issue_id)?,
            completed_at: self.completed_at,
            subtasks,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl<'a> NewTask<'a> {
    pub fn new(task: &'a DomainNewTask, completed_at: Option<NaiveDateTime>) -> Self {
        Self {
            tenant_id: task.tenant_id.get(),
            title: task.title.as_str(),
            description: task.description.as_deref(),
            status: task.status.as_str(),
            priority: task.priority.as_str(),
            due_date: task.due_date,
            assignee_id: task.assignee_id.get(),
            created_by_id: task.created_by_id.map(|id| id.get()),
            client_id: task.client_id.map(|id| id.get()),
            lead_id: task.lead_id.map(|id| id.get()),
            job_id: task.job_id.map(|id| id.get()),
            invoice_id: task.invoice_id.map(|id| id.get()),
            issue_id: task.issue_id.map(|id| id.get()),
            completed_at,
        }
    }
}

impl<'a> UpdateTask<'a> {
    pub fn from_domain(task: &'a DomainUpdateTask, updated_at: NaiveDateTime) -> Self {
        Self {
            title: task.title.as_str(),
            description: task.description.as_deref(),
            status: task.status.as_str(),
            priority: task.priority.as_str(),
            due_date: task.due_date,
            assignee_id: task.assignee_id.get(),
            completed_at: task.completed_at,
            updated_at,
        }
    }
}
