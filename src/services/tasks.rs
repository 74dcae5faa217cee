use chrono::Utc;

use crate::domain::notification::{NewNotification, NotificationKind};
use crate::domain::permission::Permission;
use crate::domain::task::Task;
use crate::domain::types::{TaskId, UserId};
use crate::dto::Listing;
use crate::forms::tasks::{TaskFilter, TaskForm, TaskListParams, TaskUpdateForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{
    ClientReader, InvoiceReader, IssueReader, JobReader, LeadReader, NotificationWriter,
    TaskListQuery, TaskReader, TaskWriter, UserReader,
};
use crate::services::notifications::deliver;
use crate::services::{
    ServiceError, ServiceResult, ensure_permission, ensure_tenant_client, ensure_tenant_user,
    log_failure,
};

fn task_id(id: i32) -> ServiceResult<TaskId> {
    TaskId::new(id).map_err(|_| ServiceError::NotFound)
}

fn load_task<R>(repo: &R, user: &AuthenticatedUser, id: TaskId) -> ServiceResult<Task>
where
    R: TaskReader + ?Sized,
{
    repo.get_task_by_id(id, user.tenant_id)
        .map_err(log_failure("load task"))?
        .ok_or(ServiceError::NotFound)
}

fn notify_assignee<R>(repo: &R, user: &AuthenticatedUser, task: &Task)
where
    R: NotificationWriter + ?Sized,
{
    if task.assignee_id == user.id {
        return;
    }
    deliver(
        repo,
        &NewNotification::new(
            user.tenant_id,
            task.assignee_id,
            NotificationKind::TaskAssigned,
            "New Task Assigned",
        )
        .message(format!("You were assigned a task: \"{}\"", task.title))
        .link("task", task.id.get()),
    );
}

pub fn list_tasks<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: TaskListParams,
) -> ServiceResult<Listing<Task>>
where
    R: TaskReader + ?Sized,
{
    ensure_permission(user, Permission::TasksViewAll)?;

    let page = params.page_request();
    let mut query = TaskListQuery::new(user.tenant_id)
        .statuses(&params.statuses()?)
        .paginate(page);
    if let Some(term) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.search(term);
    }
    if let Some(assignee) = params.assignee_id.and_then(|id| UserId::new(id).ok()) {
        query = query.assignee(assignee);
    }
    query = match params.filter {
        TaskFilter::All => query,
        TaskFilter::My => query.involving(user.id),
        TaskFilter::Assigned => query.assignee(user.id),
    };

    let (total, tasks) = repo.list_tasks(query).map_err(log_failure("list tasks"))?;
    Ok(Listing::new(total, tasks, page))
}

pub fn get_task<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<Task>
where
    R: TaskReader + ?Sized,
{
    ensure_permission(user, Permission::TasksViewAll)?;
    load_task(repo, user, task_id(id)?)
}

/// Creates a task for a teammate. A task filed against a job is also
/// filed against that job's client.
pub fn create_task<R>(repo: &R, user: &AuthenticatedUser, form: TaskForm) -> ServiceResult<Task>
where
    R: TaskWriter
        + UserReader
        + ClientReader
        + LeadReader
        + JobReader
        + InvoiceReader
        + IssueReader
        + NotificationWriter
        + ?Sized,
{
    ensure_permission(user, Permission::TasksCreate)?;
    let mut new_task = form.into_new_task(user.tenant_id, user.id)?;
    ensure_tenant_user(repo, user.tenant_id, Some(new_task.assignee_id))?;

    match new_task.job_id {
        Some(job_id) => {
            let job = repo
                .get_job_by_id(job_id, user.tenant_id)
                .map_err(log_failure("load referenced job"))?
                .ok_or(ServiceError::NotFound)?;
            new_task.client_id = Some(job.job.client_id);
        }
        None => ensure_tenant_client(repo, user.tenant_id, new_task.client_id)?,
    }
    if let Some(lead_id) = new_task.lead_id {
        repo.get_lead_by_id(lead_id, user.tenant_id)
            .map_err(log_failure("load referenced lead"))?
            .ok_or(ServiceError::NotFound)?;
    }
    if let Some(invoice_id) = new_task.invoice_id {
        repo.get_invoice_by_id(invoice_id, user.tenant_id)
            .map_err(log_failure("load referenced invoice"))?
            .ok_or(ServiceError::NotFound)?;
    }
    if let Some(issue_id) = new_task.issue_id {
        repo.get_issue_by_id(issue_id, user.tenant_id)
            .map_err(log_failure("load referenced issue"))?
            .ok_or(ServiceError::NotFound)?;
    }

    let task = repo.create_task(&new_task).map_err(log_failure("create task"))?;

    notify_assignee(repo, user, &task);
    log::info!("User {} created task {}", user.id, task.id);
    Ok(task)
}

/// Editors may change any task; everyone else only the ones assigned to
/// them.
pub fn update_task<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: TaskUpdateForm,
) -> ServiceResult<Task>
where
    R: TaskReader + TaskWriter + UserReader + NotificationWriter + ?Sized,
{
    let id = task_id(id)?;
    if !user.has_permission(Permission::TasksEdit) {
        ensure_permission(user, Permission::TasksViewAll)?;
    }
    let current = load_task(repo, user, id)?;
    if current.assignee_id != user.id {
        ensure_permission(user, Permission::TasksEdit)?;
    }

    let update = form.into_update(&current, Utc::now().naive_utc())?;
    if update.assignee_id != current.assignee_id {
        ensure_tenant_user(repo, user.tenant_id, Some(update.assignee_id))?;
    }

    let task = repo
        .update_task(id, user.tenant_id, Some(user.id), &update)
        .map_err(log_failure("update task"))?;

    if task.assignee_id != current.assignee_id {
        notify_assignee(repo, user, &task);
    }
    Ok(task)
}

pub fn delete_task<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: TaskWriter + ?Sized,
{
    ensure_permission(user, Permission::TasksDelete)?;
    let id = task_id(id)?;
    repo.delete_task(id, user.tenant_id)
        .map_err(log_failure("delete task"))?;
    log::info!("User {} deleted task {}", user.id, id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::issue::Priority;
    use crate::domain::job::{Job, JobDetail, JobStatus};
    use crate::domain::notification::{Notification, NotificationStatus};
    use crate::domain::task::TaskStatus;
    use crate::domain::types::{ClientId, JobId, NotificationId};
    use crate::domain::user::{Role, UserStatus};
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{admin_user, stored_user, tenant, user_with_role};

    fn stored_task(status: TaskStatus, assignee: i32) -> Task {
        let now = Utc::now().naive_utc();
        Task {
            id: TaskId::new(12).unwrap(),
            tenant_id: tenant(),
            title: "Order crown molding".into(),
            description: None,
            status,
            priority: Priority::Medium,
            due_date: None,
            assignee_id: UserId::new(assignee).unwrap(),
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

    fn echo_notification(new: &NewNotification) -> Notification {
        Notification {
            id: NotificationId::new(1).unwrap(),
            tenant_id: new.tenant_id,
            user_id: new.user_id,
            kind: new.kind,
            title: new.title.clone(),
            message: new.message.clone(),
            link_type: new.link_type.clone(),
            link_id: new.link_id,
            requires_ack: false,
            status: NotificationStatus::Unread,
            read_at: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    fn job_for_client(client: i32) -> JobDetail {
        let now = Utc::now().naive_utc();
        JobDetail {
            job: Job {
                id: JobId::new(30).unwrap(),
                tenant_id: tenant(),
                client_id: ClientId::new(client).unwrap(),
                job_number: "JOB-000030".into(),
                title: "Kitchen trim".into(),
                description: None,
                status: JobStatus::Scheduled,
                priority: 3,
                scheduled_start: None,
                scheduled_end: None,
                estimate_amount: None,
                completed_at: None,
                created_at: now,
                updated_at: now,
            },
            assignees: Vec::new(),
        }
    }

    #[test]
    fn job_supplies_the_client() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(|id, _| Ok(Some(stored_user(id.get(), Role::Field, UserStatus::Active))));
        repo.expect_get_job_by_id()
            .returning(|_, _| Ok(Some(job_for_client(9))));
        repo.expect_create_task()
            .withf(|task| task.client_id == Some(ClientId::new(9).unwrap()))
            .times(1)
            .returning(|_| Ok(stored_task(TaskStatus::Todo, 4)));
        repo.expect_create_notification()
            .withf(|n| n.kind == NotificationKind::TaskAssigned && n.user_id.get() == 4)
            .times(1)
            .returning(|n| Ok(echo_notification(n)));

        let form: TaskForm =
            serde_json::from_str(r#"{"title":"Order crown molding","assigneeId":4,"jobId":30}"#)
                .unwrap();

        assert!(create_task(&repo, &admin_user(), form).is_ok());
    }

    #[test]
    fn assignee_outside_tenant_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id().returning(|_, _| Ok(None));
        repo.expect_create_task().times(0);

        let form: TaskForm =
            serde_json::from_str(r#"{"title":"Order crown molding","assigneeId":40}"#).unwrap();

        assert!(matches!(
            create_task(&repo, &admin_user(), form),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn assignee_may_complete_own_task() {
        let mut repo = MockRepository::new();
        repo.expect_get_task_by_id()
            .returning(|_, _| Ok(Some(stored_task(TaskStatus::InProgress, 1))));
        repo.expect_update_task()
            .withf(|_, _, _, update| {
                update.status == TaskStatus::Completed && update.completed_at.is_some()
            })
            .returning(|_, _, _, _| Ok(stored_task(TaskStatus::Completed, 1)));

        let form: TaskUpdateForm = serde_json::from_str(r#"{"status":"COMPLETED"}"#).unwrap();
        let task = update_task(&repo, &user_with_role(Role::Field), 12, form).unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[test]
    fn others_tasks_need_edit_rights() {
        let mut repo = MockRepository::new();
        repo.expect_get_task_by_id()
            .returning(|_, _| Ok(Some(stored_task(TaskStatus::Todo, 7))));
        repo.expect_update_task().times(0);

        let result = update_task(
            &repo,
            &user_with_role(Role::Field),
            12,
            TaskUpdateForm::default(),
        );

        assert!(matches!(result, Err(ServiceError::Forbidden)));
    }

    #[test]
    fn pending_filter_asks_for_open_statuses() {
        let mut repo = MockRepository::new();
        repo.expect_list_tasks()
            .withf(|query| {
                query.statuses == TaskStatus::PENDING.to_vec()
                    && query.involving == Some(UserId::new(1).unwrap())
            })
            .returning(|_| Ok((0, Vec::new())));

        let params: TaskListParams =
            serde_json::from_str(r#"{"status":"PLANNING_PENDING","filter":"my"}"#).unwrap();
        let listing = list_tasks(&repo, &admin_user(), params).unwrap();

        assert!(listing.items.is_empty());
    }
}
