use chrono::Utc;

use crate::domain::issue::{Issue, IssueDetail, IssueNote};
use crate::domain::notification::{NewNotification, NotificationKind};
use crate::domain::permission::Permission;
use crate::domain::types::{ClientId, IssueId, JobId, LeadId, UserId};
use crate::dto::Listing;
use crate::forms::issues::{IssueFilter, IssueForm, IssueListParams, IssueNoteForm, IssueUpdateForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{
    ClientReader, IssueListQuery, IssueReader, IssueWriter, JobReader, LeadReader,
    NotificationWriter, UserReader,
};
use crate::services::notifications::deliver;
use crate::services::{
    ServiceError, ServiceResult, ensure_permission, ensure_tenant_client, ensure_tenant_user,
    log_failure,
};

fn issue_id(id: i32) -> ServiceResult<IssueId> {
    IssueId::new(id).map_err(|_| ServiceError::NotFound)
}

fn load_issue<R>(repo: &R, user: &AuthenticatedUser, id: IssueId) -> ServiceResult<IssueDetail>
where
    R: IssueReader + ?Sized,
{
    repo.get_issue_by_id(id, user.tenant_id)
        .map_err(log_failure("load issue"))?
        .ok_or(ServiceError::NotFound)
}

/// Client, lead and job an issue may point at must be the caller's.
fn check_links<R>(
    repo: &R,
    user: &AuthenticatedUser,
    client_id: Option<ClientId>,
    lead_id: Option<LeadId>,
    job_id: Option<JobId>,
) -> ServiceResult<()>
where
    R: ClientReader + LeadReader + JobReader + ?Sized,
{
    ensure_tenant_client(repo, user.tenant_id, client_id)?;
    if let Some(lead_id) = lead_id {
        repo.get_lead_by_id(lead_id, user.tenant_id)
            .map_err(log_failure("load referenced lead"))?
            .ok_or(ServiceError::NotFound)?;
    }
    if let Some(job_id) = job_id {
        repo.get_job_by_id(job_id, user.tenant_id)
            .map_err(log_failure("load referenced job"))?
            .ok_or(ServiceError::NotFound)?;
    }
    Ok(())
}

fn notify_assignee<R>(repo: &R, user: &AuthenticatedUser, issue: &Issue)
where
    R: NotificationWriter + ?Sized,
{
    let Some(assignee) = issue.assignee_id.filter(|assignee| *assignee != user.id) else {
        return;
    };
    deliver(
        repo,
        &NewNotification::new(
            user.tenant_id,
            assignee,
            NotificationKind::IssueAssigned,
            "Issue Assigned",
        )
        .message(format!("{} assigned you: \"{}\"", user.email, issue.title))
        .link("issue", issue.id.get()),
    );
}

pub fn list_issues<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: IssueListParams,
) -> ServiceResult<Listing<Issue>>
where
    R: IssueReader + ?Sized,
{
    ensure_permission(user, Permission::IssuesViewAll)?;

    let page = params.page_request();
    let mut query = IssueListQuery::new(user.tenant_id).paginate(page);
    if let Some(term) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.search(term);
    }
    if let Some(status) = params.status {
        query = query.status(status);
    }
    if let Some(issue_type) = params.issue_type {
        query = query.issue_type(issue_type);
    }
    if let Some(assignee) = params.assignee_id.and_then(|id| UserId::new(id).ok()) {
        query = query.assignee(assignee);
    }
    query = match params.filter {
        IssueFilter::All => query,
        IssueFilter::My => query.created_by(user.id),
        IssueFilter::Assigned => query.assignee(user.id),
        IssueFilter::Watched => query.watched_by(user.id),
    };

    let (total, issues) = repo.list_issues(query).map_err(log_failure("list issues"))?;
    Ok(Listing::new(total, issues, page))
}

pub fn get_issue<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<IssueDetail>
where
    R: IssueReader + ?Sized,
{
    ensure_permission(user, Permission::IssuesViewAll)?;
    load_issue(repo, user, issue_id(id)?)
}

/// Opens an issue watched by its creator and notifies the assignee.
pub fn create_issue<R>(repo: &R, user: &AuthenticatedUser, form: IssueForm) -> ServiceResult<Issue>
where
    R: IssueWriter
        + UserReader
        + ClientReader
        + LeadReader
        + JobReader
        + NotificationWriter
        + ?Sized,
{
    ensure_permission(user, Permission::IssuesCreate)?;
    let new_issue = form.into_new_issue(user.tenant_id, user.id)?;
    ensure_tenant_user(repo, user.tenant_id, new_issue.assignee_id)?;
    check_links(repo, user, new_issue.client_id, new_issue.lead_id, new_issue.job_id)?;

    let issue = repo
        .create_issue(&new_issue)
        .map_err(log_failure("create issue"))?;

    notify_assignee(repo, user, &issue);
    log::info!("User {} opened issue {}", user.id, issue.id);
    Ok(issue)
}

/// Applies a partial edit, keeping the response timeline in step with the
/// status.
pub fn update_issue<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: IssueUpdateForm,
) -> ServiceResult<Issue>
where
    R: IssueReader + IssueWriter + UserReader + NotificationWriter + ?Sized,
{
    ensure_permission(user, Permission::IssuesEdit)?;
    let id = issue_id(id)?;
    let current = load_issue(repo, user, id)?.issue;

    let update = form.into_update(&current, Utc::now().naive_utc())?;
    if update.assignee_id != current.assignee_id {
        ensure_tenant_user(repo, user.tenant_id, update.assignee_id)?;
    }

    let issue = repo
        .update_issue(id, user.tenant_id, Some(user.id), &update)
        .map_err(log_failure("update issue"))?;

    if issue.assignee_id != current.assignee_id {
        notify_assignee(repo, user, &issue);
    }
    if issue.status != current.status {
        log::info!(
            "Issue {} moved from {} to {}",
            issue.id,
            current.status.as_str(),
            issue.status.as_str()
        );
    }
    Ok(issue)
}

/// Issues are never removed; deleting one cancels it.
pub fn delete_issue<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<Issue>
where
    R: IssueWriter + ?Sized,
{
    ensure_permission(user, Permission::IssuesDelete)?;
    let issue = repo
        .cancel_issue(issue_id(id)?, user.tenant_id)
        .map_err(log_failure("cancel issue"))?;
    log::info!("User {} cancelled issue {}", user.id, issue.id);
    Ok(issue)
}

pub fn list_notes<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<Vec<IssueNote>>
where
    R: IssueReader + ?Sized,
{
    ensure_permission(user, Permission::IssuesViewAll)?;
    Ok(load_issue(repo, user, issue_id(id)?)?.notes)
}

/// Adds a note and tells every other watcher about it.
pub fn add_note<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: IssueNoteForm,
) -> ServiceResult<IssueNote>
where
    R: IssueReader + IssueWriter + NotificationWriter + ?Sized,
{
    ensure_permission(user, Permission::IssuesCreate)?;
    let detail = load_issue(repo, user, issue_id(id)?)?;
    let new_note = form.into_new_note(detail.issue.id, user.id)?;

    let note = repo
        .add_issue_note(user.tenant_id, &new_note)
        .map_err(log_failure("add issue note"))?;

    for watcher in detail.watcher_ids.iter().filter(|watcher| **watcher != user.id) {
        deliver(
            repo,
            &NewNotification::new(
                user.tenant_id,
                *watcher,
                NotificationKind::System,
                "New Note on Issue",
            )
            .message(format!(
                "{} added a note to \"{}\"",
                user.email, detail.issue.title
            ))
            .link("issue", detail.issue.id.get()),
        );
    }
    Ok(note)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::issue::{IssueStatus, IssueType, Priority};
    use crate::domain::notification::{Notification, NotificationStatus};
    use crate::domain::types::{IssueNoteId, NotificationId};
    use crate::domain::user::{Role, UserStatus};
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{admin_user, stored_user, tenant, user_with_role};

    fn stored_issue(status: IssueStatus, assignee: Option<i32>) -> Issue {
        let now = Utc::now().naive_utc();
        Issue {
            id: IssueId::new(8).unwrap(),
            tenant_id: tenant(),
            title: "Baseboard gap".into(),
            description: None,
            issue_type: IssueType::Warranty,
            status,
            priority: Priority::High,
            assignee_id: assignee.map(|id| UserId::new(id).unwrap()),
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

    fn detail(watchers: &[i32]) -> IssueDetail {
        IssueDetail {
            issue: stored_issue(IssueStatus::Open, None),
            watcher_ids: watchers.iter().map(|id| UserId::new(*id).unwrap()).collect(),
            notes: Vec::new(),
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

    #[test]
    fn new_assignee_is_notified() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(|id, _| Ok(Some(stored_user(id.get(), Role::Field, UserStatus::Active))));
        repo.expect_create_issue()
            .withf(|issue| issue.created_by_id.map(UserId::get) == Some(1))
            .returning(|_| Ok(stored_issue(IssueStatus::Open, Some(4))));
        repo.expect_create_notification()
            .withf(|n| n.user_id.get() == 4 && n.kind == NotificationKind::IssueAssigned)
            .times(1)
            .returning(|n| Ok(echo_notification(n)));

        let form: IssueForm =
            serde_json::from_str(r#"{"title":"Baseboard gap","assigneeId":4}"#).unwrap();
        let issue = create_issue(&repo, &admin_user(), form).unwrap();

        assert_eq!(issue.assignee_id.map(UserId::get), Some(4));
    }

    #[test]
    fn foreign_job_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_job_by_id().returning(|_, _| Ok(None));
        repo.expect_create_issue().times(0);

        let form: IssueForm = serde_json::from_str(r#"{"title":"Baseboard gap","jobId":77}"#).unwrap();

        assert!(matches!(
            create_issue(&repo, &admin_user(), form),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn resolving_stamps_the_timeline() {
        let mut repo = MockRepository::new();
        repo.expect_get_issue_by_id().returning(|_, _| {
            let mut detail = detail(&[]);
            detail.issue.status = IssueStatus::InProgress;
            Ok(Some(detail))
        });
        repo.expect_update_issue()
            .withf(|_, _, actor, update| {
                *actor == Some(UserId::new(1).unwrap())
                    && update.status == IssueStatus::Resolved
                    && update.timeline.resolved_at.is_some()
                    && update.timeline.first_response_at.is_none()
            })
            .returning(|_, _, _, _| Ok(stored_issue(IssueStatus::Resolved, None)));

        let form: IssueUpdateForm = serde_json::from_str(r#"{"status":"RESOLVED"}"#).unwrap();
        let issue = update_issue(&repo, &admin_user(), 8, form).unwrap();

        assert_eq!(issue.status, IssueStatus::Resolved);
    }

    #[test]
    fn field_staff_cannot_edit_issues() {
        let repo = MockRepository::new();
        let result = update_issue(&repo, &user_with_role(Role::Field), 8, IssueUpdateForm::default());
        assert!(matches!(result, Err(ServiceError::Forbidden)));
    }

    #[test]
    fn note_notifies_other_watchers() {
        let mut repo = MockRepository::new();
        repo.expect_get_issue_by_id()
            .returning(|_, _| Ok(Some(detail(&[1, 5, 6]))));
        repo.expect_add_issue_note().returning(|_, note| {
            Ok(IssueNote {
                id: IssueNoteId::new(3).unwrap(),
                issue_id: note.issue_id,
                content: note.content.clone(),
                is_internal: note.is_internal,
                created_by_id: note.created_by_id,
                created_at: Utc::now().naive_utc(),
            })
        });
        repo.expect_create_notification()
            .withf(|n| n.user_id.get() != 1 && n.link_id == Some(8))
            .times(2)
            .returning(|n| Ok(echo_notification(n)));

        let form: IssueNoteForm = serde_json::from_str(r#"{"content":"Called the client"}"#).unwrap();
        let note = add_note(&repo, &admin_user(), 8, form).unwrap();

        assert_eq!(note.content, "Called the client");
    }

    #[test]
    fn deleting_cancels() {
        let mut repo = MockRepository::new();
        repo.expect_cancel_issue()
            .times(1)
            .returning(|_, _| Ok(stored_issue(IssueStatus::Cancelled, None)));

        let issue = delete_issue(&repo, &admin_user(), 8).unwrap();

        assert_eq!(issue.status, IssueStatus::Cancelled);
    }
}
