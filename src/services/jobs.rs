use chrono::Utc;

use crate::domain::job::{Job, JobDetail, JobStatus};
use crate::domain::permission::Permission;
use crate::domain::types::{ClientId, JobId, UserId};
use crate::dto::Listing;
use crate::forms::jobs::{AssignmentsForm, JobForm, JobListParams, JobStatusForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{
    AssignmentChange, ClientReader, JobListQuery, JobReader, JobWriter,
};
use crate::services::{
    ServiceError, ServiceResult, ensure_permission, ensure_tenant_client, log_failure,
};

fn job_id(id: i32) -> ServiceResult<JobId> {
    JobId::new(id).map_err(|_| ServiceError::NotFound)
}

fn load<R>(repo: &R, user: &AuthenticatedUser, id: JobId) -> ServiceResult<JobDetail>
where
    R: JobReader + ?Sized,
{
    repo.get_job_by_id(id, user.tenant_id)
        .map_err(log_failure("load job"))?
        .ok_or(ServiceError::NotFound)
}

pub fn list_jobs<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: JobListParams,
) -> ServiceResult<Listing<Job>>
where
    R: JobReader + ?Sized,
{
    ensure_permission(user, Permission::JobsViewAll)?;

    let page = params.page_request();
    let mut query = JobListQuery::new(user.tenant_id).paginate(page);
    if let Some(term) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.search(term);
    }
    if let Some(status) = params.status {
        query = query.status(status);
    }
    if let Some(client_id) = params.client_id.and_then(|id| ClientId::new(id).ok()) {
        query = query.client(client_id);
    }
    if let Some(assignee) = params.assigned_to.and_then(|id| UserId::new(id).ok()) {
        query = query.assigned_to(assignee);
    }

    let (total, jobs) = repo.list_jobs(query).map_err(log_failure("list jobs"))?;
    Ok(Listing::new(total, jobs, page))
}

/// The job with its assigned crew.
pub fn get_job<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<JobDetail>
where
    R: JobReader + ?Sized,
{
    ensure_permission(user, Permission::JobsViewAll)?;
    load(repo, user, job_id(id)?)
}

pub fn create_job<R>(repo: &R, user: &AuthenticatedUser, form: JobForm) -> ServiceResult<Job>
where
    R: JobWriter + ClientReader + ?Sized,
{
    ensure_permission(user, Permission::JobsCreate)?;
    let new_job = form.into_new_job(user.tenant_id)?;
    ensure_tenant_client(repo, user.tenant_id, Some(new_job.client_id))?;

    let job = repo.create_job(&new_job).map_err(log_failure("create job"))?;
    log::info!("User {} created job {}", user.id, job.job_number);
    Ok(job)
}

pub fn update_job<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: JobForm,
) -> ServiceResult<Job>
where
    R: JobReader + JobWriter + ClientReader + ?Sized,
{
    ensure_permission(user, Permission::JobsEdit)?;
    let id = job_id(id)?;
    let current = load(repo, user, id)?;
    let updates = form.into_update(&current.job)?;
    ensure_tenant_client(repo, user.tenant_id, Some(updates.client_id))?;

    repo.update_job(id, user.tenant_id, &updates)
        .map_err(log_failure("update job"))
}

pub fn delete_job<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: JobWriter + ?Sized,
{
    ensure_permission(user, Permission::JobsDelete)?;
    let id = job_id(id)?;
    repo.delete_job(id, user.tenant_id)
        .map_err(log_failure("delete job"))?;
    log::info!("User {} deleted job {id}", user.id);
    Ok(())
}

/// Moves the job to `status`; completing it stamps `completedAt`.
pub fn set_status<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: JobStatusForm,
) -> ServiceResult<Job>
where
    R: JobReader + JobWriter + ?Sized,
{
    ensure_permission(user, Permission::JobsEdit)?;
    let current = load(repo, user, job_id(id)?)?.job;

    let completed_at = if form.status == JobStatus::Completed {
        Some(Utc::now().naive_utc())
    } else {
        current.completed_at
    };

    let job = repo
        .set_job_status(current.id, user.tenant_id, form.status, completed_at)
        .map_err(log_failure("update job status"))?;
    log::info!(
        "Job {} moved from {} to {}",
        job.job_number,
        current.status.as_str(),
        job.status.as_str()
    );
    Ok(job)
}

/// Replaces the crew; users joining the job are notified by the repository
/// in the same transaction.
pub fn set_assignments<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: AssignmentsForm,
) -> ServiceResult<AssignmentChange>
where
    R: JobWriter + ?Sized,
{
    ensure_permission(user, Permission::JobsEdit)?;
    let id = job_id(id)?;
    let user_ids = form.user_ids()?;

    let change = repo
        .replace_job_assignments(id, user.tenant_id, &user_ids)
        .map_err(log_failure("assign job"))?;
    log::info!(
        "Job {} assigned to {} users ({} new)",
        change.job.job.job_number,
        change.job.assignees.len(),
        change.newly_assigned.len()
    );
    Ok(change)
}
