//! Daily dispatch board: which jobs run when, and who works them.

use chrono::Utc;

use crate::domain::job::JobDetail;
use crate::domain::permission::Permission;
use crate::domain::user::{Role, User};
use crate::forms::dispatch::{DispatchAssignForm, DispatchAssignment, DispatchBoardParams};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{AssignmentChange, JobReader, JobWriter, UserReader};
use crate::services::{ServiceError, ServiceResult, ensure_permission, log_failure};

/// Roles that can be sent out to a job.
pub const TECH_ROLES: [Role; 3] = [Role::Field, Role::Office, Role::Admin];

/// Jobs scheduled on the requested day plus open jobs still waiting for a
/// slot.
pub fn board<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: DispatchBoardParams,
) -> ServiceResult<Vec<JobDetail>>
where
    R: JobReader + ?Sized,
{
    ensure_permission(user, Permission::DispatchView)?;
    let (day_start, day_end) = params.day_bounds(Utc::now().date_naive())?;

    repo.list_dispatch_jobs(user.tenant_id, day_start, day_end)
        .map_err(log_failure("load dispatch board"))
}

/// Active users who can take jobs, by first name.
pub fn technicians<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<User>>
where
    R: UserReader + ?Sized,
{
    ensure_permission(user, Permission::DispatchView)?;

    let mut techs: Vec<User> = repo
        .list_users(user.tenant_id)
        .map_err(log_failure("list users"))?
        .into_iter()
        .filter(|candidate| candidate.is_active() && TECH_ROLES.contains(&candidate.role))
        .collect();
    techs.sort_by(|a, b| {
        a.first_name
            .cmp(&b.first_name)
            .then_with(|| a.last_name.cmp(&b.last_name))
    });
    Ok(techs)
}

/// Schedules a job and hands it to a single technician.
pub fn assign<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: DispatchAssignForm,
) -> ServiceResult<AssignmentChange>
where
    R: JobWriter + UserReader + ?Sized,
{
    ensure_permission(user, Permission::DispatchAssign)?;
    let assignment = DispatchAssignment::try_from(form)?;

    if let Some(tech_id) = assignment.user_id {
        let tech = repo
            .get_user_by_id(tech_id, user.tenant_id)
            .map_err(log_failure("load technician"))?;
        if !tech.is_some_and(|tech| tech.is_active()) {
            return Err(ServiceError::Validation(
                "User not found or inactive".to_string(),
            ));
        }
    }

    let change = repo
        .dispatch_job(
            assignment.job_id,
            user.tenant_id,
            assignment.user_id,
            assignment.scheduled_start,
            assignment.scheduled_end,
        )
        .map_err(log_failure("dispatch job"))?;

    match assignment.user_id {
        Some(tech_id) => log::info!(
            "User {} dispatched job {} to user {tech_id}",
            user.id,
            change.job.job.job_number
        ),
        None => log::info!("User {} unassigned job {}", user.id, change.job.job.job_number),
    }
    Ok(change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::{Job, JobStatus};
    use crate::domain::types::{ClientId, JobId, UserId};
    use crate::domain::user::UserStatus;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{admin_user, stored_user, tenant, user_with_role};

    fn job() -> Job {
        let now = Utc::now().naive_utc();
        Job {
            id: JobId::new(4).unwrap(),
            tenant_id: tenant(),
            client_id: ClientId::new(2).unwrap(),
            job_number: "JOB-000004".into(),
            title: "Baseboards".into(),
            description: None,
            status: JobStatus::Scheduled,
            priority: 3,
            scheduled_start: None,
            scheduled_end: None,
            estimate_amount: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn assign_form(user_id: Option<i32>) -> DispatchAssignForm {
        DispatchAssignForm {
            job_id: 4,
            user_id,
            scheduled_start: Some("2025-06-12T08:00:00".into()),
            scheduled_end: None,
        }
    }

    #[test]
    fn technicians_exclude_inactive_and_office_only_roles() {
        let mut repo = MockRepository::new();
        repo.expect_list_users().returning(|_| {
            let mut zoe = stored_user(2, Role::Field, UserStatus::Active);
            zoe.first_name = "Zoe".into();
            let mut ada = stored_user(3, Role::Office, UserStatus::Active);
            ada.first_name = "Ada".into();
            Ok(vec![
                zoe,
                stored_user(4, Role::Field, UserStatus::Inactive),
                stored_user(5, Role::Sales, UserStatus::Active),
                ada,
            ])
        });

        let techs = technicians(&repo, &admin_user()).unwrap();

        let ids: Vec<i32> = techs.iter().map(|tech| tech.id.get()).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn assignment_goes_to_one_technician() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(|id, _| Ok(Some(stored_user(id.get(), Role::Field, UserStatus::Active))));
        repo.expect_dispatch_job()
            .withf(|id, _, assignee, start, end| {
                id.get() == 4
                    && *assignee == UserId::new(7).ok()
                    && start.is_some()
                    && end.is_none()
            })
            .times(1)
            .returning(|_, _, assignee, start, _| {
                Ok(AssignmentChange {
                    job: JobDetail {
                        job: Job {
                            scheduled_start: start,
                            ..job()
                        },
                        assignees: vec![stored_user(7, Role::Field, UserStatus::Active)],
                    },
                    newly_assigned: assignee.into_iter().collect(),
                })
            });

        let change = assign(&repo, &admin_user(), assign_form(Some(7))).unwrap();

        assert_eq!(change.newly_assigned, vec![UserId::new(7).unwrap()]);
        assert!(change.job.job.scheduled_start.is_some());
    }

    #[test]
    fn inactive_technician_is_refused() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(|id, _| Ok(Some(stored_user(id.get(), Role::Field, UserStatus::Inactive))));
        repo.expect_dispatch_job().times(0);

        let result = assign(&repo, &admin_user(), assign_form(Some(7)));

        assert!(
            matches!(result, Err(ServiceError::Validation(message)) if message == "User not found or inactive")
        );
    }

    #[test]
    fn field_staff_cannot_dispatch() {
        let repo = MockRepository::new();

        let result = assign(&repo, &user_with_role(Role::Field), assign_form(None));

        assert!(matches!(result, Err(ServiceError::Forbidden)));
    }
}
