use chrono::{NaiveDateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::{
        job::{JOB_NUMBER_PREFIX, Job, JobDetail, JobStatus, NewJob, UpdateJob, newly_assigned},
        notification::{NewNotification, NotificationKind},
        types::{JobId, TenantId, UserId},
        user::User,
    },
    models::{
        job::{Job as DbJob, NewJob as DbNewJob, NewJobAssignment, UpdateJob as DbUpdateJob},
        user::User as DbUser,
    },
    repository::{
        AssignmentChange, DieselRepository, JobListQuery, JobReader, JobWriter,
        document::next_number,
        errors::{RepositoryError, RepositoryResult},
        notification::insert_notification,
    },
};

pub(crate) fn find_job(
    conn: &mut SqliteConnection,
    id: i32,
    tenant_id: i32,
) -> RepositoryResult<Option<Job>> {
    use crate::schema::jobs;

    let job = jobs::table
        .filter(jobs::id.eq(id))
        .filter(jobs::tenant_id.eq(tenant_id))
        .first::<DbJob>(conn)
        .optional()?;

    job.map(Job::try_from).transpose().map_err(RepositoryError::from)
}

/// Inserts `new_job` under the next free `JOB-` number of its tenant.
pub(crate) fn insert_job(conn: &mut SqliteConnection, new_job: &NewJob) -> RepositoryResult<Job> {
    use crate::schema::jobs;

    let tenant_id = new_job.tenant_id.get();
    let count = jobs::table
        .filter(jobs::tenant_id.eq(tenant_id))
        .count()
        .get_result::<i64>(conn)?;

    let job_number = next_number(JOB_NUMBER_PREFIX, count, |candidate| {
        Ok(diesel::select(exists(
            jobs::table
                .filter(jobs::tenant_id.eq(tenant_id))
                .filter(jobs::job_number.eq(candidate)),
        ))
        .get_result::<bool>(&mut *conn)?)
    })?;

    let created = diesel::insert_into(jobs::table)
        .values(&DbNewJob::new(new_job, &job_number))
        .get_result::<DbJob>(conn)?;

    Ok(Job::try_from(created)?)
}

fn assignees(conn: &mut SqliteConnection, job_id: i32) -> RepositoryResult<Vec<User>> {
    use crate::schema::{job_assignments, users};

    job_assignments::table
        .inner_join(users::table)
        .filter(job_assignments::job_id.eq(job_id))
        .order((users::last_name.asc(), users::first_name.asc()))
        .select(users::all_columns)
        .load::<DbUser>(conn)?
        .into_iter()
        .map(|user| User::try_from(user).map_err(RepositoryError::from))
        .collect()
}

/// Replaces the crew of `job` with `user_ids` and notifies users who were
/// not on it before.
fn assign_crew(
    conn: &mut SqliteConnection,
    job: Job,
    user_ids: &[UserId],
) -> RepositoryResult<AssignmentChange> {
    use crate::schema::{job_assignments, users};

    let tenant_id = job.tenant_id;
    let requested: Vec<i32> = user_ids.iter().map(|id| id.get()).collect();
    let known = users::table
        .filter(users::tenant_id.eq(tenant_id.get()))
        .filter(users::id.eq_any(requested.clone()))
        .select(users::id)
        .load::<i32>(conn)?;
    if let Some(unknown) = requested.iter().find(|id| !known.contains(id)) {
        return Err(RepositoryError::Rejected(format!(
            "User {unknown} does not belong to this tenant"
        )));
    }

    let current = job_assignments::table
        .filter(job_assignments::job_id.eq(job.id.get()))
        .select(job_assignments::user_id)
        .load::<i32>(conn)?
        .into_iter()
        .map(UserId::new)
        .collect::<Result<Vec<_>, _>>()?;
    let added = newly_assigned(&current, user_ids);

    diesel::delete(job_assignments::table.filter(job_assignments::job_id.eq(job.id.get())))
        .execute(conn)?;

    let mut rows: Vec<NewJobAssignment> = Vec::with_capacity(user_ids.len());
    for user_id in user_ids {
        if !rows.iter().any(|row| row.user_id == user_id.get()) {
            rows.push(NewJobAssignment {
                job_id: job.id.get(),
                user_id: user_id.get(),
            });
        }
    }
    if !rows.is_empty() {
        diesel::insert_into(job_assignments::table)
            .values(&rows)
            .execute(conn)?;
    }

    for user_id in &added {
        insert_notification(
            conn,
            &NewNotification::new(
                tenant_id,
                *user_id,
                NotificationKind::JobAssigned,
                format!("Assigned to job {}", job.job_number),
            )
            .message(job.title.clone())
            .link("job", job.id.get()),
        )?;
    }

    let assignees = assignees(conn, job.id.get())?;

    Ok(AssignmentChange {
        job: JobDetail { job, assignees },
        newly_assigned: added,
    })
}

impl JobReader for DieselRepository {
    fn get_job_by_id(&self, id: JobId, tenant_id: TenantId) -> RepositoryResult<Option<JobDetail>> {
        let mut conn = self.conn()?;

        let Some(job) = find_job(&mut conn, id.get(), tenant_id.get())? else {
            return Ok(None);
        };
        let assignees = assignees(&mut conn, job.id.get())?;

        Ok(Some(JobDetail { job, assignees }))
    }

    fn list_jobs(&self, query: JobListQuery) -> RepositoryResult<(usize, Vec<Job>)> {
        use crate::schema::{job_assignments, jobs};

        let mut conn = self.conn()?;

        let filtered = || {
            let mut items = jobs::table
                .filter(jobs::tenant_id.eq(query.tenant_id.get()))
                .into_boxed();

            if let Some(status) = query.status {
                items = items.filter(jobs::status.eq(status.as_str()));
            }
            if let Some(client_id) = query.client_id {
                items = items.filter(jobs::client_id.eq(client_id.get()));
            }
            if let Some(user_id) = query.assigned_to {
                items = items.filter(
                    jobs::id.eq_any(
                        job_assignments::table
                            .filter(job_assignments::user_id.eq(user_id.get()))
                            .select(job_assignments::job_id),
                    ),
                );
            }
            if let Some(term) = &query.search {
                let pattern = format!("%{term}%");
                items = items.filter(
                    jobs::title
                        .like(pattern.clone())
                        .or(jobs::job_number.like(pattern.clone()))
                        .or(jobs::description.like(pattern)),
                );
            }

            items
        };

        let total = filtered().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = filtered().order((jobs::updated_at.desc(), jobs::id.desc()));
        if let Some(page) = &query.pagination {
            items = items.limit(page.limit as i64).offset(page.offset() as i64);
        }

        let items = items
            .load::<DbJob>(&mut conn)?
            .into_iter()
            .map(|job| Job::try_from(job).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total, items))
    }

    fn list_dispatch_jobs(
        &self,
        tenant_id: TenantId,
        day_start: NaiveDateTime,
        day_end: NaiveDateTime,
    ) -> RepositoryResult<Vec<JobDetail>> {
        use crate::schema::jobs;

        let mut conn = self.conn()?;
        let closed = [JobStatus::Completed.as_str(), JobStatus::Cancelled.as_str()];

        let rows = jobs::table
            .filter(jobs::tenant_id.eq(tenant_id.get()))
            .filter(
                jobs::scheduled_start
                    .between(day_start, day_end)
                    .or(jobs::scheduled_start
                        .is_null()
                        .and(jobs::status.ne_all(closed))),
            )
            .order((
                jobs::priority.desc(),
                jobs::scheduled_start.asc(),
                jobs::id.asc(),
            ))
            .load::<DbJob>(&mut conn)?;

        rows.into_iter()
            .map(|row| -> RepositoryResult<JobDetail> {
                let job = Job::try_from(row)?;
                let assignees = assignees(&mut conn, job.id.get())?;
                Ok(JobDetail { job, assignees })
            })
            .collect()
    }
}

impl JobWriter for DieselRepository {
    fn create_job(&self, new_job: &NewJob) -> RepositoryResult<Job> {
        let mut conn = self.conn()?;
        conn.transaction::<_, RepositoryError, _>(|conn| insert_job(conn, new_job))
    }

    fn update_job(&self, id: JobId, tenant_id: TenantId, updates: &UpdateJob) -> RepositoryResult<Job> {
        use crate::schema::jobs;

        let mut conn = self.conn()?;
        let changes = DbUpdateJob::from_domain(updates, Utc::now().naive_utc());

        let updated = diesel::update(
            jobs::table
                .filter(jobs::id.eq(id.get()))
                .filter(jobs::tenant_id.eq(tenant_id.get())),
        )
        .set(&changes)
        .get_result::<DbJob>(&mut conn)?;

        Ok(Job::try_from(updated)?)
    }

    fn delete_job(&self, id: JobId, tenant_id: TenantId) -> RepositoryResult<()> {
        use crate::schema::jobs;

        let mut conn = self.conn()?;

        let deleted = diesel::delete(
            jobs::table
                .filter(jobs::id.eq(id.get()))
                .filter(jobs::tenant_id.eq(tenant_id.get())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn set_job_status(
        &self,
        id: JobId,
        tenant_id: TenantId,
        status: JobStatus,
        completed_at: Option<NaiveDateTime>,
    ) -> RepositoryResult<Job> {
        use crate::schema::jobs;

        let mut conn = self.conn()?;

        let updated = diesel::update(
            jobs::table
                .filter(jobs::id.eq(id.get()))
                .filter(jobs::tenant_id.eq(tenant_id.get())),
        )
        .set((
            jobs::status.eq(status.as_str()),
            jobs::completed_at.eq(completed_at),
            jobs::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result::<DbJob>(&mut conn)?;

        Ok(Job::try_from(updated)?)
    }

    fn replace_job_assignments(
        &self,
        id: JobId,
        tenant_id: TenantId,
        user_ids: &[UserId],
    ) -> RepositoryResult<AssignmentChange> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let job =
                find_job(conn, id.get(), tenant_id.get())?.ok_or(RepositoryError::NotFound)?;
            assign_crew(conn, job, user_ids)
        })
    }

    fn dispatch_job(
        &self,
        id: JobId,
        tenant_id: TenantId,
        assignee: Option<UserId>,
        scheduled_start: Option<NaiveDateTime>,
        scheduled_end: Option<NaiveDateTime>,
    ) -> RepositoryResult<AssignmentChange> {
        use crate::schema::jobs;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let updated = diesel::update(
                jobs::table
                    .filter(jobs::id.eq(id.get()))
                    .filter(jobs::tenant_id.eq(tenant_id.get())),
            )
            .set((
                jobs::scheduled_start.eq(scheduled_start),
                jobs::scheduled_end.eq(scheduled_end),
                jobs::updated_at.eq(Utc::now().naive_utc()),
            ))
            .get_result::<DbJob>(conn)
            .optional()?
            .ok_or(RepositoryError::NotFound)?;

            let crew: Vec<UserId> = assignee.into_iter().collect();
            assign_crew(conn, Job::try_from(updated)?, &crew)
        })
    }
}
