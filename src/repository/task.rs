use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::{
        activity::{ActivityKind, NewActivity},
        task::{NewSubtask, NewTask, Subtask, Task, TaskStatus, UpdateTask},
        types::{TaskId, TenantId, UserId},
    },
    models::task::{
        NewSubtask as DbNewSubtask, NewTask as DbNewTask, Subtask as DbSubtask, Task as DbTask,
        UpdateTask as DbUpdateTask,
    },
    repository::{
        DieselRepository, TaskListQuery, TaskReader, TaskWriter,
        activity::insert_activity,
        errors::{RepositoryError, RepositoryResult},
        issue::priority_rank,
    },
};

fn load_subtasks(conn: &mut SqliteConnection, task_id: i32) -> RepositoryResult<Vec<Subtask>> {
    use crate::schema::subtasks;

    subtasks::table
        .filter(subtasks::task_id.eq(task_id))
        .order((subtasks::sort_order.asc(), subtasks::id.asc()))
        .load::<DbSubtask>(conn)?
        .into_iter()
        .map(|subtask| Subtask::try_from(subtask).map_err(RepositoryError::from))
        .collect()
}

fn with_subtasks(conn: &mut SqliteConnection, task: DbTask) -> RepositoryResult<Task> {
    let subtasks = load_subtasks(conn, task.id)?;
    Ok(task.into_domain(subtasks)?)
}

fn find_task(conn: &mut SqliteConnection, id: i32, tenant_id: i32) -> RepositoryResult<Option<Task>> {
    use crate::schema::tasks;

    let task = tasks::table
        .filter(tasks::id.eq(id))
        .filter(tasks::tenant_id.eq(tenant_id))
        .first::<DbTask>(conn)
        .optional()?;

    task.map(|task| with_subtasks(conn, task)).transpose()
}

/// Checklist positions follow the submitted order.
fn insert_subtasks(
    conn: &mut SqliteConnection,
    task_id: i32,
    subtasks: &[NewSubtask],
) -> RepositoryResult<()> {
    use crate::schema::subtasks;

    let rows: Vec<DbNewSubtask> = subtasks
        .iter()
        .enumerate()
        .map(|(index, subtask)| {
            DbNewSubtask::new(task_id, i32::try_from(index).unwrap_or(i32::MAX), subtask)
        })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(subtasks::table)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(())
}

fn ensure_tenant_assignee(
    conn: &mut SqliteConnection,
    tenant_id: i32,
    assignee: UserId,
) -> RepositoryResult<()> {
    use crate::schema::users;

    let found = users::table
        .filter(users::id.eq(assignee.get()))
        .filter(users::tenant_id.eq(tenant_id))
        .count()
        .get_result::<i64>(conn)?;
    if found == 0 {
        return Err(RepositoryError::Rejected(format!(
            "User {} does not belong to this tenant",
            assignee.get()
        )));
    }
    Ok(())
}

impl TaskReader for DieselRepository {
    fn get_task_by_id(&self, id: TaskId, tenant_id: TenantId) -> RepositoryResult<Option<Task>> {
        let mut conn = self.conn()?;
        find_task(&mut conn, id.get(), tenant_id.get())
    }

    fn list_tasks(&self, query: TaskListQuery) -> RepositoryResult<(usize, Vec<Task>)> {
        use crate::schema::tasks;

        let mut conn = self.conn()?;

        let filtered = || {
            let mut items = tasks::table
                .filter(tasks::tenant_id.eq(query.tenant_id.get()))
                .into_boxed();

            if !query.statuses.is_empty() {
                let statuses: Vec<&'static str> =
                    query.statuses.iter().map(|status| status.as_str()).collect();
                items = items.filter(tasks::status.eq_any(statuses));
            }
            if let Some(user_id) = query.assignee {
                items = items.filter(tasks::assignee_id.eq(user_id.get()));
            }
            if let Some(user_id) = query.involving {
                items = items.filter(
                    tasks::created_by_id
                        .eq(user_id.get())
                        .or(tasks::assignee_id.eq(user_id.get())),
                );
            }
            if let Some(term) = &query.search {
                let pattern = format!("%{term}%");
                items = items.filter(
                    tasks::title
                        .like(pattern.clone())
                        .or(tasks::description.like(pattern)),
                );
            }

            items
        };

        let total = filtered().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = filtered().order((
            priority_rank().desc(),
            tasks::due_date.is_null().asc(),
            tasks::due_date.asc(),
            tasks::created_at.desc(),
        ));
        if let Some(page) = &query.pagination {
            items = items.limit(page.limit as i64).offset(page.offset() as i64);
        }

        let rows = items.load::<DbTask>(&mut conn)?;
        let items = rows
            .into_iter()
            .map(|task| with_subtasks(&mut conn, task))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total, items))
    }
}

impl TaskWriter for DieselRepository {
    fn create_task(&self, new_task: &NewTask) -> RepositoryResult<Task> {
        use crate::schema::tasks;

        let mut conn = self.conn()?;
        let completed_at =
            (new_task.status == TaskStatus::Completed).then(|| Utc::now().naive_utc());

        conn.transaction::<_, RepositoryError, _>(|conn| {
            ensure_tenant_assignee(conn, new_task.tenant_id.get(), new_task.assignee_id)?;

            let created = diesel::insert_into(tasks::table)
                .values(&DbNewTask::new(new_task, completed_at))
                .get_result::<DbTask>(conn)?;
            insert_subtasks(conn, created.id, &new_task.subtasks)?;
            let task = with_subtasks(conn, created)?;

            insert_activity(
                conn,
                &NewActivity::new(
                    task.tenant_id,
                    task.created_by_id,
                    ActivityKind::TaskCreated,
                    format!("Task \"{}\" created", task.title),
                )
                .client(task.client_id)
                .lead(task.lead_id)
                .job(task.job_id),
            )?;

            Ok(task)
        })
    }

    fn update_task(
        &self,
        id: TaskId,
        tenant_id: TenantId,
        actor: Option<UserId>,
        updates: &UpdateTask,
    ) -> RepositoryResult<Task> {
        use crate::schema::{subtasks, tasks};

        let mut conn = self.conn()?;
        let changes = DbUpdateTask::from_domain(updates, Utc::now().naive_utc());

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let current =
                find_task(conn, id.get(), tenant_id.get())?.ok_or(RepositoryError::NotFound)?;
            if updates.assignee_id != current.assignee_id {
                ensure_tenant_assignee(conn, tenant_id.get(), updates.assignee_id)?;
            }

            let updated = diesel::update(tasks::table.find(current.id.get()))
                .set(&changes)
                .get_result::<DbTask>(conn)?;

            if let Some(checklist) = &updates.subtasks {
                diesel::delete(subtasks::table.filter(subtasks::task_id.eq(updated.id)))
                    .execute(conn)?;
                insert_subtasks(conn, updated.id, checklist)?;
            }
            let task = with_subtasks(conn, updated)?;

            if task.status != current.status {
                let (kind, description) = if task.status == TaskStatus::Completed {
                    (
                        ActivityKind::TaskCompleted,
                        format!("Task \"{}\" completed", task.title),
                    )
                } else {
                    (
                        ActivityKind::TaskUpdated,
                        format!(
                            "Task \"{}\" status changed to {}",
                            task.title,
                            task.status.as_str()
                        ),
                    )
                };
                insert_activity(
                    conn,
                    &NewActivity::new(tenant_id, actor, kind, description)
                        .client(task.client_id)
                        .lead(task.lead_id)
                        .job(task.job_id),
                )?;
            }

            Ok(task)
        })
    }

    fn delete_task(&self, id: TaskId, tenant_id: TenantId) -> RepositoryResult<()> {
        use crate::schema::{subtasks, tasks};

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            find_task(conn, id.get(), tenant_id.get())?.ok_or(RepositoryError::NotFound)?;

            diesel::delete(subtasks::table.filter(subtasks::task_id.eq(id.get()))).execute(conn)?;
            diesel::delete(tasks::table.find(id.get())).execute(conn)?;
            Ok(())
        })
    }
}
