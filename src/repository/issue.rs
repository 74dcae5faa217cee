use chrono::Utc;
use diesel::dsl::sql;
use diesel::expression::SqlLiteral;
use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::{
        activity::{ActivityKind, NewActivity},
        issue::{
            Issue, IssueDetail, IssueNote, IssueStatus, NewIssue, NewIssueNote, Priority,
            UpdateIssue,
        },
        types::{IssueId, TenantId, UserId},
    },
    models::issue::{
        Issue as DbIssue, IssueNote as DbIssueNote, NewIssue as DbNewIssue,
        NewIssueNote as DbNewIssueNote, NewIssueWatcher, UpdateIssue as DbUpdateIssue,
    },
    repository::{
        DieselRepository, IssueListQuery, IssueReader, IssueWriter,
        activity::insert_activity,
        errors::{RepositoryError, RepositoryResult},
    },
};

/// Sort key of the `priority` column, most urgent highest.
pub(crate) fn priority_rank() -> SqlLiteral<Integer> {
    let cases: String = Priority::ALL
        .iter()
        .map(|priority| format!(" WHEN '{}' THEN {}", priority.as_str(), priority.rank()))
        .collect();
    sql::<Integer>(&format!("CASE priority{cases} ELSE 0 END"))
}

fn find_issue(
    conn: &mut SqliteConnection,
    id: i32,
    tenant_id: i32,
) -> RepositoryResult<Option<Issue>> {
    use crate::schema::issues;

    let issue = issues::table
        .filter(issues::id.eq(id))
        .filter(issues::tenant_id.eq(tenant_id))
        .first::<DbIssue>(conn)
        .optional()?;

    issue.map(Issue::try_from).transpose().map_err(RepositoryError::from)
}

/// Makes `user_ids` the complete watcher list of the issue.
fn replace_watchers(
    conn: &mut SqliteConnection,
    issue_id: i32,
    tenant_id: i32,
    user_ids: &[UserId],
) -> RepositoryResult<()> {
    use crate::schema::{issue_watchers, users};

    let mut requested: Vec<i32> = user_ids.iter().map(|id| id.get()).collect();
    requested.sort_unstable();
    requested.dedup();

    let known = users::table
        .filter(users::tenant_id.eq(tenant_id))
        .filter(users::id.eq_any(requested.clone()))
        .select(users::id)
        .load::<i32>(conn)?;
    if let Some(unknown) = requested.iter().find(|id| !known.contains(id)) {
        return Err(RepositoryError::Rejected(format!(
            "User {unknown} does not belong to this tenant"
        )));
    }

    diesel::delete(issue_watchers::table.filter(issue_watchers::issue_id.eq(issue_id)))
        .execute(conn)?;

    let rows: Vec<NewIssueWatcher> = requested
        .into_iter()
        .map(|user_id| NewIssueWatcher { issue_id, user_id })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(issue_watchers::table)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(())
}

impl IssueReader for DieselRepository {
    fn get_issue_by_id(
        &self,
        id: IssueId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<IssueDetail>> {
        use crate::schema::{issue_notes, issue_watchers};

        let mut conn = self.conn()?;

        let Some(issue) = find_issue(&mut conn, id.get(), tenant_id.get())? else {
            return Ok(None);
        };

        let watcher_ids = issue_watchers::table
            .filter(issue_watchers::issue_id.eq(issue.id.get()))
            .order(issue_watchers::user_id.asc())
            .select(issue_watchers::user_id)
            .load::<i32>(&mut conn)?
            .into_iter()
            .map(UserId::new)
            .collect::<Result<Vec<_>, _>>()?;

        let notes = issue_notes::table
            .filter(issue_notes::issue_id.eq(issue.id.get()))
            .order((issue_notes::created_at.asc(), issue_notes::id.asc()))
            .load::<DbIssueNote>(&mut conn)?
            .into_iter()
            .map(|note| IssueNote::try_from(note).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(Some(IssueDetail {
            issue,
            watcher_ids,
            notes,
        }))
    }

    fn list_issues(&self, query: IssueListQuery) -> RepositoryResult<(usize, Vec<Issue>)> {
        use crate::schema::{issue_watchers, issues};

        let mut conn = self.conn()?;

        let filtered = || {
            let mut items = issues::table
                .filter(issues::tenant_id.eq(query.tenant_id.get()))
                .into_boxed();

            if let Some(status) = query.status {
                items = items.filter(issues::status.eq(status.as_str()));
            }
            if let Some(issue_type) = query.issue_type {
                items = items.filter(issues::issue_type.eq(issue_type.as_str()));
            }
            if let Some(user_id) = query.assignee {
                items = items.filter(issues::assignee_id.eq(user_id.get()));
            }
            if let Some(user_id) = query.created_by {
                items = items.filter(issues::created_by_id.eq(user_id.get()));
            }
            if let Some(user_id) = query.watched_by {
                items = items.filter(
                    issues::id.eq_any(
                        issue_watchers::table
                            .filter(issue_watchers::user_id.eq(user_id.get()))
                            .select(issue_watchers::issue_id),
                    ),
                );
            }
            if let Some(term) = &query.search {
                let pattern = format!("%{term}%");
                items = items.filter(
                    issues::title
                        .like(pattern.clone())
                        .or(issues::description.like(pattern)),
                );
            }

            items
        };

        let total = filtered().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = filtered().order((
            priority_rank().desc(),
            issues::created_at.desc(),
            issues::id.desc(),
        ));
        if let Some(page) = &query.pagination {
            items = items.limit(page.limit as i64).offset(page.offset() as i64);
        }

        let items = items
            .load::<DbIssue>(&mut conn)?
            .into_iter()
            .map(|issue| Issue::try_from(issue).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total, items))
    }
}

impl IssueWriter for DieselRepository {
    fn create_issue(&self, new_issue: &NewIssue) -> RepositoryResult<Issue> {
        use crate::schema::issues;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let created = diesel::insert_into(issues::table)
                .values(&DbNewIssue::from(new_issue))
                .get_result::<DbIssue>(conn)?;
            let issue = Issue::try_from(created)?;

            let watchers: Vec<UserId> = new_issue
                .watcher_ids
                .iter()
                .copied()
                .chain(new_issue.created_by_id)
                .collect();
            replace_watchers(conn, issue.id.get(), issue.tenant_id.get(), &watchers)?;

            insert_activity(
                conn,
                &NewActivity::new(
                    issue.tenant_id,
                    issue.created_by_id,
                    ActivityKind::IssueCreated,
                    format!("Issue \"{}\" created", issue.title),
                )
                .client(issue.client_id)
                .lead(issue.lead_id)
                .job(issue.job_id),
            )?;

            Ok(issue)
        })
    }

    fn update_issue(
        &self,
        id: IssueId,
        tenant_id: TenantId,
        actor: Option<UserId>,
        updates: &UpdateIssue,
    ) -> RepositoryResult<Issue> {
        use crate::schema::issues;

        let mut conn = self.conn()?;
        let changes = DbUpdateIssue::from_domain(updates, Utc::now().naive_utc());

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let current =
                find_issue(conn, id.get(), tenant_id.get())?.ok_or(RepositoryError::NotFound)?;

            let updated = diesel::update(issues::table.find(current.id.get()))
                .set(&changes)
                .get_result::<DbIssue>(conn)?;
            let issue = Issue::try_from(updated)?;

            if let Some(watchers) = &updates.watcher_ids {
                replace_watchers(conn, issue.id.get(), tenant_id.get(), watchers)?;
            }

            if issue.status != current.status {
                let (kind, description) = if issue.status == IssueStatus::Resolved {
                    (
                        ActivityKind::IssueResolved,
                        format!("Issue \"{}\" resolved", issue.title),
                    )
                } else {
                    (
                        ActivityKind::IssueUpdated,
                        format!(
                            "Issue \"{}\" status changed to {}",
                            issue.title,
                            issue.status.as_str()
                        ),
                    )
                };
                insert_activity(
                    conn,
                    &NewActivity::new(tenant_id, actor, kind, description)
                        .client(issue.client_id)
                        .job(issue.job_id),
                )?;
            }

            Ok(issue)
        })
    }

    fn cancel_issue(&self, id: IssueId, tenant_id: TenantId) -> RepositoryResult<Issue> {
        use crate::schema::issues;

        let mut conn = self.conn()?;

        let updated = diesel::update(
            issues::table
                .filter(issues::id.eq(id.get()))
                .filter(issues::tenant_id.eq(tenant_id.get())),
        )
        .set((
            issues::status.eq(IssueStatus::Cancelled.as_str()),
            issues::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result::<DbIssue>(&mut conn)
        .optional()?
        .ok_or(RepositoryError::NotFound)?;

        Ok(Issue::try_from(updated)?)
    }

    fn add_issue_note(&self, tenant_id: TenantId, note: &NewIssueNote) -> RepositoryResult<IssueNote> {
        use crate::schema::issue_notes;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let issue = find_issue(conn, note.issue_id.get(), tenant_id.get())?
                .ok_or(RepositoryError::NotFound)?;

            let created = diesel::insert_into(issue_notes::table)
                .values(&DbNewIssueNote::from(note))
                .get_result::<DbIssueNote>(conn)?;

            insert_activity(
                conn,
                &NewActivity::new(
                    tenant_id,
                    note.created_by_id,
                    ActivityKind::IssueUpdated,
                    format!("Note added to issue \"{}\"", issue.title),
                )
                .client(issue.client_id)
                .job(issue.job_id),
            )?;

            Ok(IssueNote::try_from(created)?)
        })
    }
}
