use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::activity::{Activity, NewActivity},
    models::activity::{Activity as DbActivity, NewActivity as DbNewActivity},
    repository::{
        ActivityListQuery, ActivityReader, ActivityWriter, DieselRepository,
        errors::{RepositoryError, RepositoryResult},
    },
};

pub(crate) fn insert_activity(
    conn: &mut SqliteConnection,
    activity: &NewActivity,
) -> RepositoryResult<Activity> {
    use crate::schema::activities;

    let created = diesel::insert_into(activities::table)
        .values(&DbNewActivity::from(activity))
        .get_result::<DbActivity>(conn)?;

    Ok(Activity::try_from(created)?)
}

impl ActivityReader for DieselRepository {
    fn list_activities(&self, query: ActivityListQuery) -> RepositoryResult<Vec<Activity>> {
        use crate::schema::activities;

        let mut conn = self.conn()?;

        let mut items = activities::table
            .filter(activities::tenant_id.eq(query.tenant_id.get()))
            .into_boxed();

        if let Some(client_id) = query.client_id {
            items = items.filter(activities::client_id.eq(client_id.get()));
        }
        if let Some(lead_id) = query.lead_id {
            items = items.filter(activities::lead_id.eq(lead_id.get()));
        }
        if let Some(job_id) = query.job_id {
            items = items.filter(activities::job_id.eq(job_id.get()));
        }

        items
            .order((activities::created_at.desc(), activities::id.desc()))
            .limit(query.limit)
            .load::<DbActivity>(&mut conn)?
            .into_iter()
            .map(|activity| Activity::try_from(activity).map_err(RepositoryError::from))
            .collect()
    }
}

impl ActivityWriter for DieselRepository {
    fn create_activity(&self, activity: &NewActivity) -> RepositoryResult<Activity> {
        let mut conn = self.conn()?;
        insert_activity(&mut conn, activity)
    }
}
