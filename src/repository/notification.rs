use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::{
        notification::{NewNotification, Notification, NotificationStatus},
        types::{NotificationId, TenantId, UserId},
    },
    models::notification::{
        NewNotification as DbNewNotification, Notification as DbNotification,
    },
    repository::{
        DieselRepository, NotificationListQuery, NotificationReader, NotificationWriter,
        errors::{RepositoryError, RepositoryResult},
    },
};

pub(crate) fn insert_notification(
    conn: &mut SqliteConnection,
    notification: &NewNotification,
) -> RepositoryResult<Notification> {
    use crate::schema::notifications;

    let created = diesel::insert_into(notifications::table)
        .values(&DbNewNotification::from(notification))
        .get_result::<DbNotification>(conn)?;

    Ok(Notification::try_from(created)?)
}

fn into_domain(rows: Vec<DbNotification>) -> RepositoryResult<Vec<Notification>> {
    rows.into_iter()
        .map(|row| Notification::try_from(row).map_err(RepositoryError::from))
        .collect()
}

impl NotificationReader for DieselRepository {
    fn list_notifications(
        &self,
        query: NotificationListQuery,
    ) -> RepositoryResult<(usize, usize, Vec<Notification>)> {
        use crate::schema::notifications;

        let mut conn = self.conn()?;

        let owned = || {
            notifications::table
                .filter(notifications::tenant_id.eq(query.tenant_id.get()))
                .filter(notifications::user_id.eq(query.user_id.get()))
                .into_boxed()
        };

        let unread = owned()
            .filter(notifications::status.eq(NotificationStatus::Unread.as_str()))
            .count()
            .get_result::<i64>(&mut conn)? as usize;

        let filtered = || {
            let items = owned();
            if query.unread_only {
                items.filter(notifications::status.eq(NotificationStatus::Unread.as_str()))
            } else {
                items
            }
        };

        let total = filtered().count().get_result::<i64>(&mut conn)? as usize;

        let mut items =
            filtered().order((notifications::created_at.desc(), notifications::id.desc()));
        if let Some(page) = &query.pagination {
            items = items.limit(page.limit as i64).offset(page.offset() as i64);
        }

        let items = into_domain(items.load::<DbNotification>(&mut conn)?)?;

        Ok((total, unread, items))
    }

    fn list_notifications_after(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        after: i32,
        limit: i64,
    ) -> RepositoryResult<Vec<Notification>> {
        use crate::schema::notifications;

        let mut conn = self.conn()?;

        let rows = notifications::table
            .filter(notifications::tenant_id.eq(tenant_id.get()))
            .filter(notifications::user_id.eq(user_id.get()))
            .filter(notifications::id.gt(after))
            .order(notifications::id.asc())
            .limit(limit)
            .load::<DbNotification>(&mut conn)?;

        into_domain(rows)
    }
}

impl NotificationWriter for DieselRepository {
    fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> RepositoryResult<Notification> {
        let mut conn = self.conn()?;
        insert_notification(&mut conn, notification)
    }

    fn mark_notification_read(
        &self,
        id: NotificationId,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> RepositoryResult<Notification> {
        use crate::schema::notifications;

        let mut conn = self.conn()?;

        let target = notifications::table
            .filter(notifications::id.eq(id.get()))
            .filter(notifications::tenant_id.eq(tenant_id.get()))
            .filter(notifications::user_id.eq(user_id.get()))
            .first::<DbNotification>(&mut conn)
            .optional()?
            .ok_or(RepositoryError::NotFound)?;

        if target.status == NotificationStatus::Read.as_str() {
            return Ok(Notification::try_from(target)?);
        }

        let updated = diesel::update(notifications::table.find(target.id))
            .set((
                notifications::status.eq(NotificationStatus::Read.as_str()),
                notifications::read_at.eq(Some(Utc::now().naive_utc())),
            ))
            .get_result::<DbNotification>(&mut conn)?;

        Ok(Notification::try_from(updated)?)
    }

    fn mark_all_notifications_read(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> RepositoryResult<usize> {
        use crate::schema::notifications;

        let mut conn = self.conn()?;

        let updated = diesel::update(
            notifications::table
                .filter(notifications::tenant_id.eq(tenant_id.get()))
                .filter(notifications::user_id.eq(user_id.get()))
                .filter(notifications::status.eq(NotificationStatus::Unread.as_str())),
        )
        .set((
            notifications::status.eq(NotificationStatus::Read.as_str()),
            notifications::read_at.eq(Some(Utc::now().naive_utc())),
        ))
        .execute(&mut conn)?;

        Ok(updated)
    }
}
