use crate::domain::notification::{NewNotification, Notification, STREAM_BATCH_SIZE};
use crate::domain::types::NotificationId;
use crate::dto::notifications::NotificationFeed;
use crate::forms::notifications::NotificationListParams;
use crate::models::auth::AuthenticatedUser;
use crate::pagination::PageInfo;
use crate::repository::{NotificationListQuery, NotificationReader, NotificationWriter};
use crate::services::{ServiceError, ServiceResult, log_failure};

/// Stores a notification as a side effect; failures are logged and
/// swallowed so they never undo the action that triggered them.
pub(crate) fn deliver<R>(repo: &R, notification: &NewNotification)
where
    R: NotificationWriter + ?Sized,
{
    if let Err(err) = repo.create_notification(notification) {
        log::error!(
            "Failed to notify user {} ({}): {err}",
            notification.user_id,
            notification.kind.as_str()
        );
    }
}

/// The caller's own notifications, newest first.
pub fn list_notifications<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: NotificationListParams,
) -> ServiceResult<NotificationFeed>
where
    R: NotificationReader + ?Sized,
{
    let page = params.page_request();
    let mut query = NotificationListQuery::new(user.tenant_id, user.id).paginate(page);
    if params.unread_only {
        query = query.unread_only();
    }

    let (total, unread_count, notifications) = repo
        .list_notifications(query)
        .map_err(log_failure("list notifications"))?;

    Ok(NotificationFeed {
        notifications,
        unread_count,
        pagination: PageInfo::new(total, page),
    })
}

pub fn mark_read<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<Notification>
where
    R: NotificationWriter + ?Sized,
{
    let id = NotificationId::new(id).map_err(|_| ServiceError::NotFound)?;
    repo.mark_notification_read(id, user.tenant_id, user.id)
        .map_err(log_failure("mark notification read"))
}

pub fn mark_all_read<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<usize>
where
    R: NotificationWriter + ?Sized,
{
    repo.mark_all_notifications_read(user.tenant_id, user.id)
        .map_err(log_failure("mark notifications read"))
}

/// One poll of the event stream: notifications newer than `cursor`, oldest
/// first, and the cursor to use next time.
pub fn poll_stream<R>(
    repo: &R,
    user: &AuthenticatedUser,
    cursor: i32,
) -> ServiceResult<(Vec<Notification>, i32)>
where
    R: NotificationReader + ?Sized,
{
    let batch = repo
        .list_notifications_after(user.tenant_id, user.id, cursor, STREAM_BATCH_SIZE)
        .map_err(log_failure("poll notifications"))?;
    let next = batch
        .iter()
        .map(|notification| notification.id.get())
        .max()
        .unwrap_or(cursor)
        .max(cursor);
    Ok((batch, next))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::notification::{NotificationKind, NotificationStatus};
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{admin_user, tenant};

    fn notification(id: i32) -> Notification {
        Notification {
            id: NotificationId::new(id).unwrap(),
            tenant_id: tenant(),
            user_id: admin_user().id,
            kind: NotificationKind::System,
            title: format!("Notice {id}"),
            message: None,
            link_type: None,
            link_id: None,
            requires_ack: false,
            status: NotificationStatus::Unread,
            read_at: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn feed_reports_unread_count() {
        let mut repo = MockRepository::new();
        repo.expect_list_notifications()
            .withf(|query| query.unread_only && query.user_id == admin_user().id)
            .returning(|_| Ok((3, 2, vec![notification(3), notification(2)])));

        let feed = list_notifications(&repo, &admin_user(), NotificationListParams {
            unread_only: true,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(feed.unread_count, 2);
        assert_eq!(feed.pagination.total, 3);
    }

    #[test]
    fn stream_cursor_advances_to_newest_id() {
        let mut repo = MockRepository::new();
        repo.expect_list_notifications_after()
            .withf(|_, _, after, limit| *after == 4 && *limit == STREAM_BATCH_SIZE)
            .returning(|_, _, _, _| Ok(vec![notification(5), notification(8)]));

        let (batch, next) = poll_stream(&repo, &admin_user(), 4).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(next, 8);
    }

    #[test]
    fn empty_poll_keeps_cursor() {
        let mut repo = MockRepository::new();
        repo.expect_list_notifications_after()
            .returning(|_, _, _, _| Ok(Vec::new()));

        let (batch, next) = poll_stream(&repo, &admin_user(), 12).unwrap();

        assert!(batch.is_empty());
        assert_eq!(next, 12);
    }
}
