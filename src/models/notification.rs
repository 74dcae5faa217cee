use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::{
    notification::{NewNotification as DomainNewNotification, Notification as DomainNotification},
    types::{NotificationId, TenantId, TypeConstraintError, UserId},
};

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::notifications)]
pub struct Notification {
    pub id: i32,
    pub tenant_id: i32,
    pub user_id: i32,
    pub kind: String,
    pub title: String,
    pub message: Option<String>,
    pub link_type: Option<String>,
    pub link_id: Option<i32>,
    pub requires_ack: bool,
    pub status: String,
    pub read_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::notifications)]
pub struct NewNotification<'a> {
    pub tenant_id: i32,
    pub user_id: i32,
    pub kind: &'a str,
    pub title: &'a str,
    pub message: Option<&'a str>,
    pub link_type: Option<&'a str>,
    pub link_id: Option<i32>,
    pub requires_ack: bool,
}

impl TryFrom<Notification> for DomainNotification {
    type Error = TypeConstraintError;

    fn try_from(notification: Notification) -> Result<Self, Self::Error> {
        Ok(Self {
            id: NotificationId::new(notification.id)?,
            tenant_id: TenantId::new(notification.tenant_id)?,
            user_id: UserId::new(notification.user_id)?,
            kind: notification.kind.parse()?,
            title: notification.title,
            message: notification.message,
            link_type: notification.link_type,
            link_id: notification.link_id,
            requires_ack: notification.requires_ack,
            status: notification.status.parse()?,
            read_at: notification.read_at,
            created_at: notification.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewNotification> for NewNotification<'a> {
    fn from(notification: &'a DomainNewNotification) -> Self {
        Self {
            tenant_id: notification.tenant_id.get(),
            user_id: notification.user_id.get(),
            kind: notification.kind.as_str(),
            title: notification.title.as_str(),
            message: notification.message.as_deref(),
            link_type: notification.link_type.as_deref(),
            link_id: notification.link_id,
            requires_ack: notification.requires_ack,
        }
    }
}
