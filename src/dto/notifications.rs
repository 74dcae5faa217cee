use serde::Serialize;

use crate::domain::notification::Notification;
use crate::pagination::PageInfo;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub pagination: PageInfo,
}

/// Batch pushed on the event stream.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotificationBatch {
    pub notifications: Vec<Notification>,
}
