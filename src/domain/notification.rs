use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{NotificationId, TenantId, UserId, string_enum};

string_enum!(
    NotificationKind {
        JobAssigned => "JOB_ASSIGNED",
        LeadAssigned => "LEAD_ASSIGNED",
        InvoicePaid => "INVOICE_PAID",
        InvoiceOverdue => "INVOICE_OVERDUE",
        IssueAssigned => "ISSUE_ASSIGNED",
        TaskAssigned => "TASK_ASSIGNED",
        System => "SYSTEM",
    }
);

string_enum!(
    NotificationStatus {
        Unread => "UNREAD",
        Read => "READ",
    }
);

/// Most notifications pushed in a single stream event.
pub const STREAM_BATCH_SIZE: i64 = 50;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: Option<String>,
    pub link_type: Option<String>,
    pub link_id: Option<i32>,
    pub requires_ack: bool,
    pub status: NotificationStatus,
    pub read_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewNotification {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: Option<String>,
    pub link_type: Option<String>,
    pub link_id: Option<i32>,
    pub requires_ack: bool,
}

impl NewNotification {
    pub fn new(
        tenant_id: TenantId,
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            user_id,
            kind,
            title: title.into(),
            message: None,
            link_type: None,
            link_id: None,
            requires_ack: false,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Points the notification at an entity, e.g. `("job", 7)`.
    pub fn link(mut self, link_type: &str, link_id: i32) -> Self {
        self.link_type = Some(link_type.to_string());
        self.link_id = Some(link_id);
        self
    }
}
