use serde::Deserialize;

use crate::pagination::PageRequest;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub unread_only: bool,
}

impl NotificationListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Cursor of the event stream: the last notification id the client saw.
#[derive(Debug, Default, Deserialize)]
pub struct StreamParams {
    pub since: Option<i32>,
}
