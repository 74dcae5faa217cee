use serde::Serialize;

use crate::domain::user::User;

/// A freshly invited user; the temporary password is only ever shown here.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvitedUser {
    pub user: User,
    pub temporary_password: String,
}
