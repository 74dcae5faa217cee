use serde::Deserialize;
use validator::Validate;

use crate::domain::types::{EmailAddress, trim_optional};
use crate::domain::user::Role;
use crate::forms::FormError;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InviteUserForm {
    pub email: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
}

/// Validated invite.
#[derive(Debug, Clone, PartialEq)]
pub struct InviteUserPayload {
    pub email: EmailAddress,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

impl TryFrom<InviteUserForm> for InviteUserPayload {
    type Error = FormError;

    fn try_from(form: InviteUserForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            email: EmailAddress::new(form.email).map_err(|_| FormError::InvalidEmail)?,
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            phone: trim_optional(form.phone),
            role: form.role,
        })
    }
}
