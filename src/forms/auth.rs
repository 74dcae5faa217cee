use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshForm {
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutForm {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetPasswordForm {
    pub user_id: i32,
    #[serde(default)]
    pub temporary_password: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// First-run administrator.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapAdminForm {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_are_rejected() {
        let form = SetPasswordForm {
            user_id: 1,
            temporary_password: None,
            new_password: "short".into(),
        };
        let err = form.validate().unwrap_err();
        assert!(err.to_string().contains("at least 8 characters"));
    }

    #[test]
    fn set_password_uses_camel_case_keys() {
        let form: SetPasswordForm = serde_json::from_str(
            r#"{"userId": 3, "temporaryPassword": "tmp", "newPassword": "long enough"}"#,
        )
        .unwrap();
        assert_eq!(form.user_id, 3);
        assert_eq!(form.temporary_password.as_deref(), Some("tmp"));
        assert!(form.validate().is_ok());
    }
}
