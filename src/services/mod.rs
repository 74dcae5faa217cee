//! Business logic shared by the HTTP routes.
//!
//! Services are generic over the repository traits they need and receive
//! the already authenticated caller, so they can be unit tested against
//! [`crate::repository::mock::MockRepository`].

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;

use crate::domain::bundle::BundleError;
use crate::domain::estimate::BillingError;
use crate::domain::permission::Permission;
use crate::domain::types::{ClientId, TenantId, TypeConstraintError, UserId};
use crate::dto::CsvFile;
use crate::forms::FormError;
use crate::models::auth::AuthenticatedUser;
use crate::repository::errors::RepositoryError;
use crate::repository::{ClientReader, UserReader};

pub mod activities;
pub mod auth;
pub mod bundles;
pub mod clients;
pub mod dispatch;
pub mod documents;
pub mod estimates;
pub mod invoices;
pub mod issues;
pub mod items;
pub mod jobs;
pub mod leads;
pub mod notifications;
pub mod purchase_orders;
pub mod tasks;
pub mod users;
pub mod webhooks;

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Unauthorized")]
    Unauthorized,

    /// A 401 carrying the reason shown to the caller.
    #[error("{0}")]
    AuthenticationFailed(&'static str),

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    TypeConstraint(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Unauthorized | ServiceError::AuthenticationFailed(_) => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) | ServiceError::TypeConstraint(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ServiceError::Internal(detail) => {
                log::error!("Request failed: {detail}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::ConstraintViolation(msg) => ServiceError::Conflict(msg),
            RepositoryError::ValidationError(msg) | RepositoryError::Rejected(msg) => {
                ServiceError::Validation(msg)
            }
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<TypeConstraintError> for ServiceError {
    fn from(err: TypeConstraintError) -> Self {
        ServiceError::TypeConstraint(err.to_string())
    }
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<BundleError> for ServiceError {
    fn from(err: BundleError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<BillingError> for ServiceError {
    fn from(err: BillingError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

/// Fails with [`ServiceError::Forbidden`] unless the caller's role grants
/// `permission`.
pub fn ensure_permission(user: &AuthenticatedUser, permission: Permission) -> ServiceResult<()> {
    if user.has_permission(permission) {
        Ok(())
    } else {
        log::warn!("User {} lacks permission {}", user.id, permission.as_str());
        Err(ServiceError::Forbidden)
    }
}

/// Logs a repository failure before handing it to the caller.
pub(crate) fn log_failure(action: &str) -> impl FnOnce(RepositoryError) -> ServiceError + '_ {
    move |err| {
        log::error!("Failed to {action}: {err}");
        ServiceError::from(err)
    }
}

/// Fails with [`ServiceError::NotFound`] when `user_id` is set but not a
/// user of `tenant_id`.
pub(crate) fn ensure_tenant_user<R>(
    repo: &R,
    tenant_id: TenantId,
    user_id: Option<UserId>,
) -> ServiceResult<()>
where
    R: UserReader + ?Sized,
{
    let Some(user_id) = user_id else {
        return Ok(());
    };
    repo.get_user_by_id(user_id, tenant_id)
        .map_err(log_failure("load referenced user"))?
        .map(|_| ())
        .ok_or(ServiceError::NotFound)
}

/// Same as [`ensure_tenant_user`] for clients.
pub(crate) fn ensure_tenant_client<R>(
    repo: &R,
    tenant_id: TenantId,
    client_id: Option<ClientId>,
) -> ServiceResult<()>
where
    R: ClientReader + ?Sized,
{
    let Some(client_id) = client_id else {
        return Ok(());
    };
    repo.get_client_by_id(client_id, tenant_id)
        .map_err(log_failure("load referenced client"))?
        .map(|_| ())
        .ok_or(ServiceError::NotFound)
}

/// Renders `rows` under `headers` as a dated CSV attachment named
/// `{prefix}-export-YYYY-MM-DD.csv`.
pub(crate) fn write_csv<I>(prefix: &str, headers: &[&str], rows: I) -> ServiceResult<CsvFile>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let csv_error = |err: csv::Error| ServiceError::Internal(format!("CSV export failed: {err}"));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers).map_err(csv_error)?;
    for row in rows {
        writer.write_record(&row).map_err(csv_error)?;
    }
    let content = writer
        .into_inner()
        .map_err(|err| ServiceError::Internal(format!("CSV export failed: {err}")))?;

    Ok(CsvFile {
        filename: format!("{prefix}-export-{}.csv", Utc::now().format("%Y-%m-%d")),
        content,
    })
}

/// `Yes`/`No` as used in CSV files.
pub(crate) fn yes_no(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;

    use crate::domain::types::{EmailAddress, TenantId, UserId};
    use crate::domain::user::{Role, User, UserStatus};
    use crate::models::auth::AuthenticatedUser;
    use crate::models::config::ServerConfig;

    pub fn tenant() -> TenantId {
        TenantId::new(1).unwrap()
    }

    pub fn server_config() -> ServerConfig {
        ServerConfig {
            address: "127.0.0.1".into(),
            port: 8080,
            database_url: ":memory:".into(),
            jwt_secret: "access-secret".into(),
            jwt_refresh_secret: "refresh-secret".into(),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 3600,
            payment_webhook_secret: None,
            public_url: "http://localhost".into(),
            notification_poll_secs: 4,
        }
    }

    /// Stored staff row for user `id` of tenant 1.
    pub fn stored_user(id: i32, role: Role, status: UserStatus) -> User {
        let now = Utc::now().naive_utc();
        User {
            id: UserId::new(id).unwrap(),
            tenant_id: tenant(),
            email: EmailAddress::new(format!("user{id}@example.com")).unwrap(),
            first_name: "Sam".into(),
            last_name: "Lee".into(),
            phone: None,
            role,
            status,
            password_hash: None,
            temporary_password_hash: None,
            temporary_password_expires_at: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn user_with_role(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            id: UserId::new(1).unwrap(),
            tenant_id: TenantId::new(1).unwrap(),
            email: "staff@example.com".into(),
            role,
        }
    }

    pub fn admin_user() -> AuthenticatedUser {
        user_with_role(Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;
    use crate::services::test_support::user_with_role;
    use crate::domain::user::Role;

    #[test]
    fn repository_errors_map_to_statuses() {
        assert_eq!(
            ServiceError::from(RepositoryError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::from(RepositoryError::ConstraintViolation("dup".into())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::from(RepositoryError::Rejected("no".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::from(RepositoryError::ConnectionError("down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn internal_errors_hide_details() {
        let response = ServiceError::Internal("db exploded".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(body, r#"{"error":"Internal server error"}"#);
    }

    #[actix_web::test]
    async fn validation_errors_carry_message() {
        let response = ServiceError::Validation("Vendor is required".into()).error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(body, r#"{"error":"Vendor is required"}"#);
    }

    #[test]
    fn permission_check_rejects_missing_grant() {
        let field = user_with_role(Role::Field);
        assert!(ensure_permission(&field, Permission::JobsViewAll).is_ok());
        assert!(matches!(
            ensure_permission(&field, Permission::InvoicesViewAll),
            Err(ServiceError::Forbidden)
        ));
    }
}
