use actix_web::{HttpResponse, get, post, web};
use serde_json::json;

use crate::dto::auth::LoginOutcome;
use crate::forms::auth::{BootstrapAdminForm, LoginForm, LogoutForm, RefreshForm, SetPasswordForm};
use crate::models::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, auth as service};

/// A temporary password is answered with 403 so the client can switch to
/// the set-password screen.
#[post("/auth/login")]
pub async fn login(
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
    form: web::Json<LoginForm>,
) -> Result<HttpResponse, ServiceError> {
    match service::login(repo.get_ref(), config.get_ref(), form.into_inner())? {
        LoginOutcome::Authenticated(response) => Ok(HttpResponse::Ok().json(response)),
        LoginOutcome::PasswordChangeRequired { user_id } => {
            Ok(HttpResponse::Forbidden().json(json!({
                "error": "Password change required",
                "requiresPasswordChange": true,
                "userId": user_id,
            })))
        }
    }
}

#[post("/auth/refresh")]
pub async fn refresh(
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
    form: web::Json<RefreshForm>,
) -> Result<HttpResponse, ServiceError> {
    let tokens = service::refresh(repo.get_ref(), config.get_ref(), form.into_inner())?;
    Ok(HttpResponse::Ok().json(tokens))
}

#[post("/auth/logout")]
pub async fn logout(
    repo: web::Data<DieselRepository>,
    form: Option<web::Json<LogoutForm>>,
) -> Result<HttpResponse, ServiceError> {
    let form = form.map(web::Json::into_inner).unwrap_or_default();
    service::logout(repo.get_ref(), form)?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[post("/auth/set-password")]
pub async fn set_password(
    repo: web::Data<DieselRepository>,
    form: web::Json<SetPasswordForm>,
) -> Result<HttpResponse, ServiceError> {
    service::set_password(repo.get_ref(), form.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[get("/auth/permissions")]
pub async fn permissions(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(service::permissions(&user))
}

#[post("/bootstrap/admin")]
pub async fn bootstrap_admin(
    repo: web::Data<DieselRepository>,
    form: web::Json<BootstrapAdminForm>,
) -> Result<HttpResponse, ServiceError> {
    let (tenant, user) = service::bootstrap_admin(repo.get_ref(), form.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "tenant": tenant, "user": user })))
}
