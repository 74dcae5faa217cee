use actix_web::{HttpResponse, get, post, web};
use serde_json::json;

use crate::forms::users::InviteUserForm;
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, users as service};

#[get("/users")]
pub async fn list_users(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let users = service::list_users(repo.get_ref(), &user)?;
    Ok(HttpResponse::Ok().json(json!({ "users": users })))
}

/// The temporary password is part of this response and nowhere else.
#[post("/users/invite")]
pub async fn invite_user(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<InviteUserForm>,
) -> Result<HttpResponse, ServiceError> {
    let invited = service::invite_user(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Created().json(invited))
}
