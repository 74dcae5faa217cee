use actix_web::{HttpResponse, get, web};
use serde_json::json;

use crate::forms::activities::ActivityListParams;
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, activities as service};

#[get("/activities")]
pub async fn list_activities(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    params: web::Query<ActivityListParams>,
) -> Result<HttpResponse, ServiceError> {
    let activities = service::list_activities(repo.get_ref(), &user, params.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "activities": activities })))
}
