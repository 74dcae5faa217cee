use actix_web::{HttpResponse, get, post, web};
use serde_json::json;

use crate::forms::dispatch::{DispatchAssignForm, DispatchBoardParams};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, dispatch as service};

#[get("/dispatch/jobs")]
pub async fn board(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    params: web::Query<DispatchBoardParams>,
) -> Result<HttpResponse, ServiceError> {
    let jobs = service::board(repo.get_ref(), &user, params.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "jobs": jobs })))
}

#[get("/dispatch/techs")]
pub async fn technicians(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let techs = service::technicians(repo.get_ref(), &user)?;
    Ok(HttpResponse::Ok().json(json!({ "techs": techs })))
}

#[post("/dispatch/assign")]
pub async fn assign(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<DispatchAssignForm>,
) -> Result<HttpResponse, ServiceError> {
    let change = service::assign(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "job": change.job })))
}
