use actix_web::{HttpResponse, delete, get, post, put, web};
use serde_json::json;

use crate::forms::jobs::{AssignmentsForm, JobForm, JobListParams, JobStatusForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, jobs as service};

#[get("/jobs")]
pub async fn list_jobs(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    params: web::Query<JobListParams>,
) -> Result<HttpResponse, ServiceError> {
    let listing = service::list_jobs(repo.get_ref(), &user, params.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({
        "jobs": listing.items,
        "pagination": listing.pagination,
    })))
}

#[get("/jobs/{id}")]
pub async fn get_job(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let job = service::get_job(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "job": job })))
}

#[post("/jobs")]
pub async fn create_job(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<JobForm>,
) -> Result<HttpResponse, ServiceError> {
    let job = service::create_job(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "job": job })))
}

#[put("/jobs/{id}")]
pub async fn update_job(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    form: web::Json<JobForm>,
) -> Result<HttpResponse, ServiceError> {
    let job = service::update_job(repo.get_ref(), &user, id.into_inner(), form.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "job": job })))
}

#[delete("/jobs/{id}")]
pub async fn delete_job(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    service::delete_job(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[put("/jobs/{id}/status")]
pub async fn set_status(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    form: web::Json<JobStatusForm>,
) -> Result<HttpResponse, ServiceError> {
    let job = service::set_status(repo.get_ref(), &user, id.into_inner(), form.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "job": job })))
}

#[put("/jobs/{id}/assignments")]
pub async fn set_assignments(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    form: web::Json<AssignmentsForm>,
) -> Result<HttpResponse, ServiceError> {
    let change =
        service::set_assignments(repo.get_ref(), &user, id.into_inner(), form.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "job": change.job })))
}
