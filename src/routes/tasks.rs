use actix_web::{HttpResponse, delete, get, post, put, web};
use serde_json::json;

use crate::forms::tasks::{TaskForm, TaskListParams, TaskUpdateForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, tasks as service};

#[get("/tasks")]
pub async fn list_tasks(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    params: web::Query<TaskListParams>,
) -> Result<HttpResponse, ServiceError> {
    let listing = service::list_tasks(repo.get_ref(), &user, params.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({
        "tasks": listing.items,
        "pagination": listing.pagination,
    })))
}

#[get("/tasks/{id}")]
pub async fn get_task(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let task = service::get_task(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "task": task })))
}

#[post("/tasks")]
pub async fn create_task(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<TaskForm>,
) -> Result<HttpResponse, ServiceError> {
    let task = service::create_task(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "task": task })))
}

#[put("/tasks/{id}")]
pub async fn update_task(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    form: web::Json<TaskUpdateForm>,
) -> Result<HttpResponse, ServiceError> {
    let task = service::update_task(repo.get_ref(), &user, id.into_inner(), form.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "task": task })))
}

#[delete("/tasks/{id}")]
pub async fn delete_task(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    service::delete_task(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
