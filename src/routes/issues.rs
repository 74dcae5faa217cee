use actix_web::{HttpResponse, delete, get, post, put, web};
use serde_json::json;

use crate::forms::issues::{IssueForm, IssueListParams, IssueNoteForm, IssueUpdateForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, issues as service};

#[get("/issues")]
pub async fn list_issues(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    params: web::Query<IssueListParams>,
) -> Result<HttpResponse, ServiceError> {
    let listing = service::list_issues(repo.get_ref(), &user, params.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({
        "issues": listing.items,
        "pagination": listing.pagination,
    })))
}

#[get("/issues/{id}")]
pub async fn get_issue(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let issue = service::get_issue(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "issue": issue })))
}

#[post("/issues")]
pub async fn create_issue(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<IssueForm>,
) -> Result<HttpResponse, ServiceError> {
    let issue = service::create_issue(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "issue": issue })))
}

#[put("/issues/{id}")]
pub async fn update_issue(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    form: web::Json<IssueUpdateForm>,
) -> Result<HttpResponse, ServiceError> {
    let issue = service::update_issue(repo.get_ref(), &user, id.into_inner(), form.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "issue": issue })))
}

#[delete("/issues/{id}")]
pub async fn delete_issue(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let issue = service::delete_issue(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "issue": issue })))
}

#[get("/issues/{id}/notes")]
pub async fn list_notes(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let notes = service::list_notes(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "notes": notes })))
}

#[post("/issues/{id}/notes")]
pub async fn add_note(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    form: web::Json<IssueNoteForm>,
) -> Result<HttpResponse, ServiceError> {
    let note = service::add_note(repo.get_ref(), &user, id.into_inner(), form.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "note": note })))
}
