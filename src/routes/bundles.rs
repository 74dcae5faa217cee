use actix_web::{HttpResponse, delete, get, post, put, web};
use serde_json::json;

use crate::forms::bundles::BundleForm;
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, bundles as service};

#[get("/bundles")]
pub async fn list_bundles(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let bundles = service::list_bundles(repo.get_ref(), &user)?;
    Ok(HttpResponse::Ok().json(json!({ "bundles": bundles })))
}

#[get("/bundles/{id}")]
pub async fn get_bundle(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let bundle = service::get_bundle(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "bundle": bundle })))
}

#[post("/bundles")]
pub async fn create_bundle(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<BundleForm>,
) -> Result<HttpResponse, ServiceError> {
    let bundle = service::create_bundle(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "bundle": bundle })))
}

#[put("/bundles/{id}")]
pub async fn update_bundle(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    form: web::Json<BundleForm>,
) -> Result<HttpResponse, ServiceError> {
    let bundle = service::update_bundle(repo.get_ref(), &user, id.into_inner(), form.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "bundle": bundle })))
}

#[delete("/bundles/{id}")]
pub async fn delete_bundle(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    service::delete_bundle(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[get("/bundles/{id}/flatten")]
pub async fn flatten_bundle(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let lines = service::flatten(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "lines": lines })))
}
