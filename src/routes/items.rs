use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, delete, get, post, put, web};
use serde_json::json;

use crate::forms::items::{ItemForm, ItemListParams, UploadItemsForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::csv_attachment;
use crate::services::{ServiceError, items as service};

#[get("/items")]
pub async fn list_items(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    params: web::Query<ItemListParams>,
) -> Result<HttpResponse, ServiceError> {
    let listing = service::list_items(repo.get_ref(), &user, params.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({
        "items": listing.items,
        "pagination": listing.pagination,
    })))
}

#[get("/items/export")]
pub async fn export_items(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let file = service::export_items(repo.get_ref(), &user)?;
    Ok(csv_attachment(file))
}

#[post("/items/import")]
pub async fn import_items(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    MultipartForm(form): MultipartForm<UploadItemsForm>,
) -> Result<HttpResponse, ServiceError> {
    let file = form.csv.file.reopen().map_err(|err| {
        log::error!("Failed to open uploaded item CSV: {err}");
        ServiceError::Internal(err.to_string())
    })?;
    let summary = service::import_items(repo.get_ref(), &user, file)?;
    Ok(HttpResponse::Ok().json(summary))
}

#[get("/items/{id}")]
pub async fn get_item(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let item = service::get_item(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "item": item })))
}

#[post("/items")]
pub async fn create_item(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<ItemForm>,
) -> Result<HttpResponse, ServiceError> {
    let item = service::create_item(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "item": item })))
}

#[put("/items/{id}")]
pub async fn update_item(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    form: web::Json<ItemForm>,
) -> Result<HttpResponse, ServiceError> {
    let item = service::update_item(repo.get_ref(), &user, id.into_inner(), form.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "item": item })))
}

#[delete("/items/{id}")]
pub async fn delete_item(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    service::delete_item(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
