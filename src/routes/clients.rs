use actix_web::{HttpResponse, delete, get, post, put, web};
use serde_json::json;

use crate::forms::clients::{ClientForm, ClientListParams};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::csv_attachment;
use crate::services::{ServiceError, clients as service};

#[get("/clients")]
pub async fn list_clients(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    params: web::Query<ClientListParams>,
) -> Result<HttpResponse, ServiceError> {
    let listing = service::list_clients(repo.get_ref(), &user, params.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({
        "clients": listing.items,
        "pagination": listing.pagination,
    })))
}

#[get("/clients/export")]
pub async fn export_clients(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let file = service::export_clients(repo.get_ref(), &user)?;
    Ok(csv_attachment(file))
}

#[get("/clients/{id}")]
pub async fn get_client(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let client = service::get_client(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "client": client })))
}

#[post("/clients")]
pub async fn create_client(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<ClientForm>,
) -> Result<HttpResponse, ServiceError> {
    let client = service::create_client(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "client": client })))
}

#[put("/clients/{id}")]
pub async fn update_client(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    form: web::Json<ClientForm>,
) -> Result<HttpResponse, ServiceError> {
    let client = service::update_client(repo.get_ref(), &user, id.into_inner(), form.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "client": client })))
}

#[delete("/clients/{id}")]
pub async fn delete_client(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    service::delete_client(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
