use actix_web::{HttpResponse, delete, get, post, put, web};
use serde_json::json;

use crate::domain::estimate::EstimateStatus;
use crate::forms::documents::DocumentListParams;
use crate::forms::estimates::{ConvertToInvoiceForm, EstimateForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, estimates as service};

#[get("/estimates")]
pub async fn list_estimates(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    params: web::Query<DocumentListParams<EstimateStatus>>,
) -> Result<HttpResponse, ServiceError> {
    let listing = service::list_estimates(repo.get_ref(), &user, params.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({
        "estimates": listing.items,
        "pagination": listing.pagination,
    })))
}

#[get("/estimates/{id}")]
pub async fn get_estimate(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let estimate = service::get_estimate(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "estimate": estimate })))
}

#[post("/estimates")]
pub async fn create_estimate(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<EstimateForm>,
) -> Result<HttpResponse, ServiceError> {
    let estimate = service::create_estimate(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "estimate": estimate })))
}

#[put("/estimates/{id}")]
pub async fn update_estimate(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    form: web::Json<EstimateForm>,
) -> Result<HttpResponse, ServiceError> {
    let estimate =
        service::update_estimate(repo.get_ref(), &user, id.into_inner(), form.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "estimate": estimate })))
}

#[delete("/estimates/{id}")]
pub async fn delete_estimate(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    service::delete_estimate(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// 201 when a job was created, 200 when the estimate already had one.
#[post("/estimates/{id}/convert-to-job")]
pub async fn convert_to_job(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let conversion = service::convert_to_job(repo.get_ref(), &user, id.into_inner())?;
    let mut response = if conversion.created {
        HttpResponse::Created()
    } else {
        HttpResponse::Ok()
    };
    Ok(response.json(json!({ "job": conversion.job })))
}

#[post("/estimates/{id}/convert-to-invoice")]
pub async fn convert_to_invoice(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    form: Option<web::Json<ConvertToInvoiceForm>>,
) -> Result<HttpResponse, ServiceError> {
    let form = form.map(web::Json::into_inner).unwrap_or_default();
    let invoice = service::convert_to_invoice(repo.get_ref(), &user, id.into_inner(), form)?;
    Ok(HttpResponse::Created().json(json!({ "invoice": invoice })))
}
