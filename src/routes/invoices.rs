use actix_web::{HttpResponse, delete, get, post, put, web};
use serde_json::json;

use crate::domain::invoice::InvoiceStatus;
use crate::forms::documents::DocumentListParams;
use crate::forms::invoices::{InvoiceForm, PaymentForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, invoices as service};

#[get("/invoices")]
pub async fn list_invoices(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    params: web::Query<DocumentListParams<InvoiceStatus>>,
) -> Result<HttpResponse, ServiceError> {
    let listing = service::list_invoices(repo.get_ref(), &user, params.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({
        "invoices": listing.items,
        "pagination": listing.pagination,
    })))
}

#[get("/invoices/{id}")]
pub async fn get_invoice(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let invoice = service::get_invoice(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "invoice": invoice })))
}

#[post("/invoices")]
pub async fn create_invoice(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<InvoiceForm>,
) -> Result<HttpResponse, ServiceError> {
    let invoice = service::create_invoice(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "invoice": invoice })))
}

#[put("/invoices/{id}")]
pub async fn update_invoice(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    form: web::Json<InvoiceForm>,
) -> Result<HttpResponse, ServiceError> {
    let invoice =
        service::update_invoice(repo.get_ref(), &user, id.into_inner(), form.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "invoice": invoice })))
}

#[delete("/invoices/{id}")]
pub async fn delete_invoice(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    service::delete_invoice(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[post("/invoices/{id}/payments")]
pub async fn record_payment(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    form: web::Json<PaymentForm>,
) -> Result<HttpResponse, ServiceError> {
    let (invoice, payment) =
        service::record_payment(repo.get_ref(), &user, id.into_inner(), form.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "invoice": invoice, "payment": payment })))
}

/// Unauthenticated; the unguessable public id is the credential.
#[get("/public/invoices/{public_id}")]
pub async fn public_invoice(
    repo: web::Data<DieselRepository>,
    public_id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let invoice = service::public_invoice(repo.get_ref(), &public_id)?;
    Ok(HttpResponse::Ok().json(json!({ "invoice": invoice })))
}
