use actix_web::{HttpResponse, delete, get, post, put, web};
use serde_json::json;

use crate::domain::purchase_order::PurchaseOrderStatus;
use crate::forms::documents::DocumentListParams;
use crate::forms::purchase_orders::PurchaseOrderForm;
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, purchase_orders as service};

#[get("/purchase-orders")]
pub async fn list_purchase_orders(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    params: web::Query<DocumentListParams<PurchaseOrderStatus>>,
) -> Result<HttpResponse, ServiceError> {
    let listing = service::list_purchase_orders(repo.get_ref(), &user, params.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({
        "purchaseOrders": listing.items,
        "pagination": listing.pagination,
    })))
}

#[get("/purchase-orders/{id}")]
pub async fn get_purchase_order(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let purchase_order = service::get_purchase_order(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "purchaseOrder": purchase_order })))
}

#[post("/purchase-orders")]
pub async fn create_purchase_order(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<PurchaseOrderForm>,
) -> Result<HttpResponse, ServiceError> {
    let purchase_order =
        service::create_purchase_order(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "purchaseOrder": purchase_order })))
}

#[put("/purchase-orders/{id}")]
pub async fn update_purchase_order(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    form: web::Json<PurchaseOrderForm>,
) -> Result<HttpResponse, ServiceError> {
    let purchase_order = service::update_purchase_order(
        repo.get_ref(),
        &user,
        id.into_inner(),
        form.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(json!({ "purchaseOrder": purchase_order })))
}

#[delete("/purchase-orders/{id}")]
pub async fn delete_purchase_order(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    service::delete_purchase_order(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[post("/purchase-orders/{id}/approve")]
pub async fn approve_purchase_order(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let purchase_order = service::approve_purchase_order(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "purchaseOrder": purchase_order })))
}

#[post("/purchase-orders/{id}/receive")]
pub async fn receive_purchase_order(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let purchase_order = service::receive_purchase_order(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "purchaseOrder": purchase_order })))
}
