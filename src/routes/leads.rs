use actix_web::{HttpResponse, delete, get, post, put, web};
use serde_json::json;

use crate::forms::leads::{LeadForm, LeadListParams};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, leads as service};

#[get("/leads")]
pub async fn list_leads(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    params: web::Query<LeadListParams>,
) -> Result<HttpResponse, ServiceError> {
    let listing = service::list_leads(repo.get_ref(), &user, params.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({
        "leads": listing.items,
        "pagination": listing.pagination,
    })))
}

#[get("/leads/{id}")]
pub async fn get_lead(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let lead = service::get_lead(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "lead": lead })))
}

#[post("/leads")]
pub async fn create_lead(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<LeadForm>,
) -> Result<HttpResponse, ServiceError> {
    let lead = service::create_lead(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "lead": lead })))
}

#[put("/leads/{id}")]
pub async fn update_lead(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
    form: web::Json<LeadForm>,
) -> Result<HttpResponse, ServiceError> {
    let lead = service::update_lead(repo.get_ref(), &user, id.into_inner(), form.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "lead": lead })))
}

#[delete("/leads/{id}")]
pub async fn delete_lead(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    service::delete_lead(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[post("/leads/{id}/convert")]
pub async fn convert_lead(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let conversion = service::convert_lead(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({
        "lead": conversion.lead,
        "client": conversion.client,
        "clientCreated": conversion.client_created,
    })))
}

#[post("/leads/{id}/convert-to-estimate")]
pub async fn convert_lead_to_estimate(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let estimate = service::convert_lead_to_estimate(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "estimate": estimate })))
}
