//! Line item and group endpoints shared by estimates, invoices and
//! purchase orders, e.g. `/estimates/{id}/line-items`.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use serde_json::json;

use crate::domain::document::DocumentKind;
use crate::forms::documents::{AddBundleForm, LineItemForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, documents as service};

/// Collection segment naming the parent document. Anything else fails the
/// path match with 404.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentSegment {
    Estimates,
    Invoices,
    PurchaseOrders,
}

impl From<DocumentSegment> for DocumentKind {
    fn from(segment: DocumentSegment) -> Self {
        match segment {
            DocumentSegment::Estimates => DocumentKind::Estimate,
            DocumentSegment::Invoices => DocumentKind::Invoice,
            DocumentSegment::PurchaseOrders => DocumentKind::PurchaseOrder,
        }
    }
}

#[get("/{kind}/{id}/line-items")]
pub async fn list_lines(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    path: web::Path<(DocumentSegment, i32)>,
) -> Result<HttpResponse, ServiceError> {
    let (kind, id) = path.into_inner();
    let lines = service::list_lines(repo.get_ref(), &user, kind.into(), id)?;
    Ok(HttpResponse::Ok().json(lines))
}

#[post("/{kind}/{id}/line-items")]
pub async fn add_line(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    path: web::Path<(DocumentSegment, i32)>,
    form: web::Json<LineItemForm>,
) -> Result<HttpResponse, ServiceError> {
    let (kind, id) = path.into_inner();
    let line = service::add_line(repo.get_ref(), &user, kind.into(), id, form.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "lineItem": line })))
}

#[put("/{kind}/{id}/line-items/{line_id}")]
pub async fn update_line(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    path: web::Path<(DocumentSegment, i32, i32)>,
    form: web::Json<LineItemForm>,
) -> Result<HttpResponse, ServiceError> {
    let (kind, id, line_id) = path.into_inner();
    let line = service::update_line(
        repo.get_ref(),
        &user,
        kind.into(),
        id,
        line_id,
        form.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(json!({ "lineItem": line })))
}

#[delete("/{kind}/{id}/line-items/{line_id}")]
pub async fn delete_line(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    path: web::Path<(DocumentSegment, i32, i32)>,
) -> Result<HttpResponse, ServiceError> {
    let (kind, id, line_id) = path.into_inner();
    service::delete_line(repo.get_ref(), &user, kind.into(), id, line_id)?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[post("/{kind}/{id}/bundles")]
pub async fn add_bundle(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    path: web::Path<(DocumentSegment, i32)>,
    form: web::Json<AddBundleForm>,
) -> Result<HttpResponse, ServiceError> {
    let (kind, id) = path.into_inner();
    let group = service::add_bundle(repo.get_ref(), &user, kind.into(), id, form.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "group": group })))
}

#[post("/{kind}/{id}/groups/{group_id}/ungroup")]
pub async fn ungroup(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    path: web::Path<(DocumentSegment, i32, i32)>,
) -> Result<HttpResponse, ServiceError> {
    let (kind, id, group_id) = path.into_inner();
    service::ungroup(repo.get_ref(), &user, kind.into(), id, group_id)?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[delete("/{kind}/{id}/groups/{group_id}")]
pub async fn delete_group(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    path: web::Path<(DocumentSegment, i32, i32)>,
) -> Result<HttpResponse, ServiceError> {
    let (kind, id, group_id) = path.into_inner();
    service::delete_group(repo.get_ref(), &user, kind.into(), id, group_id)?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[post("/{kind}/{id}/groups/{group_id}/update-from-template")]
pub async fn update_group_from_template(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    path: web::Path<(DocumentSegment, i32, i32)>,
) -> Result<HttpResponse, ServiceError> {
    let (kind, id, group_id) = path.into_inner();
    let (group, lines) =
        service::refresh_group_from_bundle(repo.get_ref(), &user, kind.into(), id, group_id)?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "group": group,
        "lineItems": lines,
    })))
}
