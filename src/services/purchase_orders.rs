use chrono::Utc;

use crate::domain::document::DocumentKind;
use crate::domain::permission::Permission;
use crate::domain::purchase_order::{PurchaseOrder, PurchaseOrderDetail, PurchaseOrderStatus};
use crate::domain::types::{JobId, PurchaseOrderId};
use crate::dto::Listing;
use crate::forms::documents::DocumentListParams;
use crate::forms::purchase_orders::PurchaseOrderForm;
use crate::models::auth::AuthenticatedUser;
use crate::repository::{
    DocumentReader, JobReader, PurchaseOrderListQuery, PurchaseOrderReader, PurchaseOrderWriter,
};
use crate::services::{ServiceError, ServiceResult, ensure_permission, log_failure};

fn order_id(id: i32) -> ServiceResult<PurchaseOrderId> {
    PurchaseOrderId::new(id).map_err(|_| ServiceError::NotFound)
}

fn load<R>(repo: &R, user: &AuthenticatedUser, id: PurchaseOrderId) -> ServiceResult<PurchaseOrder>
where
    R: PurchaseOrderReader + ?Sized,
{
    repo.get_purchase_order_by_id(id, user.tenant_id)
        .map_err(log_failure("load purchase order"))?
        .ok_or(ServiceError::NotFound)
}

fn ensure_tenant_job<R>(repo: &R, user: &AuthenticatedUser, job_id: Option<JobId>) -> ServiceResult<()>
where
    R: JobReader + ?Sized,
{
    let Some(job_id) = job_id else {
        return Ok(());
    };
    repo.get_job_by_id(job_id, user.tenant_id)
        .map_err(log_failure("load referenced job"))?
        .map(|_| ())
        .ok_or(ServiceError::NotFound)
}

pub fn list_purchase_orders<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: DocumentListParams<PurchaseOrderStatus>,
) -> ServiceResult<Listing<PurchaseOrder>>
where
    R: PurchaseOrderReader + ?Sized,
{
    ensure_permission(user, Permission::PurchaseOrdersViewAll)?;

    let page = params.page_request();
    let mut query = PurchaseOrderListQuery::new(user.tenant_id).paginate(page);
    if let Some(term) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.search(term);
    }
    if let Some(status) = params.status {
        query = query.status(status);
    }

    let (total, orders) = repo
        .list_purchase_orders(query)
        .map_err(log_failure("list purchase orders"))?;
    Ok(Listing::new(total, orders, page))
}

pub fn get_purchase_order<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
) -> ServiceResult<PurchaseOrderDetail>
where
    R: PurchaseOrderReader + DocumentReader + ?Sized,
{
    ensure_permission(user, Permission::PurchaseOrdersViewAll)?;
    let purchase_order = load(repo, user, order_id(id)?)?;
    let lines = repo
        .list_document_lines(DocumentKind::PurchaseOrder, purchase_order.id.get())
        .map_err(log_failure("load purchase order lines"))?;
    Ok(PurchaseOrderDetail {
        purchase_order,
        lines,
    })
}

pub fn create_purchase_order<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: PurchaseOrderForm,
) -> ServiceResult<PurchaseOrder>
where
    R: PurchaseOrderWriter + JobReader + ?Sized,
{
    ensure_permission(user, Permission::PurchaseOrdersCreate)?;
    let new_order = form.into_new_purchase_order(user.tenant_id)?;
    ensure_tenant_job(repo, user, new_order.job_id)?;

    let order = repo
        .create_purchase_order(&new_order)
        .map_err(log_failure("create purchase order"))?;
    log::info!(
        "User {} created purchase order {} for {}",
        user.id,
        order.po_number,
        order.vendor
    );
    Ok(order)
}

pub fn update_purchase_order<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: PurchaseOrderForm,
) -> ServiceResult<PurchaseOrder>
where
    R: PurchaseOrderReader + PurchaseOrderWriter + JobReader + ?Sized,
{
    ensure_permission(user, Permission::PurchaseOrdersEdit)?;
    let id = order_id(id)?;
    let current = load(repo, user, id)?;
    let updates = form.into_update(&current)?;
    ensure_tenant_job(repo, user, updates.job_id)?;

    repo.update_purchase_order(id, user.tenant_id, &updates)
        .map_err(log_failure("update purchase order"))
}

pub fn delete_purchase_order<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: PurchaseOrderWriter + ?Sized,
{
    ensure_permission(user, Permission::PurchaseOrdersDelete)?;
    repo.delete_purchase_order(order_id(id)?, user.tenant_id)
        .map_err(log_failure("delete purchase order"))
}

pub fn approve_purchase_order<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
) -> ServiceResult<PurchaseOrder>
where
    R: PurchaseOrderReader + PurchaseOrderWriter + ?Sized,
{
    ensure_permission(user, Permission::PurchaseOrdersEdit)?;
    let current = load(repo, user, order_id(id)?)?;
    if !current.status.can_approve() {
        return Err(ServiceError::Validation(format!(
            "Purchase order is already {}",
            current.status.as_str()
        )));
    }

    let order = repo
        .set_purchase_order_status(
            current.id,
            user.tenant_id,
            PurchaseOrderStatus::Approved,
            current.received_at,
        )
        .map_err(log_failure("approve purchase order"))?;
    log::info!("User {} approved purchase order {}", user.id, order.po_number);
    Ok(order)
}

/// Marks goods as received and stamps the time.
pub fn receive_purchase_order<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
) -> ServiceResult<PurchaseOrder>
where
    R: PurchaseOrderReader + PurchaseOrderWriter + ?Sized,
{
    ensure_permission(user, Permission::PurchaseOrdersEdit)?;
    let current = load(repo, user, order_id(id)?)?;
    if !current.status.can_receive() {
        return Err(ServiceError::Validation(format!(
            "Purchase order is already {}",
            current.status.as_str()
        )));
    }

    let order = repo
        .set_purchase_order_status(
            current.id,
            user.tenant_id,
            PurchaseOrderStatus::Received,
            Some(Utc::now().naive_utc()),
        )
        .map_err(log_failure("receive purchase order"))?;
    log::info!("User {} received purchase order {}", user.id, order.po_number);
    Ok(order)
}
