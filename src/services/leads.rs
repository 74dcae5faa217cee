use crate::domain::estimate::Estimate;
use crate::domain::lead::Lead;
use crate::domain::notification::{NewNotification, NotificationKind};
use crate::domain::permission::Permission;
use crate::domain::types::{LeadId, UserId};
use crate::dto::Listing;
use crate::forms::leads::{LeadForm, LeadListParams, LeadPayload};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{
    ClientReader, EstimateWriter, LeadConversion, LeadListQuery, LeadReader, LeadWriter,
    NotificationWriter, UserReader,
};
use crate::services::notifications::deliver;
use crate::services::{
    ServiceError, ServiceResult, ensure_permission, ensure_tenant_client, ensure_tenant_user,
    log_failure,
};

fn lead_id(id: i32) -> ServiceResult<LeadId> {
    LeadId::new(id).map_err(|_| ServiceError::NotFound)
}

/// Checks the lead's user and client references against the caller's
/// tenant.
fn check_references<R>(repo: &R, user: &AuthenticatedUser, payload: &LeadPayload) -> ServiceResult<()>
where
    R: UserReader + ClientReader + ?Sized,
{
    ensure_tenant_user(repo, user.tenant_id, payload.assigned_to_id)?;
    ensure_tenant_client(repo, user.tenant_id, payload.converted_to_client_id)
}

fn notify_assignee<R>(repo: &R, user: &AuthenticatedUser, lead: &Lead, assignee: Option<UserId>)
where
    R: NotificationWriter + ?Sized,
{
    let Some(assignee) = assignee.filter(|assignee| *assignee != user.id) else {
        return;
    };
    deliver(
        repo,
        &NewNotification::new(
            user.tenant_id,
            assignee,
            NotificationKind::LeadAssigned,
            "New Lead Assigned",
        )
        .message(format!("You were assigned a new lead: \"{}\"", lead.full_name()))
        .link("lead", lead.id.get()),
    );
}

pub fn list_leads<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: LeadListParams,
) -> ServiceResult<Listing<Lead>>
where
    R: LeadReader + ?Sized,
{
    ensure_permission(user, Permission::LeadsViewAll)?;

    let page = params.page_request();
    let mut query = LeadListQuery::new(user.tenant_id).paginate(page);
    if let Some(term) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.search(term);
    }
    if let Some(status) = params.status {
        query = query.status(status);
    }
    if let Some(source) = params.source {
        query = query.source(source);
    }
    if let Some(assignee) = params.assigned_to_id.and_then(|id| UserId::new(id).ok()) {
        query = query.assigned_to(assignee);
    }

    let (total, leads) = repo.list_leads(query).map_err(log_failure("list leads"))?;
    Ok(Listing::new(total, leads, page))
}

pub fn get_lead<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<Lead>
where
    R: LeadReader + ?Sized,
{
    ensure_permission(user, Permission::LeadsViewAll)?;
    repo.get_lead_by_id(lead_id(id)?, user.tenant_id)
        .map_err(log_failure("load lead"))?
        .ok_or(ServiceError::NotFound)
}

/// Creates a lead and notifies its assignee when someone else was picked.
pub fn create_lead<R>(repo: &R, user: &AuthenticatedUser, form: LeadForm) -> ServiceResult<Lead>
where
    R: LeadWriter + UserReader + ClientReader + NotificationWriter + ?Sized,
{
    ensure_permission(user, Permission::LeadsCreate)?;
    let payload = LeadPayload::try_from(form)?;
    check_references(repo, user, &payload)?;

    let lead = repo
        .create_lead(&payload.into_new_lead(user.tenant_id))
        .map_err(log_failure("create lead"))?;

    notify_assignee(repo, user, &lead, lead.assigned_to_id);
    log::info!("User {} created lead {}", user.id, lead.id);
    Ok(lead)
}

/// Updates a lead; a change of assignee notifies the new assignee.
pub fn update_lead<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: LeadForm,
) -> ServiceResult<Lead>
where
    R: LeadReader + LeadWriter + UserReader + ClientReader + NotificationWriter + ?Sized,
{
    ensure_permission(user, Permission::LeadsEdit)?;
    let id = lead_id(id)?;
    let payload = LeadPayload::try_from(form)?;
    check_references(repo, user, &payload)?;

    let current = repo
        .get_lead_by_id(id, user.tenant_id)
        .map_err(log_failure("load lead"))?
        .ok_or(ServiceError::NotFound)?;

    let lead = repo
        .update_lead(id, user.tenant_id, &payload.into_update())
        .map_err(log_failure("update lead"))?;

    if lead.assigned_to_id != current.assigned_to_id {
        notify_assignee(repo, user, &lead, lead.assigned_to_id);
    }
    Ok(lead)
}

pub fn delete_lead<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: LeadWriter + ?Sized,
{
    ensure_permission(user, Permission::LeadsDelete)?;
    let id = lead_id(id)?;
    repo.delete_lead(id, user.tenant_id)
        .map_err(log_failure("delete lead"))?;
    log::info!("User {} deleted lead {}", user.id, id);
    Ok(())
}

/// Turns the lead into a client, reusing a matching client when one exists.
pub fn convert_lead<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<LeadConversion>
where
    R: LeadWriter + ?Sized,
{
    ensure_permission(user, Permission::LeadsEdit)?;
    ensure_permission(user, Permission::ClientsCreate)?;

    let conversion = repo
        .convert_lead_to_client(lead_id(id)?, user.tenant_id, Some(user.id))
        .map_err(log_failure("convert lead"))?;

    log::info!(
        "Lead {} converted to client {} (new: {})",
        conversion.lead.id,
        conversion.client.id,
        conversion.client_created
    );
    Ok(conversion)
}

pub fn convert_lead_to_estimate<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
) -> ServiceResult<Estimate>
where
    R: LeadWriter + EstimateWriter + ?Sized,
{
    ensure_permission(user, Permission::EstimatesCreate)?;

    let estimate = repo
        .convert_lead_to_estimate(lead_id(id)?, user.tenant_id, Some(user.id))
        .map_err(log_failure("convert lead to estimate"))?;

    log::info!("Lead {id} converted to estimate {}", estimate.id);
    Ok(estimate)
}
