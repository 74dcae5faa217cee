use chrono::Utc;

use crate::domain::document::DocumentKind;
use crate::domain::invoice::{Invoice, InvoiceDetail, InvoiceStatus, Payment, PublicInvoice};
use crate::domain::permission::Permission;
use crate::domain::types::{ClientId, InvoiceId, JobId, PublicId};
use crate::dto::Listing;
use crate::forms::documents::DocumentListParams;
use crate::forms::invoices::{InvoiceForm, PaymentForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{
    ClientReader, DocumentReader, InvoiceListQuery, InvoiceReader, InvoiceWriter, JobReader,
};
use crate::services::{
    ServiceError, ServiceResult, ensure_permission, ensure_tenant_client, log_failure,
};

fn invoice_id(id: i32) -> ServiceResult<InvoiceId> {
    InvoiceId::new(id).map_err(|_| ServiceError::NotFound)
}

fn load<R>(repo: &R, user: &AuthenticatedUser, id: InvoiceId) -> ServiceResult<Invoice>
where
    R: InvoiceReader + ?Sized,
{
    repo.get_invoice_by_id(id, user.tenant_id)
        .map_err(log_failure("load invoice"))?
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

/// Rejects changes to paid and void invoices.
pub(crate) fn ensure_editable(invoice: &Invoice) -> ServiceResult<()> {
    if invoice.is_locked() {
        return Err(ServiceError::Validation(format!(
            "Cannot edit {} invoice",
            invoice.status.as_str().to_lowercase()
        )));
    }
    Ok(())
}

/// Moves the tenant's past-due invoices to `OVERDUE`. A failed sweep is
/// logged and does not fail the request.
fn flag_overdue<R>(repo: &R, user: &AuthenticatedUser) -> Vec<Invoice>
where
    R: InvoiceWriter + ?Sized,
{
    match repo.mark_overdue_invoices(user.tenant_id, Utc::now().naive_utc()) {
        Ok(flagged) => {
            for invoice in &flagged {
                log::info!("Invoice {} is now overdue", invoice.invoice_number);
            }
            flagged
        }
        Err(err) => {
            log::error!("Failed to flag overdue invoices of tenant {}: {err}", user.tenant_id);
            Vec::new()
        }
    }
}

pub fn list_invoices<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: DocumentListParams<InvoiceStatus>,
) -> ServiceResult<Listing<Invoice>>
where
    R: InvoiceReader + InvoiceWriter + ?Sized,
{
    ensure_permission(user, Permission::InvoicesViewAll)?;
    flag_overdue(repo, user);

    let page = params.page_request();
    let mut query = InvoiceListQuery::new(user.tenant_id).paginate(page);
    if let Some(term) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.search(term);
    }
    if let Some(status) = params.status {
        query = query.status(status);
    }
    if let Some(client_id) = params.client_id.and_then(|id| ClientId::new(id).ok()) {
        query = query.client(client_id);
    }

    let (total, invoices) = repo
        .list_invoices(query)
        .map_err(log_failure("list invoices"))?;
    Ok(Listing::new(total, invoices, page))
}

/// The invoice with its lines, groups and payments.
pub fn get_invoice<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<InvoiceDetail>
where
    R: InvoiceReader + InvoiceWriter + DocumentReader + ?Sized,
{
    ensure_permission(user, Permission::InvoicesViewAll)?;
    flag_overdue(repo, user);
    let invoice = load(repo, user, invoice_id(id)?)?;
    let lines = repo
        .list_document_lines(DocumentKind::Invoice, invoice.id.get())
        .map_err(log_failure("load invoice lines"))?;
    let payments = repo
        .list_payments(invoice.id)
        .map_err(log_failure("load payments"))?;
    Ok(InvoiceDetail {
        invoice,
        lines,
        payments,
    })
}

pub fn create_invoice<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: InvoiceForm,
) -> ServiceResult<Invoice>
where
    R: InvoiceWriter + ClientReader + JobReader + ?Sized,
{
    ensure_permission(user, Permission::InvoicesCreate)?;
    let new_invoice = form.into_new_invoice(user.tenant_id)?;
    ensure_tenant_client(repo, user.tenant_id, Some(new_invoice.client_id))?;
    ensure_tenant_job(repo, user, new_invoice.job_id)?;

    let invoice = repo
        .create_invoice(&new_invoice)
        .map_err(log_failure("create invoice"))?;
    log::info!("User {} created invoice {}", user.id, invoice.invoice_number);
    Ok(invoice)
}

pub fn update_invoice<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: InvoiceForm,
) -> ServiceResult<Invoice>
where
    R: InvoiceReader + InvoiceWriter + JobReader + ?Sized,
{
    ensure_permission(user, Permission::InvoicesEdit)?;
    let id = invoice_id(id)?;
    let current = load(repo, user, id)?;
    ensure_editable(&current)?;
    let updates = form.into_update(&current)?;
    ensure_tenant_job(repo, user, updates.job_id)?;

    let updated = repo
        .update_invoice(id, user.tenant_id, &updates)
        .map_err(log_failure("update invoice"))?;
    Ok(flag_overdue(repo, user)
        .into_iter()
        .find(|invoice| invoice.id == id)
        .unwrap_or(updated))
}

pub fn delete_invoice<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: InvoiceWriter + ?Sized,
{
    ensure_permission(user, Permission::InvoicesDelete)?;
    let id = invoice_id(id)?;
    repo.delete_invoice(id, user.tenant_id)
        .map_err(log_failure("delete invoice"))?;
    log::info!("User {} deleted invoice {id}", user.id);
    Ok(())
}

/// Records a completed manual payment and applies it to the invoice.
pub fn record_payment<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: PaymentForm,
) -> ServiceResult<(Invoice, Payment)>
where
    R: InvoiceReader + InvoiceWriter + ?Sized,
{
    ensure_permission(user, Permission::InvoicesEdit)?;
    let invoice = load(repo, user, invoice_id(id)?)?;
    let payment = form.into_payment(&invoice)?;

    let (invoice, payment) = repo
        .record_payment(&payment)
        .map_err(log_failure("record payment"))?;

    log::info!(
        "User {} recorded payment {} on invoice {} (balance {})",
        user.id,
        payment.id,
        invoice.invoice_number,
        invoice.balance
    );
    Ok((invoice, payment))
}

/// Client facing view reached through the invoice's public id; lines the
/// client may not see are left out.
pub fn public_invoice<R>(repo: &R, public_id: &str) -> ServiceResult<PublicInvoice>
where
    R: InvoiceReader + DocumentReader + ClientReader + ?Sized,
{
    let public_id: PublicId = public_id.parse().map_err(|_| ServiceError::NotFound)?;
    let invoice = repo
        .get_invoice_by_public_id(public_id)
        .map_err(log_failure("load public invoice"))?
        .ok_or(ServiceError::NotFound)?;

    let client_name = repo
        .get_client_by_id(invoice.client_id, invoice.tenant_id)
        .map_err(log_failure("load invoice client"))?
        .map(|client| client.name.into_inner())
        .unwrap_or_default();
    let lines = repo
        .list_document_lines(DocumentKind::Invoice, invoice.id.get())
        .map_err(log_failure("load invoice lines"))?
        .visible_to_client();

    Ok(PublicInvoice {
        invoice_number: invoice.invoice_number,
        title: invoice.title,
        status: invoice.status,
        client_name,
        subtotal: invoice.subtotal,
        tax: invoice.tax,
        discount: invoice.discount,
        total: invoice.total,
        paid: invoice.paid,
        balance: invoice.balance,
        due_date: invoice.due_date,
        lines,
    })
}
