use crate::domain::document::DocumentKind;
use crate::domain::estimate::{Estimate, EstimateDetail, EstimateStatus, plan_billing};
use crate::domain::invoice::Invoice;
use crate::domain::permission::Permission;
use crate::domain::types::{ClientId, EstimateId, LeadId};
use crate::dto::Listing;
use crate::forms::documents::DocumentListParams;
use crate::forms::estimates::{ConvertToInvoiceForm, EstimateForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{
    ClientReader, DocumentReader, EstimateListQuery, EstimateReader, EstimateWriter,
    JobConversion, LeadReader,
};
use crate::services::{
    ServiceError, ServiceResult, ensure_permission, ensure_tenant_client, log_failure,
};

fn estimate_id(id: i32) -> ServiceResult<EstimateId> {
    EstimateId::new(id).map_err(|_| ServiceError::NotFound)
}

fn load<R>(repo: &R, user: &AuthenticatedUser, id: EstimateId) -> ServiceResult<Estimate>
where
    R: EstimateReader + ?Sized,
{
    repo.get_estimate_by_id(id, user.tenant_id)
        .map_err(log_failure("load estimate"))?
        .ok_or(ServiceError::NotFound)
}

fn ensure_tenant_lead<R>(
    repo: &R,
    user: &AuthenticatedUser,
    lead_id: Option<LeadId>,
) -> ServiceResult<()>
where
    R: LeadReader + ?Sized,
{
    let Some(lead_id) = lead_id else {
        return Ok(());
    };
    repo.get_lead_by_id(lead_id, user.tenant_id)
        .map_err(log_failure("load referenced lead"))?
        .map(|_| ())
        .ok_or(ServiceError::NotFound)
}

pub fn list_estimates<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: DocumentListParams<EstimateStatus>,
) -> ServiceResult<Listing<Estimate>>
where
    R: EstimateReader + ?Sized,
{
    ensure_permission(user, Permission::EstimatesViewAll)?;

    let page = params.page_request();
    let mut query = EstimateListQuery::new(user.tenant_id).paginate(page);
    if let Some(term) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.search(term);
    }
    if let Some(status) = params.status {
        query = query.status(status);
    }
    if let Some(client_id) = params.client_id.and_then(|id| ClientId::new(id).ok()) {
        query = query.client(client_id);
    }

    let (total, estimates) = repo
        .list_estimates(query)
        .map_err(log_failure("list estimates"))?;
    Ok(Listing::new(total, estimates, page))
}

/// The estimate with its lines and groups.
pub fn get_estimate<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<EstimateDetail>
where
    R: EstimateReader + DocumentReader + ?Sized,
{
    ensure_permission(user, Permission::EstimatesViewAll)?;
    let estimate = load(repo, user, estimate_id(id)?)?;
    let lines = repo
        .list_document_lines(DocumentKind::Estimate, estimate.id.get())
        .map_err(log_failure("load estimate lines"))?;
    Ok(EstimateDetail { estimate, lines })
}

pub fn create_estimate<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: EstimateForm,
) -> ServiceResult<Estimate>
where
    R: EstimateWriter + ClientReader + LeadReader + ?Sized,
{
    ensure_permission(user, Permission::EstimatesCreate)?;
    let new_estimate = form.into_new_estimate(user.tenant_id, user.id)?;
    ensure_tenant_client(repo, user.tenant_id, new_estimate.client_id)?;
    ensure_tenant_lead(repo, user, new_estimate.lead_id)?;

    let estimate = repo
        .create_estimate(&new_estimate)
        .map_err(log_failure("create estimate"))?;
    log::info!(
        "User {} created estimate {}",
        user.id,
        estimate.estimate_number
    );
    Ok(estimate)
}

pub fn update_estimate<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: EstimateForm,
) -> ServiceResult<Estimate>
where
    R: EstimateReader + EstimateWriter + ClientReader + ?Sized,
{
    ensure_permission(user, Permission::EstimatesEdit)?;
    let id = estimate_id(id)?;
    let current = load(repo, user, id)?;
    let updates = form.into_update(&current)?;
    ensure_tenant_client(repo, user.tenant_id, updates.client_id)?;

    repo.update_estimate(id, user.tenant_id, &updates)
        .map_err(log_failure("update estimate"))
}

pub fn delete_estimate<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: EstimateWriter + ?Sized,
{
    ensure_permission(user, Permission::EstimatesDelete)?;
    let id = estimate_id(id)?;
    repo.delete_estimate(id, user.tenant_id)
        .map_err(log_failure("delete estimate"))?;
    log::info!("User {} deleted estimate {id}", user.id);
    Ok(())
}

/// Returns the estimate's job, creating it first when needed.
pub fn convert_to_job<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<JobConversion>
where
    R: EstimateWriter + ?Sized,
{
    ensure_permission(user, Permission::JobsCreate)?;

    let conversion = repo
        .convert_estimate_to_job(estimate_id(id)?, user.tenant_id, Some(user.id))
        .map_err(log_failure("convert estimate to job"))?;

    if conversion.created {
        log::info!(
            "Estimate {id} converted to job {}",
            conversion.job.job_number
        );
    }
    Ok(conversion)
}

/// Bills the estimate in full, in part or by percentage.
pub fn convert_to_invoice<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: ConvertToInvoiceForm,
) -> ServiceResult<Invoice>
where
    R: EstimateReader + EstimateWriter + DocumentReader + ?Sized,
{
    ensure_permission(user, Permission::InvoicesCreate)?;
    let estimate = load(repo, user, estimate_id(id)?)?;
    if estimate.client_id.is_none() {
        return Err(ServiceError::Validation(
            "Estimate must be linked to a client before converting to invoice.".to_string(),
        ));
    }

    let lines = repo
        .list_document_lines(DocumentKind::Estimate, estimate.id.get())
        .map_err(log_failure("load estimate lines"))?;
    let selected = form.selected_ids()?;
    let plan = plan_billing(
        &estimate,
        &lines.line_items,
        form.billing_mode,
        form.percentage,
        &selected,
    )?;

    let invoice = repo
        .convert_estimate_to_invoice(&estimate, &plan, Some(user.id))
        .map_err(log_failure("convert estimate to invoice"))?;

    log::info!(
        "Estimate {} billed as invoice {} ({})",
        estimate.estimate_number,
        invoice.invoice_number,
        plan.mode.as_str()
    );
    Ok(invoice)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::document::{DocumentLines, LineItem};
    use crate::domain::estimate::BillingMode;
    use crate::domain::invoice::InvoiceStatus;
    use crate::domain::job::{Job, JobStatus};
    use crate::domain::types::{Cents, InvoiceId, JobId, LineItemId, PublicId};
    use crate::domain::user::Role;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{admin_user, tenant, user_with_role};

    fn estimate(client: Option<i32>) -> Estimate {
        let now = Utc::now().naive_utc();
        Estimate {
            id: EstimateId::new(7).unwrap(),
            tenant_id: tenant(),
            client_id: client.map(|id| ClientId::new(id).unwrap()),
            lead_id: None,
            job_id: None,
            estimate_number: "EST-000007".into(),
            title: "Porch railing".into(),
            status: EstimateStatus::Approved,
            subtotal: Cents::new(40_000),
            tax_rate: 0.0,
            tax: Cents::ZERO,
            discount: Cents::ZERO,
            total: Cents::new(40_000),
            notes: None,
            created_by_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(id: i32, total: i64) -> LineItem {
        LineItem {
            id: LineItemId::new(id).unwrap(),
            group_id: None,
            source_item_id: None,
            description: format!("Line {id}"),
            quantity: 1.0,
            unit_price: Cents::new(total),
            unit_cost: None,
            total: Cents::new(total),
            taxable: true,
            is_visible_to_client: true,
            sort_order: id,
        }
    }

    fn job() -> Job {
        let now = Utc::now().naive_utc();
        Job {
            id: JobId::new(3).unwrap(),
            tenant_id: tenant(),
            client_id: ClientId::new(2).unwrap(),
            job_number: "JOB-000003".into(),
            title: "Porch railing".into(),
            description: None,
            status: JobStatus::Quote,
            priority: 3,
            scheduled_start: None,
            scheduled_end: None,
            estimate_amount: Some(Cents::new(40_000)),
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn invoice_from(estimate: &Estimate, total: Cents) -> Invoice {
        let now = Utc::now().naive_utc();
        Invoice {
            id: InvoiceId::new(11).unwrap(),
            tenant_id: estimate.tenant_id,
            public_id: PublicId::new(),
            client_id: estimate.client_id.unwrap(),
            job_id: None,
            estimate_id: Some(estimate.id),
            invoice_number: "INV-000011".into(),
            title: "Porch railing".into(),
            status: InvoiceStatus::Draft,
            subtotal: total,
            tax_rate: 0.0,
            tax: Cents::ZERO,
            discount: Cents::ZERO,
            total,
            paid: Cents::ZERO,
            balance: total,
            due_date: None,
            paid_at: None,
            progress_billing_mode: None,
            progress_billing_percent: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn estimate_without_client_cannot_be_invoiced() {
        let mut repo = MockRepository::new();
        repo.expect_get_estimate_by_id()
            .returning(|_, _| Ok(Some(estimate(None))));
        repo.expect_convert_estimate_to_invoice().times(0);

        let form: ConvertToInvoiceForm = serde_json::from_str("{}").unwrap();
        let result = convert_to_invoice(&repo, &admin_user(), 7, form);

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn manual_billing_sends_selected_lines() {
        let mut repo = MockRepository::new();
        repo.expect_get_estimate_by_id()
            .returning(|_, _| Ok(Some(estimate(Some(2)))));
        repo.expect_list_document_lines().returning(|_, _| {
            Ok(DocumentLines {
                line_items: vec![line(1, 30_000), line(2, 10_000)],
                groups: Vec::new(),
            })
        });
        repo.expect_convert_estimate_to_invoice()
            .withf(|_, plan, actor| {
                plan.mode == BillingMode::Manual
                    && plan.line_items.len() == 1
                    && plan.line_items[0].description == "Line 2"
                    && actor.map(|id| id.get()) == Some(1)
            })
            .times(1)
            .returning(|estimate, _, _| Ok(invoice_from(estimate, Cents::new(10_000))));

        let form: ConvertToInvoiceForm = serde_json::from_str(
            r#"{"billingMode":"MANUAL","selectedLineItemIds":[2]}"#,
        )
        .unwrap();
        let invoice = convert_to_invoice(&repo, &admin_user(), 7, form).unwrap();

        assert_eq!(invoice.total, Cents::new(10_000));
    }

    #[test]
    fn percentage_out_of_range_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_estimate_by_id()
            .returning(|_, _| Ok(Some(estimate(Some(2)))));
        repo.expect_list_document_lines()
            .returning(|_, _| Ok(DocumentLines::default()));
        repo.expect_convert_estimate_to_invoice().times(0);

        let form: ConvertToInvoiceForm =
            serde_json::from_str(r#"{"billingMode":"PERCENTAGE","percentage":120}"#).unwrap();

        assert!(matches!(
            convert_to_invoice(&repo, &admin_user(), 7, form),
            Err(ServiceError::Validation(msg)) if msg == "Percentage must be between 0 and 100."
        ));
    }

    #[test]
    fn existing_job_is_returned() {
        let mut repo = MockRepository::new();
        repo.expect_convert_estimate_to_job()
            .returning(|_, _, _| {
                Ok(JobConversion {
                    job: job(),
                    created: false,
                })
            });

        let conversion = convert_to_job(&repo, &admin_user(), 7).unwrap();

        assert!(!conversion.created);
        assert_eq!(conversion.job.job_number, "JOB-000003");
    }

    #[test]
    fn job_conversion_without_client_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_convert_estimate_to_job()
            .returning(|_, _, _| Err(RepositoryError::Rejected("no client".into())));

        assert!(matches!(
            convert_to_job(&repo, &admin_user(), 7),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn client_of_another_tenant_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_client_by_id().returning(|_, _| Ok(None));
        repo.expect_create_estimate().times(0);

        let form: EstimateForm = serde_json::from_str(
            r#"{"title":"Deck","clientId":42,"lineItems":[{"description":"Boards","unitPrice":100}]}"#,
        )
        .unwrap();

        assert!(matches!(
            create_estimate(&repo, &admin_user(), form),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn field_staff_cannot_create_estimates() {
        let repo = MockRepository::new();
        let form: EstimateForm = serde_json::from_str(r#"{"title":"Deck","leadId":1}"#).unwrap();

        assert!(matches!(
            create_estimate(&repo, &user_with_role(Role::Field), form),
            Err(ServiceError::Forbidden)
        ));
    }
}
