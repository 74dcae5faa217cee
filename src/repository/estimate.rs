use chrono::Utc;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::{
        activity::{ActivityKind, NewActivity},
        document::DocumentKind,
        estimate::{BillingPlan, Estimate, EstimateStatus, NewEstimate, UpdateEstimate},
        invoice::{Invoice, InvoiceStatus, NewInvoice},
        job::{DEFAULT_PRIORITY, JobStatus, NewJob},
        types::{Cents, EstimateId, TenantId, UserId},
    },
    models::estimate::{
        Estimate as DbEstimate, NewEstimate as DbNewEstimate, UpdateEstimate as DbUpdateEstimate,
    },
    repository::{
        DieselRepository, EstimateListQuery, EstimateReader, EstimateWriter, JobConversion,
        activity::insert_activity,
        client::find_client,
        document::{
            delete_document_lines, insert_lines, next_number, recalculate_totals, replace_lines,
        },
        errors::{RepositoryError, RepositoryResult},
        invoice::insert_invoice,
        job::{find_job, insert_job},
        lead::{convert_lead, find_lead},
    },
};

pub(crate) const MISSING_CLIENT_FOR_JOB: &str =
    "Estimate must be associated with a client or convertible request before creating a job.";

pub(crate) fn find_estimate(
    conn: &mut SqliteConnection,
    id: i32,
    tenant_id: i32,
) -> RepositoryResult<Option<Estimate>> {
    use crate::schema::estimates;

    let estimate = estimates::table
        .filter(estimates::id.eq(id))
        .filter(estimates::tenant_id.eq(tenant_id))
        .first::<DbEstimate>(conn)
        .optional()?;

    estimate
        .map(Estimate::try_from)
        .transpose()
        .map_err(RepositoryError::from)
}

fn reload(conn: &mut SqliteConnection, id: i32, tenant_id: i32) -> RepositoryResult<Estimate> {
    find_estimate(conn, id, tenant_id)?.ok_or(RepositoryError::NotFound)
}

/// Inserts the estimate with its lines under the next free `EST-` number
/// and stores its totals.
pub(crate) fn insert_estimate(
    conn: &mut SqliteConnection,
    new_estimate: &NewEstimate,
) -> RepositoryResult<Estimate> {
    use crate::schema::estimates;

    let tenant_id = new_estimate.tenant_id.get();
    let count = estimates::table
        .filter(estimates::tenant_id.eq(tenant_id))
        .count()
        .get_result::<i64>(conn)?;

    let number = next_number(DocumentKind::Estimate.number_prefix(), count, |candidate| {
        Ok(diesel::select(exists(
            estimates::table
                .filter(estimates::tenant_id.eq(tenant_id))
                .filter(estimates::estimate_number.eq(candidate)),
        ))
        .get_result::<bool>(&mut *conn)?)
    })?;

    let created = diesel::insert_into(estimates::table)
        .values(&DbNewEstimate::new(new_estimate, &number))
        .get_result::<DbEstimate>(conn)?;

    insert_lines(conn, DocumentKind::Estimate, created.id, &new_estimate.line_items)?;
    recalculate_totals(conn, DocumentKind::Estimate, created.id)?;

    reload(conn, created.id, tenant_id)
}

/// Returns the job of the estimate, creating one when the estimate has
/// none yet.
///
/// The client comes from the estimate, then from the client its lead was
/// converted into, and finally from converting the lead itself.
pub(crate) fn ensure_job_for_estimate(
    conn: &mut SqliteConnection,
    estimate: &Estimate,
    actor: Option<UserId>,
) -> RepositoryResult<JobConversion> {
    use crate::schema::estimates;

    let tenant_id = estimate.tenant_id.get();

    if let Some(job_id) = estimate.job_id {
        if let Some(job) = find_job(conn, job_id.get(), tenant_id)? {
            return Ok(JobConversion {
                job,
                created: false,
            });
        }
    }

    let mut client = match estimate.client_id {
        Some(client_id) => find_client(conn, client_id.get(), tenant_id)?,
        None => None,
    };

    if client.is_none() {
        let lead = match estimate.lead_id {
            Some(lead_id) => find_lead(conn, lead_id.get(), tenant_id)?,
            None => None,
        };
        if let Some(lead) = lead {
            client = match lead.converted_to_client_id {
                Some(client_id) => find_client(conn, client_id.get(), tenant_id)?,
                None => None,
            };
            if client.is_none() {
                client = Some(convert_lead(conn, &lead, actor)?.client);
            }
        }
    }

    let client =
        client.ok_or_else(|| RepositoryError::Rejected(MISSING_CLIENT_FOR_JOB.to_string()))?;

    let job = insert_job(
        conn,
        &NewJob {
            tenant_id: estimate.tenant_id,
            client_id: client.id,
            title: estimate.title.clone(),
            description: estimate.notes.clone(),
            status: JobStatus::Quote,
            priority: DEFAULT_PRIORITY,
            scheduled_start: None,
            scheduled_end: None,
            estimate_amount: Some(estimate.total),
        },
    )?;

    diesel::update(estimates::table.find(estimate.id.get()))
        .set((
            estimates::status.eq(EstimateStatus::Converted.as_str()),
            estimates::client_id.eq(Some(client.id.get())),
            estimates::job_id.eq(Some(job.id.get())),
            estimates::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;

    insert_activity(
        conn,
        &NewActivity::new(
            estimate.tenant_id,
            actor,
            ActivityKind::JobCreated,
            format!(
                "Estimate \"{}\" converted to job {}",
                estimate.estimate_number, job.job_number
            ),
        )
        .client(Some(client.id))
        .lead(estimate.lead_id)
        .estimate(Some(estimate.id))
        .job(Some(job.id)),
    )?;

    Ok(JobConversion { job, created: true })
}

impl EstimateReader for DieselRepository {
    fn get_estimate_by_id(
        &self,
        id: EstimateId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Estimate>> {
        let mut conn = self.conn()?;
        find_estimate(&mut conn, id.get(), tenant_id.get())
    }

    fn list_estimates(&self, query: EstimateListQuery) -> RepositoryResult<(usize, Vec<Estimate>)> {
        use crate::schema::estimates;

        let mut conn = self.conn()?;

        let filtered = || {
            let mut items = estimates::table
                .filter(estimates::tenant_id.eq(query.tenant_id.get()))
                .into_boxed();

            if let Some(status) = query.status {
                items = items.filter(estimates::status.eq(status.as_str()));
            }
            if let Some(client_id) = query.client_id {
                items = items.filter(estimates::client_id.eq(client_id.get()));
            }
            if let Some(term) = &query.search {
                let pattern = format!("%{term}%");
                items = items.filter(
                    estimates::estimate_number
                        .like(pattern.clone())
                        .or(estimates::title.like(pattern)),
                );
            }

            items
        };

        let total = filtered().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = filtered().order((estimates::updated_at.desc(), estimates::id.desc()));
        if let Some(page) = &query.pagination {
            items = items.limit(page.limit as i64).offset(page.offset() as i64);
        }

        let items = items
            .load::<DbEstimate>(&mut conn)?
            .into_iter()
            .map(|estimate| Estimate::try_from(estimate).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total, items))
    }
}

impl EstimateWriter for DieselRepository {
    fn create_estimate(&self, new_estimate: &NewEstimate) -> RepositoryResult<Estimate> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let estimate = insert_estimate(conn, new_estimate)?;

            insert_activity(
                conn,
                &NewActivity::new(
                    estimate.tenant_id,
                    estimate.created_by_id,
                    ActivityKind::EstimateCreated,
                    format!("Estimate {} created", estimate.estimate_number),
                )
                .client(estimate.client_id)
                .lead(estimate.lead_id)
                .estimate(Some(estimate.id)),
            )?;

            Ok(estimate)
        })
    }

    fn update_estimate(
        &self,
        id: EstimateId,
        tenant_id: TenantId,
        updates: &UpdateEstimate,
    ) -> RepositoryResult<Estimate> {
        use crate::schema::estimates;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let changes = DbUpdateEstimate::from_domain(updates, Utc::now().naive_utc());
            let updated = diesel::update(
                estimates::table
                    .filter(estimates::id.eq(id.get()))
                    .filter(estimates::tenant_id.eq(tenant_id.get())),
            )
            .set(&changes)
            .execute(conn)?;
            if updated == 0 {
                return Err(RepositoryError::NotFound);
            }

            if let Some(lines) = &updates.line_items {
                replace_lines(conn, DocumentKind::Estimate, id.get(), lines)?;
            }
            recalculate_totals(conn, DocumentKind::Estimate, id.get())?;

            reload(conn, id.get(), tenant_id.get())
        })
    }

    fn delete_estimate(&self, id: EstimateId, tenant_id: TenantId) -> RepositoryResult<()> {
        use crate::schema::estimates;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let deleted = diesel::delete(
                estimates::table
                    .filter(estimates::id.eq(id.get()))
                    .filter(estimates::tenant_id.eq(tenant_id.get())),
            )
            .execute(conn)?;
            if deleted == 0 {
                return Err(RepositoryError::NotFound);
            }

            delete_document_lines(conn, DocumentKind::Estimate, id.get())
        })
    }

    fn convert_estimate_to_job(
        &self,
        id: EstimateId,
        tenant_id: TenantId,
        actor: Option<UserId>,
    ) -> RepositoryResult<JobConversion> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let estimate = find_estimate(conn, id.get(), tenant_id.get())?
                .ok_or(RepositoryError::NotFound)?;
            ensure_job_for_estimate(conn, &estimate, actor)
        })
    }

    fn convert_estimate_to_invoice(
        &self,
        estimate: &Estimate,
        plan: &BillingPlan,
        actor: Option<UserId>,
    ) -> RepositoryResult<Invoice> {
        use crate::schema::estimates;

        let client_id = estimate.client_id.ok_or_else(|| {
            RepositoryError::Rejected(
                "Estimate must be associated with a client before invoicing.".to_string(),
            )
        })?;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let invoice = insert_invoice(
                conn,
                &NewInvoice {
                    tenant_id: estimate.tenant_id,
                    client_id,
                    job_id: estimate.job_id,
                    estimate_id: Some(estimate.id),
                    title: plan.title.clone(),
                    status: InvoiceStatus::Draft,
                    tax_rate: estimate.tax_rate,
                    discount: Cents::ZERO,
                    due_date: None,
                    progress_billing_mode: Some(plan.mode),
                    progress_billing_percent: plan.percent,
                    notes: estimate.notes.clone(),
                    line_items: plan.line_items.clone(),
                },
            )?;

            diesel::update(estimates::table.find(estimate.id.get()))
                .set((
                    estimates::status.eq(EstimateStatus::Invoiced.as_str()),
                    estimates::updated_at.eq(Utc::now().naive_utc()),
                ))
                .execute(conn)?;

            insert_activity(
                conn,
                &NewActivity::new(
                    estimate.tenant_id,
                    actor,
                    ActivityKind::InvoiceCreated,
                    format!(
                        "Estimate \"{}\" converted to invoice {} ({})",
                        estimate.estimate_number,
                        invoice.invoice_number,
                        plan.mode.as_str()
                    ),
                )
                .client(Some(client_id))
                .estimate(Some(estimate.id))
                .invoice(Some(invoice.id))
                .job(estimate.job_id),
            )?;

            Ok(invoice)
        })
    }
}
