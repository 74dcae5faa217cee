use chrono::{NaiveDateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::{
        activity::{ActivityKind, NewActivity},
        document::DocumentKind,
        invoice::{
            Invoice, InvoiceStatus, NewInvoice, NewPayment, Payment, PaymentMethod,
            PaymentStatus, UpdateInvoice,
        },
        notification::{NewNotification, NotificationKind},
        types::{Cents, InvoiceId, PublicId, TenantId},
    },
    models::invoice::{
        Invoice as DbInvoice, NewInvoice as DbNewInvoice, NewPayment as DbNewPayment,
        Payment as DbPayment, UpdateInvoice as DbUpdateInvoice,
    },
    repository::{
        BILLING_ROLES, DieselRepository, GatewayOutcome, GatewayPayment, InvoiceListQuery,
        InvoiceReader, InvoiceWriter,
        activity::insert_activity,
        client::find_client,
        document::{
            delete_document_lines, insert_lines, next_number, recalculate_totals, replace_lines,
        },
        errors::{RepositoryError, RepositoryResult},
        estimate::{ensure_job_for_estimate, find_estimate},
        notification::insert_notification,
        user::active_users_with_roles,
    },
};

fn find_invoice(
    conn: &mut SqliteConnection,
    id: i32,
    tenant_id: i32,
) -> RepositoryResult<Option<Invoice>> {
    use crate::schema::invoices;

    let invoice = invoices::table
        .filter(invoices::id.eq(id))
        .filter(invoices::tenant_id.eq(tenant_id))
        .first::<DbInvoice>(conn)
        .optional()?;

    invoice
        .map(Invoice::try_from)
        .transpose()
        .map_err(RepositoryError::from)
}

fn reload(conn: &mut SqliteConnection, id: i32, tenant_id: i32) -> RepositoryResult<Invoice> {
    find_invoice(conn, id, tenant_id)?.ok_or(RepositoryError::NotFound)
}

/// Inserts the invoice with its lines under the next free `INV-` number.
/// The balance starts equal to the computed total.
pub(crate) fn insert_invoice(
    conn: &mut SqliteConnection,
    new_invoice: &NewInvoice,
) -> RepositoryResult<Invoice> {
    use crate::schema::invoices;

    let tenant_id = new_invoice.tenant_id.get();
    let count = invoices::table
        .filter(invoices::tenant_id.eq(tenant_id))
        .count()
        .get_result::<i64>(conn)?;

    let number = next_number(DocumentKind::Invoice.number_prefix(), count, |candidate| {
        Ok(diesel::select(exists(
            invoices::table
                .filter(invoices::tenant_id.eq(tenant_id))
                .filter(invoices::invoice_number.eq(candidate)),
        ))
        .get_result::<bool>(&mut *conn)?)
    })?;

    let public_id = PublicId::new();
    let created = diesel::insert_into(invoices::table)
        .values(&DbNewInvoice::new(new_invoice, &public_id, &number))
        .get_result::<DbInvoice>(conn)?;

    insert_lines(conn, DocumentKind::Invoice, created.id, &new_invoice.line_items)?;
    recalculate_totals(conn, DocumentKind::Invoice, created.id)?;

    reload(conn, created.id, tenant_id)
}

/// Stores the payment and applies it to the invoice header.
fn apply_payment(
    conn: &mut SqliteConnection,
    invoice: &Invoice,
    payment: &NewPayment,
) -> RepositoryResult<(Invoice, Payment)> {
    use crate::schema::{invoices, payments};

    let now = Utc::now().naive_utc();

    let created = diesel::insert_into(payments::table)
        .values(&DbNewPayment::new(payment, now))
        .get_result::<DbPayment>(conn)?;

    let applied = invoice.apply_payment(payment.amount, now);
    let updated = diesel::update(invoices::table.find(invoice.id.get()))
        .set((
            invoices::paid_cents.eq(applied.paid.get()),
            invoices::balance_cents.eq(applied.balance.get()),
            invoices::status.eq(applied.status.as_str()),
            invoices::paid_at.eq(applied.paid_at),
            invoices::updated_at.eq(now),
        ))
        .get_result::<DbInvoice>(conn)?;

    insert_activity(
        conn,
        &NewActivity::new(
            invoice.tenant_id,
            None,
            ActivityKind::PaymentReceived,
            format!(
                "Payment of {} received for invoice {}",
                payment.amount, invoice.invoice_number
            ),
        )
        .client(Some(invoice.client_id))
        .invoice(Some(invoice.id))
        .job(invoice.job_id),
    )?;

    Ok((Invoice::try_from(updated)?, Payment::try_from(created)?))
}

impl InvoiceReader for DieselRepository {
    fn get_invoice_by_id(
        &self,
        id: InvoiceId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Invoice>> {
        let mut conn = self.conn()?;
        find_invoice(&mut conn, id.get(), tenant_id.get())
    }

    fn get_invoice_by_public_id(&self, public_id: PublicId) -> RepositoryResult<Option<Invoice>> {
        use crate::schema::invoices;

        let mut conn = self.conn()?;

        let invoice = invoices::table
            .filter(invoices::public_id.eq(public_id.as_bytes().to_vec()))
            .first::<DbInvoice>(&mut conn)
            .optional()?;

        invoice
            .map(Invoice::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn list_invoices(&self, query: InvoiceListQuery) -> RepositoryResult<(usize, Vec<Invoice>)> {
        use crate::schema::invoices;

        let mut conn = self.conn()?;

        let filtered = || {
            let mut items = invoices::table
                .filter(invoices::tenant_id.eq(query.tenant_id.get()))
                .into_boxed();

            if let Some(status) = query.status {
                items = items.filter(invoices::status.eq(status.as_str()));
            }
            if let Some(client_id) = query.client_id {
                items = items.filter(invoices::client_id.eq(client_id.get()));
            }
            if let Some(term) = &query.search {
                let pattern = format!("%{term}%");
                items = items.filter(
                    invoices::invoice_number
                        .like(pattern.clone())
                        .or(invoices::title.like(pattern)),
                );
            }

            items
        };

        let total = filtered().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = filtered().order((invoices::updated_at.desc(), invoices::id.desc()));
        if let Some(page) = &query.pagination {
            items = items.limit(page.limit as i64).offset(page.offset() as i64);
        }

        let items = items
            .load::<DbInvoice>(&mut conn)?
            .into_iter()
            .map(|invoice| Invoice::try_from(invoice).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total, items))
    }

    fn list_payments(&self, invoice_id: InvoiceId) -> RepositoryResult<Vec<Payment>> {
        use crate::schema::payments;

        let mut conn = self.conn()?;

        payments::table
            .filter(payments::invoice_id.eq(invoice_id.get()))
            .order((payments::processed_at.asc(), payments::id.asc()))
            .load::<DbPayment>(&mut conn)?
            .into_iter()
            .map(|payment| Payment::try_from(payment).map_err(RepositoryError::from))
            .collect()
    }
}

impl InvoiceWriter for DieselRepository {
    fn create_invoice(&self, new_invoice: &NewInvoice) -> RepositoryResult<Invoice> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let invoice = insert_invoice(conn, new_invoice)?;

            insert_activity(
                conn,
                &NewActivity::new(
                    invoice.tenant_id,
                    None,
                    ActivityKind::InvoiceCreated,
                    format!("Invoice {} created", invoice.invoice_number),
                )
                .client(Some(invoice.client_id))
                .estimate(invoice.estimate_id)
                .invoice(Some(invoice.id))
                .job(invoice.job_id),
            )?;

            Ok(invoice)
        })
    }

    fn update_invoice(
        &self,
        id: InvoiceId,
        tenant_id: TenantId,
        updates: &UpdateInvoice,
    ) -> RepositoryResult<Invoice> {
        use crate::schema::invoices;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let changes = DbUpdateInvoice::from_domain(updates, Utc::now().naive_utc());
            let updated = diesel::update(
                invoices::table
                    .filter(invoices::id.eq(id.get()))
                    .filter(invoices::tenant_id.eq(tenant_id.get())),
            )
            .set(&changes)
            .execute(conn)?;
            if updated == 0 {
                return Err(RepositoryError::NotFound);
            }

            if let Some(lines) = &updates.line_items {
                replace_lines(conn, DocumentKind::Invoice, id.get(), lines)?;
            }
            recalculate_totals(conn, DocumentKind::Invoice, id.get())?;

            reload(conn, id.get(), tenant_id.get())
        })
    }

    fn delete_invoice(&self, id: InvoiceId, tenant_id: TenantId) -> RepositoryResult<()> {
        use crate::schema::invoices;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let deleted = diesel::delete(
                invoices::table
                    .filter(invoices::id.eq(id.get()))
                    .filter(invoices::tenant_id.eq(tenant_id.get())),
            )
            .execute(conn)?;
            if deleted == 0 {
                return Err(RepositoryError::NotFound);
            }

            delete_document_lines(conn, DocumentKind::Invoice, id.get())
        })
    }

    fn record_payment(&self, payment: &NewPayment) -> RepositoryResult<(Invoice, Payment)> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let invoice = find_invoice(conn, payment.invoice_id.get(), payment.tenant_id.get())?
                .ok_or(RepositoryError::NotFound)?;
            apply_payment(conn, &invoice, payment)
        })
    }

    fn record_gateway_payment(&self, gateway: &GatewayPayment) -> RepositoryResult<GatewayOutcome> {
        use crate::schema::{invoices, payments};

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let row = invoices::table
                .filter(invoices::public_id.eq(gateway.public_id.as_bytes().to_vec()))
                .first::<DbInvoice>(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;
            let mut invoice = Invoice::try_from(row)?;

            let already_recorded = match gateway.transaction_id.as_deref() {
                Some(transaction_id) => diesel::select(exists(
                    payments::table.filter(payments::transaction_id.eq(transaction_id)),
                ))
                .get_result::<bool>(conn)?,
                None => false,
            };

            let mut notified = Vec::new();
            let mut payment = None;

            if !already_recorded {
                let amount = gateway
                    .amount
                    .filter(|amount| *amount > Cents::ZERO)
                    .unwrap_or(invoice.balance);

                let (updated, created) = apply_payment(
                    conn,
                    &invoice,
                    &NewPayment {
                        tenant_id: invoice.tenant_id,
                        invoice_id: invoice.id,
                        amount,
                        method: PaymentMethod::Card,
                        status: PaymentStatus::Completed,
                        reference: gateway
                            .reference
                            .clone()
                            .or_else(|| gateway.transaction_id.clone()),
                        transaction_id: gateway.transaction_id.clone(),
                    },
                )?;
                invoice = updated;
                payment = Some(created);

                let client_name = find_client(conn, invoice.client_id.get(), invoice.tenant_id.get())?
                    .map(|client| client.name.as_str().to_string())
                    .unwrap_or_else(|| "Client".to_string());

                for user in active_users_with_roles(conn, invoice.tenant_id, &BILLING_ROLES)? {
                    insert_notification(
                        conn,
                        &NewNotification {
                            requires_ack: true,
                            ..NewNotification::new(
                                invoice.tenant_id,
                                user.id,
                                NotificationKind::InvoicePaid,
                                "Payment Received",
                            )
                            .message(format!(
                                "{client_name} paid ${amount} for invoice {}",
                                invoice.invoice_number
                            ))
                            .link("invoice", invoice.id.get())
                        },
                    )?;
                    notified.push(user.id);
                }
            }

            let mut job = None;
            let mut estimate_number = None;
            if let Some(estimate_id) = invoice.estimate_id {
                if invoice.paid > Cents::ZERO {
                    if let Some(estimate) =
                        find_estimate(conn, estimate_id.get(), invoice.tenant_id.get())?
                    {
                        job = match ensure_job_for_estimate(conn, &estimate, None) {
                            Ok(conversion) => Some(conversion),
                            Err(RepositoryError::Rejected(_)) => None,
                            Err(err) => return Err(err),
                        };
                        estimate_number = Some(estimate.estimate_number);
                    }
                }
            }

            if let Some(conversion) = job.as_ref().filter(|conversion| conversion.created) {
                let estimate_number = estimate_number.unwrap_or_default();
                for user in active_users_with_roles(conn, invoice.tenant_id, &BILLING_ROLES)? {
                    insert_notification(
                        conn,
                        &NewNotification {
                            requires_ack: true,
                            ..NewNotification::new(
                                invoice.tenant_id,
                                user.id,
                                NotificationKind::System,
                                "Payment received. Estimate is now a Job.",
                            )
                            .message(format!(
                                "Payment received. Estimate #{estimate_number} is now a Job ({}).",
                                conversion.job.job_number
                            ))
                            .link("job", conversion.job.id.get())
                        },
                    )?;
                    if !notified.contains(&user.id) {
                        notified.push(user.id);
                    }
                }
            }

            Ok(GatewayOutcome {
                invoice,
                payment,
                job,
                notified,
            })
        })
    }

    fn mark_overdue_invoices(
        &self,
        tenant_id: TenantId,
        now: NaiveDateTime,
    ) -> RepositoryResult<Vec<Invoice>> {
        use crate::schema::invoices;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let candidates = invoices::table
                .filter(invoices::tenant_id.eq(tenant_id.get()))
                .filter(invoices::status.eq_any([
                    InvoiceStatus::Sent.as_str(),
                    InvoiceStatus::Partial.as_str(),
                ]))
                .filter(invoices::balance_cents.gt(0))
                .filter(invoices::due_date.lt(now))
                .load::<DbInvoice>(conn)?;

            let mut flagged = Vec::with_capacity(candidates.len());
            for row in candidates {
                let invoice = Invoice::try_from(row)?;
                if !invoice.is_past_due(now) {
                    continue;
                }

                let updated = diesel::update(invoices::table.find(invoice.id.get()))
                    .set((
                        invoices::status.eq(InvoiceStatus::Overdue.as_str()),
                        invoices::updated_at.eq(now),
                    ))
                    .get_result::<DbInvoice>(conn)?;
                let updated = Invoice::try_from(updated)?;

                let days = updated
                    .due_date
                    .map_or(0, |due| (now - due).num_days());
                for user in active_users_with_roles(conn, tenant_id, &BILLING_ROLES)? {
                    insert_notification(
                        conn,
                        &NewNotification::new(
                            tenant_id,
                            user.id,
                            NotificationKind::InvoiceOverdue,
                            "Invoice Overdue",
                        )
                        .message(format!(
                            "Invoice {} is {days} days overdue with {} outstanding",
                            updated.invoice_number, updated.balance
                        ))
                        .link("invoice", updated.id.get()),
                    )?;
                }

                flagged.push(updated);
            }

            Ok(flagged)
        })
    }
}
