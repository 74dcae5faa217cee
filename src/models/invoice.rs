//! Diesel models for invoices and the payments recorded against them.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::{
    invoice::{
        Invoice as DomainInvoice, NewInvoice as DomainNewInvoice, NewPayment as DomainNewPayment,
        Payment as DomainPayment, UpdateInvoice as DomainUpdateInvoice,
    },
    types::{Cents, ClientId, InvoiceId, PaymentId, PublicId, TenantId, TypeConstraintError},
};
use crate::models::opt_id;

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::invoices)]
pub struct Invoice {
    pub id: i32,
    pub tenant_id: i32,
    pub public_id: Vec<u8>,
    pub client_id: i32,
    pub job_id: Option<i32>,
    pub estimate_id: Option<i32>,
    pub invoice_number: String,
    pub title: String,
    pub status: String,
    pub subtotal_cents: i64,
    pub tax_rate: f64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub balance_cents: i64,
    pub due_date: Option<NaiveDateTime>,
    pub paid_at: Option<NaiveDateTime>,
    pub progress_billing_mode: Option<String>,
    pub progress_billing_percent: Option<f64>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::invoices)]
pub struct NewInvoice<'a> {
    pub tenant_id: i32,
    pub public_id: &'a [u8],
    pub client_id: i32,
    pub job_id: Option<i32>,
    pub estimate_id: Option<i32>,
    pub invoice_number: &'a str,
    pub title: &'a str,
    pub status: &'a str,
    pub tax_rate: f64,
    pub discount_cents: i64,
    pub due_date: Option<NaiveDateTime>,
    pub progress_billing_mode: Option<&'a str>,
    pub progress_billing_percent: Option<f64>,
    pub notes: Option<&'a str>,
}

impl<'a> NewInvoice<'a> {
    pub fn new(invoice: &'a DomainNewInvoice, public_id: &'a PublicId, invoice_number: &'a str) -> Self {
        Self {
            tenant_id: invoice.tenant_id.get(),
            public_id: public_id.as_bytes(),
            client_id: invoice.client_id.get(),
            job_id: invoice.job_id.map(|id| id.get()),
            estimate_id: invoice.estimate_id.map(|id| id.get()),
            invoice_number,
            title: invoice.title.as_str(),
            status: invoice.status.as_str(),
            tax_rate: invoice.tax_rate,
            discount_cents: invoice.discount.get(),
            due_date: invoice.due_date,
            progress_billing_mode: invoice.progress_billing_mode.map(|mode| mode.as_str()),
            progress_billing_percent: invoice.progress_billing_percent,
            notes: invoice.notes.as_deref(),
        }
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::invoices)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateInvoice<'a> {
    pub title: &'a str,
    pub status: &'a str,
    pub job_id: Option<i32>,
    pub tax_rate: f64,
    pub discount_cents: i64,
    pub due_date: Option<NaiveDateTime>,
    pub notes: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

impl<'a> UpdateInvoice<'a> {
    pub fn from_domain(invoice: &'a DomainUpdateInvoice, updated_at: NaiveDateTime) -> Self {
        Self {
            title: invoice.title.as_str(),
            status: invoice.status.as_str(),
            job_id: invoice.job_id.map(|id| id.get()),
            tax_rate: invoice.tax_rate,
            discount_cents: invoice.discount.get(),
            due_date: invoice.due_date,
            notes: invoice.notes.as_deref(),
            updated_at,
        }
    }
}

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::payments)]
pub struct Payment {
    pub id: i32,
    pub tenant_id: i32,
    pub invoice_id: i32,
    pub amount_cents: i64,
    pub method: String,
    pub status: String,
    pub reference: Option<String>,
    pub transaction_id: Option<String>,
    pub processed_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::payments)]
pub struct NewPayment<'a> {
    pub tenant_id: i32,
    pub invoice_id: i32,
    pub amount_cents: i64,
    pub method: &'a str,
    pub status: &'a str,
    pub reference: Option<&'a str>,
    pub transaction_id: Option<&'a str>,
    pub processed_at: NaiveDateTime,
}

impl<'a> NewPayment<'a> {
    pub fn new(payment: &'a DomainNewPayment, processed_at: NaiveDateTime) -> Self {
        Self {
            tenant_id: payment.tenant_id.get(),
            invoice_id: payment.invoice_id.get(),
            amount_cents: payment.amount.get(),
            method: payment.method.as_str(),
            status: payment.status.as_str(),
            reference: payment.reference.as_deref(),
            transaction_id: payment.transaction_id.as_deref(),
            processed_at,
        }
    }
}

impl TryFrom<Invoice> for DomainInvoice {
    type Error = TypeConstraintError;

    fn try_from(invoice: Invoice) -> Result<Self, Self::Error> {
        Ok(Self {
            id: InvoiceId::new(invoice.id)?,
            tenant_id: TenantId::new(invoice.tenant_id)?,
            public_id: PublicId::from_bytes(&invoice.public_id)?,
            client_id: ClientId::new(invoice.client_id)?,
            job_id: opt_id(invoice.job_id)?,
            estimate_id: opt_id(invoice.estimate_id)?,
            invoice_number: invoice.invoice_number,
            title: invoice.title,
            status: invoice.status.parse()?,
            subtotal: Cents::new(invoice.subtotal_cents),
            tax_rate: invoice.tax_rate,
            tax: Cents::new(invoice.tax_cents),
            discount: Cents::new(invoice.discount_cents),
            total: Cents::new(invoice.total_cents),
            paid: Cents::new(invoice.paid_cents),
            balance: Cents::new(invoice.balance_cents),
            due_date: invoice.due_date,
            paid_at: invoice.paid_at,
            progress_billing_mode: invoice
                .progress_billing_mode
                .map(|mode| mode.parse())
                .transpose()?,
            progress_billing_percent: invoice.progress_billing_percent,
            notes: invoice.notes,
            created_at: invoice.created_at,
            updated_at: invoice.updated_at,
        })
    }
}

impl TryFrom<Payment> for DomainPayment {
    type Error = TypeConstraintError;

    fn try_from(payment: Payment) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PaymentId::new(payment.id)?,
            tenant_id: TenantId::new(payment.tenant_id)?,
            invoice_id: InvoiceId::new(payment.invoice_id)?,
            amount: Cents::new(payment.amount_cents),
            method: payment.method.parse()?,
            status: payment.status.parse()?,
            reference: payment.reference,
            transaction_id: payment.transaction_id,
            processed_at: payment.processed_at,
        })
    }
}
