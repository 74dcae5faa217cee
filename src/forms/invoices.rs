use serde::Deserialize;
use validator::Validate;

use crate::domain::invoice::{
    Invoice, InvoiceStatus, NewInvoice, NewPayment, PaymentMethod, PaymentStatus, UpdateInvoice,
};
use crate::domain::types::{Cents, ClientId, TenantId, sanitize_text, trim_optional};
use crate::forms::documents::{LineItemForm, into_lines};
use crate::forms::{FormError, optional_datetime, optional_id};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceForm {
    #[serde(default)]
    pub client_id: Option<i32>,
    #[serde(default)]
    pub job_id: Option<i32>,
    #[serde(default)]
    pub estimate_id: Option<i32>,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0, message = "Tax rate must be between 0 and 1"))]
    pub tax_rate: Option<f64>,
    /// Cents.
    #[serde(default)]
    #[validate(range(min = 0, message = "Discount cannot be negative"))]
    pub discount: Option<i64>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub line_items: Option<Vec<LineItemForm>>,
}

impl InvoiceForm {
    pub fn into_new_invoice(self, tenant_id: TenantId) -> Result<NewInvoice, FormError> {
        self.validate()?;
        let client_id = optional_id::<ClientId>(self.client_id, "clientId")?
            .ok_or(FormError::Missing("Client"))?;

        Ok(NewInvoice {
            tenant_id,
            client_id,
            job_id: optional_id(self.job_id, "jobId")?,
            estimate_id: optional_id(self.estimate_id, "estimateId")?,
            title: self.title.trim().to_string(),
            status: self.status.unwrap_or(InvoiceStatus::Draft),
            tax_rate: self.tax_rate.unwrap_or(0.0),
            discount: Cents::new(self.discount.unwrap_or(0)),
            due_date: optional_datetime(self.due_date, "dueDate")?,
            progress_billing_mode: None,
            progress_billing_percent: None,
            notes: self.notes.as_deref().and_then(sanitize_text),
            line_items: into_lines(self.line_items.unwrap_or_default())?,
        })
    }

    /// Omitted header fields keep their current value.
    pub fn into_update(self, current: &Invoice) -> Result<UpdateInvoice, FormError> {
        self.validate()?;
        Ok(UpdateInvoice {
            title: self.title.trim().to_string(),
            status: self.status.unwrap_or(current.status),
            job_id: optional_id(self.job_id, "jobId")?.or(current.job_id),
            tax_rate: self.tax_rate.unwrap_or(current.tax_rate),
            discount: self.discount.map(Cents::new).unwrap_or(current.discount),
            due_date: optional_datetime(self.due_date, "dueDate")?.or(current.due_date),
            notes: self.notes.as_deref().and_then(sanitize_text),
            line_items: self.line_items.map(into_lines).transpose()?,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentForm {
    /// Cents.
    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount: i64,
    #[serde(default = "default_method")]
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference: Option<String>,
}

fn default_method() -> PaymentMethod {
    PaymentMethod::Other
}

impl PaymentForm {
    pub fn into_payment(self, invoice: &Invoice) -> Result<NewPayment, FormError> {
        self.validate()?;
        Ok(NewPayment {
            tenant_id: invoice.tenant_id,
            invoice_id: invoice.id,
            amount: Cents::new(self.amount),
            method: self.method,
            status: PaymentStatus::Completed,
            reference: trim_optional(self.reference),
            transaction_id: None,
        })
    }
}
