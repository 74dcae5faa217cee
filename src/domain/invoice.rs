use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::document::{DocumentLines, NewLineItem, balance_due};
use crate::domain::estimate::BillingMode;
use crate::domain::types::{
    Cents, ClientId, EstimateId, InvoiceId, JobId, PaymentId, PublicId, TenantId, string_enum,
};

string_enum!(
    InvoiceStatus {
        Draft => "DRAFT",
        Sent => "SENT",
        Partial => "PARTIAL",
        Paid => "PAID",
        Overdue => "OVERDUE",
        Void => "VOID",
    }
);

string_enum!(
    PaymentMethod {
        Card => "CARD",
        Ach => "ACH",
        Check => "CHECK",
        Cash => "CASH",
        Other => "OTHER",
    }
);

string_enum!(
    PaymentStatus {
        Pending => "PENDING",
        Completed => "COMPLETED",
        Failed => "FAILED",
        Refunded => "REFUNDED",
    }
);

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub tenant_id: TenantId,
    pub public_id: PublicId,
    pub client_id: ClientId,
    pub job_id: Option<JobId>,
    pub estimate_id: Option<EstimateId>,
    pub invoice_number: String,
    pub title: String,
    pub status: InvoiceStatus,
    pub subtotal: Cents,
    pub tax_rate: f64,
    pub tax: Cents,
    pub discount: Cents,
    pub total: Cents,
    pub paid: Cents,
    pub balance: Cents,
    pub due_date: Option<NaiveDateTime>,
    pub paid_at: Option<NaiveDateTime>,
    pub progress_billing_mode: Option<BillingMode>,
    pub progress_billing_percent: Option<f64>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Result of applying a payment to an invoice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaymentApplication {
    pub paid: Cents,
    pub balance: Cents,
    pub status: InvoiceStatus,
    pub paid_at: Option<NaiveDateTime>,
}

impl Invoice {
    /// Paid and void invoices no longer accept line or header changes.
    pub fn is_locked(&self) -> bool {
        matches!(self.status, InvoiceStatus::Paid | InvoiceStatus::Void)
    }

    /// A sent invoice still owing money after its due date.
    pub fn is_past_due(&self, now: NaiveDateTime) -> bool {
        matches!(self.status, InvoiceStatus::Sent | InvoiceStatus::Partial)
            && self.balance > Cents::ZERO
            && self.due_date.is_some_and(|due| due < now)
    }

    /// Applies `amount` to the invoice.
    ///
    /// The balance never drops below zero; a settled invoice becomes `PAID`
    /// and is stamped with `now`, a partially settled one `PARTIAL`.
    pub fn apply_payment(&self, amount: Cents, now: NaiveDateTime) -> PaymentApplication {
        let paid = self.paid + amount;
        let balance = balance_due(self.total, paid);
        if balance == Cents::ZERO {
            PaymentApplication {
                paid,
                balance,
                status: InvoiceStatus::Paid,
                paid_at: Some(self.paid_at.unwrap_or(now)),
            }
        } else if paid > Cents::ZERO {
            PaymentApplication {
                paid,
                balance,
                status: InvoiceStatus::Partial,
                paid_at: self.paid_at,
            }
        } else {
            PaymentApplication {
                paid,
                balance,
                status: self.status,
                paid_at: self.paid_at,
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    #[serde(flatten)]
    pub lines: DocumentLines,
    pub payments: Vec<Payment>,
}

#[derive(Clone, Debug)]
pub struct NewInvoice {
    pub tenant_id: TenantId,
    pub client_id: ClientId,
    pub job_id: Option<JobId>,
    pub estimate_id: Option<EstimateId>,
    pub title: String,
    pub status: InvoiceStatus,
    pub tax_rate: f64,
    pub discount: Cents,
    pub due_date: Option<NaiveDateTime>,
    pub progress_billing_mode: Option<BillingMode>,
    pub progress_billing_percent: Option<f64>,
    pub notes: Option<String>,
    pub line_items: Vec<NewLineItem>,
}

#[derive(Clone, Debug)]
pub struct UpdateInvoice {
    pub title: String,
    pub status: InvoiceStatus,
    pub job_id: Option<JobId>,
    pub tax_rate: f64,
    pub discount: Cents,
    pub due_date: Option<NaiveDateTime>,
    pub notes: Option<String>,
    /// Replaces every line when present.
    pub line_items: Option<Vec<NewLineItem>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub tenant_id: TenantId,
    pub invoice_id: InvoiceId,
    pub amount: Cents,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub reference: Option<String>,
    pub transaction_id: Option<String>,
    pub processed_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct NewPayment {
    pub tenant_id: TenantId,
    pub invoice_id: InvoiceId,
    pub amount: Cents,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub reference: Option<String>,
    pub transaction_id: Option<String>,
}

/// Client facing view of an invoice reached through its public id.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicInvoice {
    pub invoice_number: String,
    pub title: String,
    pub status: InvoiceStatus,
    pub client_name: String,
    pub subtotal: Cents,
    pub tax: Cents,
    pub discount: Cents,
    pub total: Cents,
    pub paid: Cents,
    pub balance: Cents,
    pub due_date: Option<NaiveDateTime>,
    #[serde(flatten)]
    pub lines: DocumentLines,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn invoice(total: i64, paid: i64) -> Invoice {
        let now = Utc::now().naive_utc();
        Invoice {
            id: InvoiceId::new(1).unwrap(),
            tenant_id: TenantId::new(1).unwrap(),
            public_id: PublicId::new(),
            client_id: ClientId::new(1).unwrap(),
            job_id: None,
            estimate_id: None,
            invoice_number: "INV-000001".into(),
            title: "Trim".into(),
            status: InvoiceStatus::Sent,
            subtotal: Cents::new(total),
            tax_rate: 0.0,
            tax: Cents::ZERO,
            discount: Cents::ZERO,
            total: Cents::new(total),
            paid: Cents::new(paid),
            balance: balance_due(Cents::new(total), Cents::new(paid)),
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
    fn partial_payment_marks_partial() {
        let now = Utc::now().naive_utc();
        let applied = invoice(10_000, 0).apply_payment(Cents::new(2_500), now);
        assert_eq!(applied.paid, Cents::new(2_500));
        assert_eq!(applied.balance, Cents::new(7_500));
        assert_eq!(applied.status, InvoiceStatus::Partial);
        assert_eq!(applied.paid_at, None);
    }

    #[test]
    fn settling_payment_marks_paid() {
        let now = Utc::now().naive_utc();
        let applied = invoice(10_000, 2_500).apply_payment(Cents::new(7_500), now);
        assert_eq!(applied.balance, Cents::ZERO);
        assert_eq!(applied.status, InvoiceStatus::Paid);
        assert_eq!(applied.paid_at, Some(now));
    }

    #[test]
    fn overpayment_clamps_balance() {
        let now = Utc::now().naive_utc();
        let mut paid = invoice(10_000, 10_000);
        paid.paid_at = Some(now - Duration::days(3));
        let applied = paid.apply_payment(Cents::new(500), now);
        assert_eq!(applied.paid, Cents::new(10_500));
        assert_eq!(applied.balance, Cents::ZERO);
        assert_eq!(applied.paid_at, paid.paid_at);
    }

    #[test]
    fn paid_and_void_invoices_are_locked() {
        let mut closed = invoice(10_000, 10_000);
        closed.status = InvoiceStatus::Paid;
        assert!(closed.is_locked());
        closed.status = InvoiceStatus::Void;
        assert!(closed.is_locked());
        assert!(!invoice(10_000, 0).is_locked());
    }

    #[test]
    fn past_due_needs_open_balance_and_sent_status() {
        let now = Utc::now().naive_utc();
        let mut open = invoice(10_000, 4_000);
        open.due_date = Some(now - Duration::days(1));
        assert!(open.is_past_due(now));

        let mut settled = invoice(10_000, 10_000);
        settled.due_date = open.due_date;
        assert!(!settled.is_past_due(now));

        let mut draft = open.clone();
        draft.status = InvoiceStatus::Draft;
        assert!(!draft.is_past_due(now));

        open.due_date = Some(now + Duration::days(1));
        assert!(!open.is_past_due(now));
    }
}
