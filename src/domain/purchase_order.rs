use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::document::{DocumentLines, NewLineItem};
use crate::domain::types::{Cents, JobId, PurchaseOrderId, TenantId, VendorName, string_enum};

string_enum!(
    PurchaseOrderStatus {
        Draft => "DRAFT",
        Sent => "SENT",
        Approved => "APPROVED",
        Received => "RECEIVED",
        Cancelled => "CANCELLED",
    }
);

impl PurchaseOrderStatus {
    /// Whether the order may still move to `APPROVED`.
    pub fn can_approve(self) -> bool {
        !matches!(
            self,
            PurchaseOrderStatus::Approved
                | PurchaseOrderStatus::Received
                | PurchaseOrderStatus::Cancelled
        )
    }

    /// Whether goods may still be received against the order.
    pub fn can_receive(self) -> bool {
        !matches!(
            self,
            PurchaseOrderStatus::Received | PurchaseOrderStatus::Cancelled
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: PurchaseOrderId,
    pub tenant_id: TenantId,
    pub job_id: Option<JobId>,
    pub po_number: String,
    pub vendor: VendorName,
    pub status: PurchaseOrderStatus,
    pub subtotal: Cents,
    pub tax_rate: f64,
    pub tax: Cents,
    pub discount: Cents,
    pub total: Cents,
    pub notes: Option<String>,
    pub received_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub purchase_order: PurchaseOrder,
    #[serde(flatten)]
    pub lines: DocumentLines,
}

#[derive(Clone, Debug)]
pub struct NewPurchaseOrder {
    pub tenant_id: TenantId,
    pub job_id: Option<JobId>,
    /// Caller supplied number; generated when absent.
    pub po_number: Option<String>,
    pub vendor: VendorName,
    pub status: PurchaseOrderStatus,
    pub tax_rate: f64,
    pub discount: Cents,
    pub notes: Option<String>,
    pub line_items: Vec<NewLineItem>,
}

#[derive(Clone, Debug)]
pub struct UpdatePurchaseOrder {
    pub job_id: Option<JobId>,
    pub vendor: VendorName,
    pub status: PurchaseOrderStatus,
    pub tax_rate: f64,
    pub discount: Cents,
    pub notes: Option<String>,
    /// Replaces every line when present.
    pub line_items: Option<Vec<NewLineItem>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_is_blocked_once_settled() {
        assert!(PurchaseOrderStatus::Draft.can_approve());
        assert!(PurchaseOrderStatus::Sent.can_approve());
        assert!(!PurchaseOrderStatus::Approved.can_approve());
        assert!(!PurchaseOrderStatus::Received.can_approve());
        assert!(!PurchaseOrderStatus::Cancelled.can_approve());
    }

    #[test]
    fn receiving_is_blocked_once_closed() {
        assert!(PurchaseOrderStatus::Approved.can_receive());
        assert!(!PurchaseOrderStatus::Received.can_receive());
        assert!(!PurchaseOrderStatus::Cancelled.can_receive());
    }
}
