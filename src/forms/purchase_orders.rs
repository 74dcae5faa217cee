use serde::Deserialize;
use validator::Validate;

use crate::domain::purchase_order::{
    NewPurchaseOrder, PurchaseOrder, PurchaseOrderStatus, UpdatePurchaseOrder,
};
use crate::domain::types::{Cents, TenantId, VendorName, sanitize_text, trim_optional};
use crate::forms::documents::{LineItemForm, into_lines};
use crate::forms::{FormError, optional_id};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderForm {
    #[serde(default)]
    pub job_id: Option<i32>,
    #[serde(default)]
    pub po_number: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub status: Option<PurchaseOrderStatus>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0, message = "Tax rate must be between 0 and 1"))]
    pub tax_rate: Option<f64>,
    /// Cents.
    #[serde(default)]
    #[validate(range(min = 0, message = "Discount cannot be negative"))]
    pub discount: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub line_items: Option<Vec<LineItemForm>>,
}

impl PurchaseOrderForm {
    fn vendor(&self) -> Result<VendorName, FormError> {
        VendorName::new(self.vendor.clone().unwrap_or_default())
            .map_err(|_| FormError::Missing("Vendor"))
    }

    pub fn into_new_purchase_order(self, tenant_id: TenantId) -> Result<NewPurchaseOrder, FormError> {
        self.validate()?;
        Ok(NewPurchaseOrder {
            tenant_id,
            vendor: self.vendor()?,
            job_id: optional_id(self.job_id, "jobId")?,
            po_number: trim_optional(self.po_number),
            status: self.status.unwrap_or(PurchaseOrderStatus::Draft),
            tax_rate: self.tax_rate.unwrap_or(0.0),
            discount: Cents::new(self.discount.unwrap_or(0)),
            notes: self.notes.as_deref().and_then(sanitize_text),
            line_items: into_lines(self.line_items.unwrap_or_default())?,
        })
    }

    pub fn into_update(self, current: &PurchaseOrder) -> Result<UpdatePurchaseOrder, FormError> {
        self.validate()?;
        let vendor = if self.vendor.is_some() {
            self.vendor()?
        } else {
            current.vendor.clone()
        };
        Ok(UpdatePurchaseOrder {
            job_id: optional_id(self.job_id, "jobId")?.or(current.job_id),
            vendor,
            status: self.status.unwrap_or(current.status),
            tax_rate: self.tax_rate.unwrap_or(current.tax_rate),
            discount: self.discount.map(Cents::new).unwrap_or(current.discount),
            notes: self.notes.as_deref().and_then(sanitize_text),
            line_items: self.line_items.map(into_lines).transpose()?,
        })
    }
}
