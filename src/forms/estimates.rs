use serde::Deserialize;
use validator::Validate;

use crate::domain::estimate::{
    BillingMode, Estimate, EstimateStatus, NewEstimate, UpdateEstimate,
};
use crate::domain::types::{
    Cents, ClientId, LeadId, LineItemId, TenantId, UserId, sanitize_text,
};
use crate::forms::documents::{LineItemForm, into_lines};
use crate::forms::{FormError, optional_id};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EstimateForm {
    #[serde(default)]
    pub client_id: Option<i32>,
    #[serde(default)]
    pub lead_id: Option<i32>,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    pub status: Option<EstimateStatus>,
    /// Fraction, e.g. `0.0825`.
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

impl EstimateForm {
    pub fn into_new_estimate(
        self,
        tenant_id: TenantId,
        created_by: UserId,
    ) -> Result<NewEstimate, FormError> {
        self.validate()?;
        let client_id = optional_id::<ClientId>(self.client_id, "clientId")?;
        let lead_id = optional_id::<LeadId>(self.lead_id, "leadId")?;
        if client_id.is_none() && lead_id.is_none() {
            return Err(FormError::Missing("Client or lead"));
        }
        let line_items = into_lines(self.line_items.unwrap_or_default())?;
        if line_items.is_empty() {
            return Err(FormError::Missing("At least one line item"));
        }

        Ok(NewEstimate {
            tenant_id,
            client_id,
            lead_id,
            title: self.title.trim().to_string(),
            status: self.status.unwrap_or(EstimateStatus::Draft),
            tax_rate: self.tax_rate.unwrap_or(0.0),
            discount: Cents::new(self.discount.unwrap_or(0)),
            notes: self.notes.as_deref().and_then(sanitize_text),
            created_by_id: Some(created_by),
            line_items,
        })
    }

    /// Header update; omitted fields keep their current value and lines are
    /// only replaced when `lineItems` is present.
    pub fn into_update(self, current: &Estimate) -> Result<UpdateEstimate, FormError> {
        self.validate()?;
        Ok(UpdateEstimate {
            client_id: optional_id(self.client_id, "clientId")?.or(current.client_id),
            title: self.title.trim().to_string(),
            status: self.status.unwrap_or(current.status),
            tax_rate: self.tax_rate.unwrap_or(current.tax_rate),
            discount: self.discount.map(Cents::new).unwrap_or(current.discount),
            notes: self.notes.as_deref().and_then(sanitize_text),
            line_items: self.line_items.map(into_lines).transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertToInvoiceForm {
    #[serde(default = "default_billing_mode")]
    pub billing_mode: BillingMode,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub selected_line_item_ids: Vec<i32>,
}

fn default_billing_mode() -> BillingMode {
    BillingMode::Full
}

/// An empty body bills the whole estimate.
impl Default for ConvertToInvoiceForm {
    fn default() -> Self {
        Self {
            billing_mode: default_billing_mode(),
            percentage: None,
            selected_line_item_ids: Vec::new(),
        }
    }
}

impl ConvertToInvoiceForm {
    pub fn selected_ids(&self) -> Result<Vec<LineItemId>, FormError> {
        self.selected_line_item_ids
            .iter()
            .map(|id| LineItemId::new(*id).map_err(FormError::invalid("selectedLineItemIds")))
            .collect()
    }
}
