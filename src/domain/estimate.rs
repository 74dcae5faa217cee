use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::document::{DocumentLines, LineItem, NewLineItem};
use crate::domain::types::{
    Cents, ClientId, EstimateId, JobId, LeadId, LineItemId, TenantId, UserId, string_enum,
};

string_enum!(
    EstimateStatus {
        Draft => "DRAFT",
        Sent => "SENT",
        Approved => "APPROVED",
        Rejected => "REJECTED",
        Converted => "CONVERTED",
        Invoiced => "INVOICED",
    }
);

string_enum!(
    /// How much of an estimate an invoice bills.
    BillingMode {
        Full => "FULL",
        Percentage => "PERCENTAGE",
        Manual => "MANUAL",
    }
);

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub id: EstimateId,
    pub tenant_id: TenantId,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    pub job_id: Option<JobId>,
    pub estimate_number: String,
    pub title: String,
    pub status: EstimateStatus,
    pub subtotal: Cents,
    pub tax_rate: f64,
    pub tax: Cents,
    pub discount: Cents,
    pub total: Cents,
    pub notes: Option<String>,
    pub created_by_id: Option<UserId>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EstimateDetail {
    #[serde(flatten)]
    pub estimate: Estimate,
    #[serde(flatten)]
    pub lines: DocumentLines,
}

#[derive(Clone, Debug)]
pub struct NewEstimate {
    pub tenant_id: TenantId,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    pub title: String,
    pub status: EstimateStatus,
    pub tax_rate: f64,
    pub discount: Cents,
    pub notes: Option<String>,
    pub created_by_id: Option<UserId>,
    pub line_items: Vec<NewLineItem>,
}

#[derive(Clone, Debug)]
pub struct UpdateEstimate {
    pub client_id: Option<ClientId>,
    pub title: String,
    pub status: EstimateStatus,
    pub tax_rate: f64,
    pub discount: Cents,
    pub notes: Option<String>,
    /// Replaces every line when present.
    pub line_items: Option<Vec<NewLineItem>>,
}

#[derive(Debug, Error, PartialEq)]
pub enum BillingError {
    #[error("Percentage must be between 0 and 100.")]
    InvalidPercentage,
    #[error("No line items selected to bill.")]
    NothingToBill,
}

/// Invoice contents derived from an estimate.
#[derive(Clone, Debug, PartialEq)]
pub struct BillingPlan {
    pub mode: BillingMode,
    pub title: String,
    pub percent: Option<f64>,
    pub line_items: Vec<NewLineItem>,
}

/// Builds the invoice lines for billing `estimate` in the requested mode.
///
/// `Full` copies every line, `Manual` only the selected ones and `Percentage`
/// bills one line worth `percent` of the estimate total.
pub fn plan_billing(
    estimate: &Estimate,
    lines: &[LineItem],
    mode: BillingMode,
    percent: Option<f64>,
    selected: &[LineItemId],
) -> Result<BillingPlan, BillingError> {
    match mode {
        BillingMode::Percentage => {
            let percent = percent.unwrap_or(0.0);
            if !percent.is_finite() || percent <= 0.0 || percent > 100.0 {
                return Err(BillingError::InvalidPercentage);
            }
            let amount = Cents::new(estimate.total.scale(percent / 100.0).get().max(0));
            Ok(BillingPlan {
                mode,
                title: format!("{} - {percent:.2}% Billing", estimate.title),
                percent: Some(percent),
                line_items: vec![NewLineItem {
                    group_id: None,
                    source_item_id: None,
                    description: format!(
                        "Progress Billing ({percent:.2}%) - Estimate {}",
                        estimate.estimate_number
                    ),
                    quantity: 1.0,
                    unit_price: amount,
                    unit_cost: None,
                    taxable: false,
                    is_visible_to_client: true,
                    sort_order: 0,
                }],
            })
        }
        BillingMode::Full | BillingMode::Manual => {
            let source: Vec<&LineItem> = match mode {
                BillingMode::Manual => lines
                    .iter()
                    .filter(|line| selected.contains(&line.id))
                    .collect(),
                _ => lines.iter().collect(),
            };
            if source.is_empty() {
                return Err(BillingError::NothingToBill);
            }
            let line_items = source
                .into_iter()
                .enumerate()
                .map(|(index, line)| NewLineItem {
                    sort_order: index as i32,
                    ..NewLineItem::copy_of(line)
                })
                .collect();
            let suffix = if mode == BillingMode::Full {
                "Full Billing"
            } else {
                "Partial Billing"
            };
            Ok(BillingPlan {
                mode,
                title: format!("{} - {suffix}", estimate.title),
                percent: None,
                line_items,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn estimate() -> Estimate {
        let now = Utc::now().naive_utc();
        Estimate {
            id: EstimateId::new(1).unwrap(),
            tenant_id: TenantId::new(1).unwrap(),
            client_id: Some(ClientId::new(2).unwrap()),
            lead_id: None,
            job_id: None,
            estimate_number: "EST-000007".into(),
            title: "Kitchen trim".into(),
            status: EstimateStatus::Approved,
            subtotal: Cents::new(100_000),
            tax_rate: 0.08,
            tax: Cents::new(8_000),
            discount: Cents::ZERO,
            total: Cents::new(108_000),
            notes: None,
            created_by_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(id: i32, total: i64, sort_order: i32) -> LineItem {
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
            sort_order,
        }
    }

    #[test]
    fn full_billing_copies_every_line() {
        let lines = vec![line(1, 60_000, 0), line(2, 40_000, 1)];

        let plan = plan_billing(&estimate(), &lines, BillingMode::Full, None, &[]).unwrap();

        assert_eq!(plan.title, "Kitchen trim - Full Billing");
        assert_eq!(plan.line_items.len(), 2);
        assert_eq!(plan.percent, None);
    }

    #[test]
    fn manual_billing_uses_selection_and_resequences() {
        let lines = vec![line(1, 60_000, 0), line(2, 40_000, 1), line(3, 5_000, 2)];
        let selected = [LineItemId::new(3).unwrap()];

        let plan =
            plan_billing(&estimate(), &lines, BillingMode::Manual, None, &selected).unwrap();

        assert_eq!(plan.line_items.len(), 1);
        assert_eq!(plan.line_items[0].description, "Line 3");
        assert_eq!(plan.line_items[0].sort_order, 0);
    }

    #[test]
    fn manual_billing_without_selection_fails() {
        let lines = vec![line(1, 60_000, 0)];
        assert_eq!(
            plan_billing(&estimate(), &lines, BillingMode::Manual, None, &[]),
            Err(BillingError::NothingToBill)
        );
        assert_eq!(
            plan_billing(&estimate(), &[], BillingMode::Full, None, &[]),
            Err(BillingError::NothingToBill)
        );
    }

    #[test]
    fn percentage_billing_bills_share_of_total() {
        let plan =
            plan_billing(&estimate(), &[], BillingMode::Percentage, Some(25.0), &[]).unwrap();

        assert_eq!(plan.percent, Some(25.0));
        assert_eq!(plan.title, "Kitchen trim - 25.00% Billing");
        let line = &plan.line_items[0];
        assert_eq!(line.description, "Progress Billing (25.00%) - Estimate EST-000007");
        assert_eq!(line.unit_price, Cents::new(27_000));
        assert_eq!(line.total(), Cents::new(27_000));
        assert!(!line.taxable);
    }

    #[test]
    fn percentage_must_be_in_range() {
        for percent in [None, Some(0.0), Some(-5.0), Some(100.5)] {
            assert_eq!(
                plan_billing(&estimate(), &[], BillingMode::Percentage, percent, &[]),
                Err(BillingError::InvalidPercentage)
            );
        }
        assert!(plan_billing(&estimate(), &[], BillingMode::Percentage, Some(100.0), &[]).is_ok());
    }
}
