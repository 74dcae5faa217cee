//! Line items, line groups and totals shared by estimates, invoices and
//! purchase orders.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::bundle::FlatLine;
use crate::domain::types::{
    BundleId, Cents, ItemId, LineGroupId, LineItemId, TenantId, string_enum,
};

string_enum!(
    /// Parent document a line belongs to.
    DocumentKind {
        Estimate => "ESTIMATE",
        Invoice => "INVOICE",
        PurchaseOrder => "PURCHASE_ORDER",
    }
);

impl DocumentKind {
    pub const fn number_prefix(self) -> &'static str {
        match self {
            DocumentKind::Estimate => "EST",
            DocumentKind::Invoice => "INV",
            DocumentKind::PurchaseOrder => "PO",
        }
    }
}

/// Zero padding width of sequential document numbers.
pub const NUMBER_WIDTH: usize = 6;

/// Formats a sequential document number, e.g. `EST-000042`.
pub fn format_number(prefix: &str, sequence: i64) -> String {
    format!("{prefix}-{sequence:0width$}", width = NUMBER_WIDTH)
}

/// Total of a single line: quantity times unit price, rounded to the cent.
pub fn line_total(quantity: f64, unit_price: Cents) -> Cents {
    unit_price.scale(quantity)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    pub group_id: Option<LineGroupId>,
    pub source_item_id: Option<ItemId>,
    pub description: String,
    pub quantity: f64,
    pub unit_price: Cents,
    pub unit_cost: Option<Cents>,
    pub total: Cents,
    pub taxable: bool,
    pub is_visible_to_client: bool,
    pub sort_order: i32,
}

/// Line values before they are attached to a document.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLineItem {
    pub group_id: Option<LineGroupId>,
    pub source_item_id: Option<ItemId>,
    pub description: String,
    pub quantity: f64,
    pub unit_price: Cents,
    pub unit_cost: Option<Cents>,
    pub taxable: bool,
    pub is_visible_to_client: bool,
    pub sort_order: i32,
}

impl NewLineItem {
    pub fn total(&self) -> Cents {
        line_total(self.quantity, self.unit_price)
    }

    /// Line copied from an existing one, keeping values but not identity.
    pub fn copy_of(line: &LineItem) -> Self {
        Self {
            group_id: None,
            source_item_id: line.source_item_id,
            description: line.description.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            unit_cost: line.unit_cost,
            taxable: line.taxable,
            is_visible_to_client: line.is_visible_to_client,
            sort_order: line.sort_order,
        }
    }

    /// Line produced from an expanded bundle entry.
    pub fn from_flat_line(line: &FlatLine, sort_order: i32) -> Self {
        Self {
            group_id: None,
            source_item_id: Some(line.item_id),
            description: line
                .description
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| line.name.clone()),
            quantity: line.quantity,
            unit_price: line.unit_price,
            unit_cost: line.unit_cost,
            taxable: line.taxable,
            is_visible_to_client: true,
            sort_order,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineGroup {
    pub id: LineGroupId,
    pub tenant_id: TenantId,
    pub document_type: DocumentKind,
    pub document_id: i32,
    pub name: String,
    pub source_bundle_id: Option<BundleId>,
    pub source_bundle_name: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct NewLineGroup {
    pub name: String,
    pub source_bundle_id: Option<BundleId>,
    pub source_bundle_name: Option<String>,
}

/// Highest sort order a caller may assign to a line.
pub const MAX_SORT_ORDER: i32 = 1_000_000;

/// Lines and groups of a document.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLines {
    pub line_items: Vec<LineItem>,
    pub groups: Vec<LineGroup>,
}

impl DocumentLines {
    /// Only the lines a client is allowed to see.
    pub fn visible_to_client(self) -> Self {
        Self {
            line_items: self
                .line_items
                .into_iter()
                .filter(|line| line.is_visible_to_client)
                .collect(),
            groups: self.groups,
        }
    }

    /// Sort order placing a new line after every existing one.
    pub fn next_sort_order(&self) -> i32 {
        self.line_items
            .iter()
            .map(|line| line.sort_order.saturating_add(1))
            .max()
            .unwrap_or(0)
    }
}

/// Header values stored on a document after recalculation.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Cents,
    pub tax: Cents,
    pub total: Cents,
}

/// Computes document totals from line totals.
///
/// The flat discount applies before tax and never pushes the taxable base
/// below zero.
pub fn compute_totals<I>(line_totals: I, discount: Cents, tax_rate: f64) -> Totals
where
    I: IntoIterator<Item = Cents>,
{
    let subtotal: Cents = line_totals.into_iter().sum();
    let discounted = Cents::new((subtotal - discount).get().max(0));
    let tax = discounted.scale(tax_rate);
    Totals {
        subtotal,
        tax,
        total: discounted + tax,
    }
}

/// Outstanding amount of a document after payments.
pub fn balance_due(total: Cents, paid: Cents) -> Cents {
    Cents::new((total - paid).get().max(0))
}
