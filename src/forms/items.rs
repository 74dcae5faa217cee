use std::io::Read;

use actix_multipart::form::{MultipartForm, tempfile::TempFile};
use serde::Deserialize;
use validator::Validate;

use crate::domain::item::{DEFAULT_UNIT, ItemData, ItemKind, NewItem};
use crate::domain::types::{Cents, ItemName, TenantId, sanitize_text, trim_optional};
use crate::forms::FormError;
use crate::pagination::PageRequest;

/// Column order of the item CSV export and import.
pub const ITEM_CSV_HEADERS: [&str; 9] = [
    "Name",
    "SKU",
    "Type",
    "Description",
    "Unit",
    "Unit Cost",
    "Unit Price",
    "Taxable",
    "Active",
];

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ItemForm {
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<ItemKind>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    /// Cents.
    #[validate(range(min = 0, message = "Unit price cannot be negative"))]
    pub unit_price: i64,
    #[serde(default)]
    #[validate(range(min = 0, message = "Unit cost cannot be negative"))]
    pub unit_cost: Option<i64>,
    #[serde(default)]
    pub taxable: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl TryFrom<ItemForm> for ItemData {
    type Error = FormError;

    fn try_from(form: ItemForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(ItemData {
            name: ItemName::new(form.name).map_err(|_| FormError::Missing("Name"))?,
            sku: trim_optional(form.sku),
            kind: form.kind.unwrap_or(ItemKind::Product),
            description: form.description.as_deref().and_then(sanitize_text),
            unit: trim_optional(form.unit).unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            unit_price: Cents::new(form.unit_price),
            unit_cost: form.unit_cost.map(Cents::new),
            taxable: form.taxable.unwrap_or(true),
            is_active: form.is_active.unwrap_or(true),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
    pub active: Option<bool>,
}

impl ItemListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Multipart upload carrying an item CSV in the `csv` field.
#[derive(MultipartForm)]
pub struct UploadItemsForm {
    #[multipart(limit = "10MB")]
    pub csv: TempFile,
}

/// Rows read from an item CSV.
#[derive(Debug, Default)]
pub struct ParsedItems {
    pub items: Vec<NewItem>,
    /// Rows without a name or with an unknown type.
    pub skipped: usize,
}

fn yes_no(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if v == "yes" || v == "true" || v == "1" => true,
        Some(v) if v == "no" || v == "false" || v == "0" => false,
        _ => default,
    }
}

fn decimal(value: Option<&str>, field: &'static str) -> Result<Option<Cents>, FormError> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<f64>()
        .map(|amount| Some(Cents::from_decimal(amount)))
        .map_err(|e| FormError::InvalidValue {
            field,
            reason: e.to_string(),
        })
}

/// Reads items from CSV using the export headers. Columns are located by
/// header name so extra or reordered columns are tolerated.
pub fn parse_items_csv<R: Read>(reader: R, tenant_id: TenantId) -> Result<ParsedItems, FormError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| FormError::Csv(e.to_string()))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let name_col = column("Name").ok_or(FormError::Missing("Name column"))?;
    let sku_col = column("SKU");
    let type_col = column("Type");
    let description_col = column("Description");
    let unit_col = column("Unit");
    let cost_col = column("Unit Cost");
    let price_col = column("Unit Price");
    let taxable_col = column("Taxable");
    let active_col = column("Active");

    let mut parsed = ParsedItems::default();
    for record in reader.records() {
        let record = record.map_err(|e| FormError::Csv(e.to_string()))?;
        let field = |col: Option<usize>| {
            col.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let Some(name) = field(Some(name_col)).and_then(|n| ItemName::new(n).ok()) else {
            parsed.skipped += 1;
            continue;
        };
        let kind = match field(type_col) {
            None => ItemKind::Product,
            Some(code) => match code.to_ascii_uppercase().parse::<ItemKind>() {
                Ok(kind) => kind,
                Err(err) => {
                    log::warn!("Skipping item row `{name}`: {err}");
                    parsed.skipped += 1;
                    continue;
                }
            },
        };

        parsed.items.push(NewItem {
            tenant_id,
            data: ItemData {
                name,
                sku: field(sku_col).map(str::to_string),
                kind,
                description: field(description_col).and_then(sanitize_text),
                unit: field(unit_col).unwrap_or(DEFAULT_UNIT).to_string(),
                unit_price: decimal(field(price_col), "Unit Price")?.unwrap_or(Cents::ZERO),
                unit_cost: decimal(field(cost_col), "Unit Cost")?,
                taxable: yes_no(field(taxable_col), false),
                is_active: yes_no(field(active_col), true),
            },
        });
    }

    Ok(parsed)
}
