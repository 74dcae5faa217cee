use serde::Deserialize;
use validator::Validate;

use crate::domain::document::{MAX_SORT_ORDER, NewLineItem};
use crate::domain::types::Cents;
use crate::forms::{FormError, optional_id};
use crate::pagination::PageRequest;

/// Line item as submitted on documents.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineItemForm {
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    /// Cents.
    pub unit_price: i64,
    #[serde(default)]
    pub unit_cost: Option<i64>,
    #[serde(default = "default_true")]
    pub taxable: bool,
    #[serde(default = "default_true")]
    pub is_visible_to_client: bool,
    #[serde(default)]
    #[validate(range(min = 0, max = 1000000, message = "Sort order must be between 0 and 1000000"))]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub source_item_id: Option<i32>,
    #[serde(default)]
    pub group_id: Option<i32>,
}

fn default_quantity() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl LineItemForm {
    /// `position` orders lines that were sent without a sort order.
    pub fn into_line(self, position: i32) -> Result<NewLineItem, FormError> {
        self.validate()?;
        if !self.quantity.is_finite() {
            return Err(FormError::InvalidValue {
                field: "quantity",
                reason: "must be a number".to_string(),
            });
        }
        let description = self.description.trim().to_string();
        if description.is_empty() {
            return Err(FormError::Missing("Description"));
        }

        Ok(NewLineItem {
            group_id: optional_id(self.group_id, "groupId")?,
            source_item_id: optional_id(self.source_item_id, "sourceItemId")?,
            description,
            quantity: self.quantity,
            unit_price: Cents::new(self.unit_price),
            unit_cost: self.unit_cost.map(Cents::new),
            taxable: self.taxable,
            is_visible_to_client: self.is_visible_to_client,
            sort_order: self.sort_order.unwrap_or(position),
        })
    }
}

/// Converts a submitted line list, keeping submission order as fallback.
pub fn into_lines(forms: Vec<LineItemForm>) -> Result<Vec<NewLineItem>, FormError> {
    forms
        .into_iter()
        .enumerate()
        .map(|(position, form)| {
            form.into_line(i32::try_from(position).unwrap_or(MAX_SORT_ORDER))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBundleForm {
    pub bundle_id: i32,
}

/// Query string shared by the estimate, invoice and purchase order lists.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListParams<S> {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
    pub status: Option<S>,
    pub client_id: Option<i32>,
}

impl<S> Default for DocumentListParams<S> {
    fn default() -> Self {
        Self {
            page: None,
            limit: None,
            search: None,
            status: None,
            client_id: None,
        }
    }
}

impl<S> DocumentListParams<S> {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_defaults_apply() {
        let form: LineItemForm =
            serde_json::from_str(r#"{"description":"Trim","unitPrice":1250}"#).unwrap();

        let line = form.into_line(3).unwrap();

        assert_eq!(line.quantity, 1.0);
        assert_eq!(line.sort_order, 3);
        assert!(line.taxable);
        assert!(line.is_visible_to_client);
        assert_eq!(line.total(), Cents::new(1250));
    }

    #[test]
    fn explicit_sort_order_wins() {
        let forms: Vec<LineItemForm> = serde_json::from_str(
            r#"[{"description":"A","unitPrice":1,"sortOrder":9},{"description":"B","unitPrice":2}]"#,
        )
        .unwrap();

        let lines = into_lines(forms).unwrap();

        assert_eq!(lines[0].sort_order, 9);
        assert_eq!(lines[1].sort_order, 1);
    }

    #[test]
    fn sort_order_is_bounded() {
        let form: LineItemForm = serde_json::from_str(
            r#"{"description":"Trim","unitPrice":1,"sortOrder":2147483647}"#,
        )
        .unwrap();
        assert!(matches!(form.into_line(0), Err(FormError::Validation(_))));

        let form: LineItemForm =
            serde_json::from_str(r#"{"description":"Trim","unitPrice":1,"sortOrder":-1}"#)
                .unwrap();
        assert!(matches!(form.into_line(0), Err(FormError::Validation(_))));
    }

    #[test]
    fn blank_description_is_rejected() {
        let form: LineItemForm =
            serde_json::from_str(r#"{"description":"   ","unitPrice":1}"#).unwrap();
        assert!(matches!(form.into_line(0), Err(FormError::Missing("Description"))));
    }
}
