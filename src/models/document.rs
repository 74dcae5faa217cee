//! Line items and line groups shared by every priced document.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::{
    document::{DocumentKind, LineGroup as DomainLineGroup, LineItem as DomainLineItem, NewLineItem},
    types::{Cents, LineGroupId, LineItemId, TenantId, TypeConstraintError},
};
use crate::models::opt_id;

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::line_items)]
pub struct LineItem {
    pub id: i32,
    pub document_type: String,
    pub document_id: i32,
    pub group_id: Option<i32>,
    pub source_item_id: Option<i32>,
    pub description: String,
    pub quantity: f64,
    pub unit_price_cents: i64,
    pub unit_cost_cents: Option<i64>,
    pub total_cents: i64,
    pub taxable: bool,
    pub is_visible_to_client: bool,
    pub sort_order: i32,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::line_items)]
pub struct NewLineItemRow<'a> {
    pub document_type: &'a str,
    pub document_id: i32,
    pub group_id: Option<i32>,
    pub source_item_id: Option<i32>,
    pub description: &'a str,
    pub quantity: f64,
    pub unit_price_cents: i64,
    pub unit_cost_cents: Option<i64>,
    pub total_cents: i64,
    pub taxable: bool,
    pub is_visible_to_client: bool,
    pub sort_order: i32,
}

impl<'a> NewLineItemRow<'a> {
    /// Row for `line` attached to the given document; the total is derived.
    pub fn new(kind: DocumentKind, document_id: i32, line: &'a NewLineItem) -> Self {
        Self {
            document_type: kind.as_str(),
            document_id,
            group_id: line.group_id.map(|id| id.get()),
            source_item_id: line.source_item_id.map(|id| id.get()),
            description: line.description.as_str(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.get(),
            unit_cost_cents: line.unit_cost.map(Cents::get),
            total_cents: line.total().get(),
            taxable: line.taxable,
            is_visible_to_client: line.is_visible_to_client,
            sort_order: line.sort_order,
        }
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::line_items)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateLineItem<'a> {
    pub group_id: Option<i32>,
    pub source_item_id: Option<i32>,
    pub description: &'a str,
    pub quantity: f64,
    pub unit_price_cents: i64,
    pub unit_cost_cents: Option<i64>,
    pub total_cents: i64,
    pub taxable: bool,
    pub is_visible_to_client: bool,
    pub sort_order: i32,
}

impl<'a> From<&'a NewLineItem> for UpdateLineItem<'a> {
    fn from(line: &'a NewLineItem) -> Self {
        Self {
            group_id: line.group_id.map(|id| id.get()),
            source_item_id: line.source_item_id.map(|id| id.get()),
            description: line.description.as_str(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.get(),
            unit_cost_cents: line.unit_cost.map(Cents::get),
            total_cents: line.total().get(),
            taxable: line.taxable,
            is_visible_to_client: line.is_visible_to_client,
            sort_order: line.sort_order,
        }
    }
}

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::line_groups)]
pub struct LineGroup {
    pub id: i32,
    pub tenant_id: i32,
    pub document_type: String,
    pub document_id: i32,
    pub name: String,
    pub source_bundle_id: Option<i32>,
    pub source_bundle_name: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::line_groups)]
pub struct NewLineGroupRow<'a> {
    pub tenant_id: i32,
    pub document_type: &'a str,
    pub document_id: i32,
    pub name: &'a str,
    pub source_bundle_id: Option<i32>,
    pub source_bundle_name: Option<&'a str>,
}

impl TryFrom<LineItem> for DomainLineItem {
    type Error = TypeConstraintError;

    fn try_from(line: LineItem) -> Result<Self, Self::Error> {
        Ok(Self {
            id: LineItemId::new(line.id)?,
            group_id: opt_id(line.group_id)?,
            source_item_id: opt_id(line.source_item_id)?,
            description: line.description,
            quantity: line.quantity,
            unit_price: Cents::new(line.unit_price_cents),
            unit_cost: line.unit_cost_cents.map(Cents::new),
            total: Cents::new(line.total_cents),
            taxable: line.taxable,
            is_visible_to_client: line.is_visible_to_client,
            sort_order: line.sort_order,
        })
    }
}

impl TryFrom<LineGroup> for DomainLineGroup {
    type Error = TypeConstraintError;

    fn try_from(group: LineGroup) -> Result<Self, Self::Error> {
        Ok(Self {
            id: LineGroupId::new(group.id)?,
            tenant_id: TenantId::new(group.tenant_id)?,
            document_type: group.document_type.parse()?,
            document_id: group.document_id,
            name: group.name,
            source_bundle_id: opt_id(group.source_bundle_id)?,
            source_bundle_name: group.source_bundle_name,
            created_at: group.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_row_derives_total() {
        let line = NewLineItem {
            group_id: None,
            source_item_id: None,
            description: "Crown molding".into(),
            quantity: 2.5,
            unit_price: Cents::new(400),
            unit_cost: None,
            taxable: true,
            is_visible_to_client: true,
            sort_order: 3,
        };
        let row = NewLineItemRow::new(DocumentKind::Invoice, 12, &line);
        assert_eq!(row.document_type, "INVOICE");
        assert_eq!(row.document_id, 12);
        assert_eq!(row.total_cents, 1000);
    }
}
