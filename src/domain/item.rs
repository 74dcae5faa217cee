use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{Cents, ItemId, ItemName, TenantId, string_enum};

string_enum!(
    ItemKind {
        Product => "PRODUCT",
        Service => "SERVICE",
        Material => "MATERIAL",
        Labor => "LABOR",
        Other => "OTHER",
    }
);

pub const DEFAULT_UNIT: &str = "each";

/// Catalog entry that can be priced onto documents directly or via bundles.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub tenant_id: TenantId,
    pub name: ItemName,
    pub sku: Option<String>,
    pub kind: ItemKind,
    pub description: Option<String>,
    pub unit: String,
    pub unit_price: Cents,
    pub unit_cost: Option<Cents>,
    pub taxable: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Values written on create and update alike.
#[derive(Clone, Debug)]
pub struct ItemData {
    pub name: ItemName,
    pub sku: Option<String>,
    pub kind: ItemKind,
    pub description: Option<String>,
    pub unit: String,
    pub unit_price: Cents,
    pub unit_cost: Option<Cents>,
    pub taxable: bool,
    pub is_active: bool,
}

#[derive(Clone, Debug)]
pub struct NewItem {
    pub tenant_id: TenantId,
    pub data: ItemData,
}
