use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::{
    item::{Item as DomainItem, ItemData, NewItem as DomainNewItem},
    types::{Cents, ItemId, ItemName, TenantId, TypeConstraintError},
};

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::items)]
pub struct Item {
    pub id: i32,
    pub tenant_id: i32,
    pub name: String,
    pub sku: Option<String>,
    pub kind: String,
    pub description: Option<String>,
    pub unit: String,
    pub unit_price_cents: i64,
    pub unit_cost_cents: Option<i64>,
    pub taxable: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::items)]
pub struct NewItem<'a> {
    pub tenant_id: i32,
    pub name: &'a str,
    pub sku: Option<&'a str>,
    pub kind: &'a str,
    pub description: Option<&'a str>,
    pub unit: &'a str,
    pub unit_price_cents: i64,
    pub unit_cost_cents: Option<i64>,
    pub taxable: bool,
    pub is_active: bool,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::items)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateItem<'a> {
    pub name: &'a str,
    pub sku: Option<&'a str>,
    pub kind: &'a str,
    pub description: Option<&'a str>,
    pub unit: &'a str,
    pub unit_price_cents: i64,
    pub unit_cost_cents: Option<i64>,
    pub taxable: bool,
    pub is_active: bool,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Item> for DomainItem {
    type Error = TypeConstraintError;

    fn try_from(item: Item) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ItemId::new(item.id)?,
            tenant_id: TenantId::new(item.tenant_id)?,
            name: ItemName::new(item.name)?,
            sku: item.sku,
            kind: item.kind.parse()?,
            description: item.description,
            unit: item.unit,
            unit_price: Cents::new(item.unit_price_cents),
            unit_cost: item.unit_cost_cents.map(Cents::new),
            taxable: item.taxable,
            is_active: item.is_active,
            created_at: item.created_at,
            updated_at: item.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewItem> for NewItem<'a> {
    fn from(item: &'a DomainNewItem) -> Self {
        let data = &item.data;
        Self {
            tenant_id: item.tenant_id.get(),
            name: data.name.as_str(),
            sku: data.sku.as_deref(),
            kind: data.kind.as_str(),
            description: data.description.as_deref(),
            unit: data.unit.as_str(),
            unit_price_cents: data.unit_price.get(),
            unit_cost_cents: data.unit_cost.map(Cents::get),
            taxable: data.taxable,
            is_active: data.is_active,
        }
    }
}

impl<'a> UpdateItem<'a> {
    pub fn from_domain(data: &'a ItemData, updated_at: NaiveDateTime) -> Self {
        Self {
            name: data.name.as_str(),
            sku: data.sku.as_deref(),
            kind: data.kind.as_str(),
            description: data.description.as_deref(),
            unit: data.unit.as_str(),
            unit_price_cents: data.unit_price.get(),
            unit_cost_cents: data.unit_cost.map(Cents::get),
            taxable: data.taxable,
            is_active: data.is_active,
            updated_at,
        }
    }
}
