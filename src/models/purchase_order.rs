use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::{
    purchase_order::{
        NewPurchaseOrder as DomainNewPurchaseOrder, PurchaseOrder as DomainPurchaseOrder,
        UpdatePurchaseOrder as DomainUpdatePurchaseOrder,
    },
    types::{Cents, PurchaseOrderId, TenantId, TypeConstraintError, VendorName},
};
use crate::models::opt_id;

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::purchase_orders)]
pub struct PurchaseOrder {
    pub id: i32,
    pub tenant_id: i32,
    pub job_id: Option<i32>,
    pub po_number: String,
    pub vendor: String,
    pub status: String,
    pub subtotal_cents: i64,
    pub tax_rate: f64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
    pub received_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::purchase_orders)]
pub struct NewPurchaseOrder<'a> {
    pub tenant_id: i32,
    pub job_id: Option<i32>,
    pub po_number: &'a str,
    pub vendor: &'a str,
    pub status: &'a str,
    pub tax_rate: f64,
    pub discount_cents: i64,
    pub notes: Option<&'a str>,
}

impl<'a> NewPurchaseOrder<'a> {
    pub fn new(order: &'a DomainNewPurchaseOrder, po_number: &'a str) -> Self {
        Self {
            tenant_id: order.tenant_id.get(),
            job_id: order.job_id.map(|id| id.get()),
            po_number,
            vendor: order.vendor.as_str(),
            status: order.status.as_str(),
            tax_rate: order.tax_rate,
            discount_cents: order.discount.get(),
            notes: order.notes.as_deref(),
        }
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::purchase_orders)]
#[diesel(treat_none_as_null = true)]
pub struct UpdatePurchaseOrder<'a> {
    pub job_id: Option<i32>,
    pub vendor: &'a str,
    pub status: &'a str,
    pub tax_rate: f64,
    pub discount_cents: i64,
    pub notes: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

impl<'a> UpdatePurchaseOrder<'a> {
    pub fn from_domain(order: &'a DomainUpdatePurchaseOrder, updated_at: NaiveDateTime) -> Self {
        Self {
            job_id: order.job_id.map(|id| id.get()),
            vendor: order.vendor.as_str(),
            status: order.status.as_str(),
            tax_rate: order.tax_rate,
            discount_cents: order.discount.get(),
            notes: order.notes.as_deref(),
            updated_at,
        }
    }
}

impl TryFrom<PurchaseOrder> for DomainPurchaseOrder {
    type Error = TypeConstraintError;

    fn try_from(order: PurchaseOrder) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PurchaseOrderId::new(order.id)?,
            tenant_id: TenantId::new(order.tenant_id)?,
            job_id: opt_id(order.job_id)?,
            po_number: order.po_number,
            vendor: VendorName::new(order.vendor)?,
            status: order.status.parse()?,
            subtotal: Cents::new(order.subtotal_cents),
            tax_rate: order.tax_rate,
            tax: Cents::new(order.tax_cents),
            discount: Cents::new(order.discount_cents),
            total: Cents::new(order.total_cents),
            notes: order.notes,
            received_at: order.received_at,
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }
}
