use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::bundle::{BundleComponent, BundleWithComponents, ComponentTarget, ComponentType};
use crate::domain::types::{BundleId, BundleName, Cents, ItemId};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentView {
    pub id: i32,
    pub component_type: ComponentType,
    pub component_item_id: Option<ItemId>,
    pub component_bundle_id: Option<BundleId>,
    pub quantity: f64,
    pub default_unit_price_override: Option<Cents>,
    pub default_unit_cost_override: Option<Cents>,
    pub sort_order: i32,
}

impl From<BundleComponent> for ComponentView {
    fn from(component: BundleComponent) -> Self {
        let spec = component.spec;
        let (component_item_id, component_bundle_id) = match spec.target {
            ComponentTarget::Item(item_id) => (Some(item_id), None),
            ComponentTarget::Bundle(bundle_id) => (None, Some(bundle_id)),
        };
        Self {
            id: component.id,
            component_type: spec.target.component_type(),
            component_item_id,
            component_bundle_id,
            quantity: spec.quantity,
            default_unit_price_override: spec.unit_price_override,
            default_unit_cost_override: spec.unit_cost_override,
            sort_order: spec.sort_order,
        }
    }
}

/// A bundle with its components in sort order.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BundleView {
    pub id: BundleId,
    pub name: BundleName,
    pub description: Option<String>,
    pub components: Vec<ComponentView>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<BundleWithComponents> for BundleView {
    fn from(value: BundleWithComponents) -> Self {
        let mut components: Vec<ComponentView> =
            value.components.into_iter().map(ComponentView::from).collect();
        components.sort_by_key(|component| component.sort_order);
        Self {
            id: value.bundle.id,
            name: value.bundle.name,
            description: value.bundle.description,
            components,
            created_at: value.bundle.created_at,
            updated_at: value.bundle.updated_at,
        }
    }
}
