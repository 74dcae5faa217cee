//! Catalog bundles and their expansion into concrete item lines.
//!
//! A bundle is an ordered list of components. Each component points either at
//! a catalog item or at another bundle, so bundles form a graph. Expanding a
//! bundle walks that graph depth-first and multiplies quantities through every
//! nesting level.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::item::Item;
use crate::domain::types::{BundleId, BundleName, Cents, ItemId, TenantId, string_enum};

string_enum!(
    ComponentType {
        Item => "ITEM",
        Bundle => "BUNDLE",
    }
);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BundleError {
    #[error("Circular bundle reference detected")]
    CircularReference,
}

/// What a bundle component points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentTarget {
    Item(ItemId),
    Bundle(BundleId),
}

impl ComponentTarget {
    pub fn component_type(self) -> ComponentType {
        match self {
            ComponentTarget::Item(_) => ComponentType::Item,
            ComponentTarget::Bundle(_) => ComponentType::Bundle,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub id: BundleId,
    pub tenant_id: TenantId,
    pub name: BundleName,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Component definition as supplied on create/update and as used by
/// [`flatten_bundle`].
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentSpec {
    pub target: ComponentTarget,
    pub quantity: f64,
    pub unit_price_override: Option<Cents>,
    pub unit_cost_override: Option<Cents>,
    pub sort_order: i32,
}

/// Stored component row.
#[derive(Clone, Debug, PartialEq)]
pub struct BundleComponent {
    pub id: i32,
    pub bundle_id: BundleId,
    pub spec: ComponentSpec,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BundleWithComponents {
    pub bundle: Bundle,
    pub components: Vec<BundleComponent>,
}

#[derive(Clone, Debug)]
pub struct NewBundle {
    pub tenant_id: TenantId,
    pub name: BundleName,
    pub description: Option<String>,
    pub components: Vec<ComponentSpec>,
}

#[derive(Clone, Debug)]
pub struct UpdateBundle {
    pub name: BundleName,
    pub description: Option<String>,
    pub components: Vec<ComponentSpec>,
}

/// One concrete item line produced by expanding a bundle.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlatLine {
    pub item_id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    pub quantity: f64,
    pub unit_price: Cents,
    pub unit_cost: Option<Cents>,
    pub taxable: bool,
}

/// Tenant catalog loaded for expansion: components of every bundle and the
/// items they may reference.
#[derive(Clone, Debug, Default)]
pub struct BundleCatalog {
    pub components: HashMap<BundleId, Vec<ComponentSpec>>,
    pub items: HashMap<ItemId, Item>,
}

impl BundleCatalog {
    /// Returns a copy of the catalog where `bundle` has the given components,
    /// used to validate a create/update before it is persisted.
    pub fn with_components(&self, bundle: BundleId, components: Vec<ComponentSpec>) -> Self {
        let mut catalog = self.clone();
        catalog.components.insert(bundle, components);
        catalog
    }
}

/// Expands `root` into concrete item lines.
///
/// Components are visited in `sort_order`. Quantities multiply through each
/// nesting level and price/cost overrides replace the item defaults. The same
/// bundle may be reached through sibling branches, but meeting a bundle that
/// is already on the current path fails with
/// [`BundleError::CircularReference`]. Bundles and items missing from the
/// catalog contribute nothing.
pub fn flatten_bundle(
    root: BundleId,
    catalog: &BundleCatalog,
) -> Result<Vec<FlatLine>, BundleError> {
    let mut lines = Vec::new();
    let mut path = Vec::new();
    walk(root, 1.0, catalog, &mut path, &mut lines)?;
    Ok(lines)
}

fn walk(
    bundle: BundleId,
    multiplier: f64,
    catalog: &BundleCatalog,
    path: &mut Vec<BundleId>,
    lines: &mut Vec<FlatLine>,
) -> Result<(), BundleError> {
    if path.contains(&bundle) {
        return Err(BundleError::CircularReference);
    }
    let Some(components) = catalog.components.get(&bundle) else {
        return Ok(());
    };

    let mut ordered: Vec<&ComponentSpec> = components.iter().collect();
    ordered.sort_by_key(|c| c.sort_order);

    path.push(bundle);
    for component in ordered {
        let quantity = component.quantity * multiplier;
        match component.target {
            ComponentTarget::Item(item_id) => {
                let Some(item) = catalog.items.get(&item_id) else {
                    continue;
                };
                lines.push(FlatLine {
                    item_id,
                    name: item.name.to_string(),
                    description: item.description.clone(),
                    unit: item.unit.clone(),
                    quantity,
                    unit_price: component.unit_price_override.unwrap_or(item.unit_price),
                    unit_cost: component.unit_cost_override.or(item.unit_cost),
                    taxable: item.taxable,
                });
            }
            ComponentTarget::Bundle(nested) => {
                walk(nested, quantity, catalog, path, lines)?;
            }
        }
    }
    path.pop();

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::item::{DEFAULT_UNIT, ItemKind};
    use crate::domain::types::ItemName;

    fn item(id: i32, name: &str, price: i64, cost: Option<i64>) -> Item {
        let now = Utc::now().naive_utc();
        Item {
            id: ItemId::new(id).unwrap(),
            tenant_id: TenantId::new(1).unwrap(),
            name: ItemName::new(name).unwrap(),
            sku: None,
            kind: ItemKind::Material,
            description: None,
            unit: DEFAULT_UNIT.to_string(),
            unit_price: Cents::new(price),
            unit_cost: cost.map(Cents::new),
            taxable: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn item_component(item: i32, quantity: f64, sort_order: i32) -> ComponentSpec {
        ComponentSpec {
            target: ComponentTarget::Item(ItemId::new(item).unwrap()),
            quantity,
            unit_price_override: None,
            unit_cost_override: None,
            sort_order,
        }
    }

    fn bundle_component(bundle: i32, quantity: f64, sort_order: i32) -> ComponentSpec {
        ComponentSpec {
            target: ComponentTarget::Bundle(BundleId::new(bundle).unwrap()),
            quantity,
            unit_price_override: None,
            unit_cost_override: None,
            sort_order,
        }
    }

    fn bid(id: i32) -> BundleId {
        BundleId::new(id).unwrap()
    }

    fn catalog() -> BundleCatalog {
        let mut catalog = BundleCatalog::default();
        for item in [
            item(1, "Casing", 500, Some(200)),
            item(2, "Nails", 10, None),
            item(3, "Labor hour", 6500, Some(3000)),
        ] {
            catalog.items.insert(item.id, item);
        }
        catalog
    }

    #[test]
    fn quantities_multiply_through_nesting() {
        let mut catalog = catalog();
        catalog
            .components
            .insert(bid(10), vec![item_component(1, 2.0, 0), item_component(2, 20.0, 1)]);
        catalog.components.insert(
            bid(20),
            vec![bundle_component(10, 3.0, 0), item_component(3, 1.5, 1)],
        );

        let lines = flatten_bundle(bid(20), &catalog).unwrap();

        let summary: Vec<(i32, f64)> = lines
            .iter()
            .map(|l| (l.item_id.get(), l.quantity))
            .collect();
        assert_eq!(summary, vec![(1, 6.0), (2, 60.0), (3, 1.5)]);
        assert_eq!(lines[0].unit_price, Cents::new(500));
        assert_eq!(lines[1].unit_cost, None);
    }

    #[test]
    fn components_follow_sort_order() {
        let mut catalog = catalog();
        catalog.components.insert(
            bid(10),
            vec![item_component(3, 1.0, 5), item_component(1, 1.0, 1)],
        );

        let lines = flatten_bundle(bid(10), &catalog).unwrap();

        assert_eq!(lines[0].item_id.get(), 1);
        assert_eq!(lines[1].item_id.get(), 3);
    }

    #[test]
    fn overrides_replace_item_defaults() {
        let mut catalog = catalog();
        let mut component = item_component(1, 1.0, 0);
        component.unit_price_override = Some(Cents::new(0));
        component.unit_cost_override = Some(Cents::new(150));
        catalog.components.insert(bid(10), vec![component]);

        let lines = flatten_bundle(bid(10), &catalog).unwrap();

        assert_eq!(lines[0].unit_price, Cents::ZERO);
        assert_eq!(lines[0].unit_cost, Some(Cents::new(150)));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut catalog = catalog();
        catalog
            .components
            .insert(bid(10), vec![bundle_component(20, 1.0, 0)]);
        catalog
            .components
            .insert(bid(20), vec![bundle_component(10, 1.0, 0)]);

        assert_eq!(
            flatten_bundle(bid(10), &catalog),
            Err(BundleError::CircularReference)
        );
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let mut catalog = catalog();
        catalog
            .components
            .insert(bid(10), vec![bundle_component(10, 1.0, 0)]);

        assert!(flatten_bundle(bid(10), &catalog).is_err());
    }

    #[test]
    fn shared_sub_bundles_are_not_cycles() {
        let mut catalog = catalog();
        catalog.components.insert(bid(30), vec![item_component(2, 4.0, 0)]);
        catalog.components.insert(bid(10), vec![bundle_component(30, 1.0, 0)]);
        catalog.components.insert(bid(20), vec![bundle_component(30, 2.0, 0)]);
        catalog.components.insert(
            bid(40),
            vec![bundle_component(10, 1.0, 0), bundle_component(20, 1.0, 1)],
        );

        let lines = flatten_bundle(bid(40), &catalog).unwrap();

        let quantities: Vec<f64> = lines.iter().map(|l| l.quantity).collect();
        assert_eq!(quantities, vec![4.0, 8.0]);
    }

    #[test]
    fn missing_bundles_and_items_contribute_nothing() {
        let mut catalog = catalog();
        catalog.components.insert(
            bid(10),
            vec![
                bundle_component(99, 1.0, 0),
                item_component(77, 1.0, 1),
                item_component(2, 1.0, 2),
            ],
        );

        let lines = flatten_bundle(bid(10), &catalog).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item_id.get(), 2);
    }

    #[test]
    fn proposed_components_are_checked_before_saving() {
        let mut catalog = catalog();
        catalog
            .components
            .insert(bid(20), vec![bundle_component(10, 1.0, 0)]);
        catalog.components.insert(bid(10), vec![item_component(1, 1.0, 0)]);

        let proposed = catalog.with_components(bid(10), vec![bundle_component(20, 1.0, 0)]);

        assert_eq!(
            flatten_bundle(bid(10), &proposed),
            Err(BundleError::CircularReference)
        );
        assert!(flatten_bundle(bid(10), &catalog).is_ok());
    }
}
