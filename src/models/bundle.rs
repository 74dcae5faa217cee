//! Diesel models for bundles and their components.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::{
    bundle::{
        Bundle as DomainBundle, BundleComponent as DomainBundleComponent, ComponentSpec,
        ComponentTarget, ComponentType,
    },
    types::{BundleId, BundleName, Cents, ItemId, TenantId, TypeConstraintError},
};

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::bundles)]
pub struct Bundle {
    pub id: i32,
    pub tenant_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::bundles)]
pub struct NewBundle<'a> {
    pub tenant_id: i32,
    pub name: &'a str,
    pub description: Option<&'a str>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::bundles)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateBundle<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::bundle_components)]
pub struct BundleComponent {
    pub id: i32,
    pub bundle_id: i32,
    pub component_type: String,
    pub component_item_id: Option<i32>,
    pub component_bundle_id: Option<i32>,
    pub quantity: f64,
    pub unit_price_override_cents: Option<i64>,
    pub unit_cost_override_cents: Option<i64>,
    pub sort_order: i32,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::bundle_components)]
pub struct NewBundleComponent<'a> {
    pub bundle_id: i32,
    pub component_type: &'a str,
    pub component_item_id: Option<i32>,
    pub component_bundle_id: Option<i32>,
    pub quantity: f64,
    pub unit_price_override_cents: Option<i64>,
    pub unit_cost_override_cents: Option<i64>,
    pub sort_order: i32,
}

impl NewBundleComponent<'static> {
    pub fn from_spec(bundle_id: BundleId, spec: &ComponentSpec) -> Self {
        let (item, bundle) = match spec.target {
            ComponentTarget::Item(id) => (Some(id.get()), None),
            ComponentTarget::Bundle(id) => (None, Some(id.get())),
        };
        Self {
            bundle_id: bundle_id.get(),
            component_type: spec.target.component_type().as_str(),
            component_item_id: item,
            component_bundle_id: bundle,
            quantity: spec.quantity,
            unit_price_override_cents: spec.unit_price_override.map(Cents::get),
            unit_cost_override_cents: spec.unit_cost_override.map(Cents::get),
            sort_order: spec.sort_order,
        }
    }
}

impl TryFrom<Bundle> for DomainBundle {
    type Error = TypeConstraintError;

    fn try_from(bundle: Bundle) -> Result<Self, Self::Error> {
        Ok(Self {
            id: BundleId::new(bundle.id)?,
            tenant_id: TenantId::new(bundle.tenant_id)?,
            name: BundleName::new(bundle.name)?,
            description: bundle.description,
            created_at: bundle.created_at,
            updated_at: bundle.updated_at,
        })
    }
}

impl TryFrom<BundleComponent> for ComponentSpec {
    type Error = TypeConstraintError;

    fn try_from(component: BundleComponent) -> Result<Self, Self::Error> {
        let target = match component.component_type.parse::<ComponentType>()? {
            ComponentType::Item => ComponentTarget::Item(ItemId::new(
                component
                    .component_item_id
                    .ok_or_else(|| TypeConstraintError::InvalidValue("component item".into()))?,
            )?),
            ComponentType::Bundle => ComponentTarget::Bundle(BundleId::new(
                component
                    .component_bundle_id
                    .ok_or_else(|| TypeConstraintError::InvalidValue("component bundle".into()))?,
            )?),
        };
        Ok(Self {
            target,
            quantity: component.quantity,
            unit_price_override: component.unit_price_override_cents.map(Cents::new),
            unit_cost_override: component.unit_cost_override_cents.map(Cents::new),
            sort_order: component.sort_order,
        })
    }
}

impl TryFrom<BundleComponent> for DomainBundleComponent {
    type Error = TypeConstraintError;

    fn try_from(component: BundleComponent) -> Result<Self, Self::Error> {
        let id = component.id;
        let bundle_id = BundleId::new(component.bundle_id)?;
        Ok(Self {
            id,
            bundle_id,
            spec: ComponentSpec::try_from(component)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_bundle_component_round_trips_target() {
        let spec = ComponentSpec {
            target: ComponentTarget::Bundle(BundleId::new(9).unwrap()),
            quantity: 2.0,
            unit_price_override: Some(Cents::ZERO),
            unit_cost_override: None,
            sort_order: 1,
        };
        let row = NewBundleComponent::from_spec(BundleId::new(3).unwrap(), &spec);
        assert_eq!(row.component_type, "BUNDLE");
        assert_eq!(row.component_item_id, None);
        assert_eq!(row.component_bundle_id, Some(9));
        assert_eq!(row.unit_price_override_cents, Some(0));

        let stored = BundleComponent {
            id: 1,
            bundle_id: row.bundle_id,
            component_type: row.component_type.to_string(),
            component_item_id: row.component_item_id,
            component_bundle_id: row.component_bundle_id,
            quantity: row.quantity,
            unit_price_override_cents: row.unit_price_override_cents,
            unit_cost_override_cents: row.unit_cost_override_cents,
            sort_order: row.sort_order,
        };
        assert_eq!(ComponentSpec::try_from(stored).unwrap(), spec);
    }

    #[test]
    fn item_component_without_item_is_rejected() {
        let stored = BundleComponent {
            id: 1,
            bundle_id: 1,
            component_type: "ITEM".into(),
            component_item_id: None,
            component_bundle_id: None,
            quantity: 1.0,
            unit_price_override_cents: None,
            unit_cost_override_cents: None,
            sort_order: 0,
        };
        assert!(ComponentSpec::try_from(stored).is_err());
    }
}
