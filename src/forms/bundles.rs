use serde::Deserialize;

use crate::domain::bundle::{ComponentSpec, ComponentTarget, ComponentType, NewBundle, UpdateBundle};
use crate::domain::types::{BundleId, BundleName, Cents, ItemId, TenantId, sanitize_text};
use crate::forms::FormError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentForm {
    pub component_type: ComponentType,
    #[serde(default)]
    pub component_item_id: Option<i32>,
    #[serde(default)]
    pub component_bundle_id: Option<i32>,
    #[serde(default)]
    pub quantity: Option<f64>,
    /// Cents.
    #[serde(default)]
    pub default_unit_price_override: Option<i64>,
    /// Cents.
    #[serde(default)]
    pub default_unit_cost_override: Option<i64>,
}

impl ComponentForm {
    /// Components keep the order they were submitted in.
    fn into_spec(self, sort_order: i32) -> Result<ComponentSpec, FormError> {
        let target = match self.component_type {
            ComponentType::Item => ComponentTarget::Item(
                ItemId::new(
                    self.component_item_id
                        .ok_or(FormError::Missing("componentItemId"))?,
                )
                .map_err(FormError::invalid("componentItemId"))?,
            ),
            ComponentType::Bundle => ComponentTarget::Bundle(
                BundleId::new(
                    self.component_bundle_id
                        .ok_or(FormError::Missing("componentBundleId"))?,
                )
                .map_err(FormError::invalid("componentBundleId"))?,
            ),
        };

        Ok(ComponentSpec {
            target,
            quantity: self.quantity.unwrap_or(1.0),
            unit_price_override: self.default_unit_price_override.map(Cents::new),
            unit_cost_override: self.default_unit_cost_override.map(Cents::new),
            sort_order,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleForm {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub components: Vec<ComponentForm>,
}

/// Validated bundle definition.
#[derive(Debug, Clone)]
pub struct BundlePayload {
    pub name: BundleName,
    pub description: Option<String>,
    pub components: Vec<ComponentSpec>,
}

impl TryFrom<BundleForm> for BundlePayload {
    type Error = FormError;

    fn try_from(form: BundleForm) -> Result<Self, Self::Error> {
        if form.components.is_empty() {
            return Err(FormError::Missing("At least one component"));
        }
        let components = form
            .components
            .into_iter()
            .enumerate()
            .map(|(index, component)| component.into_spec(index as i32))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: BundleName::new(form.name).map_err(|_| FormError::Missing("Name"))?,
            description: form.description.as_deref().and_then(sanitize_text),
            components,
        })
    }
}

impl BundlePayload {
    pub fn into_new_bundle(self, tenant_id: TenantId) -> NewBundle {
        NewBundle {
            tenant_id,
            name: self.name,
            description: self.description,
            components: self.components,
        }
    }

    pub fn into_update(self) -> UpdateBundle {
        UpdateBundle {
            name: self.name,
            description: self.description,
            components: self.components,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<BundlePayload, FormError> {
        BundlePayload::try_from(serde_json::from_str::<BundleForm>(json).unwrap())
    }

    #[test]
    fn components_are_ordered_by_position() {
        let payload = parse(
            r#"{"name":"Door kit","components":[
                {"componentType":"ITEM","componentItemId":4,"quantity":2},
                {"componentType":"BUNDLE","componentBundleId":9,"defaultUnitPriceOverride":0}
            ]}"#,
        )
        .unwrap();

        assert_eq!(payload.components.len(), 2);
        assert_eq!(payload.components[0].sort_order, 0);
        assert_eq!(
            payload.components[1].target,
            ComponentTarget::Bundle(BundleId::new(9).unwrap())
        );
        assert_eq!(payload.components[1].quantity, 1.0);
        assert_eq!(payload.components[1].unit_price_override, Some(Cents::ZERO));
    }

    #[test]
    fn empty_bundles_are_rejected() {
        assert!(matches!(
            parse(r#"{"name":"Empty","components":[]}"#),
            Err(FormError::Missing("At least one component"))
        ));
    }

    #[test]
    fn item_components_need_an_item() {
        assert!(matches!(
            parse(r#"{"name":"Kit","components":[{"componentType":"ITEM"}]}"#),
            Err(FormError::Missing("componentItemId"))
        ));
    }
}
