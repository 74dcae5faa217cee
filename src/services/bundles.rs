//! Catalog bundles. Bundles share the catalog permissions of items.

use crate::domain::bundle::{FlatLine, flatten_bundle};
use crate::domain::permission::Permission;
use crate::domain::types::BundleId;
use crate::dto::bundles::BundleView;
use crate::forms::bundles::{BundleForm, BundlePayload};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{BundleReader, BundleWriter};
use crate::services::{ServiceError, ServiceResult, ensure_permission, log_failure};

fn bundle_id(id: i32) -> ServiceResult<BundleId> {
    BundleId::new(id).map_err(|_| ServiceError::NotFound)
}

pub fn list_bundles<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<BundleView>>
where
    R: BundleReader + ?Sized,
{
    ensure_permission(user, Permission::ItemsViewAll)?;
    let bundles = repo
        .list_bundles(user.tenant_id)
        .map_err(log_failure("list bundles"))?;
    Ok(bundles.into_iter().map(BundleView::from).collect())
}

pub fn get_bundle<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<BundleView>
where
    R: BundleReader + ?Sized,
{
    ensure_permission(user, Permission::ItemsViewAll)?;
    repo.get_bundle_by_id(bundle_id(id)?, user.tenant_id)
        .map_err(log_failure("load bundle"))?
        .map(BundleView::from)
        .ok_or(ServiceError::NotFound)
}

/// Creates a bundle; components outside the tenant or forming a cycle are
/// rejected by the repository inside the same transaction.
pub fn create_bundle<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: BundleForm,
) -> ServiceResult<BundleView>
where
    R: BundleWriter + ?Sized,
{
    ensure_permission(user, Permission::ItemsCreate)?;
    let payload = BundlePayload::try_from(form)?;
    let created = repo
        .create_bundle(&payload.into_new_bundle(user.tenant_id))
        .map_err(log_failure("create bundle"))?;
    log::info!("User {} created bundle {}", user.id, created.bundle.id);
    Ok(created.into())
}

pub fn update_bundle<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: BundleForm,
) -> ServiceResult<BundleView>
where
    R: BundleWriter + ?Sized,
{
    ensure_permission(user, Permission::ItemsEdit)?;
    let id = bundle_id(id)?;
    let payload = BundlePayload::try_from(form)?;
    repo.update_bundle(id, user.tenant_id, &payload.into_update())
        .map(BundleView::from)
        .map_err(log_failure("update bundle"))
}

pub fn delete_bundle<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: BundleWriter + ?Sized,
{
    ensure_permission(user, Permission::ItemsDelete)?;
    repo.delete_bundle(bundle_id(id)?, user.tenant_id)
        .map_err(log_failure("delete bundle"))
}

/// Concrete item lines the bundle expands to.
pub fn flatten<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<Vec<FlatLine>>
where
    R: BundleReader + ?Sized,
{
    ensure_permission(user, Permission::ItemsViewAll)?;
    let id = bundle_id(id)?;

    if repo
        .get_bundle_by_id(id, user.tenant_id)
        .map_err(log_failure("load bundle"))?
        .is_none()
    {
        return Err(ServiceError::NotFound);
    }

    let catalog = repo
        .load_bundle_catalog(user.tenant_id)
        .map_err(log_failure("load bundle catalog"))?;
    Ok(flatten_bundle(id, &catalog)?)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::bundle::{
        Bundle, BundleCatalog, BundleComponent, BundleWithComponents, ComponentSpec,
        ComponentTarget,
    };
    use crate::domain::item::{Item, ItemKind};
    use crate::domain::types::{BundleName, Cents, ItemId, ItemName};
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{admin_user, tenant};

    fn bid(id: i32) -> BundleId {
        BundleId::new(id).unwrap()
    }

    fn spec(target: ComponentTarget, quantity: f64, sort_order: i32) -> ComponentSpec {
        ComponentSpec {
            target,
            quantity,
            unit_price_override: None,
            unit_cost_override: None,
            sort_order,
        }
    }

    fn stored_bundle(id: i32, components: Vec<ComponentSpec>) -> BundleWithComponents {
        let now = Utc::now().naive_utc();
        BundleWithComponents {
            bundle: Bundle {
                id: bid(id),
                tenant_id: tenant(),
                name: BundleName::new("Door package").unwrap(),
                description: None,
                created_at: now,
                updated_at: now,
            },
            components: components
                .into_iter()
                .enumerate()
                .map(|(index, spec)| BundleComponent {
                    id: index as i32 + 1,
                    bundle_id: bid(id),
                    spec,
                })
                .collect(),
        }
    }

    fn item(id: i32, price: i64) -> Item {
        let now = Utc::now().naive_utc();
        Item {
            id: ItemId::new(id).unwrap(),
            tenant_id: tenant(),
            name: ItemName::new(format!("Item {id}")).unwrap(),
            sku: None,
            kind: ItemKind::Material,
            description: None,
            unit: "each".into(),
            unit_price: Cents::new(price),
            unit_cost: None,
            taxable: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn flatten_multiplies_nested_quantities() {
        let mut repo = MockRepository::new();
        repo.expect_get_bundle_by_id()
            .returning(|id, _| Ok(Some(stored_bundle(id.get(), Vec::new()))));
        repo.expect_load_bundle_catalog().returning(|_| {
            let mut catalog = BundleCatalog::default();
            catalog.components.insert(
                bid(1),
                vec![spec(ComponentTarget::Bundle(bid(2)), 2.0, 0)],
            );
            catalog.components.insert(
                bid(2),
                vec![spec(ComponentTarget::Item(ItemId::new(7).unwrap()), 3.0, 0)],
            );
            catalog.items.insert(ItemId::new(7).unwrap(), item(7, 1000));
            Ok(catalog)
        });

        let lines = flatten(&repo, &admin_user(), 1).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 6.0);
        assert_eq!(lines[0].unit_price, Cents::new(1000));
    }

    #[test]
    fn flatten_reports_cycles_as_validation_errors() {
        let mut repo = MockRepository::new();
        repo.expect_get_bundle_by_id()
            .returning(|id, _| Ok(Some(stored_bundle(id.get(), Vec::new()))));
        repo.expect_load_bundle_catalog().returning(|_| {
            let mut catalog = BundleCatalog::default();
            catalog
                .components
                .insert(bid(1), vec![spec(ComponentTarget::Bundle(bid(2)), 1.0, 0)]);
            catalog
                .components
                .insert(bid(2), vec![spec(ComponentTarget::Bundle(bid(1)), 1.0, 0)]);
            Ok(catalog)
        });

        let result = flatten(&repo, &admin_user(), 1);

        assert!(matches!(
            result,
            Err(ServiceError::Validation(msg)) if msg == "Circular bundle reference detected"
        ));
    }

    #[test]
    fn rejected_components_surface_as_bad_request() {
        let mut repo = MockRepository::new();
        repo.expect_create_bundle().returning(|_| {
            Err(RepositoryError::Rejected(
                "Item 9 does not belong to this tenant".into(),
            ))
        });

        let form: BundleForm = serde_json::from_str(
            r#"{"name":"Kit","components":[{"componentType":"ITEM","componentItemId":9}]}"#,
        )
        .unwrap();

        assert!(matches!(
            create_bundle(&repo, &admin_user(), form),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn views_list_components_in_order() {
        let bundle = stored_bundle(
            3,
            vec![
                spec(ComponentTarget::Item(ItemId::new(2).unwrap()), 1.0, 5),
                spec(ComponentTarget::Bundle(bid(4)), 2.0, 1),
            ],
        );

        let view = BundleView::from(bundle);

        assert_eq!(view.components[0].component_bundle_id, Some(bid(4)));
        assert_eq!(view.components[1].component_item_id, ItemId::new(2).ok());
    }
}
