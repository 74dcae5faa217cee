use std::collections::HashMap;

use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::{
        bundle::{
            Bundle, BundleCatalog, BundleComponent, BundleWithComponents, ComponentSpec,
            ComponentTarget, NewBundle, UpdateBundle, flatten_bundle,
        },
        types::{BundleId, TenantId},
    },
    models::bundle::{
        Bundle as DbBundle, BundleComponent as DbBundleComponent, NewBundle as DbNewBundle,
        NewBundleComponent, UpdateBundle as DbUpdateBundle,
    },
    repository::{
        BundleReader, BundleWriter, DieselRepository,
        errors::{RepositoryError, RepositoryResult},
        item::load_items,
    },
};

fn find_bundle(
    conn: &mut SqliteConnection,
    id: i32,
    tenant_id: i32,
) -> RepositoryResult<Option<BundleWithComponents>> {
    use crate::schema::{bundle_components, bundles};

    let Some(bundle) = bundles::table
        .filter(bundles::id.eq(id))
        .filter(bundles::tenant_id.eq(tenant_id))
        .first::<DbBundle>(conn)
        .optional()?
    else {
        return Ok(None);
    };

    let components = bundle_components::table
        .filter(bundle_components::bundle_id.eq(bundle.id))
        .order((bundle_components::sort_order.asc(), bundle_components::id.asc()))
        .load::<DbBundleComponent>(conn)?
        .into_iter()
        .map(|component| BundleComponent::try_from(component).map_err(RepositoryError::from))
        .collect::<RepositoryResult<Vec<_>>>()?;

    Ok(Some(BundleWithComponents {
        bundle: Bundle::try_from(bundle)?,
        components,
    }))
}

fn load_catalog(conn: &mut SqliteConnection, tenant_id: i32) -> RepositoryResult<BundleCatalog> {
    use crate::schema::{bundle_components, bundles};

    let mut catalog = BundleCatalog::default();

    let bundle_ids = bundles::table
        .filter(bundles::tenant_id.eq(tenant_id))
        .select(bundles::id)
        .load::<i32>(conn)?;
    for id in &bundle_ids {
        catalog.components.insert(BundleId::new(*id)?, Vec::new());
    }

    let rows = bundle_components::table
        .filter(bundle_components::bundle_id.eq_any(bundle_ids))
        .order((bundle_components::sort_order.asc(), bundle_components::id.asc()))
        .load::<DbBundleComponent>(conn)?;
    for row in rows {
        let component = BundleComponent::try_from(row)?;
        catalog
            .components
            .entry(component.bundle_id)
            .or_default()
            .push(component.spec);
    }

    catalog.items = load_items(conn, tenant_id)?
        .into_iter()
        .map(|item| (item.id, item))
        .collect::<HashMap<_, _>>();

    Ok(catalog)
}

/// Checks that every component points inside the tenant catalog and that
/// saving them under `bundle` keeps the bundle graph acyclic.
fn validate_components(
    conn: &mut SqliteConnection,
    tenant_id: i32,
    bundle: BundleId,
    components: &[ComponentSpec],
) -> RepositoryResult<()> {
    let catalog = load_catalog(conn, tenant_id)?;

    for component in components {
        match component.target {
            ComponentTarget::Item(item_id) if !catalog.items.contains_key(&item_id) => {
                return Err(RepositoryError::Rejected(format!(
                    "Item {item_id} does not belong to this tenant"
                )));
            }
            ComponentTarget::Bundle(bundle_id)
                if bundle_id != bundle && !catalog.components.contains_key(&bundle_id) =>
            {
                return Err(RepositoryError::Rejected(format!(
                    "Bundle {bundle_id} does not belong to this tenant"
                )));
            }
            _ => {}
        }
        if component.quantity <= 0.0 {
            return Err(RepositoryError::Rejected(
                "Component quantity must be positive".to_string(),
            ));
        }
    }

    let proposed = catalog.with_components(bundle, components.to_vec());
    flatten_bundle(bundle, &proposed)?;
    Ok(())
}

fn replace_components(
    conn: &mut SqliteConnection,
    bundle: BundleId,
    components: &[ComponentSpec],
) -> RepositoryResult<()> {
    use crate::schema::bundle_components;

    diesel::delete(bundle_components::table.filter(bundle_components::bundle_id.eq(bundle.get())))
        .execute(conn)?;

    let rows: Vec<NewBundleComponent> = components
        .iter()
        .map(|component| NewBundleComponent::from_spec(bundle, component))
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(bundle_components::table)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(())
}

impl BundleReader for DieselRepository {
    fn get_bundle_by_id(
        &self,
        id: BundleId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<BundleWithComponents>> {
        let mut conn = self.conn()?;
        find_bundle(&mut conn, id.get(), tenant_id.get())
    }

    fn list_bundles(&self, tenant_id: TenantId) -> RepositoryResult<Vec<BundleWithComponents>> {
        use crate::schema::{bundle_components, bundles};

        let mut conn = self.conn()?;

        let rows = bundles::table
            .filter(bundles::tenant_id.eq(tenant_id.get()))
            .order((bundles::name.asc(), bundles::id.asc()))
            .load::<DbBundle>(&mut conn)?;
        let ids: Vec<i32> = rows.iter().map(|bundle| bundle.id).collect();

        let mut components: HashMap<i32, Vec<BundleComponent>> = HashMap::new();
        for row in bundle_components::table
            .filter(bundle_components::bundle_id.eq_any(ids))
            .order((bundle_components::sort_order.asc(), bundle_components::id.asc()))
            .load::<DbBundleComponent>(&mut conn)?
        {
            components
                .entry(row.bundle_id)
                .or_default()
                .push(BundleComponent::try_from(row)?);
        }

        rows.into_iter()
            .map(|row| -> RepositoryResult<BundleWithComponents> {
                let components = components.remove(&row.id).unwrap_or_default();
                Ok(BundleWithComponents {
                    bundle: Bundle::try_from(row)?,
                    components,
                })
            })
            .collect()
    }

    fn load_bundle_catalog(&self, tenant_id: TenantId) -> RepositoryResult<BundleCatalog> {
        let mut conn = self.conn()?;
        load_catalog(&mut conn, tenant_id.get())
    }
}

impl BundleWriter for DieselRepository {
    fn create_bundle(&self, new_bundle: &NewBundle) -> RepositoryResult<BundleWithComponents> {
        use crate::schema::bundles;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let tenant_id = new_bundle.tenant_id.get();
            let created = diesel::insert_into(bundles::table)
                .values(&DbNewBundle {
                    tenant_id,
                    name: new_bundle.name.as_str(),
                    description: new_bundle.description.as_deref(),
                })
                .get_result::<DbBundle>(conn)?;
            let bundle_id = BundleId::new(created.id)?;

            validate_components(conn, tenant_id, bundle_id, &new_bundle.components)?;
            replace_components(conn, bundle_id, &new_bundle.components)?;

            find_bundle(conn, created.id, tenant_id)?.ok_or(RepositoryError::NotFound)
        })
    }

    fn update_bundle(
        &self,
        id: BundleId,
        tenant_id: TenantId,
        updates: &UpdateBundle,
    ) -> RepositoryResult<BundleWithComponents> {
        use crate::schema::bundles;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let updated = diesel::update(
                bundles::table
                    .filter(bundles::id.eq(id.get()))
                    .filter(bundles::tenant_id.eq(tenant_id.get())),
            )
            .set(&DbUpdateBundle {
                name: updates.name.as_str(),
                description: updates.description.as_deref(),
                updated_at: Utc::now().naive_utc(),
            })
            .execute(conn)?;
            if updated == 0 {
                return Err(RepositoryError::NotFound);
            }

            validate_components(conn, tenant_id.get(), id, &updates.components)?;
            replace_components(conn, id, &updates.components)?;

            find_bundle(conn, id.get(), tenant_id.get())?.ok_or(RepositoryError::NotFound)
        })
    }

    fn delete_bundle(&self, id: BundleId, tenant_id: TenantId) -> RepositoryResult<()> {
        use crate::schema::bundles;

        let mut conn = self.conn()?;

        let deleted = diesel::delete(
            bundles::table
                .filter(bundles::id.eq(id.get()))
                .filter(bundles::tenant_id.eq(tenant_id.get())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
