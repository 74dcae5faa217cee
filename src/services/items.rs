use std::io::Read;

use crate::domain::item::{Item, ItemData, NewItem};
use crate::domain::permission::Permission;
use crate::domain::types::{Cents, ItemId};
use crate::dto::items::ImportSummary;
use crate::dto::{CsvFile, Listing};
use crate::forms::items::{ITEM_CSV_HEADERS, ItemForm, ItemListParams, parse_items_csv};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{ItemListQuery, ItemReader, ItemWriter};
use crate::services::{
    ServiceError, ServiceResult, ensure_permission, log_failure, write_csv, yes_no,
};

fn item_id(id: i32) -> ServiceResult<ItemId> {
    ItemId::new(id).map_err(|_| ServiceError::NotFound)
}

fn dollars(amount: Cents) -> String {
    format!("{:.2}", amount.to_decimal())
}

pub fn list_items<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: ItemListParams,
) -> ServiceResult<Listing<Item>>
where
    R: ItemReader + ?Sized,
{
    ensure_permission(user, Permission::ItemsViewAll)?;

    let page = params.page_request();
    let mut query = ItemListQuery::new(user.tenant_id).paginate(page);
    if let Some(term) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.search(term);
    }
    if let Some(active) = params.active {
        query = query.active(active);
    }

    let (total, items) = repo.list_items(query).map_err(log_failure("list items"))?;
    Ok(Listing::new(total, items, page))
}

pub fn get_item<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<Item>
where
    R: ItemReader + ?Sized,
{
    ensure_permission(user, Permission::ItemsViewAll)?;
    repo.get_item_by_id(item_id(id)?, user.tenant_id)
        .map_err(log_failure("load item"))?
        .ok_or(ServiceError::NotFound)
}

pub fn create_item<R>(repo: &R, user: &AuthenticatedUser, form: ItemForm) -> ServiceResult<Item>
where
    R: ItemWriter + ?Sized,
{
    ensure_permission(user, Permission::ItemsCreate)?;
    let new_item = NewItem {
        tenant_id: user.tenant_id,
        data: ItemData::try_from(form)?,
    };
    repo.create_item(&new_item)
        .map_err(log_failure("create item"))
}

pub fn update_item<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: ItemForm,
) -> ServiceResult<Item>
where
    R: ItemWriter + ?Sized,
{
    ensure_permission(user, Permission::ItemsEdit)?;
    let id = item_id(id)?;
    let data = ItemData::try_from(form)?;
    repo.update_item(id, user.tenant_id, &data)
        .map_err(log_failure("update item"))
}

pub fn delete_item<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: ItemWriter + ?Sized,
{
    ensure_permission(user, Permission::ItemsDelete)?;
    repo.delete_item(item_id(id)?, user.tenant_id)
        .map_err(log_failure("delete item"))
}

/// The whole catalog as CSV; prices are written in dollars.
pub fn export_items<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<CsvFile>
where
    R: ItemReader + ?Sized,
{
    ensure_permission(user, Permission::ItemsViewAll)?;

    let (_, items) = repo
        .list_items(ItemListQuery::new(user.tenant_id))
        .map_err(log_failure("export items"))?;

    let rows = items.into_iter().map(|item| {
        vec![
            item.name.into_inner(),
            item.sku.unwrap_or_default(),
            item.kind.as_str().to_string(),
            item.description.unwrap_or_default(),
            item.unit,
            item.unit_cost.map(dollars).unwrap_or_default(),
            dollars(item.unit_price),
            yes_no(item.taxable),
            yes_no(item.is_active),
        ]
    });

    write_csv("items", &ITEM_CSV_HEADERS, rows)
}

/// Imports every usable row of an item CSV in one batch.
pub fn import_items<R, F>(repo: &R, user: &AuthenticatedUser, file: F) -> ServiceResult<ImportSummary>
where
    R: ItemWriter + ?Sized,
    F: Read,
{
    ensure_permission(user, Permission::ItemsCreate)?;

    let parsed = parse_items_csv(file, user.tenant_id)?;
    if parsed.items.is_empty() {
        return Err(ServiceError::Validation(
            "No items found in CSV".to_string(),
        ));
    }

    let imported = repo
        .create_items(&parsed.items)
        .map_err(log_failure("import items"))?;

    log::info!(
        "User {} imported {imported} items ({} skipped)",
        user.id,
        parsed.skipped
    );

    Ok(ImportSummary {
        success: true,
        imported,
        skipped: parsed.skipped,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::item::ItemKind;
    use crate::domain::types::ItemName;
    use crate::domain::user::Role;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{admin_user, tenant, user_with_role};

    fn stored_item() -> Item {
        let now = Utc::now().naive_utc();
        Item {
            id: ItemId::new(4).unwrap(),
            tenant_id: tenant(),
            name: ItemName::new("Baseboard").unwrap(),
            sku: Some("BB-1".into()),
            kind: ItemKind::Material,
            description: None,
            unit: "ft".into(),
            unit_price: Cents::new(350),
            unit_cost: Some(Cents::new(125)),
            taxable: true,
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn export_writes_dollar_amounts() {
        let mut repo = MockRepository::new();
        repo.expect_list_items()
            .returning(|_| Ok((1, vec![stored_item()])));

        let file = export_items(&repo, &admin_user()).unwrap();
        let text = String::from_utf8(file.content).unwrap();

        assert!(text.contains("Baseboard,BB-1,MATERIAL,,ft,1.25,3.50,Yes,No"));
    }

    #[test]
    fn import_counts_rows() {
        let mut repo = MockRepository::new();
        repo.expect_create_items()
            .withf(|items| items.len() == 2)
            .times(1)
            .returning(|items| Ok(items.len()));

        let csv = "Name,Unit Price\nTrim nails,4.99\n,1\nCaulk,6\n";
        let summary = import_items(&repo, &admin_user(), csv.as_bytes()).unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                success: true,
                imported: 2,
                skipped: 1
            }
        );
    }

    #[test]
    fn import_without_usable_rows_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_create_items().times(0);

        let result = import_items(&repo, &admin_user(), "Name\n\n".as_bytes());

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn sales_cannot_edit_catalog() {
        let repo = MockRepository::new();
        let form: ItemForm = serde_json::from_str(r#"{"name":"X","unitPrice":1}"#).unwrap();

        let result = update_item(&repo, &user_with_role(Role::Sales), 4, form);

        assert!(matches!(result, Err(ServiceError::Forbidden)));
    }
}
