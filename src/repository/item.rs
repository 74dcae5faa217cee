use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::{
        item::{Item, ItemData, NewItem},
        types::{ItemId, TenantId},
    },
    models::item::{Item as DbItem, NewItem as DbNewItem, UpdateItem as DbUpdateItem},
    repository::{
        DieselRepository, ItemListQuery, ItemReader, ItemWriter,
        errors::{RepositoryError, RepositoryResult},
    },
};

pub(crate) fn load_items(
    conn: &mut SqliteConnection,
    tenant_id: i32,
) -> RepositoryResult<Vec<Item>> {
    use crate::schema::items;

    items::table
        .filter(items::tenant_id.eq(tenant_id))
        .order(items::id.asc())
        .load::<DbItem>(conn)?
        .into_iter()
        .map(|item| Item::try_from(item).map_err(RepositoryError::from))
        .collect()
}

impl ItemReader for DieselRepository {
    fn get_item_by_id(&self, id: ItemId, tenant_id: TenantId) -> RepositoryResult<Option<Item>> {
        use crate::schema::items;

        let mut conn = self.conn()?;

        let item = items::table
            .filter(items::id.eq(id.get()))
            .filter(items::tenant_id.eq(tenant_id.get()))
            .first::<DbItem>(&mut conn)
            .optional()?;

        item.map(Item::try_from).transpose().map_err(RepositoryError::from)
    }

    fn list_items(&self, query: ItemListQuery) -> RepositoryResult<(usize, Vec<Item>)> {
        use crate::schema::items;

        let mut conn = self.conn()?;

        let filtered = || {
            let mut items = items::table
                .filter(items::tenant_id.eq(query.tenant_id.get()))
                .into_boxed();

            if let Some(is_active) = query.is_active {
                items = items.filter(items::is_active.eq(is_active));
            }
            if let Some(term) = &query.search {
                let pattern = format!("%{term}%");
                items = items.filter(
                    items::name
                        .like(pattern.clone())
                        .or(items::sku.like(pattern.clone()))
                        .or(items::description.like(pattern)),
                );
            }

            items
        };

        let total = filtered().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = filtered().order((items::name.asc(), items::id.asc()));
        if let Some(page) = &query.pagination {
            items = items.limit(page.limit as i64).offset(page.offset() as i64);
        }

        let items = items
            .load::<DbItem>(&mut conn)?
            .into_iter()
            .map(|item| Item::try_from(item).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total, items))
    }
}

impl ItemWriter for DieselRepository {
    fn create_item(&self, new_item: &NewItem) -> RepositoryResult<Item> {
        use crate::schema::items;

        let mut conn = self.conn()?;

        let created = diesel::insert_into(items::table)
            .values(&DbNewItem::from(new_item))
            .get_result::<DbItem>(&mut conn)?;

        Ok(Item::try_from(created)?)
    }

    fn create_items(&self, new_items: &[NewItem]) -> RepositoryResult<usize> {
        use crate::schema::items;

        if new_items.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let rows: Vec<DbNewItem> = new_items.iter().map(DbNewItem::from).collect();

        conn.transaction::<_, RepositoryError, _>(|conn| {
            Ok(diesel::insert_into(items::table)
                .values(&rows)
                .execute(conn)?)
        })
    }

    fn update_item(
        &self,
        id: ItemId,
        tenant_id: TenantId,
        data: &ItemData,
    ) -> RepositoryResult<Item> {
        use crate::schema::items;

        let mut conn = self.conn()?;
        let changes = DbUpdateItem::from_domain(data, Utc::now().naive_utc());

        let updated = diesel::update(
            items::table
                .filter(items::id.eq(id.get()))
                .filter(items::tenant_id.eq(tenant_id.get())),
        )
        .set(&changes)
        .get_result::<DbItem>(&mut conn)?;

        Ok(Item::try_from(updated)?)
    }

    fn delete_item(&self, id: ItemId, tenant_id: TenantId) -> RepositoryResult<()> {
        use crate::schema::items;

        let mut conn = self.conn()?;

        let deleted = diesel::delete(
            items::table
                .filter(items::id.eq(id.get()))
                .filter(items::tenant_id.eq(tenant_id.get())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
