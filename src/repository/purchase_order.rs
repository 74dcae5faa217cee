use chrono::{NaiveDateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::{
        document::DocumentKind,
        purchase_order::{
            NewPurchaseOrder, PurchaseOrder, PurchaseOrderStatus, UpdatePurchaseOrder,
        },
        types::{PurchaseOrderId, TenantId},
    },
    models::purchase_order::{
        NewPurchaseOrder as DbNewPurchaseOrder, PurchaseOrder as DbPurchaseOrder,
        UpdatePurchaseOrder as DbUpdatePurchaseOrder,
    },
    repository::{
        DieselRepository, PurchaseOrderListQuery, PurchaseOrderReader, PurchaseOrderWriter,
        document::{
            delete_document_lines, insert_lines, next_number, recalculate_totals, replace_lines,
        },
        errors::{RepositoryError, RepositoryResult},
    },
};

fn find_purchase_order(
    conn: &mut SqliteConnection,
    id: i32,
    tenant_id: i32,
) -> RepositoryResult<Option<PurchaseOrder>> {
    use crate::schema::purchase_orders;

    let order = purchase_orders::table
        .filter(purchase_orders::id.eq(id))
        .filter(purchase_orders::tenant_id.eq(tenant_id))
        .first::<DbPurchaseOrder>(conn)
        .optional()?;

    order
        .map(PurchaseOrder::try_from)
        .transpose()
        .map_err(RepositoryError::from)
}

fn reload(conn: &mut SqliteConnection, id: i32, tenant_id: i32) -> RepositoryResult<PurchaseOrder> {
    find_purchase_order(conn, id, tenant_id)?.ok_or(RepositoryError::NotFound)
}

impl PurchaseOrderReader for DieselRepository {
    fn get_purchase_order_by_id(
        &self,
        id: PurchaseOrderId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<PurchaseOrder>> {
        let mut conn = self.conn()?;
        find_purchase_order(&mut conn, id.get(), tenant_id.get())
    }

    fn list_purchase_orders(
        &self,
        query: PurchaseOrderListQuery,
    ) -> RepositoryResult<(usize, Vec<PurchaseOrder>)> {
        use crate::schema::purchase_orders;

        let mut conn = self.conn()?;

        let filtered = || {
            let mut items = purchase_orders::table
                .filter(purchase_orders::tenant_id.eq(query.tenant_id.get()))
                .into_boxed();

            if let Some(status) = query.status {
                items = items.filter(purchase_orders::status.eq(status.as_str()));
            }
            if let Some(term) = &query.search {
                let pattern = format!("%{term}%");
                items = items.filter(
                    purchase_orders::po_number
                        .like(pattern.clone())
                        .or(purchase_orders::vendor.like(pattern)),
                );
            }

            items
        };

        let total = filtered().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = filtered().order((
            purchase_orders::updated_at.desc(),
            purchase_orders::id.desc(),
        ));
        if let Some(page) = &query.pagination {
            items = items.limit(page.limit as i64).offset(page.offset() as i64);
        }

        let items = items
            .load::<DbPurchaseOrder>(&mut conn)?
            .into_iter()
            .map(|order| PurchaseOrder::try_from(order).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total, items))
    }
}

impl PurchaseOrderWriter for DieselRepository {
    fn create_purchase_order(
        &self,
        new_order: &NewPurchaseOrder,
    ) -> RepositoryResult<PurchaseOrder> {
        use crate::schema::purchase_orders;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let tenant_id = new_order.tenant_id.get();

            let po_number = match &new_order.po_number {
                Some(number) => number.clone(),
                None => {
                    let count = purchase_orders::table
                        .filter(purchase_orders::tenant_id.eq(tenant_id))
                        .count()
                        .get_result::<i64>(conn)?;
                    next_number(
                        DocumentKind::PurchaseOrder.number_prefix(),
                        count,
                        |candidate| {
                            Ok(diesel::select(exists(
                                purchase_orders::table
                                    .filter(purchase_orders::tenant_id.eq(tenant_id))
                                    .filter(purchase_orders::po_number.eq(candidate)),
                            ))
                            .get_result::<bool>(&mut *conn)?)
                        },
                    )?
                }
            };

            let created = diesel::insert_into(purchase_orders::table)
                .values(&DbNewPurchaseOrder::new(new_order, &po_number))
                .get_result::<DbPurchaseOrder>(conn)?;

            insert_lines(conn, DocumentKind::PurchaseOrder, created.id, &new_order.line_items)?;
            recalculate_totals(conn, DocumentKind::PurchaseOrder, created.id)?;

            reload(conn, created.id, tenant_id)
        })
    }

    fn update_purchase_order(
        &self,
        id: PurchaseOrderId,
        tenant_id: TenantId,
        updates: &UpdatePurchaseOrder,
    ) -> RepositoryResult<PurchaseOrder> {
        use crate::schema::purchase_orders;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let changes = DbUpdatePurchaseOrder::from_domain(updates, Utc::now().naive_utc());
            let updated = diesel::update(
                purchase_orders::table
                    .filter(purchase_orders::id.eq(id.get()))
                    .filter(purchase_orders::tenant_id.eq(tenant_id.get())),
            )
            .set(&changes)
            .execute(conn)?;
            if updated == 0 {
                return Err(RepositoryError::NotFound);
            }

            if let Some(lines) = &updates.line_items {
                replace_lines(conn, DocumentKind::PurchaseOrder, id.get(), lines)?;
            }
            recalculate_totals(conn, DocumentKind::PurchaseOrder, id.get())?;

            reload(conn, id.get(), tenant_id.get())
        })
    }

    fn delete_purchase_order(
        &self,
        id: PurchaseOrderId,
        tenant_id: TenantId,
    ) -> RepositoryResult<()> {
        use crate::schema::purchase_orders;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let deleted = diesel::delete(
                purchase_orders::table
                    .filter(purchase_orders::id.eq(id.get()))
                    .filter(purchase_orders::tenant_id.eq(tenant_id.get())),
            )
            .execute(conn)?;
            if deleted == 0 {
                return Err(RepositoryError::NotFound);
            }

            delete_document_lines(conn, DocumentKind::PurchaseOrder, id.get())
        })
    }

    fn set_purchase_order_status(
        &self,
        id: PurchaseOrderId,
        tenant_id: TenantId,
        status: PurchaseOrderStatus,
        received_at: Option<NaiveDateTime>,
    ) -> RepositoryResult<PurchaseOrder> {
        use crate::schema::purchase_orders;

        let mut conn = self.conn()?;

        let updated = diesel::update(
            purchase_orders::table
                .filter(purchase_orders::id.eq(id.get()))
                .filter(purchase_orders::tenant_id.eq(tenant_id.get())),
        )
        .set((
            purchase_orders::status.eq(status.as_str()),
            purchase_orders::received_at.eq(received_at),
            purchase_orders::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result::<DbPurchaseOrder>(&mut conn)?;

        Ok(PurchaseOrder::try_from(updated)?)
    }
}
