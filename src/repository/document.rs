//! Line items, line groups and totals shared by every priced document.

use chrono::Utc;
use diesel::dsl::{max, min};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::{
        document::{
            DocumentKind, DocumentLines, LineGroup, LineItem, NewLineGroup, NewLineItem,
            balance_due, compute_totals, format_number,
        },
        types::{Cents, LineGroupId, LineItemId, TenantId},
    },
    models::document::{
        LineGroup as DbLineGroup, LineItem as DbLineItem, NewLineGroupRow, NewLineItemRow,
        UpdateLineItem,
    },
    repository::{
        DieselRepository, DocumentReader, DocumentWriter,
        errors::{RepositoryError, RepositoryResult},
    },
};

/// Next free sequential number for `prefix`, starting after `count`.
///
/// Numbers freed by deletions may already be taken further up the sequence,
/// so candidates are tried until one is unused.
pub(crate) fn next_number<F>(prefix: &str, count: i64, mut exists: F) -> RepositoryResult<String>
where
    F: FnMut(&str) -> RepositoryResult<bool>,
{
    let mut sequence = count + 1;
    loop {
        let candidate = format_number(prefix, sequence);
        if !exists(&candidate)? {
            return Ok(candidate);
        }
        sequence += 1;
    }
}

pub(crate) fn load_lines(
    conn: &mut SqliteConnection,
    kind: DocumentKind,
    document_id: i32,
) -> RepositoryResult<DocumentLines> {
    use crate::schema::{line_groups, line_items};

    let line_items = line_items::table
        .filter(line_items::document_type.eq(kind.as_str()))
        .filter(line_items::document_id.eq(document_id))
        .order((line_items::sort_order.asc(), line_items::id.asc()))
        .load::<DbLineItem>(conn)?
        .into_iter()
        .map(|line| LineItem::try_from(line).map_err(RepositoryError::from))
        .collect::<RepositoryResult<Vec<_>>>()?;

    let groups = line_groups::table
        .filter(line_groups::document_type.eq(kind.as_str()))
        .filter(line_groups::document_id.eq(document_id))
        .order(line_groups::id.asc())
        .load::<DbLineGroup>(conn)?
        .into_iter()
        .map(|group| LineGroup::try_from(group).map_err(RepositoryError::from))
        .collect::<RepositoryResult<Vec<_>>>()?;

    Ok(DocumentLines { line_items, groups })
}

pub(crate) fn insert_lines(
    conn: &mut SqliteConnection,
    kind: DocumentKind,
    document_id: i32,
    lines: &[NewLineItem],
) -> RepositoryResult<()> {
    use crate::schema::line_items;

    if lines.is_empty() {
        return Ok(());
    }

    let rows: Vec<NewLineItemRow> = lines
        .iter()
        .map(|line| NewLineItemRow::new(kind, document_id, line))
        .collect();

    diesel::insert_into(line_items::table)
        .values(&rows)
        .execute(conn)?;

    Ok(())
}

/// Removes every line and group of a document.
pub(crate) fn delete_document_lines(
    conn: &mut SqliteConnection,
    kind: DocumentKind,
    document_id: i32,
) -> RepositoryResult<()> {
    use crate::schema::{line_groups, line_items};

    diesel::delete(
        line_items::table
            .filter(line_items::document_type.eq(kind.as_str()))
            .filter(line_items::document_id.eq(document_id)),
    )
    .execute(conn)?;

    diesel::delete(
        line_groups::table
            .filter(line_groups::document_type.eq(kind.as_str()))
            .filter(line_groups::document_id.eq(document_id)),
    )
    .execute(conn)?;

    Ok(())
}

pub(crate) fn replace_lines(
    conn: &mut SqliteConnection,
    kind: DocumentKind,
    document_id: i32,
    lines: &[NewLineItem],
) -> RepositoryResult<()> {
    delete_document_lines(conn, kind, document_id)?;
    insert_lines(conn, kind, document_id, lines)
}

/// Re-sums the lines of a document and stores subtotal, tax and total on
/// its header row. Invoices also get their balance refreshed.
pub(crate) fn recalculate_totals(
    conn: &mut SqliteConnection,
    kind: DocumentKind,
    document_id: i32,
) -> RepositoryResult<()> {
    use crate::schema::{estimates, invoices, line_items, purchase_orders};

    let line_totals = line_items::table
        .filter(line_items::document_type.eq(kind.as_str()))
        .filter(line_items::document_id.eq(document_id))
        .select(line_items::total_cents)
        .load::<i64>(conn)?
        .into_iter()
        .map(Cents::new);

    let now = Utc::now().naive_utc();

    let updated = match kind {
        DocumentKind::Estimate => {
            let (discount, tax_rate) = estimates::table
                .find(document_id)
                .select((estimates::discount_cents, estimates::tax_rate))
                .first::<(i64, f64)>(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;
            let totals = compute_totals(line_totals, Cents::new(discount), tax_rate);

            diesel::update(estimates::table.find(document_id))
                .set((
                    estimates::subtotal_cents.eq(totals.subtotal.get()),
                    estimates::tax_cents.eq(totals.tax.get()),
                    estimates::total_cents.eq(totals.total.get()),
                    estimates::updated_at.eq(now),
                ))
                .execute(conn)?
        }
        DocumentKind::Invoice => {
            let (discount, tax_rate, paid) = invoices::table
                .find(document_id)
                .select((
                    invoices::discount_cents,
                    invoices::tax_rate,
                    invoices::paid_cents,
                ))
                .first::<(i64, f64, i64)>(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;
            let totals = compute_totals(line_totals, Cents::new(discount), tax_rate);

            diesel::update(invoices::table.find(document_id))
                .set((
                    invoices::subtotal_cents.eq(totals.subtotal.get()),
                    invoices::tax_cents.eq(totals.tax.get()),
                    invoices::total_cents.eq(totals.total.get()),
                    invoices::balance_cents
                        .eq(balance_due(totals.total, Cents::new(paid)).get()),
                    invoices::updated_at.eq(now),
                ))
                .execute(conn)?
        }
        DocumentKind::PurchaseOrder => {
            let (discount, tax_rate) = purchase_orders::table
                .find(document_id)
                .select((purchase_orders::discount_cents, purchase_orders::tax_rate))
                .first::<(i64, f64)>(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;
            let totals = compute_totals(line_totals, Cents::new(discount), tax_rate);

            diesel::update(purchase_orders::table.find(document_id))
                .set((
                    purchase_orders::subtotal_cents.eq(totals.subtotal.get()),
                    purchase_orders::tax_cents.eq(totals.tax.get()),
                    purchase_orders::total_cents.eq(totals.total.get()),
                    purchase_orders::updated_at.eq(now),
                ))
                .execute(conn)?
        }
    };

    if updated == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

fn find_line(
    conn: &mut SqliteConnection,
    kind: DocumentKind,
    document_id: i32,
    line_id: LineItemId,
) -> RepositoryResult<DbLineItem> {
    use crate::schema::line_items;

    line_items::table
        .filter(line_items::id.eq(line_id.get()))
        .filter(line_items::document_type.eq(kind.as_str()))
        .filter(line_items::document_id.eq(document_id))
        .first::<DbLineItem>(conn)
        .optional()?
        .ok_or(RepositoryError::NotFound)
}

fn ensure_group(
    conn: &mut SqliteConnection,
    kind: DocumentKind,
    document_id: i32,
    group_id: LineGroupId,
) -> RepositoryResult<()> {
    use crate::schema::line_groups;

    let found = line_groups::table
        .filter(line_groups::id.eq(group_id.get()))
        .filter(line_groups::document_type.eq(kind.as_str()))
        .filter(line_groups::document_id.eq(document_id))
        .select(line_groups::id)
        .first::<i32>(conn)
        .optional()?;

    match found {
        Some(_) => Ok(()),
        None => Err(RepositoryError::NotFound),
    }
}

impl DocumentReader for DieselRepository {
    fn list_document_lines(
        &self,
        kind: DocumentKind,
        document_id: i32,
    ) -> RepositoryResult<DocumentLines> {
        let mut conn = self.conn()?;
        load_lines(&mut conn, kind, document_id)
    }
}

impl DocumentWriter for DieselRepository {
    fn add_line_item(
        &self,
        kind: DocumentKind,
        document_id: i32,
        line: &NewLineItem,
    ) -> RepositoryResult<LineItem> {
        use crate::schema::line_items;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let row = NewLineItemRow::new(kind, document_id, line);
            let created = diesel::insert_into(line_items::table)
                .values(&row)
                .get_result::<DbLineItem>(conn)?;

            recalculate_totals(conn, kind, document_id)?;

            Ok(LineItem::try_from(created)?)
        })
    }

    fn update_line_item(
        &self,
        kind: DocumentKind,
        document_id: i32,
        line_id: LineItemId,
        line: &NewLineItem,
    ) -> RepositoryResult<LineItem> {
        use crate::schema::line_items;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let existing = find_line(conn, kind, document_id, line_id)?;

            let changes = UpdateLineItem::from(line);
            let updated = diesel::update(line_items::table.find(existing.id))
                .set(&changes)
                .get_result::<DbLineItem>(conn)?;

            recalculate_totals(conn, kind, document_id)?;

            Ok(LineItem::try_from(updated)?)
        })
    }

    fn delete_line_item(
        &self,
        kind: DocumentKind,
        document_id: i32,
        line_id: LineItemId,
    ) -> RepositoryResult<()> {
        use crate::schema::line_items;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let existing = find_line(conn, kind, document_id, line_id)?;
            diesel::delete(line_items::table.find(existing.id)).execute(conn)?;
            recalculate_totals(conn, kind, document_id)
        })
    }

    fn add_grouped_lines(
        &self,
        tenant_id: TenantId,
        kind: DocumentKind,
        document_id: i32,
        group: &NewLineGroup,
        lines: &[NewLineItem],
    ) -> RepositoryResult<LineGroup> {
        use crate::schema::{line_groups, line_items};

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let created = diesel::insert_into(line_groups::table)
                .values(&NewLineGroupRow {
                    tenant_id: tenant_id.get(),
                    document_type: kind.as_str(),
                    document_id,
                    name: group.name.as_str(),
                    source_bundle_id: group.source_bundle_id.map(|id| id.get()),
                    source_bundle_name: group.source_bundle_name.as_deref(),
                })
                .get_result::<DbLineGroup>(conn)?;

            let last_sort_order = line_items::table
                .filter(line_items::document_type.eq(kind.as_str()))
                .filter(line_items::document_id.eq(document_id))
                .select(max(line_items::sort_order))
                .first::<Option<i32>>(conn)?;
            let start = last_sort_order.map_or(0, |last| last.saturating_add(1));

            let group_id = LineGroupId::new(created.id)?;
            let grouped: Vec<NewLineItem> = lines
                .iter()
                .enumerate()
                .map(|(index, line)| NewLineItem {
                    group_id: Some(group_id),
                    sort_order: start.saturating_add(i32::try_from(index).unwrap_or(i32::MAX)),
                    ..line.clone()
                })
                .collect();

            insert_lines(conn, kind, document_id, &grouped)?;
            recalculate_totals(conn, kind, document_id)?;

            Ok(LineGroup::try_from(created)?)
        })
    }

    fn ungroup_lines(
        &self,
        kind: DocumentKind,
        document_id: i32,
        group_id: LineGroupId,
    ) -> RepositoryResult<()> {
        use crate::schema::{line_groups, line_items};

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            ensure_group(conn, kind, document_id, group_id)?;

            diesel::update(line_items::table.filter(line_items::group_id.eq(group_id.get())))
                .set(line_items::group_id.eq(None::<i32>))
                .execute(conn)?;
            diesel::delete(line_groups::table.find(group_id.get())).execute(conn)?;

            Ok(())
        })
    }

    fn delete_line_group(
        &self,
        kind: DocumentKind,
        document_id: i32,
        group_id: LineGroupId,
    ) -> RepositoryResult<()> {
        use crate::schema::{line_groups, line_items};

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            ensure_group(conn, kind, document_id, group_id)?;

            diesel::delete(line_items::table.filter(line_items::group_id.eq(group_id.get())))
                .execute(conn)?;
            diesel::delete(line_groups::table.find(group_id.get())).execute(conn)?;

            recalculate_totals(conn, kind, document_id)
        })
    }

    fn refresh_line_group(
        &self,
        kind: DocumentKind,
        document_id: i32,
        group_id: LineGroupId,
        name: &str,
        lines: &[NewLineItem],
    ) -> RepositoryResult<LineGroup> {
        use crate::schema::{line_groups, line_items};

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            ensure_group(conn, kind, document_id, group_id)?;

            let (first_sort_order, last_sort_order) = line_items::table
                .filter(line_items::group_id.eq(group_id.get()))
                .select((min(line_items::sort_order), max(line_items::sort_order)))
                .first::<(Option<i32>, Option<i32>)>(conn)?;

            diesel::delete(line_items::table.filter(line_items::group_id.eq(group_id.get())))
                .execute(conn)?;

            let start = match first_sort_order {
                Some(first) => first,
                None => line_items::table
                    .filter(line_items::document_type.eq(kind.as_str()))
                    .filter(line_items::document_id.eq(document_id))
                    .select(max(line_items::sort_order))
                    .first::<Option<i32>>(conn)?
                    .map_or(0, |last| last.saturating_add(1)),
            };

            // Lines after a growing group move down to make room.
            if let Some(last) = last_sort_order {
                let count = i32::try_from(lines.len()).unwrap_or(i32::MAX);
                let shift = start.saturating_add(count).saturating_sub(1).saturating_sub(last);
                if shift > 0 {
                    diesel::update(
                        line_items::table
                            .filter(line_items::document_type.eq(kind.as_str()))
                            .filter(line_items::document_id.eq(document_id))
                            .filter(line_items::sort_order.gt(last)),
                    )
                    .set(line_items::sort_order.eq(line_items::sort_order + shift))
                    .execute(conn)?;
                }
            }

            let grouped: Vec<NewLineItem> = lines
                .iter()
                .enumerate()
                .map(|(index, line)| NewLineItem {
                    group_id: Some(group_id),
                    sort_order: start.saturating_add(i32::try_from(index).unwrap_or(i32::MAX)),
                    ..line.clone()
                })
                .collect();
            insert_lines(conn, kind, document_id, &grouped)?;

            let updated = diesel::update(line_groups::table.find(group_id.get()))
                .set((
                    line_groups::name.eq(name),
                    line_groups::source_bundle_name.eq(Some(name)),
                ))
                .get_result::<DbLineGroup>(conn)?;

            recalculate_totals(conn, kind, document_id)?;

            Ok(LineGroup::try_from(updated)?)
        })
    }
}
