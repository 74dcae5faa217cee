//! Line items and line groups of estimates, invoices and purchase orders.
//!
//! Every operation first checks the parent document belongs to the caller's
//! tenant; the repository recalculates totals after each mutation.

use crate::domain::bundle::flatten_bundle;
use crate::domain::document::{
    DocumentKind, DocumentLines, LineGroup, LineItem, MAX_SORT_ORDER, NewLineGroup, NewLineItem,
};
use crate::domain::permission::Permission;
use crate::domain::types::{
    BundleId, EstimateId, InvoiceId, LineGroupId, LineItemId, PurchaseOrderId,
};
use crate::forms::documents::{AddBundleForm, LineItemForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{
    BundleReader, DocumentReader, DocumentWriter, EstimateReader, InvoiceReader,
    PurchaseOrderReader,
};
use crate::services::invoices::ensure_editable;
use crate::services::{ServiceError, ServiceResult, ensure_permission, log_failure};

/// Permission needed to read and to change lines of `kind`.
fn permissions(kind: DocumentKind) -> (Permission, Permission) {
    match kind {
        DocumentKind::Estimate => (Permission::EstimatesViewAll, Permission::EstimatesEdit),
        DocumentKind::Invoice => (Permission::InvoicesViewAll, Permission::InvoicesEdit),
        DocumentKind::PurchaseOrder => (
            Permission::PurchaseOrdersViewAll,
            Permission::PurchaseOrdersEdit,
        ),
    }
}

/// Fails with [`ServiceError::NotFound`] unless document `id` of `kind`
/// exists in the caller's tenant.
pub(crate) fn ensure_document<R>(
    repo: &R,
    user: &AuthenticatedUser,
    kind: DocumentKind,
    id: i32,
) -> ServiceResult<()>
where
    R: EstimateReader + InvoiceReader + PurchaseOrderReader + ?Sized,
{
    let found = match kind {
        DocumentKind::Estimate => {
            let id = EstimateId::new(id).map_err(|_| ServiceError::NotFound)?;
            repo.get_estimate_by_id(id, user.tenant_id)
                .map_err(log_failure("load estimate"))?
                .is_some()
        }
        DocumentKind::Invoice => {
            let id = InvoiceId::new(id).map_err(|_| ServiceError::NotFound)?;
            repo.get_invoice_by_id(id, user.tenant_id)
                .map_err(log_failure("load invoice"))?
                .is_some()
        }
        DocumentKind::PurchaseOrder => {
            let id = PurchaseOrderId::new(id).map_err(|_| ServiceError::NotFound)?;
            repo.get_purchase_order_by_id(id, user.tenant_id)
                .map_err(log_failure("load purchase order"))?
                .is_some()
        }
    };

    if found {
        Ok(())
    } else {
        Err(ServiceError::NotFound)
    }
}

/// Like [`ensure_document`], and additionally rejects paid and void
/// invoices.
fn ensure_editable_document<R>(
    repo: &R,
    user: &AuthenticatedUser,
    kind: DocumentKind,
    id: i32,
) -> ServiceResult<()>
where
    R: EstimateReader + InvoiceReader + PurchaseOrderReader + ?Sized,
{
    if kind != DocumentKind::Invoice {
        return ensure_document(repo, user, kind, id);
    }
    let id = InvoiceId::new(id).map_err(|_| ServiceError::NotFound)?;
    let invoice = repo
        .get_invoice_by_id(id, user.tenant_id)
        .map_err(log_failure("load invoice"))?
        .ok_or(ServiceError::NotFound)?;
    ensure_editable(&invoice)
}

fn line_id(id: i32) -> ServiceResult<LineItemId> {
    LineItemId::new(id).map_err(|_| ServiceError::NotFound)
}

fn group_id(id: i32) -> ServiceResult<LineGroupId> {
    LineGroupId::new(id).map_err(|_| ServiceError::NotFound)
}

/// A submitted line may only join a group of the same document.
fn check_group<R>(
    repo: &R,
    kind: DocumentKind,
    document_id: i32,
    line: &NewLineItem,
) -> ServiceResult<()>
where
    R: DocumentReader + ?Sized,
{
    let Some(group) = line.group_id else {
        return Ok(());
    };
    let lines = repo
        .list_document_lines(kind, document_id)
        .map_err(log_failure("load document lines"))?;
    if lines.groups.iter().any(|existing| existing.id == group) {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "Group {group} does not belong to this document"
        )))
    }
}

pub fn list_lines<R>(
    repo: &R,
    user: &AuthenticatedUser,
    kind: DocumentKind,
    document_id: i32,
) -> ServiceResult<DocumentLines>
where
    R: DocumentReader + EstimateReader + InvoiceReader + PurchaseOrderReader + ?Sized,
{
    ensure_permission(user, permissions(kind).0)?;
    ensure_document(repo, user, kind, document_id)?;
    repo.list_document_lines(kind, document_id)
        .map_err(log_failure("load document lines"))
}

pub fn add_line<R>(
    repo: &R,
    user: &AuthenticatedUser,
    kind: DocumentKind,
    document_id: i32,
    form: LineItemForm,
) -> ServiceResult<LineItem>
where
    R: DocumentReader
        + DocumentWriter
        + EstimateReader
        + InvoiceReader
        + PurchaseOrderReader
        + ?Sized,
{
    ensure_permission(user, permissions(kind).1)?;
    ensure_editable_document(repo, user, kind, document_id)?;

    let position = repo
        .list_document_lines(kind, document_id)
        .map_err(log_failure("load document lines"))?
        .next_sort_order();
    let line = form.into_line(position)?;
    check_group(repo, kind, document_id, &line)?;

    repo.add_line_item(kind, document_id, &line)
        .map_err(log_failure("add line item"))
}

pub fn update_line<R>(
    repo: &R,
    user: &AuthenticatedUser,
    kind: DocumentKind,
    document_id: i32,
    id: i32,
    form: LineItemForm,
) -> ServiceResult<LineItem>
where
    R: DocumentReader
        + DocumentWriter
        + EstimateReader
        + InvoiceReader
        + PurchaseOrderReader
        + ?Sized,
{
    ensure_permission(user, permissions(kind).1)?;
    ensure_editable_document(repo, user, kind, document_id)?;
    let id = line_id(id)?;
    let current = repo
        .list_document_lines(kind, document_id)
        .map_err(log_failure("load document lines"))?
        .line_items
        .into_iter()
        .find(|line| line.id == id)
        .ok_or(ServiceError::NotFound)?;
    let line = form.into_line(current.sort_order)?;
    check_group(repo, kind, document_id, &line)?;

    repo.update_line_item(kind, document_id, id, &line)
        .map_err(log_failure("update line item"))
}

pub fn delete_line<R>(
    repo: &R,
    user: &AuthenticatedUser,
    kind: DocumentKind,
    document_id: i32,
    id: i32,
) -> ServiceResult<()>
where
    R: DocumentWriter + EstimateReader + InvoiceReader + PurchaseOrderReader + ?Sized,
{
    ensure_permission(user, permissions(kind).1)?;
    ensure_editable_document(repo, user, kind, document_id)?;
    repo.delete_line_item(kind, document_id, line_id(id)?)
        .map_err(log_failure("delete line item"))
}

/// Name and flattened lines of bundle `id` as they stand in the catalog now.
fn expand_bundle<R>(
    repo: &R,
    user: &AuthenticatedUser,
    bundle_id: BundleId,
) -> ServiceResult<(String, Vec<NewLineItem>)>
where
    R: BundleReader + ?Sized,
{
    let bundle = repo
        .get_bundle_by_id(bundle_id, user.tenant_id)
        .map_err(log_failure("load bundle"))?
        .ok_or(ServiceError::NotFound)?;
    let catalog = repo
        .load_bundle_catalog(user.tenant_id)
        .map_err(log_failure("load bundle catalog"))?;

    let lines: Vec<NewLineItem> = flatten_bundle(bundle_id, &catalog)?
        .iter()
        .enumerate()
        .map(|(index, flat)| {
            NewLineItem::from_flat_line(flat, i32::try_from(index).unwrap_or(MAX_SORT_ORDER))
        })
        .collect();
    if lines.is_empty() {
        return Err(ServiceError::Validation(
            "Bundle has no items to add".to_string(),
        ));
    }

    Ok((bundle.bundle.name.into_inner(), lines))
}

/// Expands a bundle into a new group of lines appended to the document.
pub fn add_bundle<R>(
    repo: &R,
    user: &AuthenticatedUser,
    kind: DocumentKind,
    document_id: i32,
    form: AddBundleForm,
) -> ServiceResult<LineGroup>
where
    R: BundleReader
        + DocumentWriter
        + EstimateReader
        + InvoiceReader
        + PurchaseOrderReader
        + ?Sized,
{
    ensure_permission(user, permissions(kind).1)?;
    ensure_editable_document(repo, user, kind, document_id)?;

    let bundle_id = BundleId::new(form.bundle_id).map_err(|_| ServiceError::NotFound)?;
    let (name, lines) = expand_bundle(repo, user, bundle_id)?;
    let group = NewLineGroup {
        name: name.clone(),
        source_bundle_id: Some(bundle_id),
        source_bundle_name: Some(name),
    };

    let created = repo
        .add_grouped_lines(user.tenant_id, kind, document_id, &group, &lines)
        .map_err(log_failure("add bundle lines"))?;

    log::info!(
        "User {} added bundle {bundle_id} to {} {document_id} ({} lines)",
        user.id,
        kind.as_str(),
        lines.len()
    );
    Ok(created)
}

/// Rebuilds a bundle group from the bundle's current definition.
///
/// Manual edits to the group's lines are discarded.
pub fn refresh_group_from_bundle<R>(
    repo: &R,
    user: &AuthenticatedUser,
    kind: DocumentKind,
    document_id: i32,
    id: i32,
) -> ServiceResult<(LineGroup, Vec<LineItem>)>
where
    R: BundleReader
        + DocumentReader
        + DocumentWriter
        + EstimateReader
        + InvoiceReader
        + PurchaseOrderReader
        + ?Sized,
{
    ensure_permission(user, permissions(kind).1)?;
    ensure_editable_document(repo, user, kind, document_id)?;
    let id = group_id(id)?;

    let group = repo
        .list_document_lines(kind, document_id)
        .map_err(log_failure("load document lines"))?
        .groups
        .into_iter()
        .find(|group| group.id == id)
        .ok_or(ServiceError::NotFound)?;
    let Some(bundle_id) = group.source_bundle_id else {
        return Err(ServiceError::Validation(
            "Group is not linked to a bundle template".to_string(),
        ));
    };

    let (name, lines) = expand_bundle(repo, user, bundle_id)?;
    let refreshed = repo
        .refresh_line_group(kind, document_id, id, &name, &lines)
        .map_err(log_failure("refresh line group"))?;

    let line_items = repo
        .list_document_lines(kind, document_id)
        .map_err(log_failure("load document lines"))?
        .line_items
        .into_iter()
        .filter(|line| line.group_id == Some(id))
        .collect();

    log::info!(
        "User {} rebuilt group {id} of {} {document_id} from bundle {bundle_id}",
        user.id,
        kind.as_str()
    );
    Ok((refreshed, line_items))
}

/// Removes a group and keeps its lines.
pub fn ungroup<R>(
    repo: &R,
    user: &AuthenticatedUser,
    kind: DocumentKind,
    document_id: i32,
    id: i32,
) -> ServiceResult<()>
where
    R: DocumentWriter + EstimateReader + InvoiceReader + PurchaseOrderReader + ?Sized,
{
    ensure_permission(user, permissions(kind).1)?;
    ensure_editable_document(repo, user, kind, document_id)?;
    repo.ungroup_lines(kind, document_id, group_id(id)?)
        .map_err(log_failure("ungroup lines"))
}

/// Removes a group together with its lines.
pub fn delete_group<R>(
    repo: &R,
    user: &AuthenticatedUser,
    kind: DocumentKind,
    document_id: i32,
    id: i32,
) -> ServiceResult<()>
where
    R: DocumentWriter + EstimateReader + InvoiceReader + PurchaseOrderReader + ?Sized,
{
    ensure_permission(user, permissions(kind).1)?;
    ensure_editable_document(repo, user, kind, document_id)?;
    repo.delete_line_group(kind, document_id, group_id(id)?)
        .map_err(log_failure("delete line group"))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::bundle::{
        Bundle, BundleCatalog, BundleWithComponents, ComponentSpec, ComponentTarget,
    };
    use crate::domain::invoice::{Invoice, InvoiceStatus};
    use crate::domain::item::{Item, ItemKind};
    use crate::domain::purchase_order::{PurchaseOrder, PurchaseOrderStatus};
    use crate::domain::types::{
        BundleName, Cents, ClientId, ItemId, ItemName, PublicId, VendorName,
    };
    use crate::domain::user::Role;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{admin_user, tenant, user_with_role};

    fn purchase_order(id: i32) -> PurchaseOrder {
        let now = Utc::now().naive_utc();
        PurchaseOrder {
            id: PurchaseOrderId::new(id).unwrap(),
            tenant_id: tenant(),
            job_id: None,
            po_number: "PO-000001".into(),
            vendor: VendorName::new("Lumber Co").unwrap(),
            status: PurchaseOrderStatus::Draft,
            subtotal: Cents::ZERO,
            tax_rate: 0.0,
            tax: Cents::ZERO,
            discount: Cents::ZERO,
            total: Cents::ZERO,
            notes: None,
            received_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn bundle(id: i32) -> BundleWithComponents {
        let now = Utc::now().naive_utc();
        BundleWithComponents {
            bundle: Bundle {
                id: BundleId::new(id).unwrap(),
                tenant_id: tenant(),
                name: BundleName::new("Window trim kit").unwrap(),
                description: None,
                created_at: now,
                updated_at: now,
            },
            components: Vec::new(),
        }
    }

    fn catalog() -> BundleCatalog {
        let now = Utc::now().naive_utc();
        let item_id = ItemId::new(8).unwrap();
        let mut catalog = BundleCatalog::default();
        catalog.components.insert(
            BundleId::new(2).unwrap(),
            vec![ComponentSpec {
                target: ComponentTarget::Item(item_id),
                quantity: 4.0,
                unit_price_override: None,
                unit_cost_override: None,
                sort_order: 0,
            }],
        );
        catalog.items.insert(
            item_id,
            Item {
                id: item_id,
                tenant_id: tenant(),
                name: ItemName::new("Casing").unwrap(),
                sku: None,
                kind: ItemKind::Material,
                description: None,
                unit: "ft".into(),
                unit_price: Cents::new(300),
                unit_cost: None,
                taxable: true,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        );
        catalog
    }

    fn group(name: &str) -> LineGroup {
        LineGroup {
            id: LineGroupId::new(5).unwrap(),
            tenant_id: tenant(),
            document_type: DocumentKind::PurchaseOrder,
            document_id: 3,
            name: name.to_string(),
            source_bundle_id: BundleId::new(2).ok(),
            source_bundle_name: Some(name.to_string()),
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn bundle_lines_are_grouped_under_bundle_name() {
        let mut repo = MockRepository::new();
        repo.expect_get_purchase_order_by_id()
            .returning(|id, _| Ok(Some(purchase_order(id.get()))));
        repo.expect_get_bundle_by_id()
            .returning(|id, _| Ok(Some(bundle(id.get()))));
        repo.expect_load_bundle_catalog().returning(|_| Ok(catalog()));
        repo.expect_add_grouped_lines()
            .withf(|_, kind, document_id, group, lines| {
                *kind == DocumentKind::PurchaseOrder
                    && *document_id == 3
                    && group.name == "Window trim kit"
                    && group.source_bundle_name.as_deref() == Some("Window trim kit")
                    && lines.len() == 1
                    && lines[0].description == "Casing"
                    && lines[0].quantity == 4.0
            })
            .times(1)
            .returning(|_, _, _, group, _| Ok(self::group(&group.name)));

        let created = add_bundle(
            &repo,
            &admin_user(),
            DocumentKind::PurchaseOrder,
            3,
            AddBundleForm { bundle_id: 2 },
        )
        .unwrap();

        assert_eq!(created.name, "Window trim kit");
    }

    #[test]
    fn lines_of_foreign_documents_are_hidden() {
        let mut repo = MockRepository::new();
        repo.expect_get_purchase_order_by_id().returning(|_, _| Ok(None));
        repo.expect_delete_line_group().times(0);

        let result = delete_group(&repo, &admin_user(), DocumentKind::PurchaseOrder, 3, 5);

        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[test]
    fn editing_lines_needs_document_permission() {
        let repo = MockRepository::new();

        let result = ungroup(
            &repo,
            &user_with_role(Role::Field),
            DocumentKind::Estimate,
            1,
            1,
        );

        assert!(matches!(result, Err(ServiceError::Forbidden)));
    }

    #[test]
    fn new_line_lands_after_existing_ones() {
        let mut repo = MockRepository::new();
        repo.expect_get_purchase_order_by_id()
            .returning(|id, _| Ok(Some(purchase_order(id.get()))));
        repo.expect_list_document_lines().returning(|_, _| {
            Ok(DocumentLines {
                line_items: vec![LineItem {
                    id: LineItemId::new(1).unwrap(),
                    group_id: None,
                    source_item_id: None,
                    description: "Existing".into(),
                    quantity: 1.0,
                    unit_price: Cents::new(100),
                    unit_cost: None,
                    total: Cents::new(100),
                    taxable: true,
                    is_visible_to_client: true,
                    sort_order: 4,
                }],
                groups: Vec::new(),
            })
        });
        repo.expect_add_line_item()
            .withf(|_, _, line| line.sort_order == 5)
            .times(1)
            .returning(|_, _, line| {
                Ok(LineItem {
                    id: LineItemId::new(2).unwrap(),
                    group_id: None,
                    source_item_id: None,
                    description: line.description.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    unit_cost: None,
                    total: line.total(),
                    taxable: line.taxable,
                    is_visible_to_client: true,
                    sort_order: line.sort_order,
                })
            });

        let form: LineItemForm =
            serde_json::from_str(r#"{"description":"Shims","quantity":2,"unitPrice":150}"#)
                .unwrap();
        let line = add_line(&repo, &admin_user(), DocumentKind::PurchaseOrder, 3, form).unwrap();

        assert_eq!(line.total, Cents::new(300));
    }

    fn existing_line(id: i32, sort_order: i32) -> LineItem {
        LineItem {
            id: LineItemId::new(id).unwrap(),
            group_id: None,
            source_item_id: None,
            description: "Existing".into(),
            quantity: 1.0,
            unit_price: Cents::new(100),
            unit_cost: None,
            total: Cents::new(100),
            taxable: true,
            is_visible_to_client: true,
            sort_order,
        }
    }

    fn paid_invoice() -> Invoice {
        let now = Utc::now().naive_utc();
        Invoice {
            id: InvoiceId::new(7).unwrap(),
            tenant_id: tenant(),
            public_id: PublicId::new(),
            client_id: ClientId::new(2).unwrap(),
            job_id: None,
            estimate_id: None,
            invoice_number: "INV-000007".into(),
            title: "Crown molding".into(),
            status: InvoiceStatus::Paid,
            subtotal: Cents::new(10_000),
            tax_rate: 0.0,
            tax: Cents::ZERO,
            discount: Cents::ZERO,
            total: Cents::new(10_000),
            paid: Cents::new(10_000),
            balance: Cents::ZERO,
            due_date: None,
            paid_at: Some(now),
            progress_billing_mode: None,
            progress_billing_percent: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn paid_invoice_lines_are_locked() {
        let mut repo = MockRepository::new();
        repo.expect_get_invoice_by_id()
            .returning(|_, _| Ok(Some(paid_invoice())));
        repo.expect_add_line_item().times(0);
        repo.expect_delete_line_group().times(0);

        let form: LineItemForm =
            serde_json::from_str(r#"{"description":"Extra","unitPrice":5000}"#).unwrap();
        let added = add_line(&repo, &admin_user(), DocumentKind::Invoice, 7, form);
        let removed = delete_group(&repo, &admin_user(), DocumentKind::Invoice, 7, 1);

        assert!(
            matches!(added, Err(ServiceError::Validation(message)) if message == "Cannot edit paid invoice")
        );
        assert!(matches!(removed, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn paid_invoice_lines_stay_readable() {
        let mut repo = MockRepository::new();
        repo.expect_get_invoice_by_id()
            .returning(|_, _| Ok(Some(paid_invoice())));
        repo.expect_list_document_lines().returning(|_, _| {
            Ok(DocumentLines {
                line_items: vec![existing_line(1, 0)],
                groups: Vec::new(),
            })
        });

        let lines = list_lines(&repo, &admin_user(), DocumentKind::Invoice, 7).unwrap();

        assert_eq!(lines.line_items.len(), 1);
    }

    #[test]
    fn line_update_keeps_position_when_omitted() {
        let mut repo = MockRepository::new();
        repo.expect_get_purchase_order_by_id()
            .returning(|id, _| Ok(Some(purchase_order(id.get()))));
        repo.expect_list_document_lines().returning(|_, _| {
            Ok(DocumentLines {
                line_items: vec![existing_line(1, 0), existing_line(3, 2)],
                groups: Vec::new(),
            })
        });
        repo.expect_update_line_item()
            .withf(|_, _, id, line| id.get() == 3 && line.sort_order == 2 && line.quantity == 4.0)
            .times(1)
            .returning(|_, _, id, line| {
                Ok(LineItem {
                    quantity: line.quantity,
                    ..existing_line(id.get(), line.sort_order)
                })
            });

        let form: LineItemForm =
            serde_json::from_str(r#"{"description":"Existing","quantity":4,"unitPrice":100}"#)
                .unwrap();
        let line =
            update_line(&repo, &admin_user(), DocumentKind::PurchaseOrder, 3, 3, form).unwrap();

        assert_eq!(line.sort_order, 2);
    }

    #[test]
    fn unknown_line_update_is_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_get_purchase_order_by_id()
            .returning(|id, _| Ok(Some(purchase_order(id.get()))));
        repo.expect_list_document_lines()
            .returning(|_, _| Ok(DocumentLines::default()));
        repo.expect_update_line_item().times(0);

        let form: LineItemForm =
            serde_json::from_str(r#"{"description":"Shims","unitPrice":150}"#).unwrap();
        let result = update_line(&repo, &admin_user(), DocumentKind::PurchaseOrder, 3, 9, form);

        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[test]
    fn foreign_group_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_purchase_order_by_id()
            .returning(|id, _| Ok(Some(purchase_order(id.get()))));
        repo.expect_list_document_lines().returning(|_, _| {
            Ok(DocumentLines {
                line_items: vec![existing_line(1, 0)],
                groups: Vec::new(),
            })
        });
        repo.expect_update_line_item().times(0);

        let form: LineItemForm =
            serde_json::from_str(r#"{"description":"Shims","unitPrice":150,"groupId":9}"#).unwrap();
        let result = update_line(&repo, &admin_user(), DocumentKind::PurchaseOrder, 3, 1, form);

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn group_is_rebuilt_from_current_bundle() {
        let mut repo = MockRepository::new();
        repo.expect_get_purchase_order_by_id()
            .returning(|id, _| Ok(Some(purchase_order(id.get()))));
        repo.expect_list_document_lines().returning(|_, _| {
            Ok(DocumentLines {
                line_items: vec![LineItem {
                    group_id: LineGroupId::new(5).ok(),
                    ..existing_line(1, 0)
                }],
                groups: vec![group("Old kit name")],
            })
        });
        repo.expect_get_bundle_by_id()
            .returning(|id, _| Ok(Some(bundle(id.get()))));
        repo.expect_load_bundle_catalog().returning(|_| Ok(catalog()));
        repo.expect_refresh_line_group()
            .withf(|_, _, group_id, name, lines| {
                group_id.get() == 5
                    && name.to_string() == "Window trim kit"
                    && lines.len() == 1
                    && lines[0].unit_price == Cents::new(300)
            })
            .times(1)
            .returning(|_, _, _, name, _| Ok(group(name)));

        let (refreshed, lines) =
            refresh_group_from_bundle(&repo, &admin_user(), DocumentKind::PurchaseOrder, 3, 5)
                .unwrap();

        assert_eq!(refreshed.name, "Window trim kit");
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn group_without_bundle_cannot_be_rebuilt() {
        let mut repo = MockRepository::new();
        repo.expect_get_purchase_order_by_id()
            .returning(|id, _| Ok(Some(purchase_order(id.get()))));
        repo.expect_list_document_lines().returning(|_, _| {
            Ok(DocumentLines {
                line_items: Vec::new(),
                groups: vec![LineGroup {
                    source_bundle_id: None,
                    ..group("Manual group")
                }],
            })
        });
        repo.expect_refresh_line_group().times(0);

        let result =
            refresh_group_from_bundle(&repo, &admin_user(), DocumentKind::PurchaseOrder, 3, 5);

        assert!(
            matches!(result, Err(ServiceError::Validation(message)) if message == "Group is not linked to a bundle template")
        );
    }
}
