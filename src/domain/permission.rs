//! Role based access control.
//!
//! Every role carries a fixed default permission set. Permission keys follow
//! the `module:action` convention and are what the API reports back to
//! clients from `GET /api/auth/permissions`.

use crate::domain::types::string_enum;
use crate::domain::user::Role;

string_enum!(
    /// A single `module:action` capability.
    Permission {
        ClientsCreate => "clients:create",
        ClientsEdit => "clients:edit",
        ClientsDelete => "clients:delete",
        ClientsViewAll => "clients:view_all",
        LeadsCreate => "leads:create",
        LeadsEdit => "leads:edit",
        LeadsDelete => "leads:delete",
        LeadsViewAll => "leads:view_all",
        JobsCreate => "jobs:create",
        JobsEdit => "jobs:edit",
        JobsDelete => "jobs:delete",
        JobsViewAll => "jobs:view_all",
        EstimatesCreate => "estimates:create",
        EstimatesEdit => "estimates:edit",
        EstimatesDelete => "estimates:delete",
        EstimatesViewAll => "estimates:view_all",
        InvoicesCreate => "invoices:create",
        InvoicesEdit => "invoices:edit",
        InvoicesDelete => "invoices:delete",
        InvoicesViewAll => "invoices:view_all",
        PaymentsView => "payments:view",
        PaymentsRefund => "payments:refund",
        PurchaseOrdersCreate => "purchase_orders:create",
        PurchaseOrdersEdit => "purchase_orders:edit",
        PurchaseOrdersDelete => "purchase_orders:delete",
        PurchaseOrdersViewAll => "purchase_orders:view_all",
        ItemsCreate => "items:create",
        ItemsEdit => "items:edit",
        ItemsDelete => "items:delete",
        ItemsViewAll => "items:view_all",
        DispatchView => "dispatch:view",
        DispatchAssign => "dispatch:assign",
        IssuesCreate => "issues:create",
        IssuesEdit => "issues:edit",
        IssuesDelete => "issues:delete",
        IssuesViewAll => "issues:view_all",
        TasksCreate => "tasks:create",
        TasksEdit => "tasks:edit",
        TasksDelete => "tasks:delete",
        TasksViewAll => "tasks:view_all",
        ReportsView => "reports:view",
        SettingsManage => "settings:manage",
        UsersInvite => "users:invite",
        UsersEdit => "users:edit",
        UsersDelete => "users:delete",
    }
);

use Permission::*;

const OFFICE: &[Permission] = &[
    ClientsCreate,
    ClientsEdit,
    ClientsViewAll,
    LeadsCreate,
    LeadsEdit,
    LeadsViewAll,
    JobsCreate,
    JobsEdit,
    JobsViewAll,
    EstimatesCreate,
    EstimatesEdit,
    EstimatesViewAll,
    InvoicesCreate,
    InvoicesEdit,
    InvoicesViewAll,
    PaymentsView,
    PurchaseOrdersCreate,
    PurchaseOrdersEdit,
    PurchaseOrdersViewAll,
    ItemsCreate,
    ItemsEdit,
    ItemsViewAll,
    DispatchView,
    DispatchAssign,
    IssuesCreate,
    IssuesEdit,
    IssuesDelete,
    IssuesViewAll,
    TasksCreate,
    TasksEdit,
    TasksDelete,
    TasksViewAll,
    ReportsView,
];

const FIELD: &[Permission] = &[
    ClientsViewAll,
    JobsViewAll,
    ItemsViewAll,
    DispatchView,
    IssuesCreate,
    IssuesViewAll,
    TasksViewAll,
];

const SALES: &[Permission] = &[
    ClientsCreate,
    ClientsEdit,
    ClientsViewAll,
    LeadsCreate,
    LeadsEdit,
    LeadsViewAll,
    JobsCreate,
    JobsViewAll,
    EstimatesCreate,
    EstimatesEdit,
    EstimatesViewAll,
    ItemsViewAll,
    IssuesCreate,
    IssuesViewAll,
    TasksCreate,
    TasksEdit,
    TasksViewAll,
];

const ACCOUNTING: &[Permission] = &[
    ClientsViewAll,
    InvoicesCreate,
    InvoicesEdit,
    InvoicesViewAll,
    PaymentsView,
    PaymentsRefund,
    PurchaseOrdersEdit,
    PurchaseOrdersViewAll,
    ItemsViewAll,
    TasksCreate,
    TasksEdit,
    TasksViewAll,
    ReportsView,
];

impl Role {
    /// Default permission set of the role.
    pub fn permissions(self) -> &'static [Permission] {
        match self {
            Role::Admin => Permission::ALL,
            Role::Office => OFFICE,
            Role::Field => FIELD,
            Role::Sales => SALES,
            Role::Accounting => ACCOUNTING,
        }
    }

    pub fn has_permission(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_every_permission() {
        for permission in Permission::ALL {
            assert!(Role::Admin.has_permission(*permission));
        }
    }

    #[test]
    fn field_role_is_read_only() {
        assert!(Role::Field.has_permission(Permission::JobsViewAll));
        assert!(!Role::Field.has_permission(Permission::JobsEdit));
        assert!(!Role::Field.has_permission(Permission::InvoicesViewAll));
    }

    #[test]
    fn accounting_cannot_touch_leads() {
        assert!(Role::Accounting.has_permission(Permission::InvoicesEdit));
        assert!(!Role::Accounting.has_permission(Permission::LeadsViewAll));
    }

    #[test]
    fn only_office_staff_dispatch() {
        assert!(Role::Office.has_permission(Permission::DispatchAssign));
        assert!(Role::Field.has_permission(Permission::DispatchView));
        assert!(!Role::Field.has_permission(Permission::DispatchAssign));
        assert!(!Role::Sales.has_permission(Permission::DispatchView));
    }

    #[test]
    fn permission_keys_use_module_action_form() {
        assert_eq!(Permission::PurchaseOrdersViewAll.as_str(), "purchase_orders:view_all");
        assert_eq!("users:invite".parse::<Permission>(), Ok(Permission::UsersInvite));
    }
}
