//! Mock repository implementations for isolating services in tests.

use chrono::NaiveDateTime;
use mockall::mock;

use crate::domain::activity::{Activity, NewActivity};
use crate::domain::bundle::{BundleCatalog, BundleWithComponents, NewBundle, UpdateBundle};
use crate::domain::client::{Client, ClientMatchCriteria, NewClient, UpdateClient};
use crate::domain::document::{DocumentKind, DocumentLines, LineGroup, LineItem, NewLineGroup, NewLineItem};
use crate::domain::estimate::{BillingPlan, Estimate, NewEstimate, UpdateEstimate};
use crate::domain::invoice::{Invoice, NewInvoice, NewPayment, Payment, UpdateInvoice};
use crate::domain::issue::{Issue, IssueDetail, IssueNote, NewIssue, NewIssueNote, UpdateIssue};
use crate::domain::item::{Item, ItemData, NewItem};
use crate::domain::job::{Job, JobDetail, JobStatus, NewJob, UpdateJob};
use crate::domain::lead::{Lead, NewLead, UpdateLead};
use crate::domain::notification::{NewNotification, Notification};
use crate::domain::purchase_order::{
    NewPurchaseOrder, PurchaseOrder, PurchaseOrderStatus, UpdatePurchaseOrder,
};
use crate::domain::task::{NewTask, Task, UpdateTask};
use crate::domain::tenant::{NewTenant, Tenant};
use crate::domain::types::{
    BundleId, ClientId, EmailAddress, EstimateId, InvoiceId, IssueId, ItemId, JobId, LeadId,
    LineGroupId, LineItemId, NotificationId, PublicId, PurchaseOrderId, TaskId, TenantId, UserId,
};
use crate::domain::user::{AdminAccount, NewRefreshToken, NewUser, RefreshToken, User};
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    ActivityListQuery, ActivityReader, ActivityWriter, AssignmentChange, BundleReader,
    BundleWriter, ClientListQuery, ClientReader, ClientWriter, DocumentReader, DocumentWriter,
    EstimateListQuery, EstimateReader, EstimateWriter, GatewayOutcome, GatewayPayment,
    InvoiceListQuery, InvoiceReader, InvoiceWriter, IssueListQuery, IssueReader, IssueWriter,
    ItemListQuery, ItemReader, ItemWriter, JobConversion, JobListQuery, JobReader, JobWriter,
    LeadConversion, LeadListQuery, LeadReader, LeadWriter, NotificationListQuery,
    NotificationReader, NotificationWriter, PurchaseOrderListQuery, PurchaseOrderReader,
    PurchaseOrderWriter, RefreshTokenReader, RefreshTokenWriter, TaskListQuery, TaskReader,
    TaskWriter, TenantReader, UserReader, UserWriter,
};

mock! {
    pub Repository {}

    impl TenantReader for Repository {
        fn get_tenant_by_id(&self, id: TenantId) -> RepositoryResult<Option<Tenant>>;
    }

    impl UserReader for Repository {
        fn get_user_by_id(&self, id: UserId, tenant_id: TenantId) -> RepositoryResult<Option<User>>;
        fn get_user_by_email(&self, email: &EmailAddress) -> RepositoryResult<Option<User>>;
        fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>>;
        fn list_users(&self, tenant_id: TenantId) -> RepositoryResult<Vec<User>>;
        fn admin_exists(&self) -> RepositoryResult<bool>;
    }

    impl UserWriter for Repository {
        fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User>;
        fn bootstrap_admin(
            &self,
            tenant: &NewTenant,
            admin: &AdminAccount,
        ) -> RepositoryResult<(Tenant, User)>;
        fn set_user_password(&self, user_id: UserId, password_hash: &str) -> RepositoryResult<User>;
        fn record_login(&self, user_id: UserId, at: NaiveDateTime) -> RepositoryResult<()>;
    }

    impl RefreshTokenReader for Repository {
        fn get_refresh_token(&self, token_hash: &str) -> RepositoryResult<Option<RefreshToken>>;
    }

    impl RefreshTokenWriter for Repository {
        fn create_refresh_token(&self, token: &NewRefreshToken) -> RepositoryResult<RefreshToken>;
        fn delete_refresh_token(&self, token_hash: &str) -> RepositoryResult<usize>;
        fn rotate_refresh_token(
            &self,
            old_hash: &str,
            token: &NewRefreshToken,
        ) -> RepositoryResult<RefreshToken>;
    }

    impl ClientReader for Repository {
        fn get_client_by_id(&self, id: ClientId, tenant_id: TenantId) -> RepositoryResult<Option<Client>>;
        fn list_clients(&self, query: ClientListQuery) -> RepositoryResult<(usize, Vec<Client>)>;
        fn find_matching_client(
            &self,
            criteria: &ClientMatchCriteria,
        ) -> RepositoryResult<Option<Client>>;
    }

    impl ClientWriter for Repository {
        fn create_client(&self, new_client: &NewClient) -> RepositoryResult<Client>;
        fn update_client(
            &self,
            id: ClientId,
            tenant_id: TenantId,
            updates: &UpdateClient,
        ) -> RepositoryResult<Client>;
        fn delete_client(&self, id: ClientId, tenant_id: TenantId) -> RepositoryResult<()>;
    }

    impl LeadReader for Repository {
        fn get_lead_by_id(&self, id: LeadId, tenant_id: TenantId) -> RepositoryResult<Option<Lead>>;
        fn list_leads(&self, query: LeadListQuery) -> RepositoryResult<(usize, Vec<Lead>)>;
    }

    impl LeadWriter for Repository {
        fn create_lead(&self, new_lead: &NewLead) -> RepositoryResult<Lead>;
        fn update_lead(
            &self,
            id: LeadId,
            tenant_id: TenantId,
            updates: &UpdateLead,
        ) -> RepositoryResult<Lead>;
        fn delete_lead(&self, id: LeadId, tenant_id: TenantId) -> RepositoryResult<()>;
        fn convert_lead_to_client(
            &self,
            id: LeadId,
            tenant_id: TenantId,
            actor: Option<UserId>,
        ) -> RepositoryResult<LeadConversion>;
        fn convert_lead_to_estimate(
            &self,
            id: LeadId,
            tenant_id: TenantId,
            actor: Option<UserId>,
        ) -> RepositoryResult<Estimate>;
    }

    impl ItemReader for Repository {
        fn get_item_by_id(&self, id: ItemId, tenant_id: TenantId) -> RepositoryResult<Option<Item>>;
        fn list_items(&self, query: ItemListQuery) -> RepositoryResult<(usize, Vec<Item>)>;
    }

    impl ItemWriter for Repository {
        fn create_item(&self, new_item: &NewItem) -> RepositoryResult<Item>;
        fn create_items(&self, new_items: &[NewItem]) -> RepositoryResult<usize>;
        fn update_item(&self, id: ItemId, tenant_id: TenantId, data: &ItemData) -> RepositoryResult<Item>;
        fn delete_item(&self, id: ItemId, tenant_id: TenantId) -> RepositoryResult<()>;
    }

    impl BundleReader for Repository {
        fn get_bundle_by_id(
            &self,
            id: BundleId,
            tenant_id: TenantId,
        ) -> RepositoryResult<Option<BundleWithComponents>>;
        fn list_bundles(&self, tenant_id: TenantId) -> RepositoryResult<Vec<BundleWithComponents>>;
        fn load_bundle_catalog(&self, tenant_id: TenantId) -> RepositoryResult<BundleCatalog>;
    }

    impl BundleWriter for Repository {
        fn create_bundle(&self, new_bundle: &NewBundle) -> RepositoryResult<BundleWithComponents>;
        fn update_bundle(
            &self,
            id: BundleId,
            tenant_id: TenantId,
            updates: &UpdateBundle,
        ) -> RepositoryResult<BundleWithComponents>;
        fn delete_bundle(&self, id: BundleId, tenant_id: TenantId) -> RepositoryResult<()>;
    }

    impl DocumentReader for Repository {
        fn list_document_lines(
            &self,
            kind: DocumentKind,
            document_id: i32,
        ) -> RepositoryResult<DocumentLines>;
    }

    impl DocumentWriter for Repository {
        fn add_line_item(
            &self,
            kind: DocumentKind,
            document_id: i32,
            line: &NewLineItem,
        ) -> RepositoryResult<LineItem>;
        fn update_line_item(
            &self,
            kind: DocumentKind,
            document_id: i32,
            line_id: LineItemId,
            line: &NewLineItem,
        ) -> RepositoryResult<LineItem>;
        fn delete_line_item(
            &self,
            kind: DocumentKind,
            document_id: i32,
            line_id: LineItemId,
        ) -> RepositoryResult<()>;
        fn add_grouped_lines(
            &self,
            tenant_id: TenantId,
            kind: DocumentKind,
            document_id: i32,
            group: &NewLineGroup,
            lines: &[NewLineItem],
        ) -> RepositoryResult<LineGroup>;
        fn ungroup_lines(
            &self,
            kind: DocumentKind,
            document_id: i32,
            group_id: LineGroupId,
        ) -> RepositoryResult<()>;
        fn delete_line_group(
            &self,
            kind: DocumentKind,
            document_id: i32,
            group_id: LineGroupId,
        ) -> RepositoryResult<()>;
        fn refresh_line_group(
            &self,
            kind: DocumentKind,
            document_id: i32,
            group_id: LineGroupId,
            name: &str,
            lines: &[NewLineItem],
        ) -> RepositoryResult<LineGroup>;
    }

    impl EstimateReader for Repository {
        fn get_estimate_by_id(
            &self,
            id: EstimateId,
            tenant_id: TenantId,
        ) -> RepositoryResult<Option<Estimate>>;
        fn list_estimates(&self, query: EstimateListQuery) -> RepositoryResult<(usize, Vec<Estimate>)>;
    }

    impl EstimateWriter for Repository {
        fn create_estimate(&self, new_estimate: &NewEstimate) -> RepositoryResult<Estimate>;
        fn update_estimate(
            &self,
            id: EstimateId,
            tenant_id: TenantId,
            updates: &UpdateEstimate,
        ) -> RepositoryResult<Estimate>;
        fn delete_estimate(&self, id: EstimateId, tenant_id: TenantId) -> RepositoryResult<()>;
        fn convert_estimate_to_job(
            &self,
            id: EstimateId,
            tenant_id: TenantId,
            actor: Option<UserId>,
        ) -> RepositoryResult<JobConversion>;
        fn convert_estimate_to_invoice(
            &self,
            estimate: &Estimate,
            plan: &BillingPlan,
            actor: Option<UserId>,
        ) -> RepositoryResult<Invoice>;
    }

    impl InvoiceReader for Repository {
        fn get_invoice_by_id(
            &self,
            id: InvoiceId,
            tenant_id: TenantId,
        ) -> RepositoryResult<Option<Invoice>>;
        fn get_invoice_by_public_id(&self, public_id: PublicId) -> RepositoryResult<Option<Invoice>>;
        fn list_invoices(&self, query: InvoiceListQuery) -> RepositoryResult<(usize, Vec<Invoice>)>;
        fn list_payments(&self, invoice_id: InvoiceId) -> RepositoryResult<Vec<Payment>>;
    }

    impl InvoiceWriter for Repository {
        fn create_invoice(&self, new_invoice: &NewInvoice) -> RepositoryResult<Invoice>;
        fn update_invoice(
            &self,
            id: InvoiceId,
            tenant_id: TenantId,
            updates: &UpdateInvoice,
        ) -> RepositoryResult<Invoice>;
        fn delete_invoice(&self, id: InvoiceId, tenant_id: TenantId) -> RepositoryResult<()>;
        fn record_payment(&self, payment: &NewPayment) -> RepositoryResult<(Invoice, Payment)>;
        fn record_gateway_payment(&self, payment: &GatewayPayment) -> RepositoryResult<GatewayOutcome>;
        fn mark_overdue_invoices(
            &self,
            tenant_id: TenantId,
            now: NaiveDateTime,
        ) -> RepositoryResult<Vec<Invoice>>;
    }

    impl PurchaseOrderReader for Repository {
        fn get_purchase_order_by_id(
            &self,
            id: PurchaseOrderId,
            tenant_id: TenantId,
        ) -> RepositoryResult<Option<PurchaseOrder>>;
        fn list_purchase_orders(
            &self,
            query: PurchaseOrderListQuery,
        ) -> RepositoryResult<(usize, Vec<PurchaseOrder>)>;
    }

    impl PurchaseOrderWriter for Repository {
        fn create_purchase_order(&self, new_order: &NewPurchaseOrder) -> RepositoryResult<PurchaseOrder>;
        fn update_purchase_order(
            &self,
            id: PurchaseOrderId,
            tenant_id: TenantId,
            updates: &UpdatePurchaseOrder,
        ) -> RepositoryResult<PurchaseOrder>;
        fn delete_purchase_order(&self, id: PurchaseOrderId, tenant_id: TenantId) -> RepositoryResult<()>;
        fn set_purchase_order_status(
            &self,
            id: PurchaseOrderId,
            tenant_id: TenantId,
            status: PurchaseOrderStatus,
            received_at: Option<NaiveDateTime>,
        ) -> RepositoryResult<PurchaseOrder>;
    }

    impl JobReader for Repository {
        fn get_job_by_id(&self, id: JobId, tenant_id: TenantId) -> RepositoryResult<Option<JobDetail>>;
        fn list_jobs(&self, query: JobListQuery) -> RepositoryResult<(usize, Vec<Job>)>;
        fn list_dispatch_jobs(
            &self,
            tenant_id: TenantId,
            day_start: NaiveDateTime,
            day_end: NaiveDateTime,
        ) -> RepositoryResult<Vec<JobDetail>>;
    }

    impl JobWriter for Repository {
        fn create_job(&self, new_job: &NewJob) -> RepositoryResult<Job>;
        fn update_job(&self, id: JobId, tenant_id: TenantId, updates: &UpdateJob) -> RepositoryResult<Job>;
        fn delete_job(&self, id: JobId, tenant_id: TenantId) -> RepositoryResult<()>;
        fn set_job_status(
            &self,
            id: JobId,
            tenant_id: TenantId,
            status: JobStatus,
            completed_at: Option<NaiveDateTime>,
        ) -> RepositoryResult<Job>;
        fn replace_job_assignments(
            &self,
            id: JobId,
            tenant_id: TenantId,
            user_ids: &[UserId],
        ) -> RepositoryResult<AssignmentChange>;
        fn dispatch_job(
            &self,
            id: JobId,
            tenant_id: TenantId,
            assignee: Option<UserId>,
            scheduled_start: Option<NaiveDateTime>,
            scheduled_end: Option<NaiveDateTime>,
        ) -> RepositoryResult<AssignmentChange>;
    }

    impl IssueReader for Repository {
        fn get_issue_by_id(&self, id: IssueId, tenant_id: TenantId) -> RepositoryResult<Option<IssueDetail>>;
        fn list_issues(&self, query: IssueListQuery) -> RepositoryResult<(usize, Vec<Issue>)>;
    }

    impl IssueWriter for Repository {
        fn create_issue(&self, new_issue: &NewIssue) -> RepositoryResult<Issue>;
        fn update_issue(
            &self,
            id: IssueId,
            tenant_id: TenantId,
            actor: Option<UserId>,
            updates: &UpdateIssue,
        ) -> RepositoryResult<Issue>;
        fn cancel_issue(&self, id: IssueId, tenant_id: TenantId) -> RepositoryResult<Issue>;
        fn add_issue_note(&self, tenant_id: TenantId, note: &NewIssueNote) -> RepositoryResult<IssueNote>;
    }

    impl TaskReader for Repository {
        fn get_task_by_id(&self, id: TaskId, tenant_id: TenantId) -> RepositoryResult<Option<Task>>;
        fn list_tasks(&self, query: TaskListQuery) -> RepositoryResult<(usize, Vec<Task>)>;
    }

    impl TaskWriter for Repository {
        fn create_task(&self, new_task: &NewTask) -> RepositoryResult<Task>;
        fn update_task(
            &self,
            id: TaskId,
            tenant_id: TenantId,
            actor: Option<UserId>,
            updates: &UpdateTask,
        ) -> RepositoryResult<Task>;
        fn delete_task(&self, id: TaskId, tenant_id: TenantId) -> RepositoryResult<()>;
    }

    impl NotificationReader for Repository {
        fn list_notifications(
            &self,
            query: NotificationListQuery,
        ) -> RepositoryResult<(usize, usize, Vec<Notification>)>;
        fn list_notifications_after(
            &self,
            tenant_id: TenantId,
            user_id: UserId,
            after: i32,
            limit: i64,
        ) -> RepositoryResult<Vec<Notification>>;
    }

    impl NotificationWriter for Repository {
        fn create_notification(&self, notification: &NewNotification) -> RepositoryResult<Notification>;
        fn mark_notification_read(
            &self,
            id: NotificationId,
            tenant_id: TenantId,
            user_id: UserId,
        ) -> RepositoryResult<Notification>;
        fn mark_all_notifications_read(
            &self,
            tenant_id: TenantId,
            user_id: UserId,
        ) -> RepositoryResult<usize>;
    }

    impl ActivityReader for Repository {
        fn list_activities(&self, query: ActivityListQuery) -> RepositoryResult<Vec<Activity>>;
    }

    impl ActivityWriter for Repository {
        fn create_activity(&self, activity: &NewActivity) -> RepositoryResult<Activity>;
    }
}
