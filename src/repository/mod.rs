//! Repository traits and the Diesel backed implementation.
//!
//! Every trait is implemented by [`DieselRepository`]; services only ever
//! depend on the traits so they can be exercised against
//! [`mock::MockRepository`] in tests.

use chrono::NaiveDateTime;

use crate::db::{DbConnection, DbPool};
use crate::domain::{
    activity::{Activity, NewActivity},
    bundle::{BundleCatalog, BundleWithComponents, NewBundle, UpdateBundle},
    client::{Client, ClientMatchCriteria, NewClient, UpdateClient},
    document::{DocumentKind, DocumentLines, LineGroup, LineItem, NewLineGroup, NewLineItem},
    estimate::{BillingPlan, Estimate, EstimateStatus, NewEstimate, UpdateEstimate},
    invoice::{Invoice, InvoiceStatus, NewInvoice, NewPayment, Payment, UpdateInvoice},
    issue::{Issue, IssueDetail, IssueNote, IssueStatus, IssueType, NewIssue, NewIssueNote, UpdateIssue},
    item::{Item, ItemData, NewItem},
    job::{Job, JobDetail, JobStatus, NewJob, UpdateJob},
    lead::{Lead, LeadSource, LeadStatus, NewLead, UpdateLead},
    notification::{NewNotification, Notification},
    purchase_order::{NewPurchaseOrder, PurchaseOrder, PurchaseOrderStatus, UpdatePurchaseOrder},
    task::{NewTask, Task, TaskStatus, UpdateTask},
    tenant::{NewTenant, Tenant},
    types::{
        BundleId, Cents, ClientId, EmailAddress, EstimateId, InvoiceId, IssueId, ItemId, JobId,
        LeadId, LineGroupId, LineItemId, NotificationId, PublicId, PurchaseOrderId, TaskId,
        TenantId, UserId,
    },
    user::{AdminAccount, NewRefreshToken, NewUser, RefreshToken, Role, User},
};
use crate::pagination::PageRequest;
use crate::repository::errors::RepositoryResult;

pub mod activity;
pub mod bundle;
pub mod client;
pub mod document;
pub mod errors;
pub mod estimate;
pub mod invoice;
pub mod issue;
pub mod item;
pub mod job;
pub mod lead;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;
pub mod notification;
pub mod purchase_order;
pub mod task;
pub mod tenant;
pub mod user;

/// Diesel repository sharing one connection pool across all traits.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

#[derive(Debug, Clone)]
pub struct ClientListQuery {
    pub tenant_id: TenantId,
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub pagination: Option<PageRequest>,
}

impl ClientListQuery {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            search: None,
            is_active: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn paginate(mut self, page: PageRequest) -> Self {
        self.pagination = Some(page);
        self
    }
}

#[derive(Debug, Clone)]
pub struct LeadListQuery {
    pub tenant_id: TenantId,
    pub search: Option<String>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub assigned_to: Option<UserId>,
    pub pagination: Option<PageRequest>,
}

impl LeadListQuery {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            search: None,
            status: None,
            source: None,
            assigned_to: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: LeadStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn source(mut self, source: LeadSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn assigned_to(mut self, user_id: UserId) -> Self {
        self.assigned_to = Some(user_id);
        self
    }

    pub fn paginate(mut self, page: PageRequest) -> Self {
        self.pagination = Some(page);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ItemListQuery {
    pub tenant_id: TenantId,
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub pagination: Option<PageRequest>,
}

impl ItemListQuery {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            search: None,
            is_active: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn paginate(mut self, page: PageRequest) -> Self {
        self.pagination = Some(page);
        self
    }
}

/// Filters shared by estimate and invoice listings.
#[derive(Debug, Clone)]
pub struct DocumentListQuery<S> {
    pub tenant_id: TenantId,
    pub search: Option<String>,
    pub status: Option<S>,
    pub client_id: Option<ClientId>,
    pub pagination: Option<PageRequest>,
}

pub type EstimateListQuery = DocumentListQuery<EstimateStatus>;
pub type InvoiceListQuery = DocumentListQuery<InvoiceStatus>;
pub type PurchaseOrderListQuery = DocumentListQuery<PurchaseOrderStatus>;

impl<S> DocumentListQuery<S> {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            search: None,
            status: None,
            client_id: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: S) -> Self {
        self.status = Some(status);
        self
    }

    pub fn client(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn paginate(mut self, page: PageRequest) -> Self {
        self.pagination = Some(page);
        self
    }
}

#[derive(Debug, Clone)]
pub struct JobListQuery {
    pub tenant_id: TenantId,
    pub search: Option<String>,
    pub status: Option<JobStatus>,
    pub client_id: Option<ClientId>,
    pub assigned_to: Option<UserId>,
    pub pagination: Option<PageRequest>,
}

impl JobListQuery {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            search: None,
            status: None,
            client_id: None,
            assigned_to: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn client(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn assigned_to(mut self, user_id: UserId) -> Self {
        self.assigned_to = Some(user_id);
        self
    }

    pub fn paginate(mut self, page: PageRequest) -> Self {
        self.pagination = Some(page);
        self
    }
}

#[derive(Debug, Clone)]
pub struct IssueListQuery {
    pub tenant_id: TenantId,
    pub search: Option<String>,
    pub status: Option<IssueStatus>,
    pub issue_type: Option<IssueType>,
    pub assignee: Option<UserId>,
    pub created_by: Option<UserId>,
    pub watched_by: Option<UserId>,
    pub pagination: Option<PageRequest>,
}

impl IssueListQuery {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            search: None,
            status: None,
            issue_type: None,
            assignee: None,
            created_by: None,
            watched_by: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: IssueStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn issue_type(mut self, issue_type: IssueType) -> Self {
        self.issue_type = Some(issue_type);
        self
    }

    pub fn assignee(mut self, user_id: UserId) -> Self {
        self.assignee = Some(user_id);
        self
    }

    pub fn created_by(mut self, user_id: UserId) -> Self {
        self.created_by = Some(user_id);
        self
    }

    pub fn watched_by(mut self, user_id: UserId) -> Self {
        self.watched_by = Some(user_id);
        self
    }

    pub fn paginate(mut self, page: PageRequest) -> Self {
        self.pagination = Some(page);
        self
    }
}

#[derive(Debug, Clone)]
pub struct TaskListQuery {
    pub tenant_id: TenantId,
    pub search: Option<String>,
    /// Empty means any status.
    pub statuses: Vec<TaskStatus>,
    pub assignee: Option<UserId>,
    /// Tasks the user either created or is assigned to.
    pub involving: Option<UserId>,
    pub pagination: Option<PageRequest>,
}

impl TaskListQuery {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            search: None,
            statuses: Vec::new(),
            assignee: None,
            involving: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn statuses(mut self, statuses: &[TaskStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn assignee(mut self, user_id: UserId) -> Self {
        self.assignee = Some(user_id);
        self
    }

    pub fn involving(mut self, user_id: UserId) -> Self {
        self.involving = Some(user_id);
        self
    }

    pub fn paginate(mut self, page: PageRequest) -> Self {
        self.pagination = Some(page);
        self
    }
}

#[derive(Debug, Clone)]
pub struct NotificationListQuery {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub unread_only: bool,
    pub pagination: Option<PageRequest>,
}

impl NotificationListQuery {
    pub fn new(tenant_id: TenantId, user_id: UserId) -> Self {
        Self {
            tenant_id,
            user_id,
            unread_only: false,
            pagination: None,
        }
    }

    pub fn unread_only(mut self) -> Self {
        self.unread_only = true;
        self
    }

    pub fn paginate(mut self, page: PageRequest) -> Self {
        self.pagination = Some(page);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ActivityListQuery {
    pub tenant_id: TenantId,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    pub job_id: Option<JobId>,
    pub limit: i64,
}

impl ActivityListQuery {
    pub fn new(tenant_id: TenantId, limit: i64) -> Self {
        Self {
            tenant_id,
            client_id: None,
            lead_id: None,
            job_id: None,
            limit,
        }
    }
}

/// Result of a lead conversion: the updated lead and the client it now
/// points at.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadConversion {
    pub lead: Lead,
    pub client: Client,
    /// False when an existing client matched the lead.
    pub client_created: bool,
}

/// Result of ensuring an estimate has a job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConversion {
    pub job: Job,
    pub created: bool,
}

/// Payment reported by the payment gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayPayment {
    pub public_id: PublicId,
    /// Falls back to the invoice balance when absent.
    pub amount: Option<Cents>,
    pub transaction_id: Option<String>,
    pub reference: Option<String>,
}

/// What a gateway notification changed.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayOutcome {
    pub invoice: Invoice,
    /// `None` when the transaction id had already been recorded.
    pub payment: Option<Payment>,
    pub job: Option<JobConversion>,
    pub notified: Vec<UserId>,
}

/// Result of replacing a job's crew.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentChange {
    pub job: JobDetail,
    pub newly_assigned: Vec<UserId>,
}

pub trait TenantReader {
    fn get_tenant_by_id(&self, id: TenantId) -> RepositoryResult<Option<Tenant>>;
}

pub trait UserReader {
    fn get_user_by_id(&self, id: UserId, tenant_id: TenantId) -> RepositoryResult<Option<User>>;
    /// Looks a user up across tenants; emails are globally unique.
    fn get_user_by_email(&self, email: &EmailAddress) -> RepositoryResult<Option<User>>;
    fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>>;
    fn list_users(&self, tenant_id: TenantId) -> RepositoryResult<Vec<User>>;
    fn admin_exists(&self) -> RepositoryResult<bool>;
}

pub trait UserWriter {
    fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User>;
    /// Creates the bootstrap tenant when needed and the admin inside it.
    fn bootstrap_admin(
        &self,
        tenant: &NewTenant,
        admin: &AdminAccount,
    ) -> RepositoryResult<(Tenant, User)>;
    /// Stores a chosen password, clears any temporary one and activates
    /// invited users.
    fn set_user_password(&self, user_id: UserId, password_hash: &str) -> RepositoryResult<User>;
    fn record_login(&self, user_id: UserId, at: NaiveDateTime) -> RepositoryResult<()>;
}

pub trait RefreshTokenReader {
    fn get_refresh_token(&self, token_hash: &str) -> RepositoryResult<Option<RefreshToken>>;
}

pub trait RefreshTokenWriter {
    fn create_refresh_token(&self, token: &NewRefreshToken) -> RepositoryResult<RefreshToken>;
    fn delete_refresh_token(&self, token_hash: &str) -> RepositoryResult<usize>;
    /// Replaces `old_hash` with `token` atomically.
    fn rotate_refresh_token(
        &self,
        old_hash: &str,
        token: &NewRefreshToken,
    ) -> RepositoryResult<RefreshToken>;
}

pub trait ClientReader {
    fn get_client_by_id(&self, id: ClientId, tenant_id: TenantId)
    -> RepositoryResult<Option<Client>>;
    fn list_clients(&self, query: ClientListQuery) -> RepositoryResult<(usize, Vec<Client>)>;
    /// Best existing client for the criteria: email, then phone, then name
    /// (with company when given).
    fn find_matching_client(
        &self,
        criteria: &ClientMatchCriteria,
    ) -> RepositoryResult<Option<Client>>;
}

pub trait ClientWriter {
    fn create_client(&self, new_client: &NewClient) -> RepositoryResult<Client>;
    fn update_client(
        &self,
        id: ClientId,
        tenant_id: TenantId,
        updates: &UpdateClient,
    ) -> RepositoryResult<Client>;
    fn delete_client(&self, id: ClientId, tenant_id: TenantId) -> RepositoryResult<()>;
}

pub trait LeadReader {
    fn get_lead_by_id(&self, id: LeadId, tenant_id: TenantId) -> RepositoryResult<Option<Lead>>;
    fn list_leads(&self, query: LeadListQuery) -> RepositoryResult<(usize, Vec<Lead>)>;
}

pub trait LeadWriter {
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

pub trait ItemReader {
    fn get_item_by_id(&self, id: ItemId, tenant_id: TenantId) -> RepositoryResult<Option<Item>>;
    fn list_items(&self, query: ItemListQuery) -> RepositoryResult<(usize, Vec<Item>)>;
}

pub trait ItemWriter {
    fn create_item(&self, new_item: &NewItem) -> RepositoryResult<Item>;
    fn create_items(&self, new_items: &[NewItem]) -> RepositoryResult<usize>;
    fn update_item(&self, id: ItemId, tenant_id: TenantId, data: &ItemData)
    -> RepositoryResult<Item>;
    fn delete_item(&self, id: ItemId, tenant_id: TenantId) -> RepositoryResult<()>;
}

pub trait BundleReader {
    fn get_bundle_by_id(
        &self,
        id: BundleId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<BundleWithComponents>>;
    fn list_bundles(&self, tenant_id: TenantId) -> RepositoryResult<Vec<BundleWithComponents>>;
    /// Every bundle component and item of the tenant, ready for expansion.
    fn load_bundle_catalog(&self, tenant_id: TenantId) -> RepositoryResult<BundleCatalog>;
}

pub trait BundleWriter {
    fn create_bundle(&self, new_bundle: &NewBundle) -> RepositoryResult<BundleWithComponents>;
    fn update_bundle(
        &self,
        id: BundleId,
        tenant_id: TenantId,
        updates: &UpdateBundle,
    ) -> RepositoryResult<BundleWithComponents>;
    fn delete_bundle(&self, id: BundleId, tenant_id: TenantId) -> RepositoryResult<()>;
}

/// Lines of a document; callers check the document belongs to the tenant.
pub trait DocumentReader {
    fn list_document_lines(
        &self,
        kind: DocumentKind,
        document_id: i32,
    ) -> RepositoryResult<DocumentLines>;
}

/// Line mutations; each one recalculates the document totals in the same
/// transaction.
pub trait DocumentWriter {
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
    /// Appends `lines` after the current last line inside a new group.
    fn add_grouped_lines(
        &self,
        tenant_id: TenantId,
        kind: DocumentKind,
        document_id: i32,
        group: &NewLineGroup,
        lines: &[NewLineItem],
    ) -> RepositoryResult<LineGroup>;
    /// Removes the group but keeps its lines.
    fn ungroup_lines(
        &self,
        kind: DocumentKind,
        document_id: i32,
        group_id: LineGroupId,
    ) -> RepositoryResult<()>;
    /// Removes the group together with its lines.
    fn delete_line_group(
        &self,
        kind: DocumentKind,
        document_id: i32,
        group_id: LineGroupId,
    ) -> RepositoryResult<()>;
    /// Swaps the lines of a group for `lines`, keeping the group's position,
    /// and renames it after its bundle.
    fn refresh_line_group(
        &self,
        kind: DocumentKind,
        document_id: i32,
        group_id: LineGroupId,
        name: &str,
        lines: &[NewLineItem],
    ) -> RepositoryResult<LineGroup>;
}

pub trait EstimateReader {
    fn get_estimate_by_id(
        &self,
        id: EstimateId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Estimate>>;
    fn list_estimates(&self, query: EstimateListQuery) -> RepositoryResult<(usize, Vec<Estimate>)>;
}

pub trait EstimateWriter {
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

pub trait InvoiceReader {
    fn get_invoice_by_id(
        &self,
        id: InvoiceId,
        tenant_id: TenantId,
    ) -> RepositoryResult<Option<Invoice>>;
    fn get_invoice_by_public_id(&self, public_id: PublicId) -> RepositoryResult<Option<Invoice>>;
    fn list_invoices(&self, query: InvoiceListQuery) -> RepositoryResult<(usize, Vec<Invoice>)>;
    fn list_payments(&self, invoice_id: InvoiceId) -> RepositoryResult<Vec<Payment>>;
}

pub trait InvoiceWriter {
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
    /// Flags the tenant's past-due invoices `OVERDUE`, notifies the billing
    /// roles and returns the invoices that changed.
    fn mark_overdue_invoices(
        &self,
        tenant_id: TenantId,
        now: NaiveDateTime,
    ) -> RepositoryResult<Vec<Invoice>>;
}

pub trait PurchaseOrderReader {
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

pub trait PurchaseOrderWriter {
    fn create_purchase_order(&self, new_order: &NewPurchaseOrder)
    -> RepositoryResult<PurchaseOrder>;
    fn update_purchase_order(
        &self,
        id: PurchaseOrderId,
        tenant_id: TenantId,
        updates: &UpdatePurchaseOrder,
    ) -> RepositoryResult<PurchaseOrder>;
    fn delete_purchase_order(&self, id: PurchaseOrderId, tenant_id: TenantId)
    -> RepositoryResult<()>;
    fn set_purchase_order_status(
        &self,
        id: PurchaseOrderId,
        tenant_id: TenantId,
        status: PurchaseOrderStatus,
        received_at: Option<NaiveDateTime>,
    ) -> RepositoryResult<PurchaseOrder>;
}

pub trait JobReader {
    fn get_job_by_id(&self, id: JobId, tenant_id: TenantId) -> RepositoryResult<Option<JobDetail>>;
    fn list_jobs(&self, query: JobListQuery) -> RepositoryResult<(usize, Vec<Job>)>;
    /// Jobs starting between `day_start` and `day_end` plus every open job
    /// without a start, highest priority first.
    fn list_dispatch_jobs(
        &self,
        tenant_id: TenantId,
        day_start: NaiveDateTime,
        day_end: NaiveDateTime,
    ) -> RepositoryResult<Vec<JobDetail>>;
}

pub trait JobWriter {
    fn create_job(&self, new_job: &NewJob) -> RepositoryResult<Job>;
    fn update_job(&self, id: JobId, tenant_id: TenantId, updates: &UpdateJob)
    -> RepositoryResult<Job>;
    fn delete_job(&self, id: JobId, tenant_id: TenantId) -> RepositoryResult<()>;
    fn set_job_status(
        &self,
        id: JobId,
        tenant_id: TenantId,
        status: JobStatus,
        completed_at: Option<NaiveDateTime>,
    ) -> RepositoryResult<Job>;
    /// Replaces the crew and notifies users who were not assigned before.
    fn replace_job_assignments(
        &self,
        id: JobId,
        tenant_id: TenantId,
        user_ids: &[UserId],
    ) -> RepositoryResult<AssignmentChange>;
    /// Reschedules the job and makes `assignee` its only crew member, or
    /// clears the crew when `None`.
    fn dispatch_job(
        &self,
        id: JobId,
        tenant_id: TenantId,
        assignee: Option<UserId>,
        scheduled_start: Option<NaiveDateTime>,
        scheduled_end: Option<NaiveDateTime>,
    ) -> RepositoryResult<AssignmentChange>;
}

pub trait IssueReader {
    fn get_issue_by_id(&self, id: IssueId, tenant_id: TenantId)
    -> RepositoryResult<Option<IssueDetail>>;
    /// Most urgent first, then newest.
    fn list_issues(&self, query: IssueListQuery) -> RepositoryResult<(usize, Vec<Issue>)>;
}

pub trait IssueWriter {
    /// Creates the issue, subscribes its creator and the requested watchers
    /// and writes a feed entry.
    fn create_issue(&self, new_issue: &NewIssue) -> RepositoryResult<Issue>;
    /// A status change is recorded in the activity feed as `actor`.
    fn update_issue(
        &self,
        id: IssueId,
        tenant_id: TenantId,
        actor: Option<UserId>,
        updates: &UpdateIssue,
    ) -> RepositoryResult<Issue>;
    /// Issues are never deleted, only moved to CANCELLED.
    fn cancel_issue(&self, id: IssueId, tenant_id: TenantId) -> RepositoryResult<Issue>;
    fn add_issue_note(&self, tenant_id: TenantId, note: &NewIssueNote) -> RepositoryResult<IssueNote>;
}

pub trait TaskReader {
    fn get_task_by_id(&self, id: TaskId, tenant_id: TenantId) -> RepositoryResult<Option<Task>>;
    /// Most urgent first, then earliest due.
    fn list_tasks(&self, query: TaskListQuery) -> RepositoryResult<(usize, Vec<Task>)>;
}

pub trait TaskWriter {
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

pub trait NotificationReader {
    /// Returns `(total, unread, page)`.
    fn list_notifications(
        &self,
        query: NotificationListQuery,
    ) -> RepositoryResult<(usize, usize, Vec<Notification>)>;
    /// Notifications with an id above `after`, oldest first.
    fn list_notifications_after(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        after: i32,
        limit: i64,
    ) -> RepositoryResult<Vec<Notification>>;
}

pub trait NotificationWriter {
    fn create_notification(&self, notification: &NewNotification)
    -> RepositoryResult<Notification>;
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

pub trait ActivityReader {
    fn list_activities(&self, query: ActivityListQuery) -> RepositoryResult<Vec<Activity>>;
}

pub trait ActivityWriter {
    fn create_activity(&self, activity: &NewActivity) -> RepositoryResult<Activity>;
}

/// Roles that receive payment notifications.
pub const BILLING_ROLES: [Role; 2] = [Role::Admin, Role::Accounting];
