use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    ActivityId, ClientId, EstimateId, InvoiceId, JobId, LeadId, TenantId, UserId, string_enum,
};

string_enum!(
    ActivityKind {
        LeadCreated => "LEAD_CREATED",
        ClientCreated => "CLIENT_CREATED",
        EstimateCreated => "ESTIMATE_CREATED",
        JobCreated => "JOB_CREATED",
        InvoiceCreated => "INVOICE_CREATED",
        PaymentReceived => "PAYMENT_RECEIVED",
        IssueCreated => "ISSUE_CREATED",
        IssueUpdated => "ISSUE_UPDATED",
        IssueResolved => "ISSUE_RESOLVED",
        TaskCreated => "TASK_CREATED",
        TaskUpdated => "TASK_UPDATED",
        TaskCompleted => "TASK_COMPLETED",
        Note => "NOTE",
    }
);

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub tenant_id: TenantId,
    pub user_id: Option<UserId>,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub description: String,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    pub estimate_id: Option<EstimateId>,
    pub invoice_id: Option<InvoiceId>,
    pub job_id: Option<JobId>,
    pub created_at: NaiveDateTime,
}

/// Feed entry to append; links are filled in with the builder methods.
#[derive(Clone, Debug, PartialEq)]
pub struct NewActivity {
    pub tenant_id: TenantId,
    pub user_id: Option<UserId>,
    pub kind: ActivityKind,
    pub description: String,
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    pub estimate_id: Option<EstimateId>,
    pub invoice_id: Option<InvoiceId>,
    pub job_id: Option<JobId>,
}

impl NewActivity {
    pub fn new(
        tenant_id: TenantId,
        user_id: Option<UserId>,
        kind: ActivityKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            user_id,
            kind,
            description: description.into(),
            client_id: None,
            lead_id: None,
            estimate_id: None,
            invoice_id: None,
            job_id: None,
        }
    }

    pub fn client(mut self, client_id: Option<ClientId>) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn lead(mut self, lead_id: Option<LeadId>) -> Self {
        self.lead_id = lead_id;
        self
    }

    pub fn estimate(mut self, estimate_id: Option<EstimateId>) -> Self {
        self.estimate_id = estimate_id;
        self
    }

    pub fn invoice(mut self, invoice_id: Option<InvoiceId>) -> Self {
        self.invoice_id = invoice_id;
        self
    }

    pub fn job(mut self, job_id: Option<JobId>) -> Self {
        self.job_id = job_id;
        self
    }
}
