use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::TenantId;

/// Name given to the tenant created by the first-run admin bootstrap.
pub const DEFAULT_TENANT_NAME: &str = "Default Tenant";
/// Subdomain of the bootstrap tenant.
pub const DEFAULT_TENANT_SUBDOMAIN: &str = "default";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub subdomain: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct NewTenant {
    pub name: String,
    pub subdomain: String,
}

impl NewTenant {
    /// The tenant every bootstrap admin lands in.
    pub fn default_tenant() -> Self {
        Self {
            name: DEFAULT_TENANT_NAME.to_string(),
            subdomain: DEFAULT_TENANT_SUBDOMAIN.to_string(),
        }
    }
}
