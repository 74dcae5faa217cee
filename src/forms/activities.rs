use serde::Deserialize;

use crate::domain::types::{ClientId, JobId, LeadId, TenantId};
use crate::forms::{FormError, optional_id};
use crate::repository::ActivityListQuery;

pub const DEFAULT_ACTIVITY_LIMIT: i64 = 50;
pub const MAX_ACTIVITY_LIMIT: i64 = 200;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityListParams {
    pub client_id: Option<i32>,
    pub lead_id: Option<i32>,
    pub job_id: Option<i32>,
    pub limit: Option<i64>,
}

impl ActivityListParams {
    pub fn into_query(self, tenant_id: TenantId) -> Result<ActivityListQuery, FormError> {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
            .clamp(1, MAX_ACTIVITY_LIMIT);
        let mut query = ActivityListQuery::new(tenant_id, limit);
        query.client_id = optional_id::<ClientId>(self.client_id, "clientId")?;
        query.lead_id = optional_id::<LeadId>(self.lead_id, "leadId")?;
        query.job_id = optional_id::<JobId>(self.job_id, "jobId")?;
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        let params = ActivityListParams {
            limit: Some(10_000),
            client_id: Some(4),
            ..Default::default()
        };
        let query = params.into_query(TenantId::new(1).unwrap()).unwrap();
        assert_eq!(query.limit, MAX_ACTIVITY_LIMIT);
        assert_eq!(query.client_id.map(ClientId::get), Some(4));
        assert_eq!(query.lead_id, None);
    }
}
