use crate::domain::activity::Activity;
use crate::forms::activities::ActivityListParams;
use crate::models::auth::AuthenticatedUser;
use crate::repository::ActivityReader;
use crate::services::{ServiceResult, log_failure};

/// Newest entries of the tenant feed, optionally narrowed to one client,
/// lead or job.
pub fn list_activities<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: ActivityListParams,
) -> ServiceResult<Vec<Activity>>
where
    R: ActivityReader + ?Sized,
{
    let query = params.into_query(user.tenant_id)?;
    repo.list_activities(query)
        .map_err(log_failure("list activities"))
}
