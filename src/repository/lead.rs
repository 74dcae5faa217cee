use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::{
        activity::{ActivityKind, NewActivity},
        document::NewLineItem,
        estimate::{Estimate, EstimateStatus, NewEstimate},
        lead::{Lead, LeadStatus, NewLead, UpdateLead},
        types::{Cents, LeadId, TenantId, UserId},
    },
    models::lead::{Lead as DbLead, NewLead as DbNewLead, UpdateLead as DbUpdateLead},
    repository::{
        DieselRepository, LeadConversion, LeadListQuery, LeadReader, LeadWriter,
        activity::insert_activity,
        client::{find_client, find_matching_client, insert_client},
        errors::{RepositoryError, RepositoryResult},
        estimate::insert_estimate,
    },
};

pub(crate) fn find_lead(
    conn: &mut SqliteConnection,
    id: i32,
    tenant_id: i32,
) -> RepositoryResult<Option<Lead>> {
    use crate::schema::leads;

    let lead = leads::table
        .filter(leads::id.eq(id))
        .filter(leads::tenant_id.eq(tenant_id))
        .first::<DbLead>(conn)
        .optional()?;

    lead.map(Lead::try_from).transpose().map_err(RepositoryError::from)
}

/// Turns `lead` into a client: reuses the client it already points at or
/// one matching its contact details, otherwise creates one. The lead is
/// marked converted and a feed entry is written.
pub(crate) fn convert_lead(
    conn: &mut SqliteConnection,
    lead: &Lead,
    actor: Option<UserId>,
) -> RepositoryResult<LeadConversion> {
    use crate::schema::leads;

    let linked = match lead.converted_to_client_id {
        Some(client_id) => find_client(conn, client_id.get(), lead.tenant_id.get())?,
        None => None,
    };

    let (client, client_created) = match linked {
        Some(client) => (client, false),
        None => match find_matching_client(conn, &lead.match_criteria()?)? {
            Some(client) => (client, false),
            None => (insert_client(conn, &lead.to_new_client()?)?, true),
        },
    };

    let now = Utc::now().naive_utc();
    let updated = diesel::update(leads::table.find(lead.id.get()))
        .set((
            leads::status.eq(LeadStatus::Converted.as_str()),
            leads::converted_to_client_id.eq(Some(client.id.get())),
            leads::converted_at.eq(Some(lead.converted_at.unwrap_or(now))),
            leads::updated_at.eq(now),
        ))
        .get_result::<DbLead>(conn)?;

    insert_activity(
        conn,
        &NewActivity::new(
            lead.tenant_id,
            actor,
            ActivityKind::ClientCreated,
            format!("Lead \"{}\" converted to client", lead.full_name()),
        )
        .client(Some(client.id))
        .lead(Some(lead.id)),
    )?;

    Ok(LeadConversion {
        lead: Lead::try_from(updated)?,
        client,
        client_created,
    })
}

impl LeadReader for DieselRepository {
    fn get_lead_by_id(&self, id: LeadId, tenant_id: TenantId) -> RepositoryResult<Option<Lead>> {
        let mut conn = self.conn()?;
        find_lead(&mut conn, id.get(), tenant_id.get())
    }

    fn list_leads(&self, query: LeadListQuery) -> RepositoryResult<(usize, Vec<Lead>)> {
        use crate::schema::leads;

        let mut conn = self.conn()?;

        let filtered = || {
            let mut items = leads::table
                .filter(leads::tenant_id.eq(query.tenant_id.get()))
                .into_boxed();

            if let Some(status) = query.status {
                items = items.filter(leads::status.eq(status.as_str()));
            }
            if let Some(source) = query.source {
                items = items.filter(leads::source.eq(source.as_str()));
            }
            if let Some(user_id) = query.assigned_to {
                items = items.filter(leads::assigned_to_id.eq(user_id.get()));
            }
            if let Some(term) = &query.search {
                let pattern = format!("%{term}%");
                items = items.filter(
                    leads::first_name
                        .like(pattern.clone())
                        .or(leads::last_name.like(pattern.clone()))
                        .or(leads::email.like(pattern.clone()))
                        .or(leads::phone.like(pattern.clone()))
                        .or(leads::company.like(pattern)),
                );
            }

            items
        };

        let total = filtered().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = filtered().order((leads::updated_at.desc(), leads::id.desc()));
        if let Some(page) = &query.pagination {
            items = items.limit(page.limit as i64).offset(page.offset() as i64);
        }

        let items = items
            .load::<DbLead>(&mut conn)?
            .into_iter()
            .map(|lead| Lead::try_from(lead).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total, items))
    }
}

impl LeadWriter for DieselRepository {
    fn create_lead(&self, new_lead: &NewLead) -> RepositoryResult<Lead> {
        use crate::schema::leads;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let created = diesel::insert_into(leads::table)
                .values(&DbNewLead::from(new_lead))
                .get_result::<DbLead>(conn)?;
            let lead = Lead::try_from(created)?;

            insert_activity(
                conn,
                &NewActivity::new(
                    lead.tenant_id,
                    None,
                    ActivityKind::LeadCreated,
                    format!("Lead \"{}\" created", lead.full_name()),
                )
                .lead(Some(lead.id))
                .client(lead.converted_to_client_id),
            )?;

            Ok(lead)
        })
    }

    fn update_lead(
        &self,
        id: LeadId,
        tenant_id: TenantId,
        updates: &UpdateLead,
    ) -> RepositoryResult<Lead> {
        use crate::schema::leads;

        let mut conn = self.conn()?;
        let changes = DbUpdateLead::from_domain(updates, Utc::now().naive_utc());

        let updated = diesel::update(
            leads::table
                .filter(leads::id.eq(id.get()))
                .filter(leads::tenant_id.eq(tenant_id.get())),
        )
        .set(&changes)
        .get_result::<DbLead>(&mut conn)?;

        Ok(Lead::try_from(updated)?)
    }

    fn delete_lead(&self, id: LeadId, tenant_id: TenantId) -> RepositoryResult<()> {
        use crate::schema::leads;

        let mut conn = self.conn()?;

        let deleted = diesel::delete(
            leads::table
                .filter(leads::id.eq(id.get()))
                .filter(leads::tenant_id.eq(tenant_id.get())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn convert_lead_to_client(
        &self,
        id: LeadId,
        tenant_id: TenantId,
        actor: Option<UserId>,
    ) -> RepositoryResult<LeadConversion> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let lead =
                find_lead(conn, id.get(), tenant_id.get())?.ok_or(RepositoryError::NotFound)?;

            if lead.is_converted() {
                return Err(RepositoryError::Rejected(
                    "Lead already converted to client".to_string(),
                ));
            }

            convert_lead(conn, &lead, actor)
        })
    }

    fn convert_lead_to_estimate(
        &self,
        id: LeadId,
        tenant_id: TenantId,
        actor: Option<UserId>,
    ) -> RepositoryResult<Estimate> {
        use crate::schema::leads;

        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let lead =
                find_lead(conn, id.get(), tenant_id.get())?.ok_or(RepositoryError::NotFound)?;

            let request_name = lead.full_name().trim().to_string();
            let amount = lead.value.unwrap_or(Cents::ZERO);

            let estimate = insert_estimate(
                conn,
                &NewEstimate {
                    tenant_id: lead.tenant_id,
                    client_id: lead.converted_to_client_id,
                    lead_id: Some(lead.id),
                    title: format!("Estimate for {request_name}"),
                    status: EstimateStatus::Draft,
                    tax_rate: 0.0,
                    discount: Cents::ZERO,
                    notes: lead.notes.clone(),
                    created_by_id: actor,
                    line_items: vec![NewLineItem {
                        group_id: None,
                        source_item_id: None,
                        description: format!("Requested work for {}", lead.display_name()),
                        quantity: 1.0,
                        unit_price: amount,
                        unit_cost: None,
                        taxable: true,
                        is_visible_to_client: true,
                        sort_order: 0,
                    }],
                },
            )?;

            if lead.status != LeadStatus::Converted {
                diesel::update(leads::table.find(lead.id.get()))
                    .set((
                        leads::status.eq(LeadStatus::EstimateSent.as_str()),
                        leads::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)?;
            }

            insert_activity(
                conn,
                &NewActivity::new(
                    lead.tenant_id,
                    actor,
                    ActivityKind::EstimateCreated,
                    format!(
                        "Request \"{request_name}\" converted to estimate {}",
                        estimate.estimate_number
                    ),
                )
                .lead(Some(lead.id))
                .estimate(Some(estimate.id))
                .client(estimate.client_id),
            )?;

            Ok(estimate)
        })
    }
}
