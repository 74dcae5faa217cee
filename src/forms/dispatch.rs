use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::domain::types::{JobId, UserId};
use crate::forms::jobs::check_window;
use crate::forms::{FormError, optional_datetime, optional_id};

#[derive(Debug, Default, Deserialize)]
pub struct DispatchBoardParams {
    /// `YYYY-MM-DD`; today when absent.
    pub date: Option<String>,
}

impl DispatchBoardParams {
    /// First and last instant of the requested day.
    pub fn day_bounds(&self, today: NaiveDate) -> Result<(NaiveDateTime, NaiveDateTime), FormError> {
        let day = match self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                FormError::InvalidValue {
                    field: "date",
                    reason: format!("`{raw}` is not a date"),
                }
            })?,
            None => today,
        };
        let invalid = || FormError::InvalidValue {
            field: "date",
            reason: "out of range".to_string(),
        };
        let start = day.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
        let end = day.and_hms_milli_opt(23, 59, 59, 999).ok_or_else(invalid)?;
        Ok((start, end))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchAssignForm {
    pub job_id: i32,
    /// Leaving the technician out unassigns the job.
    #[serde(default)]
    pub user_id: Option<i32>,
    #[serde(default)]
    pub scheduled_start: Option<String>,
    #[serde(default)]
    pub scheduled_end: Option<String>,
}

/// Validated dispatch decision.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchAssignment {
    pub job_id: JobId,
    pub user_id: Option<UserId>,
    pub scheduled_start: Option<NaiveDateTime>,
    pub scheduled_end: Option<NaiveDateTime>,
}

impl TryFrom<DispatchAssignForm> for DispatchAssignment {
    type Error = FormError;

    fn try_from(form: DispatchAssignForm) -> Result<Self, Self::Error> {
        let job_id = JobId::new(form.job_id).map_err(FormError::invalid("jobId"))?;
        let scheduled_start = optional_datetime(form.scheduled_start, "scheduledStart")?;
        let scheduled_end = optional_datetime(form.scheduled_end, "scheduledEnd")?;
        check_window(scheduled_start, scheduled_end)?;

        Ok(Self {
            job_id,
            user_id: optional_id(form.user_id, "userId")?,
            scheduled_start,
            scheduled_end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 9).unwrap()
    }

    #[test]
    fn board_covers_the_whole_day() {
        let params = DispatchBoardParams {
            date: Some("2025-06-12".into()),
        };
        let (start, end) = params.day_bounds(today()).unwrap();
        assert_eq!(start.to_string(), "2025-06-12 00:00:00");
        assert_eq!(end.to_string(), "2025-06-12 23:59:59.999");
    }

    #[test]
    fn board_defaults_to_today() {
        let (start, _) = DispatchBoardParams::default().day_bounds(today()).unwrap();
        assert_eq!(start.date(), today());
        assert!(
            DispatchBoardParams {
                date: Some("tomorrow".into())
            }
            .day_bounds(today())
            .is_err()
        );
    }

    #[test]
    fn assignment_without_technician_unassigns() {
        let form: DispatchAssignForm =
            serde_json::from_str(r#"{"jobId":4,"scheduledStart":"2025-06-12T08:00:00"}"#).unwrap();
        let assignment = DispatchAssignment::try_from(form).unwrap();
        assert_eq!(assignment.user_id, None);
        assert!(assignment.scheduled_start.is_some());
    }

    #[test]
    fn assignment_window_must_be_ordered() {
        let form: DispatchAssignForm = serde_json::from_str(
            r#"{"jobId":4,"userId":2,"scheduledStart":"2025-06-12T10:00:00","scheduledEnd":"2025-06-12T08:00:00"}"#,
        )
        .unwrap();
        assert!(matches!(
            DispatchAssignment::try_from(form),
            Err(FormError::InvalidValue { field: "scheduledEnd", .. })
        ));
    }
}
