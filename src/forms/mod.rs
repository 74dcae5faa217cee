//! Request payloads accepted by the JSON API and their conversion into
//! domain values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::types::{EmailAddress, TypeConstraintError, trim_optional};

pub mod activities;
pub mod auth;
pub mod bundles;
pub mod clients;
pub mod dispatch;
pub mod documents;
pub mod estimates;
pub mod invoices;
pub mod issues;
pub mod items;
pub mod jobs;
pub mod leads;
pub mod notifications;
pub mod purchase_orders;
pub mod tasks;
pub mod users;
pub mod webhooks;

#[derive(Debug, Error)]
/// Errors that can occur when processing request payloads.
pub enum FormError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Invalid CSV: {0}")]
    Csv(String),
}

impl FormError {
    pub(crate) fn invalid(field: &'static str) -> impl FnOnce(TypeConstraintError) -> Self {
        move |err| FormError::InvalidValue {
            field,
            reason: err.to_string(),
        }
    }
}

/// Optional email: blank input means no email, anything else must parse.
pub(crate) fn optional_email(value: Option<String>) -> Result<Option<EmailAddress>, FormError> {
    trim_optional(value)
        .map(|email| EmailAddress::new(email).map_err(|_| FormError::InvalidEmail))
        .transpose()
}

/// Parses an optional positive id.
pub(crate) fn optional_id<T>(
    value: Option<i32>,
    field: &'static str,
) -> Result<Option<T>, FormError>
where
    T: TryFrom<i32, Error = TypeConstraintError>,
{
    value
        .map(|id| T::try_from(id).map_err(FormError::invalid(field)))
        .transpose()
}

/// Accepts RFC 3339 timestamps (converted to UTC), naive
/// `YYYY-MM-DDTHH:MM:SS` values and plain dates (midnight).
pub(crate) fn optional_datetime(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<NaiveDateTime>, FormError> {
    let Some(raw) = trim_optional(value) else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.naive_utc()));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(parsed));
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(Some)
        .ok_or(FormError::InvalidValue {
            field,
            reason: format!("`{raw}` is not a date"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ClientId;

    #[test]
    fn blank_email_is_absent() {
        assert_eq!(optional_email(Some("  ".into())).unwrap(), None);
        assert!(matches!(
            optional_email(Some("nope".into())),
            Err(FormError::InvalidEmail)
        ));
    }

    #[test]
    fn dates_accept_common_shapes() {
        let midnight = optional_datetime(Some("2025-03-04".into()), "dueDate")
            .unwrap()
            .unwrap();
        assert_eq!(midnight.to_string(), "2025-03-04 00:00:00");

        let utc = optional_datetime(Some("2025-03-04T10:30:00-05:00".into()), "dueDate")
            .unwrap()
            .unwrap();
        assert_eq!(utc.to_string(), "2025-03-04 15:30:00");

        assert_eq!(optional_datetime(Some(" ".into()), "dueDate").unwrap(), None);
        assert!(optional_datetime(Some("next week".into()), "dueDate").is_err());
    }

    #[test]
    fn ids_must_be_positive() {
        assert_eq!(
            optional_id::<ClientId>(Some(4), "clientId").unwrap(),
            Some(ClientId::new(4).unwrap())
        );
        let err = optional_id::<ClientId>(Some(0), "clientId").unwrap_err();
        assert_eq!(err.to_string(), "Invalid clientId: id must be greater than zero");
    }
}
