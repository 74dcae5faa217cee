//! Database models shared across the repository layer.

pub mod activity;
#[cfg(feature = "server")]
pub mod auth;
pub mod bundle;
pub mod client;
#[cfg(feature = "server")]
pub mod config;
pub mod document;
pub mod estimate;
pub mod invoice;
pub mod issue;
pub mod item;
pub mod job;
pub mod lead;
pub mod notification;
pub mod purchase_order;
pub mod task;
pub mod tenant;
pub mod user;

use crate::domain::types::TypeConstraintError;

/// Converts an optional raw foreign key into its typed identifier.
pub(crate) fn opt_id<T>(value: Option<i32>) -> Result<Option<T>, TypeConstraintError>
where
    T: TryFrom<i32, Error = TypeConstraintError>,
{
    value.map(T::try_from).transpose()
}
