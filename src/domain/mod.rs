//! Domain aggregates exposed by the field service layer.

pub mod activity;
pub mod bundle;
pub mod client;
pub mod document;
pub mod estimate;
pub mod invoice;
pub mod issue;
pub mod item;
pub mod job;
pub mod lead;
pub mod notification;
pub mod permission;
pub mod purchase_order;
pub mod task;
pub mod tenant;
pub mod types;
pub mod user;
