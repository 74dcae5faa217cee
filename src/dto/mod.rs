//! Response payloads shared by services and routes.

use serde::Serialize;

use crate::pagination::{PageInfo, PageRequest};

pub mod auth;
pub mod bundles;
pub mod items;
pub mod notifications;
pub mod users;
pub mod webhooks;

/// One page of a listing. Routes render it under a resource specific key
/// next to `pagination`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Listing<T> {
    pub fn new(total: usize, items: Vec<T>, request: PageRequest) -> Self {
        Self {
            items,
            pagination: PageInfo::new(total, request),
        }
    }
}

/// A generated CSV download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFile {
    pub filename: String,
    pub content: Vec<u8>,
}
