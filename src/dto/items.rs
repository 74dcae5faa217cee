use serde::Serialize;

/// Outcome of a catalog CSV import.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub success: bool,
    pub imported: usize,
    pub skipped: usize,
}
