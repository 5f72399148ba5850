use super::repo_types::ScanListRow;

/// One row on the history page.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryItem {
    pub id: String,
    pub drink: String,
    pub calories: Option<i64>,
    /// RFC 3339 timestamp of the upload.
    pub scanned_at: Option<String>,
}

impl From<ScanListRow> for HistoryItem {
    fn from(row: ScanListRow) -> Self {
        Self {
            id: row.id.to_hex(),
            drink: row.drink_name,
            calories: row.nutrition.map(|n| n.calories),
            scanned_at: row.created_at.and_then(|t| t.try_to_rfc3339_string().ok()),
        }
    }
}
