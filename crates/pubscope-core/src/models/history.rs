use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Visit,
}

impl HistoryAction {
    pub fn code(self) -> i64 {
        match self {
            Self::Visit => 2,
        }
    }

    /// Code 1 belonged to PDF reads, which are no longer recorded.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            2 => Some(Self::Visit),
            _ => None,
        }
    }
}

/// Append-only record of something the user did with a publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,
    pub pub_id: i64,
    pub action: HistoryAction,
}
