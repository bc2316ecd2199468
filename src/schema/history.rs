use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted record of a player choice: what was on screen, what was
/// picked, and who picked it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub scene_text: String,
    pub choice_text: String,
    pub user_id: String,
    pub app_id: String,
    pub timestamp: DateTime<Utc>,
}
