use serde::{Deserialize, Serialize};

/// A single accepted click on a bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub id: String,
    pub bookmark_id: String,
    pub user_id: String,
    pub clicked_at: i64,
}

/// What happened to a click submitted to the click manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A click log was written and the bookmark counter incremented.
    Recorded(ClickEvent),
    /// The same user clicked the same bookmark inside the dedup window.
    Suppressed,
}

impl ClickOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, ClickOutcome::Recorded(_))
    }
}
