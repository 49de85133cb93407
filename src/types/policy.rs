use std::time::Duration;
use uuid::Uuid;

use crate::types::tab::{TabContent, TabId};

/// Where a newly added tab lands in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPosition {
    ListEnd,
    AfterSelected,
}

/// App-level tab positioning configuration, supplied by the embedding
/// application rather than derived by the registry.
#[derive(Debug, Clone)]
pub struct TabPolicy {
    pub add_position: AddPosition,
    /// Content given to the replacement tab created when the last tab closes.
    pub default_content: TabContent,
    /// When set, the tab-added notification for a selected addition is held
    /// back this long so in-flight UI layout can settle first. The count and
    /// selection notifications are never delayed.
    pub add_notification_delay: Option<Duration>,
    /// Sentinel selected-tab id used before the registry's startup fetch
    /// completes. Filtered out of the selected-tab broadcast channel.
    pub default_selected_tab_id: TabId,
}

impl Default for TabPolicy {
    fn default() -> Self {
        Self {
            add_position: AddPosition::ListEnd,
            default_content: TabContent::Blank,
            add_notification_delay: None,
            default_selected_tab_id: Uuid::nil(),
        }
    }
}
