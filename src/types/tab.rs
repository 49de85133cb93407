use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::types::site::Site;

/// Opaque tab identity, immutable for the tab's lifetime.
///
/// The nil UUID doubles as the "not yet initialized" sentinel for the
/// selected-tab id (see `TabPolicy::default_selected_tab_id`).
pub type TabId = Uuid;

/// What a tab is currently showing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TabContent {
    Blank,
    Site(Site),
    Homepage,
    Favorites,
    TopSites,
}

impl TabContent {
    /// True when the tab shows a concrete site rather than placeholder content.
    pub fn is_site(&self) -> bool {
        matches!(self, TabContent::Site(_))
    }
}

/// Selection marker. Exactly one tab holds `Selected` at any observed instant
/// (zero only during the pre-init sentinel window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualState {
    Selected,
    Deselected,
}

/// One browsing session slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub content: TabContent,
    pub visual_state: VisualState,
    /// Cached screenshot bytes; pull-only, read by the UI on next render.
    pub preview: Option<Vec<u8>>,
    pub created_at: i64,
}

impl Tab {
    pub fn new(content: TabContent, visual_state: VisualState) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            visual_state,
            preview: None,
            created_at: Self::now(),
        }
    }

    /// Overwrites the content and drops the preview: a stale screenshot must
    /// never be shown for new content.
    pub fn set_content(&mut self, content: TabContent) {
        self.content = content;
        self.preview = None;
    }

    pub fn is_selected(&self) -> bool {
        self.visual_state == VisualState::Selected
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}
