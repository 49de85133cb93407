use serde::{Deserialize, Serialize};

use crate::types::errors::SessionError;
use crate::types::tab::{Tab, TabId};

/// Serializable snapshot of the open-tab set, handed to session save/restore
/// collaborators. The registry produces it; restoring goes through storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub tabs: Vec<Tab>,
    pub selected_tab_id: TabId,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String, SessionError> {
        serde_json::to_string(self).map_err(|e| SessionError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        serde_json::from_str(json).map_err(|e| SessionError::Serialization(e.to_string()))
    }
}
