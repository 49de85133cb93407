//! Storage collaborator boundary for WebSession.
//!
//! The registry persists through this trait but treats its own in-memory state
//! as authoritative: a storage failure is logged, never reverted. Persistent
//! backends live outside this crate; [`InMemoryTabStorage`] backs the demo and
//! tests.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::types::errors::StorageError;
use crate::types::tab::{Tab, TabId};

/// Trait defining the tab persistence interface.
#[async_trait]
pub trait TabStorageTrait: Send + Sync {
    async fn fetch_all_tabs(&self) -> Result<Vec<Tab>, StorageError>;
    async fn fetch_selected_tab_id(&self) -> Result<TabId, StorageError>;
    async fn add(&self, tab: Tab, select: bool) -> Result<Tab, StorageError>;
    async fn update(&self, tab: Tab) -> Result<Tab, StorageError>;
    async fn remove(&self, id: TabId) -> Result<Tab, StorageError>;
    async fn remove_all(&self, ids: Vec<TabId>) -> Result<Vec<Tab>, StorageError>;
    async fn select(&self, id: TabId) -> Result<TabId, StorageError>;
}

#[derive(Default)]
struct MemoryState {
    tabs: Vec<Tab>,
    selected: Option<TabId>,
}

/// In-memory tab storage.
#[derive(Default)]
pub struct InMemoryTabStorage {
    state: Mutex<MemoryState>,
}

impl InMemoryTabStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StorageError> {
        self.state.lock().map_err(|_| StorageError::Disconnected)
    }
}

#[async_trait]
impl TabStorageTrait for InMemoryTabStorage {
    async fn fetch_all_tabs(&self) -> Result<Vec<Tab>, StorageError> {
        Ok(self.lock()?.tabs.clone())
    }

    async fn fetch_selected_tab_id(&self) -> Result<TabId, StorageError> {
        self.lock()?.selected.ok_or(StorageError::NotFound)
    }

    async fn add(&self, tab: Tab, select: bool) -> Result<Tab, StorageError> {
        let mut state = self.lock()?;
        if select {
            state.selected = Some(tab.id);
        }
        state.tabs.push(tab.clone());
        Ok(tab)
    }

    async fn update(&self, tab: Tab) -> Result<Tab, StorageError> {
        let mut state = self.lock()?;
        let slot = state
            .tabs
            .iter_mut()
            .find(|t| t.id == tab.id)
            .ok_or(StorageError::NotFound)?;
        *slot = tab.clone();
        Ok(tab)
    }

    async fn remove(&self, id: TabId) -> Result<Tab, StorageError> {
        let mut state = self.lock()?;
        let idx = state
            .tabs
            .iter()
            .position(|t| t.id == id)
            .ok_or(StorageError::NotFound)?;
        if state.selected == Some(id) {
            state.selected = None;
        }
        Ok(state.tabs.remove(idx))
    }

    async fn remove_all(&self, ids: Vec<TabId>) -> Result<Vec<Tab>, StorageError> {
        let mut state = self.lock()?;
        let mut removed = Vec::new();
        for id in ids {
            if let Some(idx) = state.tabs.iter().position(|t| t.id == id) {
                if state.selected == Some(id) {
                    state.selected = None;
                }
                removed.push(state.tabs.remove(idx));
            }
        }
        Ok(removed)
    }

    async fn select(&self, id: TabId) -> Result<TabId, StorageError> {
        let mut state = self.lock()?;
        if !state.tabs.iter().any(|t| t.id == id) {
            return Err(StorageError::NotFound);
        }
        state.selected = Some(id);
        Ok(id)
    }
}
