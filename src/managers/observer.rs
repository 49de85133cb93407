//! Observer contract for tab registry notifications.

use crate::types::tab::{Tab, TabContent, TabId};

/// Push notifications emitted by the tab registry. Each event carries enough
/// data that consumers never need to re-query the registry.
///
/// There is no tab-removed event: the UI drops its view immediately and infers
/// the model-side removal from the following count or selection change.
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    CountChanged(usize),
    TabAdded { tab: Tab, index: usize },
    TabReplaced { tab: Tab, index: usize },
    SelectionChanged {
        id: TabId,
        index: usize,
        content: TabContent,
    },
}

/// Trait for registry observers. Methods default to no-ops so observers
/// implement only what they render.
///
/// Callbacks are delivered from the registry's notifier task, in mutation
/// order, regardless of which task issued the command.
pub trait TabsObserverTrait: Send + Sync {
    fn tabs_count_changed(&self, _count: usize) {}
    fn initial_tabs(&self, _tabs: &[Tab]) {}
    fn tab_added(&self, _tab: &Tab, _index: usize) {}
    fn tab_replaced(&self, _tab: &Tab, _index: usize) {}
    fn tab_selected(&self, _index: usize, _content: &TabContent, _id: TabId) {}
}
