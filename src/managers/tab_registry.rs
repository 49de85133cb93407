//! Tab Registry for WebSession.
//!
//! Single source of truth for the open-tab collection. A cloneable handle
//! sends commands to an actor task that serializes every mutation and read,
//! so concurrent callers can never interleave partial updates. Two broadcast
//! channels (tab count, selected tab) feed a notifier task that fans events
//! out to registered observers from one execution context.
//!
//! In-memory state is authoritative: storage writes that fail are logged and
//! never reverted.

use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc, oneshot};

use crate::managers::observer::{RegistryEvent, TabsObserverTrait};
use crate::managers::selection::TabSelectionStrategyTrait;
use crate::storage::TabStorageTrait;
use crate::types::errors::TabError;
use crate::types::policy::{AddPosition, TabPolicy};
use crate::types::session::SessionSnapshot;
use crate::types::tab::{Tab, TabContent, TabId, VisualState};

/// Payload of the selected-tab broadcast channel. Carries enough data that
/// subscribers never need to re-query the registry.
#[derive(Debug, Clone)]
pub struct SelectedTab {
    pub id: TabId,
    pub index: usize,
    pub content: TabContent,
}

// === RegistryCore ===

/// Outcome of closing a tab, with everything the actor needs to persist.
pub struct CloseOutcome {
    pub removed: Vec<Tab>,
    pub replacement: Option<Tab>,
    pub new_selected: Option<TabId>,
    pub events: Vec<RegistryEvent>,
}

/// Synchronous in-memory core of the tab registry.
///
/// Holds the authoritative tab collection and the selected-tab id, and
/// enforces the two structural invariants: the collection is never left empty
/// by a close, and at most one tab is visually selected. The actor wraps this
/// core; it is public so invariant tests can drive it directly.
pub struct RegistryCore {
    tabs: Vec<Tab>,
    selected_id: TabId,
    policy: TabPolicy,
    strategy: Box<dyn TabSelectionStrategyTrait>,
}

impl RegistryCore {
    pub fn new(policy: TabPolicy, strategy: Box<dyn TabSelectionStrategyTrait>) -> Self {
        Self {
            tabs: Vec::new(),
            selected_id: policy.default_selected_tab_id,
            policy,
            strategy,
        }
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn count(&self) -> usize {
        self.tabs.len()
    }

    pub fn selected_id(&self) -> TabId {
        self.selected_id
    }

    pub fn policy(&self) -> &TabPolicy {
        &self.policy
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == self.selected_id)
    }

    /// Loads the startup fetch result. A selected id that matches no fetched
    /// tab is discarded and the sentinel kept, so observers are not fed a
    /// dangling selection.
    pub fn restore(&mut self, tabs: Vec<Tab>, selected: Option<TabId>) {
        self.tabs = tabs;
        self.selected_id = match selected {
            Some(id) if self.tabs.iter().any(|t| t.id == id) => id,
            _ => self.policy.default_selected_tab_id,
        };
        let selected_id = self.selected_id;
        for tab in &mut self.tabs {
            tab.visual_state = if tab.id == selected_id {
                VisualState::Selected
            } else {
                VisualState::Deselected
            };
        }
    }

    /// Inserts a tab per the configured add position. The new tab takes the
    /// selection only when it arrives selected and the strategy opts in.
    pub fn add_tab(&mut self, mut tab: Tab) -> Vec<RegistryEvent> {
        let takes_selection = tab.is_selected() && self.strategy.selects_newly_added_tab();
        if !takes_selection {
            tab.visual_state = VisualState::Deselected;
        }

        let index = match self.policy.add_position {
            AddPosition::ListEnd => self.tabs.len(),
            AddPosition::AfterSelected => self
                .selected_index()
                .map(|i| i + 1)
                .unwrap_or(self.tabs.len()),
        };
        self.tabs.insert(index, tab.clone());

        let mut events = vec![
            RegistryEvent::CountChanged(self.tabs.len()),
            RegistryEvent::TabAdded {
                tab: tab.clone(),
                index,
            },
        ];
        if takes_selection {
            self.move_selection_to(tab.id);
            events.push(RegistryEvent::SelectionChanged {
                id: tab.id,
                index,
                content: tab.content,
            });
        }
        events
    }

    /// Removes the tab with `id`. Unknown ids are a silent no-op (a tap on a
    /// ghost view must never fail). Closing the last tab synchronously
    /// creates a default-content replacement before returning.
    pub fn close_tab(&mut self, id: TabId) -> Option<CloseOutcome> {
        let removed_index = self.tabs.iter().position(|t| t.id == id)?;
        let last_valid_index = self.tabs.len() - 1;
        let old_selected_index = self.selected_index();
        let was_selected = self.tabs[removed_index].is_selected();
        let removed = self.tabs.remove(removed_index);

        if self.tabs.is_empty() {
            let (replacement, mut events) = self.create_replacement_tab();
            events.insert(0, RegistryEvent::CountChanged(self.tabs.len()));
            return Some(CloseOutcome {
                removed: vec![removed],
                replacement: Some(replacement),
                new_selected: Some(self.selected_id),
                events,
            });
        }

        let mut events = vec![RegistryEvent::CountChanged(self.tabs.len())];
        let mut new_selected = None;
        if let Some(old_index) = old_selected_index {
            let next_index =
                self.strategy
                    .next_selected_index(last_valid_index, old_index, removed_index);
            let next_id = self.tabs[next_index].id;
            if was_selected {
                // Same numeric index, different tab: the selection change
                // must still be re-notified because the content differs.
                self.move_selection_to(next_id);
                new_selected = Some(next_id);
                events.push(RegistryEvent::SelectionChanged {
                    id: next_id,
                    index: next_index,
                    content: self.tabs[next_index].content.clone(),
                });
            }
        }

        Some(CloseOutcome {
            removed: vec![removed],
            replacement: None,
            new_selected,
            events,
        })
    }

    /// Removes every tab, then performs the same single-replacement step as
    /// closing the last tab.
    pub fn close_all(&mut self) -> CloseOutcome {
        let removed = std::mem::take(&mut self.tabs);
        let (replacement, mut events) = self.create_replacement_tab();
        events.insert(0, RegistryEvent::CountChanged(self.tabs.len()));
        CloseOutcome {
            removed,
            replacement: Some(replacement),
            new_selected: Some(self.selected_id),
            events,
        }
    }

    /// Moves the selection. Unknown ids and reselecting the current tab are
    /// silent no-ops.
    pub fn select(&mut self, id: TabId) -> Option<Vec<RegistryEvent>> {
        let index = self.tabs.iter().position(|t| t.id == id)?;
        if id == self.selected_id {
            return None;
        }
        self.move_selection_to(id);
        Some(vec![RegistryEvent::SelectionChanged {
            id,
            index,
            content: self.tabs[index].content.clone(),
        }])
    }

    /// Overwrites the selected tab's content, clearing its preview.
    pub fn replace_selected_content(
        &mut self,
        content: TabContent,
    ) -> Result<(Tab, usize, Vec<RegistryEvent>), TabError> {
        if self.selected_id == self.policy.default_selected_tab_id {
            return Err(TabError::NotInitializedYet);
        }
        let index = self
            .selected_index()
            .ok_or(TabError::WrongTabIndexToReplace)?;
        if self.tabs[index].content == content {
            return Err(TabError::TabContentAlreadySet);
        }
        self.tabs[index].set_content(content);
        let tab = self.tabs[index].clone();
        let events = vec![RegistryEvent::TabReplaced {
            tab: tab.clone(),
            index,
        }];
        Ok((tab, index, events))
    }

    /// Stores preview bytes on the selected tab. A site tab must always carry
    /// a live preview, so `None` is rejected for it.
    pub fn update_selected_preview(&mut self, preview: Option<Vec<u8>>) -> Result<(), TabError> {
        let index = self.selected_index().ok_or(TabError::SelectedNotFound)?;
        if self.tabs[index].content.is_site() && preview.is_none() {
            return Err(TabError::WrongTabContent);
        }
        self.tabs[index].preview = preview;
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            tabs: self.tabs.clone(),
            selected_tab_id: self.selected_id,
        }
    }

    fn move_selection_to(&mut self, id: TabId) {
        for tab in &mut self.tabs {
            tab.visual_state = if tab.id == id {
                VisualState::Selected
            } else {
                VisualState::Deselected
            };
        }
        self.selected_id = id;
    }

    fn create_replacement_tab(&mut self) -> (Tab, Vec<RegistryEvent>) {
        let tab = Tab::new(self.policy.default_content.clone(), VisualState::Selected);
        self.tabs.push(tab.clone());
        self.selected_id = tab.id;
        let events = vec![
            RegistryEvent::TabAdded {
                tab: tab.clone(),
                index: 0,
            },
            RegistryEvent::SelectionChanged {
                id: tab.id,
                index: 0,
                content: tab.content.clone(),
            },
        ];
        (tab, events)
    }
}

// === TabRegistry ===

enum Command {
    TabsCount(oneshot::Sender<usize>),
    SelectedTabId(oneshot::Sender<TabId>),
    AllTabs(oneshot::Sender<Vec<Tab>>),
    AddTab(Tab, oneshot::Sender<()>),
    CloseTabWithId(TabId, oneshot::Sender<()>),
    CloseAll(oneshot::Sender<()>),
    SelectTabWithId(TabId, oneshot::Sender<()>),
    ReplaceSelectedContent(TabContent, oneshot::Sender<Result<(), TabError>>),
    UpdateSelectedTabPreview(Option<Vec<u8>>, oneshot::Sender<Result<(), TabError>>),
    Attach(Arc<dyn TabsObserverTrait>, bool, oneshot::Sender<()>),
    Detach(Arc<dyn TabsObserverTrait>, oneshot::Sender<()>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

type ObserverList = Arc<Mutex<Vec<Arc<dyn TabsObserverTrait>>>>;

/// Handle to the tab registry actor. Cloneable; every operation is a message
/// send awaiting the actor's reply, so callers on any task see strictly
/// ordered, atomic state transitions.
#[derive(Clone)]
pub struct TabRegistry {
    tx: mpsc::Sender<Command>,
    count_tx: broadcast::Sender<usize>,
    selected_tx: broadcast::Sender<SelectedTab>,
}

impl TabRegistry {
    /// Spawns the registry actor and its notifier task. The actor performs a
    /// startup fetch from storage before serving commands; commands issued in
    /// the meantime queue up behind it.
    pub fn new(
        storage: Arc<dyn TabStorageTrait>,
        policy: TabPolicy,
        strategy: Box<dyn TabSelectionStrategyTrait>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let (count_tx, _) = broadcast::channel(32);
        let (selected_tx, _) = broadcast::channel(32);
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let observers: ObserverList = Arc::new(Mutex::new(Vec::new()));

        spawn_notifier(observers.clone(), ui_rx);

        let actor = RegistryActor {
            core: RegistryCore::new(policy, strategy),
            storage,
            observers,
            count_tx: count_tx.clone(),
            selected_tx: selected_tx.clone(),
            ui_tx,
            rx,
        };
        tokio::spawn(actor.run());

        Self {
            tx,
            count_tx,
            selected_tx,
        }
    }

    /// Subscribes to the tab-count broadcast channel.
    pub fn subscribe_count(&self) -> broadcast::Receiver<usize> {
        self.count_tx.subscribe()
    }

    /// Subscribes to the selected-tab broadcast channel. The pre-init
    /// sentinel id is never published on it.
    pub fn subscribe_selected(&self) -> broadcast::Receiver<SelectedTab> {
        self.selected_tx.subscribe()
    }

    pub async fn tabs_count(&self) -> usize {
        self.query(Command::TabsCount).await.unwrap_or(0)
    }

    pub async fn selected_tab_id(&self) -> TabId {
        self.query(Command::SelectedTabId)
            .await
            .unwrap_or_else(uuid::Uuid::nil)
    }

    pub async fn all_tabs(&self) -> Vec<Tab> {
        self.query(Command::AllTabs).await.unwrap_or_default()
    }

    pub async fn add_tab(&self, tab: Tab) {
        let _ = self.query(|reply| Command::AddTab(tab, reply)).await;
    }

    pub async fn close_tab(&self, tab: &Tab) {
        self.close_tab_with_id(tab.id).await;
    }

    pub async fn close_tab_with_id(&self, id: TabId) {
        let _ = self
            .query(|reply| Command::CloseTabWithId(id, reply))
            .await;
    }

    pub async fn close_all(&self) {
        let _ = self.query(Command::CloseAll).await;
    }

    pub async fn select_tab_with_id(&self, id: TabId) {
        let _ = self
            .query(|reply| Command::SelectTabWithId(id, reply))
            .await;
    }

    pub async fn replace_selected_content(&self, content: TabContent) -> Result<(), TabError> {
        self.query(|reply| Command::ReplaceSelectedContent(content, reply))
            .await
            .unwrap_or(Ok(()))
    }

    pub async fn update_selected_tab_preview(
        &self,
        preview: Option<Vec<u8>>,
    ) -> Result<(), TabError> {
        self.query(|reply| Command::UpdateSelectedTabPreview(preview, reply))
            .await
            .unwrap_or(Ok(()))
    }

    /// Registers an observer. With `notify_immediately` the observer is fed
    /// the current count, the full tab list, and any existing selection
    /// before this call returns, so a freshly created UI surface can render
    /// without racing the next mutation.
    pub async fn attach(&self, observer: Arc<dyn TabsObserverTrait>, notify_immediately: bool) {
        let _ = self
            .query(|reply| Command::Attach(observer, notify_immediately, reply))
            .await;
    }

    pub async fn detach(&self, observer: Arc<dyn TabsObserverTrait>) {
        let _ = self.query(|reply| Command::Detach(observer, reply)).await;
    }

    pub async fn session_snapshot(&self) -> SessionSnapshot {
        self.query(Command::Snapshot).await.unwrap_or(SessionSnapshot {
            tabs: Vec::new(),
            selected_tab_id: uuid::Uuid::nil(),
        })
    }

    async fn query<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Option<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(make(reply_tx)).await.is_err() {
            log::error!("tab registry actor is gone; command dropped");
            return None;
        }
        reply_rx.await.ok()
    }
}

// === RegistryActor ===

struct RegistryActor {
    core: RegistryCore,
    storage: Arc<dyn TabStorageTrait>,
    observers: ObserverList,
    count_tx: broadcast::Sender<usize>,
    selected_tx: broadcast::Sender<SelectedTab>,
    ui_tx: mpsc::UnboundedSender<RegistryEvent>,
    rx: mpsc::Receiver<Command>,
}

impl RegistryActor {
    async fn run(mut self) {
        self.startup_fetch().await;
        while let Some(command) = self.rx.recv().await {
            self.handle(command).await;
        }
    }

    async fn startup_fetch(&mut self) {
        let tabs = match self.storage.fetch_all_tabs().await {
            Ok(tabs) => tabs,
            Err(e) => {
                log::warn!("startup tab fetch failed, starting empty: {}", e);
                Vec::new()
            }
        };
        let selected = match self.storage.fetch_selected_tab_id().await {
            Ok(id) => Some(id),
            Err(e) => {
                log::debug!("no persisted selection: {}", e);
                None
            }
        };
        self.core.restore(tabs, selected);
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::TabsCount(reply) => {
                let _ = reply.send(self.core.count());
            }
            Command::SelectedTabId(reply) => {
                let _ = reply.send(self.core.selected_id());
            }
            Command::AllTabs(reply) => {
                let _ = reply.send(self.core.tabs().to_vec());
            }
            Command::AddTab(tab, reply) => {
                let events = self.core.add_tab(tab);
                let added = events.iter().find_map(|event| match event {
                    RegistryEvent::TabAdded { tab, .. } => Some(tab.clone()),
                    _ => None,
                });
                // Persist before notifying; the in-memory add stands either way.
                let mut select = false;
                if let Some(added) = added {
                    select = added.is_selected();
                    if let Err(e) = self.storage.add(added, select).await {
                        log::warn!("failed to persist added tab: {}", e);
                    }
                }
                self.publish(events, select);
                let _ = reply.send(());
            }
            Command::CloseTabWithId(id, reply) => {
                if let Some(outcome) = self.core.close_tab(id) {
                    self.persist_close(&outcome).await;
                    self.publish(outcome.events, false);
                }
                let _ = reply.send(());
            }
            Command::CloseAll(reply) => {
                let outcome = self.core.close_all();
                self.persist_close(&outcome).await;
                self.publish(outcome.events, false);
                let _ = reply.send(());
            }
            Command::SelectTabWithId(id, reply) => {
                if let Some(events) = self.core.select(id) {
                    if let Err(e) = self.storage.select(id).await {
                        log::warn!("failed to persist selection: {}", e);
                    }
                    self.publish(events, false);
                }
                let _ = reply.send(());
            }
            Command::ReplaceSelectedContent(content, reply) => {
                let result = self.replace_selected_content(content).await;
                let _ = reply.send(result);
            }
            Command::UpdateSelectedTabPreview(preview, reply) => {
                let _ = reply.send(self.core.update_selected_preview(preview));
            }
            Command::Attach(observer, notify_immediately, reply) => {
                if notify_immediately {
                    observer.tabs_count_changed(self.core.count());
                    observer.initial_tabs(self.core.tabs());
                    if let Some(index) = self.core.selected_index() {
                        let tab = &self.core.tabs()[index];
                        observer.tab_selected(index, &tab.content, tab.id);
                    }
                }
                if let Ok(mut list) = self.observers.lock() {
                    list.push(observer);
                }
                let _ = reply.send(());
            }
            Command::Detach(observer, reply) => {
                if let Ok(mut list) = self.observers.lock() {
                    list.retain(|o| !Arc::ptr_eq(o, &observer));
                }
                let _ = reply.send(());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.core.snapshot());
            }
        }
    }

    async fn replace_selected_content(&mut self, content: TabContent) -> Result<(), TabError> {
        match self.core.replace_selected_content(content) {
            Ok((tab, _index, events)) => {
                // Persist before notifying; in-memory state is not reverted
                // on failure, but the caller learns about it.
                let persisted = self.storage.update(tab).await;
                self.publish(events, false);
                match persisted {
                    Ok(_) => Ok(()),
                    Err(e) => {
                        log::warn!("failed to persist replaced tab content: {}", e);
                        Err(TabError::FailToUpdateTabContent(e.to_string()))
                    }
                }
            }
            // Unchanged content is a successful no-op for callers.
            Err(TabError::TabContentAlreadySet) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn persist_close(&self, outcome: &CloseOutcome) {
        let ids: Vec<TabId> = outcome.removed.iter().map(|t| t.id).collect();
        if let Err(e) = self.storage.remove_all(ids).await {
            log::warn!("failed to persist tab removal: {}", e);
        }
        if let Some(replacement) = &outcome.replacement {
            if let Err(e) = self.storage.add(replacement.clone(), true).await {
                log::warn!("failed to persist replacement tab: {}", e);
            }
        } else if let Some(id) = outcome.new_selected {
            if let Err(e) = self.storage.select(id).await {
                log::warn!("failed to persist selection: {}", e);
            }
        }
    }

    /// Routes events to the broadcast channels and the notifier queue. The
    /// selected-tab channel filters the pre-init sentinel id. A delayed add
    /// holds back only the tab-added observer event.
    fn publish(&self, events: Vec<RegistryEvent>, delay_added: bool) {
        for event in events {
            match &event {
                RegistryEvent::CountChanged(count) => {
                    let _ = self.count_tx.send(*count);
                }
                RegistryEvent::SelectionChanged { id, index, content } => {
                    if *id == self.core.policy().default_selected_tab_id {
                        continue;
                    }
                    let _ = self.selected_tx.send(SelectedTab {
                        id: *id,
                        index: *index,
                        content: content.clone(),
                    });
                }
                _ => {}
            }

            let is_add = matches!(event, RegistryEvent::TabAdded { .. });
            match self.core.policy().add_notification_delay {
                Some(delay) if delay_added && is_add => {
                    let ui_tx = self.ui_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = ui_tx.send(event);
                    });
                }
                _ => {
                    let _ = self.ui_tx.send(event);
                }
            }
        }
    }
}

fn spawn_notifier(observers: ObserverList, mut ui_rx: mpsc::UnboundedReceiver<RegistryEvent>) {
    tokio::spawn(async move {
        while let Some(event) = ui_rx.recv().await {
            let list = match observers.lock() {
                Ok(list) => list.clone(),
                Err(_) => break,
            };
            for observer in &list {
                match &event {
                    RegistryEvent::CountChanged(count) => observer.tabs_count_changed(*count),
                    RegistryEvent::TabAdded { tab, index } => observer.tab_added(tab, *index),
                    RegistryEvent::TabReplaced { tab, index } => {
                        observer.tab_replaced(tab, *index)
                    }
                    RegistryEvent::SelectionChanged { id, index, content } => {
                        observer.tab_selected(*index, content, *id)
                    }
                }
            }
        }
    });
}
