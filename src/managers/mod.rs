// WebSession state managers
// Managers handle stateful operations: the tab registry and its selection policy.

pub mod observer;
pub mod selection;
pub mod tab_registry;
