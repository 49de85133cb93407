use std::fmt;

// === TabError ===

/// Errors returned by tab registry commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabError {
    /// The operation needs a selected tab but no selection exists yet.
    NotInitializedYet,
    /// The selected tab id points at no live tab.
    SelectedNotFound,
    /// Preview update rejected: a site tab must always carry a live preview.
    WrongTabContent,
    /// The selected tab's index could not be resolved for replacement.
    WrongTabIndexToReplace,
    /// The requested content equals the current content. Call sites treat
    /// this as a successful no-op.
    TabContentAlreadySet,
    /// The storage write failed while replacing tab content.
    FailToUpdateTabContent(String),
}

impl fmt::Display for TabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabError::NotInitializedYet => write!(f, "No tab selected yet"),
            TabError::SelectedNotFound => write!(f, "Selected tab not found"),
            TabError::WrongTabContent => {
                write!(f, "A site tab requires a preview image")
            }
            TabError::WrongTabIndexToReplace => {
                write!(f, "No valid index for the tab to replace")
            }
            TabError::TabContentAlreadySet => write!(f, "Tab content already set"),
            TabError::FailToUpdateTabContent(msg) => {
                write!(f, "Failed to persist tab content: {}", msg)
            }
        }
    }
}

impl std::error::Error for TabError {}

// === WebLoadError ===

/// Errors raised by the page-load state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebLoadError {
    /// The (state, action) pair is not a declared transition. Signals a driver
    /// bug; the state is left unchanged.
    UnexpectedStateForAction {
        state: &'static str,
        action: &'static str,
    },
    /// Placeholder for an intentionally unhandled transition.
    NotImplemented,
}

impl fmt::Display for WebLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebLoadError::UnexpectedStateForAction { state, action } => {
                write!(f, "Action `{}` is not valid in state `{}`", action, state)
            }
            WebLoadError::NotImplemented => write!(f, "Transition not implemented"),
        }
    }
}

impl std::error::Error for WebLoadError {}

// === StorageError ===

/// Errors surfaced by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Opaque wrapped persistence error.
    Backend(String),
    /// The owning handle was dropped while the operation was in flight.
    Disconnected,
    /// No record matched the requested id.
    NotFound,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Backend(msg) => write!(f, "Storage backend error: {}", msg),
            StorageError::Disconnected => {
                write!(f, "Storage owner dropped mid-operation")
            }
            StorageError::NotFound => write!(f, "Record not found"),
        }
    }
}

impl std::error::Error for StorageError {}

// === DnsError ===

/// Errors from domain name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsError {
    /// The underlying resolver failed or the input URL was malformed.
    ResolutionFailed(String),
    /// The URL carries no host to resolve.
    MissingHost,
    /// The resolution was cancelled before completing.
    Cancelled,
}

impl fmt::Display for DnsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DnsError::ResolutionFailed(msg) => write!(f, "DNS resolution failed: {}", msg),
            DnsError::MissingHost => write!(f, "URL has no host to resolve"),
            DnsError::Cancelled => write!(f, "DNS resolution cancelled"),
        }
    }
}

impl std::error::Error for DnsError {}

// === SessionError ===

/// Errors from session snapshot encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Failed to serialize or deserialize snapshot data.
    Serialization(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Serialization(msg) => {
                write!(f, "Session serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for SessionError {}
