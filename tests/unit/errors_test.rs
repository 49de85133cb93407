use websession::types::errors::{DnsError, SessionError, StorageError, TabError, WebLoadError};

#[test]
fn test_tab_error_display() {
    assert_eq!(TabError::NotInitializedYet.to_string(), "No tab selected yet");
    assert_eq!(
        TabError::SelectedNotFound.to_string(),
        "Selected tab not found"
    );
    assert_eq!(
        TabError::WrongTabContent.to_string(),
        "A site tab requires a preview image"
    );
    assert_eq!(
        TabError::WrongTabIndexToReplace.to_string(),
        "No valid index for the tab to replace"
    );
    assert_eq!(
        TabError::TabContentAlreadySet.to_string(),
        "Tab content already set"
    );
    assert_eq!(
        TabError::FailToUpdateTabContent("disk full".to_string()).to_string(),
        "Failed to persist tab content: disk full"
    );
}

#[test]
fn test_web_load_error_display() {
    let err = WebLoadError::UnexpectedStateForAction {
        state: "initialized",
        action: "goBack",
    };
    assert_eq!(
        err.to_string(),
        "Action `goBack` is not valid in state `initialized`"
    );
    assert_eq!(
        WebLoadError::NotImplemented.to_string(),
        "Transition not implemented"
    );
}

#[test]
fn test_storage_error_display() {
    assert_eq!(
        StorageError::Backend("timeout".to_string()).to_string(),
        "Storage backend error: timeout"
    );
    assert_eq!(
        StorageError::Disconnected.to_string(),
        "Storage owner dropped mid-operation"
    );
    assert_eq!(StorageError::NotFound.to_string(), "Record not found");
}

#[test]
fn test_dns_error_display() {
    assert_eq!(
        DnsError::ResolutionFailed("NXDOMAIN".to_string()).to_string(),
        "DNS resolution failed: NXDOMAIN"
    );
    assert_eq!(
        DnsError::MissingHost.to_string(),
        "URL has no host to resolve"
    );
    assert_eq!(DnsError::Cancelled.to_string(), "DNS resolution cancelled");
}

#[test]
fn test_session_error_display() {
    assert_eq!(
        SessionError::Serialization("bad token".to_string()).to_string(),
        "Session serialization error: bad token"
    );
}

#[test]
fn test_errors_are_std_errors() {
    fn assert_error<E: std::error::Error>(_e: &E) {}
    assert_error(&TabError::NotInitializedYet);
    assert_error(&WebLoadError::NotImplemented);
    assert_error(&StorageError::NotFound);
    assert_error(&DnsError::MissingHost);
}
