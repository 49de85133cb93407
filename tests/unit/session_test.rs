use websession::types::session::SessionSnapshot;
use websession::types::site::{Site, SiteSettings, UrlInfo};
use websession::types::tab::{Tab, TabContent, VisualState};

#[test]
fn test_snapshot_json_round_trip() {
    let site = Site::new(
        UrlInfo::parse("https://example.com/docs?page=2").unwrap(),
        SiteSettings {
            is_private: true,
            ..SiteSettings::default()
        },
    );
    let mut tab = Tab::new(TabContent::Site(site), VisualState::Selected);
    tab.preview = Some(vec![0xDE, 0xAD, 0xBE, 0xEF]);
    let other = Tab::new(TabContent::Homepage, VisualState::Deselected);

    let snapshot = SessionSnapshot {
        selected_tab_id: tab.id,
        tabs: vec![tab, other],
    };

    let json = snapshot.to_json().unwrap();
    let restored = SessionSnapshot::from_json(&json).unwrap();
    assert_eq!(restored, snapshot);
}

#[test]
fn test_snapshot_rejects_malformed_json() {
    let err = SessionSnapshot::from_json("{\"tabs\": 42}").unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Session serialization error:"), "{}", message);
}
