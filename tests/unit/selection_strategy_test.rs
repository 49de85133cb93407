use websession::managers::selection::{NearbySelectionStrategy, TabSelectionStrategyTrait};

const STRATEGY: NearbySelectionStrategy = NearbySelectionStrategy;

#[test]
fn test_removing_selected_middle_tab_keeps_index() {
    // 5 tabs, selected index 2, remove index 2: the next tab slides into the
    // slot, so the selected index stays 2.
    assert_eq!(STRATEGY.next_selected_index(4, 2, 2), 2);
}

#[test]
fn test_removing_selected_last_tab_steps_back() {
    // 5 tabs, selected index 4 (the last), remove it: selection moves to 3.
    assert_eq!(STRATEGY.next_selected_index(4, 4, 4), 3);
}

#[test]
fn test_removing_before_selection_shifts_it_down() {
    // 5 tabs, selected index 2, remove index 0: selection shifts to 1.
    assert_eq!(STRATEGY.next_selected_index(4, 2, 0), 1);
}

#[test]
fn test_removing_after_selection_leaves_it_alone() {
    assert_eq!(STRATEGY.next_selected_index(4, 1, 3), 1);
}

#[test]
fn test_removing_selected_only_remaining_candidate() {
    // Two tabs, selected 0, remove 0: next tab slides into slot 0.
    assert_eq!(STRATEGY.next_selected_index(1, 0, 0), 0);
}

#[test]
fn test_removing_selected_first_of_one_saturates() {
    // Degenerate single-tab case never underflows.
    assert_eq!(STRATEGY.next_selected_index(0, 0, 0), 0);
}

#[test]
fn test_strategy_selects_newly_added_tabs() {
    assert!(STRATEGY.selects_newly_added_tab());
}
