//! Property-based tests for the tab registry core.
//!
//! These drive arbitrary add/close/select sequences against `RegistryCore`
//! (the synchronous state the actor serializes) and check the two structural
//! invariants: the collection is never left empty by a close, and at most one
//! tab is visually selected at any observed instant.

use proptest::prelude::*;

use websession::managers::selection::NearbySelectionStrategy;
use websession::managers::tab_registry::RegistryCore;
use websession::types::policy::TabPolicy;
use websession::types::tab::{Tab, TabContent, VisualState};

/// Operations that can be performed on the registry core.
#[derive(Debug, Clone)]
enum TabOp {
    AddSelected,
    AddDeselected,
    Close(usize),  // index into the current collection to pick which tab to close
    Select(usize), // index into the current collection to pick which tab to select
    CloseAll,
}

/// Strategy for generating an operation sequence, biased toward adds so
/// interesting collection shapes build up.
fn arb_tab_ops() -> impl Strategy<Value = Vec<TabOp>> {
    prop::collection::vec(
        prop_oneof![
            3 => Just(TabOp::AddSelected),
            2 => Just(TabOp::AddDeselected),
            3 => (0..20usize).prop_map(TabOp::Close),
            2 => (0..20usize).prop_map(TabOp::Select),
            1 => Just(TabOp::CloseAll),
        ],
        1..60,
    )
}

fn new_core() -> RegistryCore {
    RegistryCore::new(TabPolicy::default(), Box::new(NearbySelectionStrategy))
}

fn selected_tab_count(core: &RegistryCore) -> usize {
    core.tabs().iter().filter(|t| t.is_selected()).count()
}

// **Property: never-empty after close**
//
// For any operation sequence, a close never leaves the collection empty:
// closing the last tab synchronously replaces it with a fresh default tab.
//
// **Property: at most one selected tab**
//
// At every step, at most one tab is visually selected, and the selected-tab
// id always points at a live tab once a selection exists.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    #[test]
    fn registry_core_invariants_hold(ops in arb_tab_ops()) {
        let mut core = new_core();
        let mut performed_close = false;

        for op in &ops {
            match op {
                TabOp::AddSelected => {
                    core.add_tab(Tab::new(TabContent::Homepage, VisualState::Selected));
                }
                TabOp::AddDeselected => {
                    core.add_tab(Tab::new(TabContent::Favorites, VisualState::Deselected));
                }
                TabOp::Close(idx) => {
                    if core.count() > 0 {
                        let pick = idx % core.count();
                        let id = core.tabs()[pick].id;
                        let _ = core.close_tab(id);
                        performed_close = true;
                    }
                }
                TabOp::Select(idx) => {
                    if core.count() > 0 {
                        let pick = idx % core.count();
                        let id = core.tabs()[pick].id;
                        let _ = core.select(id);
                    }
                }
                TabOp::CloseAll => {
                    let _ = core.close_all();
                    performed_close = true;
                }
            }

            if performed_close {
                prop_assert!(
                    core.count() >= 1,
                    "collection must never be left empty by a close, after {:?}",
                    op
                );
            }

            prop_assert!(
                selected_tab_count(&core) <= 1,
                "more than one visually selected tab after {:?}",
                op
            );

            let selected_id = core.selected_id();
            if selected_id != core.policy().default_selected_tab_id {
                prop_assert!(
                    core.tabs().iter().any(|t| t.id == selected_id),
                    "selected id points at no live tab after {:?}",
                    op
                );
                prop_assert_eq!(
                    selected_tab_count(&core),
                    1,
                    "a live selection must be reflected in exactly one visual state"
                );
            }
        }
    }

    // **Property: count arithmetic**
    //
    // `count()` equals adds minus successful closes, accounting for the
    // auto-created replacement when the last tab closes.
    #[test]
    fn registry_core_count_tracks_operations(ops in arb_tab_ops()) {
        let mut core = new_core();
        let mut expected: usize = 0;

        for op in &ops {
            match op {
                TabOp::AddSelected | TabOp::AddDeselected => {
                    core.add_tab(Tab::new(TabContent::Homepage, VisualState::Selected));
                    expected += 1;
                }
                TabOp::Close(idx) => {
                    if core.count() > 0 {
                        let pick = idx % core.count();
                        let id = core.tabs()[pick].id;
                        let was_last = core.count() == 1;
                        let _ = core.close_tab(id);
                        if !was_last {
                            expected -= 1;
                        }
                        // Closing the last tab removes one and creates one.
                    }
                }
                TabOp::Select(_) => {}
                TabOp::CloseAll => {
                    let _ = core.close_all();
                    expected = 1;
                }
            }
            prop_assert_eq!(core.count(), expected, "after {:?}", op);
        }
    }
}
