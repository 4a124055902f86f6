//! Panel visibility and highlighted-item activation.
//!
//! Both run at the end of a cycle, after the collections were committed.

use super::input::Refresh;
use super::store::Store;
use crate::domain::highlight::active_item;
use crate::domain::state::{AutocompleteState, InputEvent, NextState};
use crate::source::OnActiveParams;
use std::sync::Arc;

/// Pluggable predicate deciding whether the panel should open for a state.
pub type PanelPredicate = Arc<dyn Fn(&AutocompleteState) -> bool + Send + Sync>;

/// Default visibility policy: open whenever there is at least one item.
#[must_use]
pub fn has_items(state: &AutocompleteState) -> bool {
    state.items_count() > 0
}

/// Decides panel visibility after a completed resolution.
///
/// An explicit `next_state.is_open` always wins. Otherwise the panel opens when
/// the predicate holds, either through the open-on-focus term or on its own.
///
/// # Example
///
/// ```
/// use typeahead::{decide_visibility, NextState};
///
/// assert!(decide_visibility(NextState::open(true), false, "x", false));
/// assert!(!decide_visibility(NextState::default(), true, "", false));
/// assert!(decide_visibility(NextState::default(), false, "x", true));
/// ```
#[must_use]
#[allow(clippy::nonminimal_bool)]
pub fn decide_visibility(
    next_state: NextState,
    open_on_focus: bool,
    query: &str,
    should_panel_open: bool,
) -> bool {
    // Focus-triggered opening is subject to the same predicate as typing.
    next_state
        .is_open
        .unwrap_or((open_on_focus && query.is_empty() && should_panel_open) || should_panel_open)
}

/// Notifies the source of the highlighted item, if there is one.
///
/// The highlighted item is recomputed from the store's current `active_item_id`
/// and collections. Returns whether a source was notified.
pub fn activate_highlighted(store: &Arc<dyn Store>, event: InputEvent, refresh: &Refresh) -> bool {
    let state = store.get_state();
    if state.active_item_id.is_none() {
        return false;
    }
    let Some(highlighted) = active_item(&state) else {
        tracing::debug!(active_item_id = ?state.active_item_id, "active item id matches no item");
        return false;
    };

    tracing::debug!(
        source_id = %highlighted.source.source_id(),
        active_item_id = ?state.active_item_id,
        "activating highlighted item"
    );
    highlighted.source.on_active(&OnActiveParams {
        item: &highlighted.item,
        item_input_value: &highlighted.item_input_value,
        item_url: highlighted.item_url.as_deref(),
        event,
        state: &state,
        store,
        refresh,
    });
    true
}
