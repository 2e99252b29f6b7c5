//! Load-more trigger guard for scrolling lists.

use cinelist_api::catalog::Movie;

/// Decides when a list view should ask for the next page.
///
/// The trigger fires when the last item becomes visible, at most once per
/// last item id. Repeated visibility of the same last item (re-renders,
/// jitter) does not fire again until new items arrive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadMoreTrigger {
    last_fired: Option<u64>,
}

impl LoadMoreTrigger {
    /// Creates a trigger that has never fired.
    #[must_use]
    pub const fn new() -> Self {
        Self { last_fired: None }
    }

    /// Reports that the item with `visible_id` is on screen.
    ///
    /// Returns `true` when the caller should invoke `load_more`.
    pub fn on_item_visible(&mut self, visible_id: u64, items: &[Movie]) -> bool {
        let Some(last) = items.last() else {
            return false;
        };
        if last.id != visible_id {
            return false;
        }
        if self.last_fired == Some(last.id) {
            return false;
        }
        self.last_fired = Some(last.id);
        tracing::trace!(last_id = last.id, count = items.len(), "load more triggered");
        true
    }

    /// Forgets the last firing, e.g. after a refresh replaced the list.
    pub const fn reset(&mut self) {
        self.last_fired = None;
    }

    /// Id of the item that last fired the trigger.
    #[must_use]
    pub const fn last_fired(&self) -> Option<u64> {
        self.last_fired
    }
}
