//! Page-scoped row selection.

use std::collections::HashSet;
use std::hash::Hash;

/// Tracks which of the currently visible rows are selected.
///
/// Only ids present in the visible page can be selected. When the visible
/// rows change, ids that left the page are dropped.
#[derive(Debug, Clone)]
pub struct SelectionLedger<Id> {
    visible: Vec<Id>,
    selected: HashSet<Id>,
}

impl<Id> Default for SelectionLedger<Id> {
    fn default() -> Self {
        Self {
            visible: Vec::new(),
            selected: HashSet::new(),
        }
    }
}

impl<Id: Copy + Eq + Hash> SelectionLedger<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the visible ids and recomputes the selection against them.
    pub fn sync_rows(&mut self, ids: impl IntoIterator<Item = Id>) {
        self.visible = ids.into_iter().collect();
        let visible: HashSet<Id> = self.visible.iter().copied().collect();
        self.selected.retain(|id| visible.contains(id));
    }

    pub fn select_all(&mut self) {
        self.selected = self.visible.iter().copied().collect();
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    /// Ignored when `id` is not on the visible page.
    pub fn select_one(&mut self, id: Id) {
        if self.visible.contains(&id) {
            self.selected.insert(id);
        }
    }

    pub fn deselect_one(&mut self, id: Id) {
        self.selected.remove(&id);
    }

    pub fn is_selected(&self, id: Id) -> bool {
        self.selected.contains(&id)
    }

    pub fn all_selected(&self) -> bool {
        !self.visible.is_empty() && self.visible.iter().all(|id| self.selected.contains(id))
    }

    pub fn some_selected(&self) -> bool {
        !self.selected.is_empty() && !self.all_selected()
    }

    /// Selected ids in page order.
    pub fn selected(&self) -> Vec<Id> {
        self.visible
            .iter()
            .copied()
            .filter(|id| self.selected.contains(id))
            .collect()
    }
}
