//! Selection flags live on the dataset rows and are independent of the view.

use std::collections::HashSet;

use tracing::trace;

use crate::dataset::{Dataset, RowId};

impl Dataset {
    /// Unknown ids are ignored, the UI may still reference a row from a stale page.
    pub fn set_selected(&mut self, id: RowId, selected: bool) {
        match self.get_mut(id) {
            Some(row) => row.selected = selected,
            None => trace!("Ignoring selection of unknown row {id}"),
        }
    }

    pub fn toggle(&mut self, id: RowId) {
        let selected = self.get(id).map(|r| !r.selected).unwrap_or(false);
        self.set_selected(id, selected);
    }

    pub fn set_selected_for_ids(&mut self, ids: &HashSet<RowId>, selected: bool) {
        for &id in ids {
            self.set_selected(id, selected);
        }
    }

    pub fn selected_count(&self) -> usize {
        self.rows().iter().filter(|r| r.selected).count()
    }

    /// True iff every known row in `ids` is selected. Vacuously true for no rows.
    pub fn is_all_selected_on(&self, ids: &HashSet<RowId>) -> bool {
        ids.iter()
            .filter_map(|&id| self.get(id))
            .all(|row| row.selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_id_is_a_noop() {
        let mut data = Dataset::sample();
        data.set_selected(42, true);
        data.toggle(42);
        assert_eq!(data.selected_count(), 0);
    }

    #[test]
    fn toggle_flips_one_row() {
        let mut data = Dataset::sample();
        data.toggle(1003);
        assert!(data.get(1003).unwrap().selected);
        assert_eq!(data.selected_count(), 1);
        data.toggle(1003);
        assert_eq!(data.selected_count(), 0);
    }

    #[test]
    fn select_all_on_partially_selected_page() {
        let mut data = Dataset::sample();
        let page: HashSet<RowId> = (1001..=1010).collect();
        for id in [1002, 1005, 1009] {
            data.set_selected(id, true);
        }
        assert!(!data.is_all_selected_on(&page));

        data.set_selected_for_ids(&page, true);
        assert_eq!(data.selected_count(), 10);
        assert!(data.is_all_selected_on(&page));

        data.set_selected_for_ids(&page, false);
        assert_eq!(data.selected_count(), 0);
    }

    #[test]
    fn is_all_selected_ignores_unknown_ids() {
        let mut data = Dataset::sample();
        data.set_selected(1001, true);
        let ids: HashSet<RowId> = [1001, 9999].into_iter().collect();
        assert!(data.is_all_selected_on(&ids));
        assert!(data.is_all_selected_on(&HashSet::new()));
    }
}
