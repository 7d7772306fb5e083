use std::collections::HashSet;

use tracing::{debug, trace};

use crate::dataset::{Dataset, Row, RowId};
use crate::export::SelectionPayload;
use crate::projection::{Projection, project};
use crate::view::{SortKey, ViewState};

/// A single interaction that changes the grid.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    SortBy(SortKey),
    SetQuery(String),
    SetPageSize(usize),
    PrevPage,
    NextPage,
    SetSelected(RowId, bool),
    ToggleSelected(RowId),
    SelectPage(bool),
}

/// Session state: the dataset, the view on it and the current projection.
#[derive(Debug)]
pub struct Grid {
    dataset: Dataset,
    view: ViewState,
    projection: Projection,
}

impl Grid {
    pub fn new(dataset: Dataset, view: ViewState) -> Self {
        let mut grid = Grid {
            dataset,
            view,
            projection: Projection::default(),
        };
        grid.reproject();
        grid
    }

    /// Applies one event and re-projects exactly once.
    pub fn dispatch(&mut self, event: GridEvent) {
        trace!("Dispatch {event:?}");
        match event {
            GridEvent::SortBy(key) => self.view.sort_by(key),
            GridEvent::SetQuery(query) => self.view.set_query(&query),
            GridEvent::SetPageSize(size) => {
                self.view.set_page_size(size);
            }
            GridEvent::PrevPage => self.view.prev_page(),
            GridEvent::NextPage => self.view.next_page(),
            GridEvent::SetSelected(id, selected) => self.dataset.set_selected(id, selected),
            GridEvent::ToggleSelected(id) => self.dataset.toggle(id),
            GridEvent::SelectPage(selected) => {
                let ids = self.page_ids();
                self.dataset.set_selected_for_ids(&ids, selected);
            }
        }
        self.reproject();
    }

    fn reproject(&mut self) {
        self.projection = project(&self.dataset, &self.view);
        if self.projection.page != self.view.page {
            debug!("Clamped page {} to {}", self.view.page, self.projection.page);
            self.view.page = self.projection.page;
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn visible_rows(&self) -> Vec<&Row> {
        self.projection.rows(&self.dataset)
    }

    pub fn page_ids(&self) -> HashSet<RowId> {
        self.visible_rows().iter().map(|r| r.id).collect()
    }

    pub fn is_page_selected(&self) -> bool {
        self.dataset.is_all_selected_on(&self.page_ids())
    }

    pub fn selected_count(&self) -> usize {
        self.dataset.selected_count()
    }

    /// One read of the selection, `count` derives from it.
    pub fn payload(&self) -> SelectionPayload {
        self.dataset.selection_payload()
    }
}
