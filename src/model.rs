use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{info, trace, warn};

use crate::dataset::Row;
use crate::domain::{CMDMode, GridConfig, GridError, HELP_TEXT, Message};
use crate::export::send_label;
use crate::grid::{Grid, GridEvent};
use crate::host::{Emission, Host};
use crate::inputter::{InputResult, Inputter};
use crate::view::{SortDir, SortKey};

const PREVIEW_ROWS: usize = 5;

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    POPUP,
    CMDINPUT,
}

/// One rendered table line.
#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub selected: bool,
    pub cells: Vec<String>,
}

impl RowView {
    fn from_row(row: &Row) -> Self {
        RowView {
            selected: row.selected,
            cells: vec![
                row.id.to_string(),
                row.item.clone(),
                row.qty.to_string(),
                row.price.display(),
                row.total.display(),
            ],
        }
    }
}

/// Everything the ui needs to draw a frame.
pub struct UIData {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<RowView>,
    pub selected_row: usize,
    pub page_selected: bool,
    pub page_label: String,
    pub has_prev: bool,
    pub has_next: bool,
    pub query: String,
    pub send_label: String,
    pub selected_count: usize,
    pub show_popup: bool,
    pub popup_message: String,
    pub last_update: Instant,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CMDMode>,
    pub active_cmdinput: bool,
    pub status_message: String,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            headers: Vec::new(),
            rows: Vec::new(),
            selected_row: 0,
            page_selected: false,
            page_label: String::new(),
            has_prev: false,
            has_next: false,
            query: String::new(),
            send_label: send_label(0),
            selected_count: 0,
            show_popup: false,
            popup_message: String::new(),
            last_update: Instant::now(),
            cmdinput: InputResult::default(),
            cmd_mode: None,
            active_cmdinput: false,
            status_message: String::new(),
        }
    }
}

pub struct Model {
    name: String,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    grid: Grid,
    host: Host,
    curser_row: usize,
    pending: VecDeque<Message>,
    uidata: UIData,
    clipboard: Option<Clipboard>,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    active_cmdinput: bool,
    status_message: String,
    local_payloads: Vec<String>,
}

impl Model {
    pub fn init(
        name: impl Into<String>,
        grid: Grid,
        mut host: Host,
        config: &GridConfig,
    ) -> Self {
        host.notify_ready();
        let clipboard = match Clipboard::new() {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("Clipboard not available: {e:?}");
                None
            }
        };
        let mut model = Self {
            name: name.into(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            grid,
            host,
            curser_row: 0,
            pending: VecDeque::new(),
            uidata: UIData::empty(),
            clipboard,
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            active_cmdinput: false,
            status_message: String::new(),
            local_payloads: Vec::new(),
        };
        if model.grid.view().page_size != config.page_size {
            model.grid.dispatch(GridEvent::SetPageSize(config.page_size));
        }
        let rows = model.grid.dataset().len();
        let message = if model.host.is_present() {
            format!("Loaded {rows} rows")
        } else {
            format!("Loaded {rows} rows, no host: selections stay local")
        };
        model.set_status_message(message);
        model.update_uidata();
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Payloads that never reached a host, in emission order.
    pub fn local_payloads(&self) -> &[String] {
        &self.local_payloads
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn enqueue(&mut self, message: Message) {
        self.pending.push_back(message);
    }

    /// Handles queued messages one at a time, each fully before the next.
    pub fn process_events(&mut self) -> Result<(), GridError> {
        while let Some(message) = self.pending.pop_front() {
            self.update(message)?;
        }
        Ok(())
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_update = Instant::now();
    }

    fn header(key: SortKey, active: SortKey, dir: SortDir) -> String {
        let name = key.name();
        if key != active {
            return name.to_string();
        }
        match dir {
            SortDir::Asc => format!("{name} ▲"),
            SortDir::Desc => format!("{name} ▼"),
        }
    }

    fn update_uidata(&mut self) {
        let grid = &self.grid;
        let view = grid.view();
        let projection = grid.projection();
        let rows: Vec<RowView> = grid.visible_rows().into_iter().map(RowView::from_row).collect();
        self.curser_row = std::cmp::min(self.curser_row, rows.len().saturating_sub(1));
        let selected_count = grid.selected_count();

        self.uidata = UIData {
            name: self.name.clone(),
            headers: SortKey::ALL
                .iter()
                .map(|&k| Self::header(k, view.sort_key, view.sort_dir))
                .collect(),
            rows,
            selected_row: self.curser_row,
            page_selected: grid.is_page_selected(),
            page_label: format!("Page {} / {}", projection.page, projection.page_count),
            has_prev: projection.has_prev(),
            has_next: projection.has_next(),
            query: view.query.clone(),
            send_label: send_label(selected_count),
            selected_count,
            show_popup: self.modus == Modus::POPUP,
            popup_message: std::mem::take(&mut self.uidata.popup_message),
            last_update: Instant::now(),
            cmdinput: self.last_input.clone(),
            cmd_mode: self.cmd_mode,
            active_cmdinput: self.active_cmdinput,
            status_message: self.status_message.clone(),
        };
    }

    pub fn update(&mut self, message: Message) -> Result<(), GridError> {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, message);
        match self.modus {
            Modus::TABLE => match message {
                Message::Quit => self.quit(),
                Message::MoveUp => self.move_curser(-1),
                Message::MoveDown => self.move_curser(1),
                Message::PrevPage => self.apply(GridEvent::PrevPage),
                Message::NextPage => self.apply(GridEvent::NextPage),
                Message::SortBy(key) => self.apply(GridEvent::SortBy(key)),
                Message::CyclePageSize => {
                    let size = self.grid.view().next_page_size();
                    self.apply(GridEvent::SetPageSize(size));
                    self.set_status_message(format!("{size} rows per page"));
                }
                Message::ToggleRow => self.toggle_current_row(),
                Message::ToggleAllOnPage => {
                    let select = !self.grid.is_page_selected();
                    self.apply(GridEvent::SelectPage(select));
                }
                Message::Filter => self.enter_cmd_mode(CMDMode::Filter),
                Message::Send => self.send_selection(),
                Message::Help => self.show_popup(HELP_TEXT.to_string()),
                Message::Exit => {}
                Message::RawKey(_) => {}
            },
            Modus::POPUP => match message {
                Message::Quit => self.quit(),
                Message::Exit => self.close_popup(),
                _ => (),
            },
            Modus::CMDINPUT => {
                if let Message::RawKey(key) = message {
                    self.raw_input(key)
                }
            }
        }
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn apply(&mut self, event: GridEvent) {
        self.grid.dispatch(event);
        self.update_uidata();
    }

    fn move_curser(&mut self, step: i32) {
        let nrows = self.grid.projection().rows.len();
        if step < 0 {
            self.curser_row = self.curser_row.saturating_sub(step.unsigned_abs() as usize);
        } else {
            self.curser_row = std::cmp::min(
                self.curser_row + step as usize,
                nrows.saturating_sub(1),
            );
        }
        self.update_uidata();
    }

    fn toggle_current_row(&mut self) {
        let id = self.grid.visible_rows().get(self.curser_row).map(|r| r.id);
        if let Some(id) = id {
            self.apply(GridEvent::ToggleSelected(id));
        }
    }

    fn show_popup(&mut self, message: String) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.uidata.popup_message = message;
        self.uidata.show_popup = true;
        self.uidata.last_update = Instant::now();
    }

    fn close_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
        self.uidata.show_popup = false;
        self.uidata.last_update = Instant::now();
    }

    fn send_selection(&mut self) {
        let payload = self.grid.payload();
        match self.host.emit(&payload) {
            Emission::Delivered => {
                self.set_status_message(format!("Sent {} rows", payload.count));
                self.quit();
            }
            Emission::Local { notice, payload: serialized } => {
                if let Some(clipboard) = self.clipboard.as_mut() {
                    match clipboard.set_text(serialized.clone()) {
                        Ok(_) => trace!("Copied payload to clipboard."),
                        Err(e) => trace!("Error copying to clipboard: {:?}", e),
                    }
                }
                self.local_payloads.push(serialized);
                self.set_status_message(notice.clone());
                self.show_popup(format!("{notice}\n\n{}", payload.preview(PREVIEW_ROWS)));
            }
        }
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if self.active_cmdinput {
            self.last_input = self.input.read(key);
            if self.last_input.finished {
                self.handle_cmd_input();
            } else if self.cmd_mode == Some(CMDMode::Filter) {
                // Filter as you type
                let query = self.last_input.input.clone();
                self.apply(GridEvent::SetQuery(query));
            }
            self.uidata.cmdinput = self.last_input.clone();
            self.uidata.cmd_mode = self.cmd_mode;
            self.uidata.active_cmdinput = self.active_cmdinput;
            self.uidata.last_update = Instant::now();
        }
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode ...");
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);

        self.active_cmdinput = true;
        let query = self.grid.view().query.clone();
        self.input.set(&query);
        self.last_input = self.input.get();

        self.uidata.cmdinput = self.last_input.clone();
        self.uidata.active_cmdinput = self.active_cmdinput;
        self.uidata.cmd_mode = self.cmd_mode;
        self.uidata.last_update = Instant::now();
    }

    fn handle_cmd_input(&mut self) {
        trace!("Handle cmd input {}", self.last_input.input);

        self.active_cmdinput = false;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;

        let cmd_input = self.last_input.input.clone();
        match self.cmd_mode {
            Some(CMDMode::Filter) => {
                self.apply(GridEvent::SetQuery(cmd_input));
                let count = self.grid.projection().filtered_count;
                if self.last_input.canceled {
                    self.set_status_message("Filter cleared");
                } else {
                    self.set_status_message(format!("{count} matching rows"));
                }
            }
            None => {
                info!("Cmd mode is none!")
            }
        }

        self.cmd_mode = None;
        self.update_uidata();
    }
}
