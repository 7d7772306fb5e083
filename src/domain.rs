use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;
use tracing_error::SpanTrace;

use crate::view::SortKey;

pub const HELP_TEXT: &str = r#"
    1-5      : Sort by id / item / qty / price / total (again to reverse)
    /        : Filter rows (Enter keeps, Esc clears)
    p        : Cycle page size
    ←/h  →/l : Previous / next page
    ↑/k  ↓/j : Move cursor
    space    : Toggle selection of the current row
    a        : Select / unselect every row on the page
    s        : Send selected rows
    ?        : Show this help (Esc to close)
    q        : Quit
"#;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("I/O error: {0}")]
    IoError(#[from] Error),

    #[error("polars error: {0}")]
    PolarsError(#[from] PolarsError),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("loading failed: {reason}\n{span_trace}")]
    LoadingFailed {
        reason: String,
        span_trace: SpanTrace,
    },

    #[error("file not found")]
    FileNotFound,

    #[error("permission denied")]
    PermissionDenied,

    #[error("unknown file type")]
    UnknownFileType,

    #[error("duplicate row id {0}")]
    DuplicateId(u64),

    #[error("invalid row {id}: {reason}")]
    InvalidRow { id: u64, reason: String },

    #[error("host bridge failed: {0}")]
    HostFailed(String),
}

impl GridError {
    pub fn loading_failed(reason: impl Into<String>) -> Self {
        GridError::LoadingFailed {
            reason: reason.into(),
            span_trace: SpanTrace::capture(),
        }
    }
}

/// Command line input modes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    Filter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    PrevPage,
    NextPage,
    SortBy(SortKey),
    CyclePageSize,
    ToggleRow,
    ToggleAllOnPage,
    Filter,
    Send,
    Help,
    Exit,
    RawKey(KeyEvent),
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct GridConfig {
    pub event_poll_time: u64,
    pub page_size: usize,
    #[setters(strip_option)]
    pub send_to: Option<PathBuf>,
    pub log_file: PathBuf,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            page_size: crate::view::DEFAULT_PAGE_SIZE,
            send_to: None,
            log_file: PathBuf::from("tv-grid.log"),
        }
    }
}
