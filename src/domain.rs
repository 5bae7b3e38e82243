use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

use crate::grid::GridConfig;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid log file path: {0}")]
    LogPath(String),
    #[error("could not install logger: {0}")]
    Logging(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    AddRow,
    EditRow,
    DeleteRow,
    AddColumn,
    Filter,
    Sort,
    CopyRow,
    Help,
    Enter,
    Exit,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

#[derive(Debug, Clone, Setters)]
#[setters(into)]
pub struct AppConfig {
    pub grid: GridConfig,
    /// Column offered by the filter picker.
    pub filter_column: String,
    /// Column the sort key toggles.
    pub sort_column: String,
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub start_empty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            filter_column: "status".to_string(),
            sort_column: "age".to_string(),
            event_poll_time: 100,
            max_column_width: 24,
            start_empty: false,
        }
    }
}

pub const HELP_TEXT: &str = "\
 Navigation
   j / Down        next row
   k / Up          previous row
   PgDown / PgUp   page down / up
   g / G           first / last row

 Rows and columns
   a               add a row
   e / Enter       edit the selected row
   d / Delete      delete the selected row
   c               add a column
   y               copy the selected row as CSV

 View
   f               filter on a column value
   s               toggle the numeric sort

 Forms
   Tab / Down      next field
   Shift-Tab / Up  previous field
   Left / Right    change column type
   Ctrl-U          clear the field
   Enter           submit
   Esc             cancel

   ?               this help
   q               quit
";
