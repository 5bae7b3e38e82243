use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, info, trace, warn};

use crate::domain::{AppConfig, HELP_TEXT, Message};
use crate::form::{Form, FormKind, FormOutcome};
use crate::grid::{Column, FilterValue, Grid, Row, RowId};
use crate::ui::{CMDLINE_HEIGHT, COLUMN_WIDTH_MARGIN, TABLE_BORDER_HEIGHT, TABLE_HEADER_HEIGHT};

#[derive(Debug, PartialEq)]
pub enum Status {
    Ready,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modus {
    Table,
    Form,
    FilterPicker,
    Popup,
}

/// Choices offered when filtering: "All" followed by every distinct value of
/// the filter column.
#[derive(Debug, Clone)]
pub struct FilterPicker {
    pub column: String,
    pub options: Vec<(FilterValue, String)>,
    pub selected: usize,
}

/// Everything the UI needs to draw the table, rebuilt whenever the grid
/// changes.
#[derive(Debug, Default, Clone)]
pub struct UIData {
    pub name: String,
    pub header: Vec<String>,
    pub widths: Vec<usize>,
    pub rows: Vec<Vec<String>>,
    pub nrows: usize, // Rows in the grid, before filtering
    pub selected_row: usize,
    pub filter_label: Option<String>,
    pub sort_label: Option<String>,
    pub status_message: String,
}

#[derive(Default, Clone, Debug)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub table_height: usize,
}

impl UILayout {
    pub fn from_values(ui_width: usize, ui_height: usize) -> Self {
        let table_height = ui_height
            .saturating_sub(CMDLINE_HEIGHT + TABLE_HEADER_HEIGHT + TABLE_BORDER_HEIGHT)
            .max(1);
        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            table_height,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

pub struct Model {
    config: AppConfig,
    grid: Grid,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    // Visible row ids and the grid version they were derived from.
    view: Vec<RowId>,
    view_version: Option<u64>,
    cursor_row: usize,
    form: Option<Form>,
    picker: Option<FilterPicker>,
    clipboard: Option<Clipboard>,
    uilayout: UILayout,
    uidata: UIData,
}

impl Model {
    pub fn init(config: &AppConfig, grid: Grid, ui_width: usize, ui_height: usize) -> Self {
        let mut model = Self {
            config: config.clone(),
            grid,
            status: Status::Ready,
            modus: Modus::Table,
            previous_modus: Modus::Table,
            view: Vec::new(),
            view_version: None,
            cursor_row: 0,
            form: None,
            picker: None,
            clipboard: None,
            uilayout: UILayout::from_values(ui_width, ui_height),
            uidata: UIData {
                name: "Users".to_string(),
                ..UIData::default()
            },
        };
        model.refresh_view();
        model.set_status_message(format!("Loaded {} rows. Press ? for help.", model.grid.len()));
        model
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn form(&self) -> Option<&Form> {
        self.form.as_ref()
    }

    pub fn picker(&self) -> Option<&FilterPicker> {
        self.picker.as_ref()
    }

    pub fn popup_message(&self) -> Option<&str> {
        (self.modus == Modus::Popup).then_some(HELP_TEXT)
    }

    /// True while a form is open and key presses are text input.
    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::Form
    }

    pub fn selected_row_id(&self) -> Option<RowId> {
        self.view.get(self.cursor_row).copied()
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    pub fn update(&mut self, message: Option<Message>) {
        if let Some(msg) = message {
            match self.modus {
                Modus::Table => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveDown => self.move_selection_down(1),
                    Message::MoveUp => self.move_selection_up(1),
                    Message::MovePageDown => self.move_selection_down(self.uilayout.table_height),
                    Message::MovePageUp => self.move_selection_up(self.uilayout.table_height),
                    Message::MoveBeginning => self.cursor_row = 0,
                    Message::MoveEnd => self.cursor_row = self.view.len().saturating_sub(1),
                    Message::AddRow => self.open_form(Form::add_row(self.grid.columns())),
                    Message::EditRow | Message::Enter => self.edit_selected_row(),
                    Message::DeleteRow => self.delete_selected_row(),
                    Message::AddColumn => self.open_form(Form::add_column()),
                    Message::Filter => self.open_filter_picker(),
                    Message::Sort => self.toggle_sort(),
                    Message::CopyRow => self.copy_selected_row(),
                    Message::Help => self.show_help(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::Exit | Message::RawKey(_) => (),
                },
                Modus::Form => match msg {
                    Message::RawKey(key) => self.form_input(key),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    _ => (),
                },
                Modus::FilterPicker => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveDown => self.move_picker(1),
                    Message::MoveUp => self.move_picker(-1),
                    Message::Enter => self.apply_filter(),
                    Message::Exit => self.exit(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    _ => (),
                },
                Modus::Popup => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit | Message::Help | Message::Enter => self.exit(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    _ => (),
                },
            }
        }

        self.refresh_view();
        self.uidata.selected_row = self.cursor_row;
    }

    // -------------------- View derivation ---------------------- //

    fn refresh_view(&mut self) {
        let version = self.grid.version();
        if self.view_version == Some(version) {
            return;
        }

        let columns = self.grid.columns();
        let visible = self.grid.visible_rows();
        let max_width = self.config.max_column_width;

        let rows: Vec<Vec<String>> = visible
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| Self::get_visible_text(&row.get(c).to_string(), max_width))
                    .collect()
            })
            .collect();
        let widths = columns
            .iter()
            .enumerate()
            .map(|(idx, c)| Self::calculate_column_width(c, &rows, idx, max_width))
            .collect();

        self.view = visible.iter().map(|r| r.id()).collect();
        self.view_version = Some(version);
        self.cursor_row = self.cursor_row.min(self.view.len().saturating_sub(1));
        debug!(
            "Derived view v{version}: {} of {} rows visible",
            self.view.len(),
            self.grid.len()
        );

        self.uidata.header = columns.iter().map(|c| c.label.clone()).collect();
        self.uidata.widths = widths;
        self.uidata.rows = rows;
        self.uidata.nrows = self.grid.len();
        self.uidata.filter_label = self
            .grid
            .filter()
            .map(|f| format!("{} = {}", self.column_label(&f.column), f.value));
        self.uidata.sort_label = self
            .grid
            .sort()
            .map(|s| format!("{} {}", self.column_label(&s.column), s.direction.arrow()));
    }

    fn calculate_column_width(
        column: &Column,
        rows: &[Vec<String>],
        idx: usize,
        max_column_width: usize,
    ) -> usize {
        let widest = rows
            .iter()
            .filter_map(|r| r.get(idx))
            .map(|s| s.chars().count())
            .max()
            .unwrap_or(0);
        let width = column.label.chars().count().max(widest) + COLUMN_WIDTH_MARGIN;
        width.min(max_column_width)
    }

    fn get_visible_text(text: &str, width: usize) -> String {
        if width < 3 {
            return String::new();
        }
        if text.chars().count() > width {
            let mut reduced: String = text.chars().take(width - 3).collect();
            reduced.push_str("...");
            reduced
        } else {
            text.to_string()
        }
    }

    fn column_label(&self, id: &str) -> String {
        self.grid
            .column(id)
            .map(|c| c.label.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.uidata.status_message = message;
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height);
    }

    // -------------------- Control handling functions ---------------------- //

    fn exit(&mut self) {
        match self.modus {
            Modus::Table => {}
            Modus::Form => self.form = None,
            Modus::FilterPicker => self.picker = None,
            Modus::Popup => trace!("Close popup ..."),
        }
        self.modus = match self.previous_modus {
            Modus::Popup => Modus::Table,
            previous => previous,
        };
        self.previous_modus = Modus::Table;
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::Popup;
    }

    fn open_form(&mut self, form: Form) {
        trace!("Opening form {:?}", form.kind());
        self.form = Some(form);
        self.previous_modus = Modus::Table;
        self.modus = Modus::Form;
    }

    fn form_input(&mut self, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            self.exit();
            return;
        };
        match form.read(key) {
            FormOutcome::Editing => {}
            FormOutcome::Cancel => {
                self.exit();
                self.set_status_message("Cancelled");
            }
            FormOutcome::Submit => self.submit_form(),
        }
    }

    fn submit_form(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        let result = match form.kind() {
            FormKind::AddRow => self
                .grid
                .add_row(&form.row_input())
                .map(|id| format!("Added row {id}")),
            FormKind::EditRow(id) => self
                .grid
                .edit_row_by_id(id, &form.row_input())
                .map(|id| format!("Saved row {id}")),
            FormKind::AddColumn => {
                let column = form.column();
                let message = format!("Added column {} ({})", column.label, column.column_type);
                self.grid.add_column(column).map(|()| message)
            }
        };

        match result {
            Ok(message) => {
                self.exit();
                self.set_status_message(message);
            }
            Err(e) => {
                // Keep the form and what was typed so the user can correct it.
                warn!("Form submission failed: {e}");
                if let Some(form) = self.form.as_mut() {
                    form.set_error(e.to_string());
                }
            }
        }
    }

    fn edit_selected_row(&mut self) {
        let form = self
            .selected_row_id()
            .and_then(|id| self.grid.row(id))
            .map(|row| Form::edit_row(self.grid.columns(), row));
        match form {
            Some(form) => self.open_form(form),
            None => self.set_status_message("No row selected"),
        }
    }

    fn delete_selected_row(&mut self) {
        let Some(id) = self.selected_row_id() else {
            self.set_status_message("No row selected");
            return;
        };
        match self.grid.delete_row_by_id(id) {
            Ok(row) => {
                let key = self.describe_row(&row);
                self.set_status_message(format!("Deleted {key}"));
            }
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    fn describe_row(&self, row: &Row) -> String {
        match self.grid.key_column() {
            Some(key) => format!("{} {}", row.id(), row.get(key)),
            None => row.id().to_string(),
        }
    }

    fn open_filter_picker(&mut self) {
        let column = self.config.filter_column.clone();
        let values = match self.grid.distinct_values(&column) {
            Ok(values) => values,
            Err(e) => {
                self.set_status_message(format!("Cannot filter: {e}"));
                return;
            }
        };

        let mut options = vec![(FilterValue::All, "All".to_string())];
        options.extend(values.into_iter().map(|(value, count)| {
            let label = format!("{value} ({count})");
            (FilterValue::Equals(value), label)
        }));
        let selected = self
            .grid
            .filter()
            .and_then(|f| {
                options
                    .iter()
                    .position(|(o, _)| *o == FilterValue::Equals(f.value.clone()))
            })
            .unwrap_or(0);

        trace!("Filter picker with {} options", options.len());
        self.picker = Some(FilterPicker {
            column,
            options,
            selected,
        });
        self.previous_modus = Modus::Table;
        self.modus = Modus::FilterPicker;
    }

    fn move_picker(&mut self, step: isize) {
        if let Some(picker) = self.picker.as_mut() {
            let len = picker.options.len();
            if len > 0 {
                picker.selected = picker.selected.saturating_add_signed(step).min(len - 1);
            }
        }
    }

    fn apply_filter(&mut self) {
        let Some(picker) = self.picker.take() else {
            return;
        };
        self.exit();
        let Some((value, label)) = picker.options.into_iter().nth(picker.selected) else {
            return;
        };
        let message = match &value {
            FilterValue::All => "Showing all rows".to_string(),
            FilterValue::Equals(_) => {
                format!("Filter: {} = {label}", self.column_label(&picker.column))
            }
        };
        self.grid.set_filter(&picker.column, value);
        self.set_status_message(message);
    }

    fn toggle_sort(&mut self) {
        match self.grid.toggle_sort(&self.config.sort_column) {
            Ok(direction) => {
                let label = self.column_label(&self.config.sort_column);
                self.set_status_message(format!("Sorted by {label} {}", direction.arrow()));
            }
            Err(e) => self.set_status_message(format!("Cannot sort: {e}")),
        }
    }

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.contains('"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace('"', "\"\"");
        }
        if needs_wrapping || needs_escaping {
            out = format!("\"{out}\"");
        }
        out
    }

    fn row_as_csv(&self, id: RowId) -> Option<String> {
        let row = self.grid.row(id)?;
        let content = self
            .grid
            .columns()
            .iter()
            .map(|c| Self::wrap_cell_content(&row.get(c).to_string()))
            .collect::<Vec<String>>();
        Some(content.join(","))
    }

    fn copy_selected_row(&mut self) {
        let Some(content) = self.selected_row_id().and_then(|id| self.row_as_csv(id)) else {
            self.set_status_message("No row selected");
            return;
        };
        trace!("Row content: {}", content);

        if self.clipboard.is_none() {
            self.clipboard = match Clipboard::new() {
                Ok(clipboard) => Some(clipboard),
                Err(e) => {
                    warn!("Clipboard unavailable: {e:?}");
                    None
                }
            };
        }
        let result = match self.clipboard.as_mut() {
            Some(clipboard) => clipboard.set_text(content),
            None => {
                self.set_status_message("Clipboard unavailable");
                return;
            }
        };
        match result {
            Ok(()) => self.set_status_message("Copied row to clipboard"),
            Err(e) => self.set_status_message(format!("Error copying to clipboard: {e}")),
        }
    }

    fn move_selection_up(&mut self, size: usize) {
        self.cursor_row = self.cursor_row.saturating_sub(size);
    }

    fn move_selection_down(&mut self, size: usize) {
        let last = self.view.len().saturating_sub(1);
        self.cursor_row = (self.cursor_row + size).min(last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridConfig;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn demo_model() -> Model {
        Model::init(
            &AppConfig::default(),
            Grid::demo(GridConfig::default()),
            120,
            40,
        )
    }

    fn send(model: &mut Model, message: Message) {
        model.update(Some(message));
    }

    fn press(model: &mut Model, code: KeyCode) {
        send(model, Message::RawKey(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_str(model: &mut Model, s: &str) {
        for c in s.chars() {
            press(model, KeyCode::Char(c));
        }
    }

    fn first_names(model: &Model) -> Vec<String> {
        model.get_uidata().rows.iter().map(|r| r[0].clone()).collect()
    }

    #[test]
    fn add_row_through_form() {
        let mut model = demo_model();
        send(&mut model, Message::AddRow);
        assert!(model.raw_keyevents());
        type_str(&mut model, "Zed");
        press(&mut model, KeyCode::Tab);
        press(&mut model, KeyCode::Tab);
        press(&mut model, KeyCode::Backspace);
        type_str(&mut model, "41");
        press(&mut model, KeyCode::Enter);

        assert!(!model.raw_keyevents());
        assert_eq!(model.grid().len(), 3);
        assert_eq!(first_names(&model), ["Tanner", "Kevin", "Zed"]);
        assert_eq!(model.get_uidata().rows[2][2], "41");
    }

    #[test]
    fn duplicate_column_keeps_form_open() {
        let mut model = demo_model();
        send(&mut model, Message::AddColumn);
        type_str(&mut model, "age");
        press(&mut model, KeyCode::Tab);
        type_str(&mut model, "Age again");
        press(&mut model, KeyCode::Enter);

        let form = model.form().unwrap();
        assert!(form.error().unwrap().contains("already exists"));
        assert_eq!(form.column().label, "Age again");
        assert_eq!(model.grid().columns().len(), 6);

        // Fix the id and resubmit.
        press(&mut model, KeyCode::BackTab);
        type_str(&mut model, "2");
        press(&mut model, KeyCode::Enter);
        assert!(model.form().is_none());
        assert_eq!(model.get_uidata().header.last().unwrap(), "Age again");
        assert_eq!(model.get_uidata().rows[0][6], "");
    }

    #[test]
    fn edit_selected_row() {
        let mut model = demo_model();
        send(&mut model, Message::MoveDown);
        send(&mut model, Message::Enter);
        for _ in 0.."Kevin".len() {
            press(&mut model, KeyCode::Backspace);
        }
        type_str(&mut model, "Kev");
        press(&mut model, KeyCode::Enter);
        assert_eq!(first_names(&model), ["Tanner", "Kev"]);
        let grid = model.grid();
        let key = grid.key_column().unwrap();
        assert_eq!(grid.rows()[1].get(key).to_string(), "Kev");
    }

    #[test]
    fn delete_selected_row_clamps_cursor() {
        let mut model = demo_model();
        send(&mut model, Message::MoveEnd);
        assert_eq!(model.get_uidata().selected_row, 1);
        send(&mut model, Message::DeleteRow);
        assert_eq!(first_names(&model), ["Tanner"]);
        assert_eq!(model.get_uidata().selected_row, 0);
        send(&mut model, Message::DeleteRow);
        assert!(model.get_uidata().rows.is_empty());
        send(&mut model, Message::DeleteRow);
        assert_eq!(model.get_uidata().status_message, "No row selected");
    }

    #[test]
    fn filter_picker_lists_distinct_statuses() {
        let mut model = demo_model();
        send(&mut model, Message::Filter);
        let labels: Vec<&str> = model
            .picker()
            .unwrap()
            .options
            .iter()
            .map(|(_, l)| l.as_str())
            .collect();
        assert_eq!(labels, ["All", "Married (1)", "Single (1)"]);

        send(&mut model, Message::MoveDown);
        send(&mut model, Message::MoveDown);
        send(&mut model, Message::Enter);
        assert!(model.picker().is_none());
        assert_eq!(first_names(&model), ["Kevin"]);
        assert_eq!(
            model.get_uidata().filter_label.as_deref(),
            Some("Status = Single")
        );

        send(&mut model, Message::Filter);
        assert_eq!(model.picker().unwrap().selected, 2);
        send(&mut model, Message::MoveUp);
        send(&mut model, Message::MoveUp);
        send(&mut model, Message::MoveUp);
        send(&mut model, Message::Enter);
        assert_eq!(first_names(&model), ["Tanner", "Kevin"]);
    }

    #[test]
    fn sort_toggles_by_age() {
        let mut model = demo_model();
        send(&mut model, Message::Sort);
        assert_eq!(first_names(&model), ["Kevin", "Tanner"]);
        assert_eq!(model.get_uidata().sort_label.as_deref(), Some("Age ↑"));
        send(&mut model, Message::Sort);
        assert_eq!(first_names(&model), ["Tanner", "Kevin"]);
        assert_eq!(model.get_uidata().sort_label.as_deref(), Some("Age ↓"));
    }

    #[test]
    fn view_is_rederived_only_on_grid_change() {
        let mut model = demo_model();
        let version = model.view_version;
        send(&mut model, Message::MoveDown);
        send(&mut model, Message::Help);
        send(&mut model, Message::Exit);
        assert_eq!(model.view_version, version);
        send(&mut model, Message::Sort);
        assert_ne!(model.view_version, version);
    }

    #[test]
    fn help_popup_opens_and_closes() {
        let mut model = demo_model();
        send(&mut model, Message::Help);
        assert!(model.popup_message().is_some());
        send(&mut model, Message::Exit);
        assert!(model.popup_message().is_none());
        send(&mut model, Message::Quit);
        assert_eq!(model.status, Status::Quitting);
    }

    #[test]
    fn cells_are_quoted_for_csv() {
        assert_eq!(Model::wrap_cell_content("plain"), "plain");
        assert_eq!(Model::wrap_cell_content("a b"), "\"a b\"");
        assert_eq!(Model::wrap_cell_content("say \"hi\""), "\"say \"\"hi\"\"\"");
        let model = demo_model();
        let id = model.selected_row_id().unwrap();
        assert_eq!(
            model.row_as_csv(id).unwrap(),
            "Tanner,Linsley,33,100,50,Married"
        );
    }
}
