//! Dialogs for adding and editing rows and for declaring new columns.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use tracing::trace;

use crate::grid::{Column, ColumnType, Row, RowId, RowInput};
use crate::inputter::Inputter;

const COLUMN_ID_FIELD: &str = "id";
const COLUMN_LABEL_FIELD: &str = "label";
const COLUMN_TYPE_FIELD: &str = "type";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    AddRow,
    EditRow(RowId),
    AddColumn,
}

impl FormKind {
    pub fn title(&self) -> &'static str {
        match self {
            FormKind::AddRow => " Add New User ",
            FormKind::EditRow(_) => " Edit User ",
            FormKind::AddColumn => " Add New Column ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Entry(ColumnType),
    TypeChoice(ColumnType),
}

#[derive(Debug, Clone)]
pub struct Field {
    pub id: String,
    pub label: String,
    pub kind: FieldKind,
    pub input: Inputter,
}

impl Field {
    fn entry(id: &str, label: &str, column_type: ColumnType, text: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind: FieldKind::Entry(column_type),
            input: Inputter::with_text(text),
        }
    }

    /// What the field shows: the typed text, or the chosen column type.
    pub fn display(&self) -> String {
        match &self.kind {
            FieldKind::Entry(_) => self.input.text().to_string(),
            FieldKind::TypeChoice(column_type) => format!("< {column_type} >"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    Editing,
    Submit,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct Form {
    kind: FormKind,
    fields: Vec<Field>,
    focused: usize,
    error: Option<String>,
}

impl Form {
    /// One field per declared column, initialised to the column's default.
    pub fn add_row(columns: &[Column]) -> Self {
        let fields = columns
            .iter()
            .map(|c| {
                let initial = c.column_type.default_value().to_string();
                Field::entry(&c.id, &c.label, c.column_type, &initial)
            })
            .collect();
        Self::new(FormKind::AddRow, fields)
    }

    /// One field per declared column, pre-filled from `row`.
    pub fn edit_row(columns: &[Column], row: &Row) -> Self {
        let fields = columns
            .iter()
            .map(|c| Field::entry(&c.id, &c.label, c.column_type, &row.get(c).to_string()))
            .collect();
        Self::new(FormKind::EditRow(row.id()), fields)
    }

    pub fn add_column() -> Self {
        let fields = vec![
            Field::entry(COLUMN_ID_FIELD, "Column ID", ColumnType::Text, ""),
            Field::entry(COLUMN_LABEL_FIELD, "Column Label", ColumnType::Text, ""),
            Field {
                id: COLUMN_TYPE_FIELD.to_string(),
                label: "Column Type".to_string(),
                kind: FieldKind::TypeChoice(ColumnType::Text),
                input: Inputter::default(),
            },
        ];
        Self::new(FormKind::AddColumn, fields)
    }

    fn new(kind: FormKind, fields: Vec<Field>) -> Self {
        Self {
            kind,
            fields,
            focused: 0,
            error: None,
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    pub fn read(&mut self, key: KeyEvent) -> FormOutcome {
        match key.code {
            KeyCode::Enter => return FormOutcome::Submit,
            KeyCode::Esc => return FormOutcome::Cancel,
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_previous(),
            _ => {
                if let Some(field) = self.fields.get_mut(self.focused) {
                    match &mut field.kind {
                        FieldKind::TypeChoice(column_type) => {
                            if matches!(
                                key.code,
                                KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
                            ) {
                                *column_type = column_type.toggled();
                            }
                        }
                        FieldKind::Entry(_) => {
                            field.input.read(key);
                        }
                    }
                }
            }
        }
        FormOutcome::Editing
    }

    /// Field values keyed by column id, for add/edit row forms.
    pub fn row_input(&self) -> RowInput {
        self.fields
            .iter()
            .map(|f| (f.id.clone(), f.input.text().to_string()))
            .collect()
    }

    /// The column described by an add-column form.
    pub fn column(&self) -> Column {
        let text = |id: &str| {
            self.fields
                .iter()
                .find(|f| f.id == id)
                .map(|f| f.input.text().trim().to_string())
                .unwrap_or_default()
        };
        let column_type = self
            .fields
            .iter()
            .find_map(|f| match f.kind {
                FieldKind::TypeChoice(column_type) => Some(column_type),
                FieldKind::Entry(_) => None,
            })
            .unwrap_or_default();
        Column::new(text(COLUMN_ID_FIELD), text(COLUMN_LABEL_FIELD), column_type)
    }

    fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + 1) % self.fields.len();
        }
        trace!("Form focus {}", self.focused);
    }

    fn focus_previous(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
        }
        trace!("Form focus {}", self.focused);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Grid, GridConfig};
    use ratatui::crossterm::event::KeyModifiers;

    fn press(form: &mut Form, code: KeyCode) -> FormOutcome {
        form.read(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(form: &mut Form, s: &str) {
        for c in s.chars() {
            press(form, KeyCode::Char(c));
        }
    }

    #[test]
    fn add_row_form_starts_with_type_defaults() {
        let grid = Grid::demo(GridConfig::default());
        let form = Form::add_row(grid.columns());
        let input = form.row_input();
        assert_eq!(input.get("firstName"), Some(""));
        assert_eq!(input.get("age"), Some("0"));
        assert_eq!(form.fields().len(), 6);
    }

    #[test]
    fn edit_form_is_prefilled_from_row() {
        let grid = Grid::demo(GridConfig::default());
        let row = &grid.rows()[0];
        let form = Form::edit_row(grid.columns(), row);
        assert_eq!(form.kind(), FormKind::EditRow(row.id()));
        assert_eq!(form.row_input().get("firstName"), Some("Tanner"));
        assert_eq!(form.row_input().get("age"), Some("33"));
    }

    #[test]
    fn add_column_form_builds_column() {
        let mut form = Form::add_column();
        type_str(&mut form, "email");
        press(&mut form, KeyCode::Tab);
        type_str(&mut form, "E-Mail");
        press(&mut form, KeyCode::Tab);
        press(&mut form, KeyCode::Right);
        assert_eq!(press(&mut form, KeyCode::Enter), FormOutcome::Submit);
        assert_eq!(form.column(), Column::number("email", "E-Mail"));
    }

    #[test]
    fn focus_wraps_around() {
        let mut form = Form::add_column();
        press(&mut form, KeyCode::BackTab);
        assert_eq!(form.focused(), 2);
        press(&mut form, KeyCode::Down);
        assert_eq!(form.focused(), 0);
        assert_eq!(press(&mut form, KeyCode::Esc), FormOutcome::Cancel);
    }
}
