//! In-memory tabular data model.
//!
//! A [`Grid`] owns the base rows, the ordered column definitions, the active
//! equality filter and the active sort directive. The rows shown to a user are
//! always derived on demand: base rows, then filter, then (optionally) sort.
//! Deriving the view never touches the base rows.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use derive_setters::Setters;
use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

/// Selection value a host uses for "no filter".
pub const SHOW_ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("column id must not be empty")]
    EmptyColumnId,
    #[error("column id \"{id}\" already exists")]
    DuplicateColumnId { id: String },
    #[error("unknown column \"{id}\"")]
    UnknownColumn { id: String },
    #[error("no row matches {key}")]
    NotFound { key: String },
    #[error("\"{input}\" is not a number (column \"{column}\")")]
    InvalidNumber { column: String, input: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnType {
    #[default]
    Text,
    Number,
}

impl ColumnType {
    pub fn default_value(self) -> Value {
        match self {
            ColumnType::Text => Value::Text(String::new()),
            ColumnType::Number => Value::Number(0.0),
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ColumnType::Text => ColumnType::Number,
            ColumnType::Number => ColumnType::Text,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Text => write!(f, "text"),
            ColumnType::Number => write!(f, "number"),
        }
    }
}

/// How raw user input is turned into a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoercionPolicy {
    /// Anything that does not parse as a finite number becomes `0`.
    #[default]
    Lenient,
    /// Non-numeric input is rejected with [`GridError::InvalidNumber`].
    Strict,
}

#[derive(Debug, Clone, Default, Setters)]
pub struct GridConfig {
    pub coercion: CoercionPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub id: String,
    pub label: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(id: impl Into<String>, label: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            column_type,
        }
    }

    pub fn text(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, ColumnType::Text)
    }

    pub fn number(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, ColumnType::Number)
    }

    /// Interpret raw input according to this column's declared type.
    pub fn coerce(&self, raw: &str, policy: CoercionPolicy) -> Result<Value, GridError> {
        match self.column_type {
            ColumnType::Text => Ok(Value::Text(raw.to_string())),
            ColumnType::Number => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(Value::Number(0.0));
                }
                match trimmed.parse::<f64>().ok().filter(|n| n.is_finite()) {
                    Some(n) => Ok(Value::Number(n)),
                    None if policy == CoercionPolicy::Lenient => {
                        trace!("Coercing {raw:?} to 0 for column {}", self.id);
                        Ok(Value::Number(0.0))
                    }
                    None => Err(GridError::InvalidNumber {
                        column: self.id.clone(),
                        input: raw.to_string(),
                    }),
                }
            }
        }
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    // Numbers order before text, mirroring how mixed columns are sorted.
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Number(_), Value::Text(_)) => Ordering::Less,
            (Value::Text(_), Value::Number(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

/// Stable identity assigned to a row when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    id: RowId,
    values: BTreeMap<String, Value>,
}

impl Row {
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Value for `column`, or the column type's default when the row
    /// predates the column.
    pub fn get(&self, column: &Column) -> Cow<'_, Value> {
        match self.values.get(&column.id) {
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(column.column_type.default_value()),
        }
    }

    /// Stored value only, without falling back to a default.
    pub fn raw(&self, column_id: &str) -> Option<&Value> {
        self.values.get(column_id)
    }
}

/// Raw form input: one string per column id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowInput {
    fields: BTreeMap<String, String>,
}

impl RowInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column_id: impl Into<String>, raw: impl Into<String>) -> Self {
        self.set(column_id, raw);
        self
    }

    pub fn set(&mut self, column_id: impl Into<String>, raw: impl Into<String>) {
        self.fields.insert(column_id.into(), raw.into());
    }

    pub fn get(&self, column_id: &str) -> Option<&str> {
        self.fields.get(column_id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RowInput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Direction::Ascending => "↑",
            Direction::Descending => "↓",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortDirective {
    pub column: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

/// Argument to [`Grid::set_filter`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    All,
    Equals(Value),
}

impl FilterValue {
    /// Map a selector choice to a filter; [`SHOW_ALL`] clears it.
    pub fn from_selection(selection: &str) -> Self {
        if selection == SHOW_ALL {
            FilterValue::All
        } else {
            FilterValue::Equals(Value::text(selection))
        }
    }
}

impl From<Option<Value>> for FilterValue {
    fn from(value: Option<Value>) -> Self {
        match value {
            Some(v) => FilterValue::Equals(v),
            None => FilterValue::All,
        }
    }
}

impl From<Value> for FilterValue {
    fn from(value: Value) -> Self {
        FilterValue::Equals(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Grid {
    config: GridConfig,
    columns: Vec<Column>,
    rows: Vec<Row>,
    filter: Option<Filter>,
    sort: Option<SortDirective>,
    // Survives filter changes so the next toggle keeps flipping.
    last_sort: Option<SortDirective>,
    next_row_id: u64,
    version: u64,
}

impl Grid {
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// A grid seeded with the user records the demo starts with.
    pub fn demo(config: GridConfig) -> Self {
        let mut grid = Self::new(config);
        grid.columns = vec![
            Column::text("firstName", "First Name"),
            Column::text("lastName", "Last Name"),
            Column::number("age", "Age"),
            Column::number("visits", "Visits"),
            Column::number("progress", "Progress"),
            Column::text("status", "Status"),
        ];
        let users = [
            ("Tanner", "Linsley", 33.0, 100.0, 50.0, "Married"),
            ("Kevin", "Vandy", 27.0, 200.0, 100.0, "Single"),
        ];
        for (first, last, age, visits, progress, status) in users {
            grid.push_values(BTreeMap::from([
                ("firstName".to_string(), Value::text(first)),
                ("lastName".to_string(), Value::text(last)),
                ("age".to_string(), Value::Number(age)),
                ("visits".to_string(), Value::Number(visits)),
                ("progress".to_string(), Value::Number(progress)),
                ("status".to_string(), Value::text(status)),
            ]));
        }
        grid
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// The column whose value identifies a row for [`Grid::edit_row`] and
    /// [`Grid::delete_row`]: the first declared column.
    pub fn key_column(&self) -> Option<&Column> {
        self.columns.first()
    }

    /// Base rows in insertion order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn sort(&self) -> Option<&SortDirective> {
        self.sort.as_ref()
    }

    /// Incremented by every operation that changes what [`Grid::visible_rows`]
    /// could return.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn add_column(&mut self, column: Column) -> Result<(), GridError> {
        if column.id.trim().is_empty() {
            return Err(GridError::EmptyColumnId);
        }
        if self.column(&column.id).is_some() {
            return Err(GridError::DuplicateColumnId { id: column.id });
        }
        debug!(
            "Adding column {} \"{}\" ({})",
            column.id, column.label, column.column_type
        );
        self.columns.push(column);
        self.bump();
        Ok(())
    }

    #[instrument(level = "debug", skip_all)]
    pub fn add_row(&mut self, input: &RowInput) -> Result<RowId, GridError> {
        let values = self.coerce(input)?;
        let id = self.push_values(values);
        debug!("Added row {id}, {} rows total", self.rows.len());
        Ok(id)
    }

    /// Replace the values of the first row whose key field equals `key`.
    #[instrument(level = "debug", skip(self, updated))]
    pub fn edit_row(&mut self, key: &Value, updated: &RowInput) -> Result<RowId, GridError> {
        let index = self
            .key_column()
            .and_then(|key_column| {
                self.rows
                    .iter()
                    .position(|row| row.get(key_column).as_ref() == key)
            })
            .ok_or_else(|| GridError::NotFound {
                key: key.to_string(),
            })?;
        self.replace_at(index, updated)
    }

    /// Remove every row whose key field equals `key`. Returns how many rows
    /// were removed, which is zero when nothing matched.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_row(&mut self, key: &Value) -> usize {
        let Some(key_column) = self.key_column().cloned() else {
            return 0;
        };
        let before = self.rows.len();
        self.rows.retain(|row| row.get(&key_column).as_ref() != key);
        let removed = before - self.rows.len();
        if removed > 0 {
            self.bump();
        }
        debug!("Deleted {removed} rows");
        removed
    }

    pub fn edit_row_by_id(&mut self, id: RowId, updated: &RowInput) -> Result<RowId, GridError> {
        let index = self
            .rows
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| GridError::NotFound { key: id.to_string() })?;
        self.replace_at(index, updated)
    }

    pub fn delete_row_by_id(&mut self, id: RowId) -> Result<Row, GridError> {
        let index = self
            .rows
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| GridError::NotFound { key: id.to_string() })?;
        let row = self.rows.remove(index);
        self.bump();
        debug!("Deleted row {id}");
        Ok(row)
    }

    /// Restrict the view to rows whose `column` equals the given value, or
    /// clear the restriction with [`FilterValue::All`]. Any active sort is
    /// dropped; the view returns to filter order.
    pub fn set_filter(&mut self, column: &str, value: impl Into<FilterValue>) {
        self.filter = match value.into() {
            FilterValue::All => {
                debug!("Clearing filter");
                None
            }
            FilterValue::Equals(value) => {
                if self.column(column).is_none() {
                    warn!("Filtering on undeclared column {column}");
                }
                debug!("Filtering {column} == {value:?}");
                Some(Filter {
                    column: column.to_string(),
                    value,
                })
            }
        };
        self.sort = None;
        self.bump();
    }

    /// Flip the sort direction for `column` and sort the filtered view by it.
    /// The first toggle on a column sorts ascending.
    pub fn toggle_sort(&mut self, column: &str) -> Result<Direction, GridError> {
        if self.column(column).is_none() {
            return Err(GridError::UnknownColumn {
                id: column.to_string(),
            });
        }
        let direction = match &self.last_sort {
            Some(previous) if previous.column == column => previous.direction.flip(),
            _ => Direction::Ascending,
        };
        let directive = SortDirective {
            column: column.to_string(),
            direction,
        };
        debug!("Sorting by {column} {direction:?}");
        self.last_sort = Some(directive.clone());
        self.sort = Some(directive);
        self.bump();
        Ok(direction)
    }

    /// Rows currently shown: base rows, filtered, then stably sorted.
    pub fn visible_rows(&self) -> Vec<&Row> {
        let mut view: Vec<&Row> = match &self.filter {
            None => self.rows.iter().collect(),
            Some(filter) => self
                .rows
                .iter()
                .filter(|row| self.matches(row, filter))
                .collect(),
        };

        if let Some(sort) = &self.sort
            && let Some(column) = self.column(&sort.column)
        {
            view.sort_by(|a, b| {
                let ordering = a.get(column).compare(&b.get(column));
                match sort.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
        view
    }

    /// Value counts of `column` over the base rows, most frequent first.
    /// Equal counts keep the order in which the values first appear.
    pub fn distinct_values(&self, column: &str) -> Result<Vec<(Value, usize)>, GridError> {
        let column = self.column(column).ok_or_else(|| GridError::UnknownColumn {
            id: column.to_string(),
        })?;
        let mut counts: Vec<(Value, usize)> = Vec::new();
        for row in &self.rows {
            let value = row.get(column);
            match counts.iter_mut().find(|(v, _)| *v == *value) {
                Some((_, count)) => *count += 1,
                None => counts.push((value.into_owned(), 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(counts)
    }

    fn matches(&self, row: &Row, filter: &Filter) -> bool {
        match self.column(&filter.column) {
            Some(column) => *row.get(column) == filter.value,
            None => row.raw(&filter.column) == Some(&filter.value),
        }
    }

    fn coerce(&self, input: &RowInput) -> Result<BTreeMap<String, Value>, GridError> {
        for (id, _) in input.iter() {
            if self.column(id).is_none() {
                warn!("Ignoring input for undeclared column {id}");
            }
        }
        self.columns
            .iter()
            .map(|column| {
                let value = match input.get(&column.id) {
                    Some(raw) => column.coerce(raw, self.config.coercion)?,
                    None => column.column_type.default_value(),
                };
                Ok::<_, GridError>((column.id.clone(), value))
            })
            .collect()
    }

    fn replace_at(&mut self, index: usize, updated: &RowInput) -> Result<RowId, GridError> {
        let values = self.coerce(updated)?;
        let row = &mut self.rows[index];
        row.values = values;
        let id = row.id;
        self.bump();
        debug!("Edited row {id}");
        Ok(id)
    }

    fn push_values(&mut self, values: BTreeMap<String, Value>) -> RowId {
        let id = RowId(self.next_row_id);
        self.next_row_id += 1;
        self.rows.push(Row { id, values });
        self.bump();
        id
    }

    fn bump(&mut self) {
        self.version += 1;
    }
}
