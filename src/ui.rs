use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState},
};

use crate::form::{FieldKind, Form};
use crate::model::{FilterPicker, Model, UIData};

pub const CMDLINE_HEIGHT: usize = 1;
pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const TABLE_BORDER_HEIGHT: usize = 2;
pub const COLUMN_WIDTH_MARGIN: usize = 2;

const POPUP_WIDTH: u16 = 64;
const FORM_LABEL_GAP: u16 = 2;

#[derive(Debug, Default)]
pub struct TableUI {
    table_state: TableState,
}

impl TableUI {
    pub fn draw(&mut self, model: &Model, frame: &mut Frame<'_>) {
        let uidata = model.get_uidata();
        let [table_area, status_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(CMDLINE_HEIGHT as u16),
        ])
        .areas(frame.area());

        self.draw_table(uidata, frame, table_area);
        Self::draw_statusline(uidata, frame, status_area);

        if let Some(form) = model.form() {
            Self::draw_form(form, frame);
        } else if let Some(picker) = model.picker() {
            Self::draw_picker(picker, frame);
        } else if let Some(message) = model.popup_message() {
            Self::draw_popup(message, frame);
        }
    }

    fn draw_table(&mut self, uidata: &UIData, frame: &mut Frame<'_>, area: Rect) {
        let title = Line::from(Span::from(format!(" {} ", uidata.name)).bold());
        let instructions = Line::from(vec![
            " Add ".into(),
            "<A>".blue().bold(),
            " Column ".into(),
            "<C>".blue().bold(),
            " Filter ".into(),
            "<F>".blue().bold(),
            " Sort ".into(),
            "<S>".blue().bold(),
            " Help ".into(),
            "<?> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);

        let header = Row::new(uidata.header.iter().map(|h| Cell::from(h.as_str())))
            .style(Style::new().add_modifier(Modifier::BOLD))
            .height(TABLE_HEADER_HEIGHT as u16);
        let rows = uidata
            .rows
            .iter()
            .map(|r| Row::new(r.iter().map(|c| Cell::from(c.as_str()))));
        let widths = uidata
            .widths
            .iter()
            .map(|w| Constraint::Length(u16::try_from(*w).unwrap_or(u16::MAX)));

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::new().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        let selected = (!uidata.rows.is_empty()).then_some(uidata.selected_row);
        self.table_state.select(selected);
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_statusline(uidata: &UIData, frame: &mut Frame<'_>, area: Rect) {
        let mut spans = vec![
            Span::from(format!(" {}/{} rows ", uidata.rows.len(), uidata.nrows)).yellow(),
        ];
        if let Some(filter) = &uidata.filter_label {
            spans.push(Span::from(format!("[filter: {filter}] ")).cyan());
        }
        if let Some(sort) = &uidata.sort_label {
            spans.push(Span::from(format!("[sort: {sort}] ")).cyan());
        }
        spans.push(Span::from(uidata.status_message.as_str()));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_form(form: &Form, frame: &mut Frame<'_>) {
        let fields = form.fields();
        let label_width = fields
            .iter()
            .map(|f| f.label.chars().count())
            .max()
            .unwrap_or(0);

        let mut lines: Vec<Line<'_>> = fields
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let label = Span::from(format!("{:>label_width$}: ", field.label));
                let value = Span::from(field.display());
                if idx == form.focused() {
                    Line::from(vec![label.bold(), value.yellow()])
                } else {
                    Line::from(vec![label, value])
                }
            })
            .collect();
        lines.push(Line::default());
        match form.error() {
            Some(error) => lines.push(Line::from(error.red())),
            None => lines.push(Line::from(
                "Enter submit, Esc cancel, Tab next field".dark_gray(),
            )),
        }

        let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(2);
        let area = popup_area(frame.area(), POPUP_WIDTH, height);
        let block = Block::bordered()
            .title(Line::from(form.kind().title()).centered())
            .border_set(border::ROUNDED);
        let inner = block.inner(area);

        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);

        if let Some(field) = fields.get(form.focused())
            && let FieldKind::Entry(_) = field.kind
        {
            let offset = u16::try_from(label_width + field.input.cursor()).unwrap_or(u16::MAX);
            let x = inner
                .x
                .saturating_add(offset)
                .saturating_add(FORM_LABEL_GAP)
                .min(inner.right().saturating_sub(1));
            let y = inner.y + u16::try_from(form.focused()).unwrap_or(0);
            frame.set_cursor_position(Position::new(x, y));
        }
    }

    fn draw_picker(picker: &FilterPicker, frame: &mut Frame<'_>) {
        let items: Vec<ListItem<'_>> = picker
            .options
            .iter()
            .map(|(_, label)| ListItem::new(label.as_str()))
            .collect();
        let height = u16::try_from(items.len()).unwrap_or(u16::MAX).saturating_add(2);
        let area = popup_area(frame.area(), POPUP_WIDTH / 2, height);

        let list = List::new(items)
            .block(
                Block::bordered()
                    .title(Line::from(format!(" Filter by {} ", picker.column)).centered())
                    .border_set(border::ROUNDED),
            )
            .highlight_style(Style::new().fg(Color::Black).bg(Color::Yellow))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(picker.selected));

        frame.render_widget(Clear, area);
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_popup(message: &str, frame: &mut Frame<'_>) {
        let height = u16::try_from(message.lines().count())
            .unwrap_or(u16::MAX)
            .saturating_add(2);
        let area = popup_area(frame.area(), POPUP_WIDTH, height);
        let block = Block::bordered()
            .title(Line::from(" Help ").centered())
            .title_bottom(Line::from(" Esc to close ").centered())
            .border_set(border::ROUNDED);

        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(message).block(block), area);
    }
}

/// A `width` x `height` rect centered in `area`, shrunk to fit.
fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_area_is_centered_and_clamped() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(popup_area(area, 20, 10), Rect::new(40, 15, 20, 10));
        assert_eq!(popup_area(area, 200, 50), area);
    }
}
