use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use crate::domain::CMDMode;
use crate::model::{Model, UIData};

pub const CMDLINE_HEIGH: usize = 1;
pub const TITLE_HEIGHT: usize = 1;

const CHECKBOX_WIDTH: u16 = 3;

#[derive(Debug, Default)]
pub struct TableUI {
    table_state: TableState,
}

fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

impl TableUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [title_area, table_area, status_area] = Layout::vertical([
            Constraint::Length(TITLE_HEIGHT as u16),
            Constraint::Min(0),
            Constraint::Length(CMDLINE_HEIGH as u16),
        ])
        .areas(frame.area());

        self.draw_title(uidata, frame, title_area);
        self.draw_table(uidata, frame, table_area);
        self.draw_statusline(uidata, frame, status_area);

        if uidata.show_popup {
            self.draw_popup(uidata, frame);
        }
    }

    fn draw_title(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::from(format!(" {} ", uidata.name)).bold()];
        if !uidata.query.is_empty() {
            spans.push(" filter: ".into());
            spans.push(Span::from(uidata.query.clone()).yellow());
        }
        let prev = if uidata.has_prev { "◀ " } else { "  " };
        let next = if uidata.has_next { " ▶" } else { "  " };
        spans.push(format!("  {prev}{}{next}", uidata.page_label).into());
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_table(&mut self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let header = Row::new(
            std::iter::once(Cell::from(checkbox(uidata.page_selected)))
                .chain(uidata.headers.iter().map(|h| Cell::from(h.clone()))),
        )
        .style(Style::new().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));

        let rows = uidata.rows.iter().map(|r| {
            let style = if r.selected {
                Style::new().green()
            } else {
                Style::new()
            };
            Row::new(
                std::iter::once(Cell::from(checkbox(r.selected)))
                    .chain(r.cells.iter().map(|c| Cell::from(c.clone()))),
            )
            .style(style)
        });

        let widths = [
            Constraint::Length(CHECKBOX_WIDTH),
            Constraint::Length(8),
            Constraint::Min(12),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(10),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .row_highlight_style(Style::new().reversed());

        if uidata.rows.is_empty() {
            self.table_state.select(None);
        } else {
            self.table_state.select(Some(uidata.selected_row));
        }
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_statusline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.active_cmdinput {
            let prompt = match uidata.cmd_mode {
                Some(CMDMode::Filter) => "/",
                None => ":",
            };
            let line = Line::from(vec![prompt.blue().bold(), uidata.cmdinput.input.clone().into()]);
            frame.render_widget(Paragraph::new(line), area);
            let x = area.x + 1 + uidata.cmdinput.curser_pos as u16;
            frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
            return;
        }

        let send = if uidata.selected_count > 0 {
            Span::from(format!("<s> {} ", uidata.send_label)).green().bold()
        } else {
            Span::from(format!("{} ", uidata.send_label)).dark_gray()
        };
        let [left, right] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(send.width() as u16)])
                .areas(area);
        frame.render_widget(Paragraph::new(format!(" {}", uidata.status_message)), left);
        frame.render_widget(Paragraph::new(Line::from(send)), right);
    }

    fn draw_popup(&self, uidata: &UIData, frame: &mut Frame) {
        let area = popup_area(frame.area(), 70, 60);
        let block = Block::bordered()
            .title(Line::from(" tv-grid ".bold()).centered())
            .title_bottom(Line::from(" <Esc> close ").centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(Text::from(uidata.popup_message.clone()))
                .wrap(Wrap { trim: false })
                .block(block),
            area,
        );
    }
}
