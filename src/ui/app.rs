use std::mem;
use std::path::{Path, PathBuf};

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_file;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap,
};
use ratatui::Frame;
use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::db::{count_books, create_book, delete_book, ensure_csv_extension, export_csv};
use crate::error::BookError;
use crate::models::BookField;

use super::forms::{
    input_line, CellEdit, ConfirmDelete, EntryForm, ExportPrompt, MenuAction, MenuState, Notice,
    NoticeKind, MENUS,
};
use super::helpers::{book_error, centered_rect, key_hints, surface_error, truncate};
use super::table::{BookTable, COLUMN_COUNT, COLUMN_TITLES};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Entry form height: three inputs plus the border.
const FORM_HEIGHT: u16 = 5;
const SEARCH_HEIGHT: u16 = 3;
/// Rows jumped by PageUp/PageDown in the grid.
const PAGE_STEP: isize = 10;

const SAVE_WARNING: &str = "Fill in every field correctly! Year must be numeric.";
const NO_SELECTION_WARNING: &str = "No record selected!";
const APP_TITLE: &str = "Book Catalog Manager";

/// The two views reachable from the tab bar.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Tab {
    Books,
    Export,
}

impl Tab {
    const TITLES: [&'static str; 2] = ["F1 Book Data", "F2 Export"];

    fn index(self) -> usize {
        match self {
            Tab::Books => 0,
            Tab::Export => 1,
        }
    }
}

/// Which widget on the Book Data tab receives typed keys. Inside the form the
/// active input is tracked by `EntryForm::active`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Focus {
    Form,
    Search,
    Table,
}

/// Modal layer on top of the current tab.
enum Mode {
    Normal,
    Menu(MenuState),
    EditingCell(CellEdit),
    ConfirmDelete(ConfirmDelete),
    ExportPrompt(ExportPrompt),
    Notice(Notice),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Application context: the open catalog, the settings it was started with
/// and all UI state. Built once in `main` and handed to the event loop.
pub struct App {
    conn: Connection,
    settings: Settings,
    table: BookTable,
    form: EntryForm,
    search: String,
    focus: Focus,
    tab: Tab,
    mode: Mode,
    status: Option<StatusMessage>,
    last_export: Option<PathBuf>,
}

impl App {
    pub fn new(conn: Connection, settings: Settings) -> Result<Self> {
        let table = BookTable::load(&conn)?;
        Ok(Self {
            conn,
            settings,
            table,
            form: EntryForm::default(),
            search: String::new(),
            focus: Focus::Form,
            tab: Tab::Books,
            mode: Mode::Normal,
            status: None,
            last_export: None,
        })
    }

    /// Dispatch a key press. Returns `true` once the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code)?,
            Mode::Menu(menu) => self.handle_menu(code, menu, &mut exit)?,
            Mode::EditingCell(edit) => self.handle_edit_cell(code, edit)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::ExportPrompt(prompt) => self.handle_export_prompt(code, prompt),
            Mode::Notice(notice) => match code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Mode::Normal,
                _ => Mode::Notice(notice),
            },
        };

        Ok(exit)
    }

    /// Ctrl+<key> shortcuts. They mirror the menu and only fire when no
    /// dialog is open.
    pub fn handle_shortcut(&mut self, ch: char) -> Result<bool> {
        if !matches!(self.mode, Mode::Normal) {
            return Ok(false);
        }

        let action = match ch.to_ascii_lowercase() {
            's' => MenuAction::Save,
            'e' => MenuAction::Export,
            'q' => MenuAction::Exit,
            'f' => MenuAction::SearchTitle,
            'd' => MenuAction::DeleteRecord,
            _ => return Ok(false),
        };

        let mut exit = false;
        self.mode = self.perform(action, &mut exit)?;
        Ok(exit)
    }

    fn perform(&mut self, action: MenuAction, exit: &mut bool) -> Result<Mode> {
        match action {
            MenuAction::Save => self.save(),
            MenuAction::Export => Ok(self.request_export()),
            MenuAction::Exit => {
                info!("exit requested");
                *exit = true;
                Ok(Mode::Normal)
            }
            MenuAction::SearchTitle => {
                self.tab = Tab::Books;
                self.focus = Focus::Search;
                self.search_changed();
                Ok(Mode::Normal)
            }
            MenuAction::DeleteRecord => Ok(self.request_delete()),
        }
    }

    /// Insert the form contents. Success clears the form and refreshes the
    /// grid; invalid input keeps the form and raises a warning.
    fn save(&mut self) -> Result<Mode> {
        let (title, author, year) = self.form.trimmed();
        match create_book(&self.conn, &title, &author, &year) {
            Ok(book) => {
                self.form.clear();
                self.set_status(format!("Added book ID {}.", book.id), StatusKind::Info);
                self.refresh_table();
                Ok(Mode::Normal)
            }
            Err(err) if book_error(&err).is_some_and(BookError::is_validation) => {
                warn!(reason = %surface_error(&err), "book rejected");
                Ok(Mode::Notice(Notice::new(
                    "Invalid Input",
                    SAVE_WARNING,
                    NoticeKind::Warning,
                )))
            }
            Err(err) => Ok(self.failure_notice("Save Failed", &err)),
        }
    }

    fn request_delete(&mut self) -> Mode {
        match self.table.current_book() {
            Some(book) => Mode::ConfirmDelete(ConfirmDelete {
                id: book.id,
                title: book.title.clone(),
            }),
            None => Mode::Notice(Notice::new(
                "Warning",
                NO_SELECTION_WARNING,
                NoticeKind::Warning,
            )),
        }
    }

    fn request_export(&mut self) -> Mode {
        Mode::ExportPrompt(ExportPrompt::new(&self.settings.export_file_name))
    }

    /// Push the trimmed search text into the grid filter.
    fn search_changed(&mut self) {
        let keyword = self.search.trim().to_string();
        if let Err(err) = self.table.set_filter(&self.conn, &keyword) {
            self.refresh_failed(&err);
        }
    }

    fn refresh_table(&mut self) {
        if let Err(err) = self.table.refresh(&self.conn) {
            self.refresh_failed(&err);
        }
    }

    /// A failed reload keeps the previous rows and reports in the footer.
    fn refresh_failed(&mut self, err: &anyhow::Error) {
        error!(error = ?err, "failed to refresh records");
        self.set_status(
            format!("Failed to refresh records: {}", surface_error(err)),
            StatusKind::Error,
        );
    }

    fn export_to(&mut self, raw: &str) -> Mode {
        let path = ensure_csv_extension(Path::new(raw));
        match export_csv(&self.conn, &path) {
            Ok(count) => {
                self.set_status(
                    format!("Exported {count} records to {}.", path.display()),
                    StatusKind::Info,
                );
                let message = format!(
                    "Data exported successfully!\n{count} records written to {}.",
                    path.display()
                );
                self.last_export = Some(path);
                Mode::Notice(Notice::new("Success", message, NoticeKind::Info))
            }
            Err(err) => self.failure_notice("Export Failed", &err),
        }
    }

    fn failure_notice(&mut self, title: &str, err: &anyhow::Error) -> Mode {
        error!(error = ?err, "{title}");
        let message = surface_error(err);
        self.set_status(message.clone(), StatusKind::Error);
        Mode::Notice(Notice::new(title, message, NoticeKind::Error))
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::F(10) => return Ok(Mode::Menu(MenuState::default())),
            KeyCode::F(1) => {
                self.tab = Tab::Books;
                return Ok(Mode::Normal);
            }
            KeyCode::F(2) => {
                self.tab = Tab::Export;
                return Ok(Mode::Normal);
            }
            _ => {}
        }

        match self.tab {
            Tab::Books => self.handle_books_key(code),
            Tab::Export => Ok(self.handle_export_tab_key(code)),
        }
    }

    fn handle_books_key(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Tab => {
                self.cycle_focus(1);
                return Ok(Mode::Normal);
            }
            KeyCode::BackTab => {
                self.cycle_focus(-1);
                return Ok(Mode::Normal);
            }
            _ => {}
        }

        match self.focus {
            Focus::Form => match code {
                KeyCode::Enter => return self.save(),
                KeyCode::Backspace => self.form.backspace(),
                KeyCode::Up => self.cycle_focus(-1),
                KeyCode::Down => self.cycle_focus(1),
                KeyCode::Char(ch) => {
                    self.form.push_char(ch);
                }
                _ => {}
            },
            Focus::Search => match code {
                KeyCode::Backspace => {
                    self.search.pop();
                    self.search_changed();
                }
                KeyCode::Esc => {
                    self.search.clear();
                    self.search_changed();
                }
                KeyCode::Enter | KeyCode::Down => self.focus_table(),
                KeyCode::Char(ch) if !ch.is_control() => {
                    self.search.push(ch);
                    self.search_changed();
                }
                _ => {}
            },
            Focus::Table => match code {
                KeyCode::Up => self.table.move_selection(-1),
                KeyCode::Down => self.table.move_selection(1),
                KeyCode::PageUp => self.table.move_selection(-PAGE_STEP),
                KeyCode::PageDown => self.table.move_selection(PAGE_STEP),
                KeyCode::Home => self.table.select_first(),
                KeyCode::End => self.table.select_last(),
                KeyCode::Left => self.table.move_column(-1),
                KeyCode::Right => self.table.move_column(1),
                KeyCode::Char('/') => self.focus = Focus::Search,
                KeyCode::Delete | KeyCode::Char('-') => return Ok(self.request_delete()),
                KeyCode::Enter => {
                    if let Some(edit) = self.table.begin_edit() {
                        self.clear_status();
                        return Ok(Mode::EditingCell(edit));
                    }
                    if self.table.selected().is_some() {
                        self.set_status("The ID column is read-only.", StatusKind::Info);
                    }
                }
                _ => {}
            },
        }

        Ok(Mode::Normal)
    }

    fn handle_export_tab_key(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E') => {
                return self.request_export();
            }
            KeyCode::Char('o') | KeyCode::Char('O') => match self.last_export.clone() {
                Some(path) => match open_file(&path) {
                    Ok(()) => self.set_status(
                        format!("Opened {}.", path.display()),
                        StatusKind::Info,
                    ),
                    Err(err) => self.set_status(
                        format!("Failed to open export: {err}"),
                        StatusKind::Error,
                    ),
                },
                None => self.set_status("Nothing exported yet.", StatusKind::Error),
            },
            KeyCode::Esc => self.tab = Tab::Books,
            _ => {}
        }
        Mode::Normal
    }

    fn handle_menu(&mut self, code: KeyCode, mut menu: MenuState, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::F(10) => Ok(Mode::Normal),
            KeyCode::Left => {
                menu.switch_menu(-1);
                Ok(Mode::Menu(menu))
            }
            KeyCode::Right => {
                menu.switch_menu(1);
                Ok(Mode::Menu(menu))
            }
            KeyCode::Up => {
                menu.move_item(-1);
                Ok(Mode::Menu(menu))
            }
            KeyCode::Down => {
                menu.move_item(1);
                Ok(Mode::Menu(menu))
            }
            KeyCode::Enter => self.perform(menu.current(), exit),
            _ => Ok(Mode::Menu(menu)),
        }
    }

    fn handle_edit_cell(&mut self, code: KeyCode, mut edit: CellEdit) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Backspace => {
                edit.backspace();
                Ok(Mode::EditingCell(edit))
            }
            KeyCode::Char(ch) => {
                edit.push_char(ch);
                Ok(Mode::EditingCell(edit))
            }
            KeyCode::Enter => match self.table.commit_edit(&self.conn, &edit) {
                Ok(true) => {
                    self.set_status(
                        format!("Updated {} of book ID {}.", edit.field.label(), edit.book_id),
                        StatusKind::Info,
                    );
                    Ok(Mode::Normal)
                }
                Ok(false) => Ok(Mode::Normal),
                Err(err) => match book_error(&err) {
                    Some(book_err) if book_err.is_validation() => {
                        edit.error = Some(surface_error(&err));
                        Ok(Mode::EditingCell(edit))
                    }
                    _ => Ok(self.failure_notice("Update Failed", &err)),
                },
            },
            _ => Ok(Mode::EditingCell(edit)),
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match delete_book(&self.conn, confirm.id) {
                    Ok(removed) => {
                        let text = if removed {
                            format!("Deleted book ID {}.", confirm.id)
                        } else {
                            format!("Book ID {} was already gone; nothing deleted.", confirm.id)
                        };
                        self.set_status(text, StatusKind::Info);
                        self.refresh_table();
                        Ok(Mode::Normal)
                    }
                    Err(err) => Ok(self.failure_notice("Delete Failed", &err)),
                }
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn handle_export_prompt(&mut self, code: KeyCode, mut prompt: ExportPrompt) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Export cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Backspace => {
                prompt.backspace();
                Mode::ExportPrompt(prompt)
            }
            KeyCode::Char(ch) => {
                prompt.push_char(ch);
                Mode::ExportPrompt(prompt)
            }
            KeyCode::Enter => {
                let raw = prompt.path.trim();
                if raw.is_empty() {
                    self.set_status("Export cancelled.", StatusKind::Info);
                    Mode::Normal
                } else {
                    self.export_to(raw)
                }
            }
            _ => Mode::ExportPrompt(prompt),
        }
    }

    /// Walk the focus ring Title → Author → Year → Search → Table.
    fn cycle_focus(&mut self, offset: isize) {
        const RING: usize = BookField::ALL.len() + 2;
        let current = match self.focus {
            Focus::Form => self.form.active.column_index() - 1,
            Focus::Search => RING - 2,
            Focus::Table => RING - 1,
        };
        let next = (current as isize + offset).rem_euclid(RING as isize) as usize;

        if let Some(field) = BookField::ALL.get(next) {
            self.focus = Focus::Form;
            self.form.active = *field;
        } else if next == RING - 2 {
            self.focus = Focus::Search;
        } else {
            self.focus_table();
        }
    }

    fn focus_table(&mut self) {
        self.focus = Focus::Table;
        if self.table.selected().is_none() {
            self.table.select_first();
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_menu_bar(frame, chunks[0]);
        self.draw_tabs(frame, chunks[1]);
        match self.tab {
            Tab::Books => self.draw_books_tab(frame, chunks[2]),
            Tab::Export => self.draw_export_tab(frame, chunks[2]),
        }
        self.draw_footer(frame, chunks[3]);

        match &self.mode {
            Mode::Normal => {}
            Mode::Menu(menu) => self.draw_menu(frame, chunks[0], area, menu),
            Mode::EditingCell(edit) => self.draw_cell_edit(frame, area, edit),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::ExportPrompt(prompt) => self.draw_export_prompt(frame, area, prompt),
            Mode::Notice(notice) => self.draw_notice(frame, area, notice),
        }
    }

    fn draw_menu_bar(&self, frame: &mut Frame, area: Rect) {
        let open = match &self.mode {
            Mode::Menu(menu) => Some(menu.menu),
            _ => None,
        };
        let mut spans = Vec::new();
        for (idx, (name, _)) in MENUS.iter().enumerate() {
            let style = if open == Some(idx) {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            spans.push(Span::styled(format!(" {name} "), style));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            "  F10 menu",
            Style::default().fg(Color::DarkGray),
        ));
        spans.push(Span::styled(
            format!("   {APP_TITLE}"),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let tabs = Tabs::new(Tab::TITLES.to_vec())
            .select(self.tab.index())
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .divider("|");
        frame.render_widget(tabs, area);
    }

    fn draw_books_tab(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(FORM_HEIGHT),
                Constraint::Length(SEARCH_HEIGHT),
                Constraint::Min(0),
            ])
            .split(area);

        let show_cursor = matches!(self.mode, Mode::Normal);

        let form_focused = self.focus == Focus::Form;
        let form_block = Block::default()
            .borders(Borders::ALL)
            .title("New Book")
            .border_style(focus_border(form_focused));
        let form_inner = form_block.inner(chunks[0]);
        let lines: Vec<Line> = BookField::ALL
            .iter()
            .map(|field| self.form.build_line(*field, form_focused))
            .collect();
        frame.render_widget(Paragraph::new(lines).block(form_block), chunks[0]);
        if form_focused && show_cursor {
            let field = self.form.active;
            let prefix = format!("{}: ", field.label()).chars().count();
            let value_len = self.form.value(field).chars().count();
            frame.set_cursor_position((
                form_inner.x + (prefix + value_len) as u16,
                form_inner.y + (field.column_index() - 1) as u16,
            ));
        }

        let search_focused = self.focus == Focus::Search;
        let search_block = Block::default()
            .borders(Borders::ALL)
            .title("Search Title")
            .border_style(focus_border(search_focused));
        let search_inner = search_block.inner(chunks[1]);
        let search_text = if self.search.is_empty() && !search_focused {
            Line::from(Span::styled(
                "Search title...",
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Line::from(self.search.clone())
        };
        frame.render_widget(Paragraph::new(search_text).block(search_block), chunks[1]);
        if search_focused && show_cursor {
            frame.set_cursor_position((
                search_inner.x + self.search.chars().count() as u16,
                search_inner.y,
            ));
        }

        self.draw_table(frame, chunks[2]);
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::Table;
        let rows = self.table.rows();
        let title = if self.table.filter().is_empty() {
            format!("Books ({})", rows.len())
        } else {
            format!("Books matching '{}' ({})", self.table.filter(), rows.len())
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(focus_border(focused));

        if rows.is_empty() {
            let message = if self.table.filter().is_empty() {
                "No books yet. Fill in the form and press Enter to add one."
            } else {
                "No titles match the search."
            };
            let paragraph = Paragraph::new(message)
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let header = Row::new(COLUMN_TITLES.iter().map(|title| Cell::from(*title)))
            .style(Style::default().add_modifier(Modifier::BOLD));
        let cursor_style = Style::default().fg(Color::Black).bg(Color::Yellow);
        let selected = self.table.selected();

        let body = rows.iter().enumerate().map(|(idx, book)| {
            let is_selected = selected == Some(idx);
            let cells = (0..COLUMN_COUNT).map(|column| {
                let cell = Cell::from(book.cell(column));
                if is_selected && focused && column == self.table.column() {
                    cell.style(cursor_style)
                } else {
                    cell
                }
            });
            let row = Row::new(cells);
            if is_selected {
                row.style(Style::default().bg(Color::DarkGray))
            } else {
                row
            }
        });

        let widths = [
            Constraint::Length(6),
            Constraint::Percentage(45),
            Constraint::Percentage(35),
            Constraint::Length(6),
        ];
        let table = Table::new(body, widths)
            .header(header)
            .block(block)
            .column_spacing(1);
        let mut state = TableState::default().with_selected(selected);
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_export_tab(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Export");
        let last = match &self.last_export {
            Some(path) => path.display().to_string(),
            None => "none yet".to_string(),
        };
        let total = count_books(&self.conn)
            .map(|count| count.to_string())
            .unwrap_or_else(|_| "?".to_string());
        let lines = vec![
            Line::from("Press Enter to export every book to a CSV file."),
            Line::from(""),
            Line::from(format!("Books in catalog: {total}")),
            Line::from(format!("Default file: {}", self.settings.export_file_name)),
            Line::from(format!("Last export: {last}")),
        ];
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match (&self.mode, self.tab, self.focus) {
            (Mode::Menu(_), _, _) => key_hints(&[
                ("←→", "Menu"),
                ("↑↓", "Item"),
                ("Enter", "Select"),
                ("Esc", "Close"),
            ]),
            (Mode::Notice(_), _, _) => key_hints(&[("Enter", "Dismiss")]),
            (Mode::ConfirmDelete(_), _, _) => key_hints(&[("y", "Delete"), ("n", "Keep")]),
            (Mode::EditingCell(_), _, _) | (Mode::ExportPrompt(_), _, _) => {
                key_hints(&[("Enter", "Confirm"), ("Esc", "Cancel")])
            }
            (Mode::Normal, Tab::Export, _) => key_hints(&[
                ("Enter", "Export to CSV"),
                ("o", "Open last export"),
                ("F1", "Book Data"),
                ("^Q", "Quit"),
            ]),
            (Mode::Normal, Tab::Books, Focus::Table) => key_hints(&[
                ("↑↓←→", "Move"),
                ("Enter", "Edit cell"),
                ("Del", "Delete"),
                ("Tab", "Next"),
                ("^E", "Export"),
                ("^Q", "Quit"),
            ]),
            (Mode::Normal, Tab::Books, _) => key_hints(&[
                ("Tab", "Next field"),
                ("Enter/^S", "Save"),
                ("^F", "Search"),
                ("^D", "Delete"),
                ("^E", "Export"),
                ("^Q", "Quit"),
            ]),
        }
    }

    fn draw_menu(&self, frame: &mut Frame, bar: Rect, area: Rect, menu: &MenuState) {
        let offset: usize = MENUS
            .iter()
            .take(menu.menu)
            .map(|(name, _)| name.chars().count() + 3)
            .sum();
        let items = menu.items();
        let width = items
            .iter()
            .map(|action| action.label().chars().count())
            .max()
            .unwrap_or(0) as u16
            + 4;
        let popup = Rect {
            x: bar.x + offset as u16,
            y: bar.y + 1,
            width,
            height: items.len() as u16 + 2,
        }
        .intersection(area);
        frame.render_widget(Clear, popup);

        let lines: Vec<Line> = items
            .iter()
            .enumerate()
            .map(|(idx, action)| {
                if idx == menu.item {
                    Line::from(Span::styled(
                        format!(" {} ", action.label()),
                        Style::default().fg(Color::Black).bg(Color::Cyan),
                    ))
                } else {
                    Line::from(format!(" {} ", action.label()))
                }
            })
            .collect();
        let block = Block::default().borders(Borders::ALL);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }

    fn draw_cell_edit(&self, frame: &mut Frame, area: Rect, edit: &CellEdit) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let label = edit.field.label();
        let block = Block::default()
            .title(format!("Edit {label} (book ID {})", edit.book_id))
            .borders(Borders::ALL);
        let inner = block.inner(popup_area);

        let mut lines = vec![input_line(label, &edit.input, true), Line::from("")];
        if let Some(error) = &edit.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            popup_area,
        );

        let prefix = format!("{label}: ").chars().count();
        frame.set_cursor_position((
            inner.x + (prefix + edit.input.chars().count()) as u16,
            inner.y,
        ));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Confirm").borders(Borders::ALL);
        let width = block.inner(popup_area).width as usize;
        let lines = vec![
            Line::from(format!("Delete book ID {}?", confirm.id)),
            Line::from(truncate(&confirm.title, width)),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }

    fn draw_export_prompt(&self, frame: &mut Frame, area: Rect, prompt: &ExportPrompt) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Save CSV").borders(Borders::ALL);
        let inner = block.inner(popup_area);
        let lines = vec![
            input_line("File", &prompt.path, true),
            Line::from(""),
            Line::from(Span::styled(
                "A .csv suffix is added when missing. Enter to export • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            popup_area,
        );

        frame.set_cursor_position((
            inner.x + ("File: ".len() + prompt.path.chars().count()) as u16,
            inner.y,
        ));
    }

    fn draw_notice(&self, frame: &mut Frame, area: Rect, notice: &Notice) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(notice.title.clone())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(notice.kind.color()));
        let mut lines: Vec<Line> = notice
            .message
            .lines()
            .map(|line| Line::from(line.to_string()))
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Enter to continue.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }
}

fn focus_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tempfile::TempDir;

    use super::*;
    use crate::db::{fetch_books, open_in_memory, read_csv};

    fn app() -> (App, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::with_data_dir(dir.path());
        settings.export_file_name = dir.path().join("katalog").display().to_string();
        let app = App::new(open_in_memory().unwrap(), settings).unwrap();
        (app, dir)
    }

    fn seeded_app() -> (App, TempDir) {
        let (mut app, dir) = app();
        create_book(&app.conn, "Harry Potter", "J. K. Rowling", "1997").unwrap();
        create_book(&app.conn, "Bumi Manusia", "Pramoedya Ananta Toer", "1980").unwrap();
        create_book(&app.conn, "Harry's Game", "Gerald Seymour", "1975").unwrap();
        app.table.refresh(&app.conn).unwrap();
        (app, dir)
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(code).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn fill_form(app: &mut App, title: &str, author: &str, year: &str) {
        type_text(app, title);
        press(app, KeyCode::Tab);
        type_text(app, author);
        press(app, KeyCode::Tab);
        type_text(app, year);
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn save_inserts_and_clears_the_form() {
        let (mut app, _dir) = app();
        fill_form(&mut app, "  Laskar Pelangi ", "Andrea Hirata", " 2005 ");
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        assert!(app.form.title.is_empty() && app.form.author.is_empty() && app.form.year.is_empty());
        assert_eq!(app.form.active, BookField::Title);

        let books = fetch_books(&app.conn, "").unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Laskar Pelangi");
        assert_eq!(books[0].year, 2005);
        assert_eq!(app.table.rows(), books.as_slice());
    }

    #[test]
    fn invalid_save_warns_and_keeps_input() {
        let (mut app, _dir) = app();
        fill_form(&mut app, "Dune", "Frank Herbert", "19x5");
        press(&mut app, KeyCode::Enter);

        match &app.mode {
            Mode::Notice(notice) => {
                assert_eq!(notice.kind, NoticeKind::Warning);
                assert_eq!(notice.message, SAVE_WARNING);
            }
            _ => panic!("expected a warning notice"),
        }
        assert_eq!(app.form.year, "19x5");
        assert_eq!(count_books(&app.conn).unwrap(), 0);

        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.form.title, "Dune");
    }

    #[test]
    fn ctrl_s_saves_from_any_focus() {
        let (mut app, _dir) = app();
        fill_form(&mut app, "Dune", "Frank Herbert", "1965");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Search);

        assert!(!app.handle_shortcut('s').unwrap());
        assert_eq!(count_books(&app.conn).unwrap(), 1);
    }

    #[test]
    fn delete_without_selection_warns() {
        let (mut app, _dir) = seeded_app();
        app.handle_shortcut('d').unwrap();

        match &app.mode {
            Mode::Notice(notice) => assert_eq!(notice.message, NO_SELECTION_WARNING),
            _ => panic!("expected a warning notice"),
        }
        assert_eq!(count_books(&app.conn).unwrap(), 3);
    }

    #[test]
    fn delete_asks_for_confirmation() {
        let (mut app, _dir) = seeded_app();
        app.focus_table();
        press(&mut app, KeyCode::Down);
        let target = app.table.current_book().unwrap().id;

        press(&mut app, KeyCode::Delete);
        match &app.mode {
            Mode::ConfirmDelete(confirm) => assert_eq!(confirm.id, target),
            _ => panic!("expected a confirmation"),
        }
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(count_books(&app.conn).unwrap(), 3);

        app.handle_shortcut('d').unwrap();
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(count_books(&app.conn).unwrap(), 2);
        assert!(app.table.rows().iter().all(|book| book.id != target));
    }

    #[test]
    fn editing_a_cell_writes_through_and_moves_right() {
        let (mut app, _dir) = seeded_app();
        app.focus_table();
        press(&mut app, KeyCode::Down);
        assert_eq!(app.table.column(), 1);

        press(&mut app, KeyCode::Enter);
        let Mode::EditingCell(edit) = &app.mode else {
            panic!("expected the edit prompt");
        };
        assert_eq!(edit.input, "Bumi Manusia");

        for _ in 0.."Manusia".len() {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "Pertiwi");
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.table.rows()[1].title, "Bumi Pertiwi");
        assert_eq!(app.table.rows()[1].author, "Pramoedya Ananta Toer");
        assert_eq!(app.table.column(), 2);
    }

    #[test]
    fn id_column_ignores_edit_requests() {
        let (mut app, _dir) = seeded_app();
        app.focus_table();
        press(&mut app, KeyCode::Left);
        assert_eq!(app.table.column(), 0);

        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn bad_year_edit_keeps_the_prompt_open() {
        let (mut app, _dir) = seeded_app();
        app.focus_table();
        app.table.select_cell(0, 3);

        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "x");
        press(&mut app, KeyCode::Enter);

        let Mode::EditingCell(edit) = &app.mode else {
            panic!("prompt should stay open");
        };
        assert!(edit.error.is_some());
        assert_eq!(app.table.rows()[0].year, 1997);

        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn typing_in_search_filters_the_grid() {
        let (mut app, _dir) = seeded_app();
        app.handle_shortcut('f').unwrap();
        assert_eq!(app.focus, Focus::Search);

        type_text(&mut app, " Harry ");
        assert_eq!(app.table.filter(), "Harry");
        assert_eq!(app.table.rows().len(), 2);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.table.rows().len(), 3);
    }

    #[test]
    fn export_appends_suffix_and_reports_success() {
        let (mut app, dir) = seeded_app();
        app.handle_shortcut('e').unwrap();
        assert!(matches!(app.mode, Mode::ExportPrompt(_)));

        press(&mut app, KeyCode::Enter);
        let expected = dir.path().join("katalog.csv");
        assert_eq!(app.last_export.as_deref(), Some(expected.as_path()));
        match &app.mode {
            Mode::Notice(notice) => assert_eq!(notice.kind, NoticeKind::Info),
            _ => panic!("expected a success notice"),
        }
        assert_eq!(read_csv(&expected).unwrap().len(), 3);
    }

    #[test]
    fn blank_export_path_cancels() {
        let (mut app, _dir) = seeded_app();
        app.tab = Tab::Export;
        press(&mut app, KeyCode::Enter);
        let Mode::ExportPrompt(prompt) = &app.mode else {
            panic!("expected the export prompt");
        };
        for _ in 0..prompt.path.chars().count() {
            press(&mut app, KeyCode::Backspace);
        }
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        assert!(app.last_export.is_none());
    }

    #[test]
    fn menu_dispatches_actions() {
        let (mut app, _dir) = seeded_app();

        press(&mut app, KeyCode::F(10));
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Notice(_)));
        press(&mut app, KeyCode::Esc);

        press(&mut app, KeyCode::F(10));
        press(&mut app, KeyCode::Up);
        assert!(press(&mut app, KeyCode::Enter));
    }

    #[test]
    fn focus_ring_visits_every_widget() {
        let (mut app, _dir) = seeded_app();
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push((app.focus, app.form.active));
            press(&mut app, KeyCode::Tab);
        }
        assert_eq!(app.focus, Focus::Form);
        assert_eq!(app.form.active, BookField::Title);
        assert!(seen.contains(&(Focus::Search, BookField::Year)));
        assert!(seen.iter().any(|(focus, _)| *focus == Focus::Table));
        assert_eq!(app.table.selected(), Some(0));

        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, Focus::Table);
    }

    #[test]
    fn storage_failure_while_searching_is_reported_in_footer() {
        let (mut app, _dir) = seeded_app();
        app.handle_shortcut('f').unwrap();
        app.conn.execute_batch("DROP TABLE Buku").unwrap();

        assert!(!press(&mut app, KeyCode::Char('x')));
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.search, "x");
        assert_eq!(app.table.rows().len(), 3);

        let status = app.status.as_ref().unwrap();
        assert!(matches!(status.kind, StatusKind::Error));
        assert!(status.text.contains("no such table: Buku"));
    }

    #[test]
    fn confirming_delete_of_vanished_row_says_nothing_was_removed() {
        let (mut app, _dir) = seeded_app();
        app.focus_table();
        press(&mut app, KeyCode::Down);
        let target = app.table.current_book().unwrap().id;

        press(&mut app, KeyCode::Delete);
        assert!(matches!(app.mode, Mode::ConfirmDelete(_)));
        delete_book(&app.conn, target).unwrap();

        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Normal));
        let status = app.status.as_ref().unwrap();
        assert!(status.text.contains("nothing deleted"));
        assert_eq!(app.table.rows().len(), 2);
    }

    #[test]
    fn render_shows_tabs_grid_and_export_view() {
        let (mut app, _dir) = seeded_app();
        let screen = render(&app);
        assert!(screen.contains("F1 Book Data"));
        assert!(screen.contains("F2 Export"));
        assert!(screen.contains("Title"));
        assert!(screen.contains("Harry Potter"));
        assert!(screen.contains("Books (3)"));
        assert!(screen.contains(APP_TITLE));

        press(&mut app, KeyCode::F(2));
        let screen = render(&app);
        assert!(screen.contains("Press Enter to export"));
        assert!(screen.contains("Books in catalog: 3"));
        assert!(screen.contains("Last export: none yet"));
    }
}
