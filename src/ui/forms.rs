use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::BookField;

/// Entry form on the Book Data tab. Values are kept raw; trimming and
/// validation happen when the form is saved.
#[derive(Default, Clone)]
pub(crate) struct EntryForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) year: String,
    pub(crate) active: BookField,
}

impl EntryForm {
    fn value_mut(&mut self, field: BookField) -> &mut String {
        match field {
            BookField::Title => &mut self.title,
            BookField::Author => &mut self.author,
            BookField::Year => &mut self.year,
        }
    }

    pub(crate) fn value(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Year => &self.year,
        }
    }

    /// Append a character to the active field. Control characters are
    /// refused; the year field accepts anything so validation can warn.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let field = self.active;
        self.value_mut(field).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        let field = self.active;
        self.value_mut(field).pop();
    }

    /// Trimmed copies of the three inputs, in title/author/year order.
    pub(crate) fn trimmed(&self) -> (String, String, String) {
        (
            self.title.trim().to_string(),
            self.author.trim().to_string(),
            self.year.trim().to_string(),
        )
    }

    /// Empty every input and put focus back on the title.
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn build_line(&self, field: BookField, focused: bool) -> Line<'static> {
        input_line(field.label(), self.value(field), focused && self.active == field)
    }
}

/// Render `Label: value` with the same focus styling used across dialogs.
pub(crate) fn input_line(label: &str, value: &str, is_active: bool) -> Line<'static> {
    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    let display = if value.is_empty() && !is_active {
        "<required>".to_string()
    } else {
        value.to_string()
    };

    Line::from(vec![
        Span::raw(format!("{label}: ")),
        Span::styled(display, style),
    ])
}

/// Prompt for replacing one cell of the grid.
#[derive(Clone, Debug)]
pub(crate) struct CellEdit {
    pub(crate) book_id: i64,
    pub(crate) row: usize,
    pub(crate) field: BookField,
    pub(crate) input: String,
    pub(crate) error: Option<String>,
}

impl CellEdit {
    pub(crate) fn push_char(&mut self, ch: char) {
        if !ch.is_control() {
            self.input.push(ch);
            self.error = None;
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.input.pop();
        self.error = None;
    }

    /// Blank input counts as a cancellation.
    pub(crate) fn is_blank(&self) -> bool {
        self.input.trim().is_empty()
    }
}

/// Pending delete, waiting for the user's yes/no.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmDelete {
    pub(crate) id: i64,
    pub(crate) title: String,
}

/// Destination prompt for the CSV export.
#[derive(Clone, Debug)]
pub(crate) struct ExportPrompt {
    pub(crate) path: String,
}

impl ExportPrompt {
    pub(crate) fn new(default_path: &str) -> Self {
        Self {
            path: default_path.to_string(),
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) {
        if !ch.is_control() {
            self.path.push(ch);
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.path.pop();
    }
}

/// Modal message shown until dismissed.
#[derive(Clone, Debug)]
pub(crate) struct Notice {
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) kind: NoticeKind,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum NoticeKind {
    Info,
    Warning,
    Error,
}

impl NoticeKind {
    pub(crate) fn color(self) -> Color {
        match self {
            NoticeKind::Info => Color::Green,
            NoticeKind::Warning => Color::Yellow,
            NoticeKind::Error => Color::Red,
        }
    }
}

impl Notice {
    pub(crate) fn new(title: &str, message: impl Into<String>, kind: NoticeKind) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
            kind,
        }
    }
}

/// Everything reachable from the menu bar.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum MenuAction {
    Save,
    Export,
    Exit,
    SearchTitle,
    DeleteRecord,
}

impl MenuAction {
    pub(crate) fn label(self) -> &'static str {
        match self {
            MenuAction::Save => "Save",
            MenuAction::Export => "Export to CSV",
            MenuAction::Exit => "Exit",
            MenuAction::SearchTitle => "Search Title",
            MenuAction::DeleteRecord => "Delete Record",
        }
    }
}

pub(crate) const MENUS: [(&str, &[MenuAction]); 2] = [
    (
        "File",
        &[MenuAction::Save, MenuAction::Export, MenuAction::Exit],
    ),
    ("Edit", &[MenuAction::SearchTitle, MenuAction::DeleteRecord]),
];

/// Open drop-down: which menu and which entry inside it.
#[derive(Clone, Debug, Default)]
pub(crate) struct MenuState {
    pub(crate) menu: usize,
    pub(crate) item: usize,
}

impl MenuState {
    pub(crate) fn items(&self) -> &'static [MenuAction] {
        MENUS[self.menu].1
    }

    /// Move across menus, wrapping, and reset the highlighted entry.
    pub(crate) fn switch_menu(&mut self, offset: isize) {
        let count = MENUS.len() as isize;
        self.menu = (self.menu as isize + offset).rem_euclid(count) as usize;
        self.item = 0;
    }

    pub(crate) fn move_item(&mut self, offset: isize) {
        let count = self.items().len() as isize;
        self.item = (self.item as isize + offset).rem_euclid(count) as usize;
    }

    pub(crate) fn current(&self) -> MenuAction {
        self.items()[self.item]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_form_edits_the_active_field() {
        let mut form = EntryForm::default();
        for ch in "Dune".chars() {
            form.push_char(ch);
        }
        form.active = BookField::Year;
        assert!(form.push_char('1'));
        assert!(!form.push_char('\u{7}'));
        form.push_char('9');
        form.backspace();

        assert_eq!(form.title, "Dune");
        assert_eq!(form.year, "1");

        form.clear();
        assert!(form.title.is_empty());
        assert_eq!(form.active, BookField::Title);
    }

    #[test]
    fn menu_navigation_wraps() {
        let mut menu = MenuState::default();
        menu.move_item(-1);
        assert_eq!(menu.current(), MenuAction::Exit);
        menu.switch_menu(1);
        assert_eq!(menu.current(), MenuAction::SearchTitle);
        menu.switch_menu(1);
        assert_eq!(menu.menu, 0);
    }
}
