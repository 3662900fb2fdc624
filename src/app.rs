//! TUI application state and logic
//!
//! This module contains TUI-specific state and acts as an adapter between
//! the session (core logic) and the ratatui UI.

use std::rc::Rc;

use color_eyre::Result;
use ratatui::layout::Rect;
use ratatui::widgets::TableState;

use getrid::details::DetailCache;
use getrid::pacman::PackageManager;
use getrid::session::Session;
use getrid::types::*;

/// Details pane state and cached data
#[derive(Default)]
pub struct DetailsState {
    pub scroll: u16,
    pub width: u16,
    pub text: String,
    pub cache: DetailCache,
    /// Name and width the current `text` was fetched for
    shown: Option<(String, u16)>,
}

/// TUI Application - wraps the Session with UI state
pub struct App {
    /// Core logic: ledger, visible list, selection
    pub session: Session,
    manager: Box<dyn PackageManager>,

    /// TUI-specific state
    pub table_state: TableState,
    /// Snapshot of the visible rows, rebuilt after every action
    pub rows: Vec<(Rc<PackageEntry>, Disposition)>,
    /// Where the package table was last drawn, for mouse hit-testing
    pub table_area: Rect,
    pub details: DetailsState,
    pub status_message: String,
}

impl App {
    pub fn new(session: Session, manager: Box<dyn PackageManager>) -> Result<Self> {
        let mut app = Self {
            session,
            manager,
            table_state: TableState::default(),
            rows: Vec::new(),
            table_area: Rect::default(),
            details: DetailsState::default(),
            status_message: String::new(),
        };
        app.refresh_ui_state()?;
        app.update_status_message();
        Ok(app)
    }

    pub fn handle(&mut self, action: Action) -> Result<()> {
        match self.session.handle(action)? {
            Effect::Nothing | Effect::Quit => return Ok(()),
            Effect::SelectionChanged => self.details.scroll = 0,
            Effect::ViewChanged { .. } => self.update_status_message(),
            Effect::DispositionChanged { name, now } => {
                self.status_message = format!("{name}: {}", now.label());
            }
        }
        self.refresh_ui_state()
    }

    /// Re-read the session after it changed
    fn refresh_ui_state(&mut self) -> Result<()> {
        self.rows = self.session.visible_rows()?;
        self.table_state.select(self.session.view().selected_row());
        self.update_details();
        Ok(())
    }

    pub fn update_status_message(&mut self) {
        let mode = if self.session.view().is_hidden() {
            "kept packages hidden"
        } else {
            "showing all"
        };
        self.status_message = format!(
            "{} removable packages | {mode} | Press 'q' when done",
            self.session.package_count()
        );
    }

    // === Details (cached pacman -Qi) ===

    /// Called before every frame with the width of the details pane.
    pub fn set_detail_width(&mut self, width: u16) {
        if self.details.width != width {
            self.details.width = width;
            self.update_details();
        }
    }

    fn update_details(&mut self) {
        let Some(name) = self.session.selected_package().map(|p| p.name.clone()) else {
            self.details.shown = None;
            self.details.text.clear();
            return;
        };
        let key = (name, self.details.width);
        if self.details.shown.as_ref() == Some(&key) {
            return;
        }
        self.details.text = self
            .details
            .cache
            .get_or_fetch(self.manager.as_ref(), &key.0, key.1);
        self.details.shown = Some(key);
        self.details.scroll = 0;
    }

    pub fn scroll_details(&mut self, delta: i32) {
        let max_scroll = self.details.text.lines().count().saturating_sub(1) as i32;
        let current = self.details.scroll as i32;
        self.details.scroll = (current + delta).clamp(0, max_scroll) as u16;
    }

    // === Mouse ===

    /// Visible-list row under a click, accounting for border, header and
    /// the table's scroll offset.
    pub fn row_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.table_area;
        let first_row_y = area.y + 2;
        let inside = column > area.x
            && column < area.x + area.width.saturating_sub(1)
            && row >= first_row_y
            && row < area.y + area.height.saturating_sub(1);
        if !inside {
            return None;
        }
        let idx = self.table_state.offset() + (row - first_row_y) as usize;
        (idx < self.rows.len()).then_some(idx)
    }
}

#[cfg(test)]
mod tests {
    use getrid::pacman::PacmanError;

    use super::*;

    struct NoPacman;

    impl PackageManager for NoPacman {
        fn query_info(&self, name: &str, _width: u16) -> Result<String, PacmanError> {
            Ok(format!("Name : {name}"))
        }

        fn remove(&self, _names: &[String]) -> Result<(), PacmanError> {
            unreachable!("the TUI never removes")
        }
    }

    fn app() -> App {
        let packages = vec![PackageEntry::new("a", 1), PackageEntry::new("b", 2)];
        let session = Session::new(packages, &[], true).unwrap();
        App::new(session, Box::new(NoPacman)).unwrap()
    }

    #[test]
    fn visibility_toggle_restores_the_mode_line() {
        let mut app = app();
        assert!(app.status_message.contains("kept packages hidden"));

        app.handle(Action::ToggleRemove).unwrap();
        assert_eq!(app.status_message, "a: Marked for removal");

        app.handle(Action::ToggleVisibility).unwrap();
        assert!(app.status_message.contains("showing all"));
        assert!(app.status_message.contains("Press 'q' when done"));

        app.handle(Action::ToggleVisibility).unwrap();
        assert!(app.status_message.contains("kept packages hidden"));
    }

    #[test]
    fn details_follow_the_selection() {
        let mut app = app();
        assert_eq!(app.details.text, "Name : a");
        app.handle(Action::MoveDown).unwrap();
        assert_eq!(app.details.text, "Name : b");
        assert_eq!(app.table_state.selected(), Some(1));
    }
}
