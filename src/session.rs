//! Session controller
//!
//! Owns the package list, the ledger and the visible list for one run, and
//! turns input actions into ledger and view operations. Nothing here knows
//! about terminals: the TUI translates keys into `Action`s and reads back
//! through the accessors.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::ledger::{Ledger, LedgerError};
use crate::stats;
use crate::types::*;
use crate::view::VisibleSet;

pub struct Session {
    packages: Vec<Rc<PackageEntry>>,
    ledger: Ledger,
    view: VisibleSet,
    state: AppState,
    /// Kept names with no package this run. Written back untouched.
    stale_keeps: Vec<String>,
}

impl Session {
    /// Start a session over `packages`, pre-seeding `keep` as kept forever.
    pub fn new(packages: Vec<PackageEntry>, keep: &[String], hidden: bool) -> Result<Self, LedgerError> {
        let mut seen = HashSet::new();
        let packages: Vec<Rc<PackageEntry>> = packages
            .into_iter()
            .filter(|pkg| {
                let fresh = seen.insert(pkg.name.clone());
                if !fresh {
                    warn!(package = %pkg.name, "duplicate package in index, ignoring");
                }
                fresh
            })
            .map(Rc::new)
            .collect();

        let keep_set: HashSet<String> = keep.iter().cloned().collect();
        let ledger = Ledger::from_entries(&packages, &keep_set);
        let stale_keeps: Vec<String> = keep
            .iter()
            .filter(|name| !ledger.contains(name))
            .cloned()
            .collect();
        if !stale_keeps.is_empty() {
            debug!(count = stale_keeps.len(), "kept packages not offered this run");
        }

        let view = VisibleSet::new(&packages, &ledger, hidden)?;
        Ok(Self {
            packages,
            ledger,
            view,
            state: AppState::Browsing,
            stale_keeps,
        })
    }

    pub fn handle(&mut self, action: Action) -> Result<Effect, LedgerError> {
        if self.state == AppState::Exiting {
            return Ok(Effect::Nothing);
        }

        match action {
            Action::Quit => {
                self.state = AppState::Exiting;
                Ok(Effect::Quit)
            }
            Action::ToggleRemove => self.toggle(Disposition::MarkForRemoval),
            Action::ToggleKeepForNow => self.toggle(Disposition::KeepForNow),
            Action::ToggleKeepForever => self.toggle(Disposition::KeepForever),
            Action::ToggleVisibility => {
                self.view.toggle_visibility(&self.packages, &self.ledger)?;
                Ok(Effect::ViewChanged {
                    hidden: self.view.is_hidden(),
                })
            }
            Action::MoveUp => Ok(Self::moved(self.view.move_by(-1))),
            Action::MoveDown => Ok(Self::moved(self.view.move_by(1))),
            Action::MoveBy(delta) => Ok(Self::moved(self.view.move_by(delta))),
            Action::SelectRow(row) => Ok(Self::moved(self.view.select_row(row))),
            Action::Select => Ok(Self::moved(self.view.selected().is_some())),
        }
    }

    fn moved(changed: bool) -> Effect {
        if changed {
            Effect::SelectionChanged
        } else {
            Effect::Nothing
        }
    }

    fn toggle(&mut self, disposition: Disposition) -> Result<Effect, LedgerError> {
        let Some(pos) = self.view.selected() else {
            return Ok(Effect::Nothing);
        };
        let name = self.packages[pos].name.clone();
        let now = self.ledger.set(&name, disposition)?;
        self.view.refresh(&self.packages, &self.ledger)?;
        Ok(Effect::DispositionChanged { name, now })
    }

    // === Accessors ===

    pub fn is_exiting(&self) -> bool {
        self.state == AppState::Exiting
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn view(&self) -> &VisibleSet {
        &self.view
    }

    pub fn selected_package(&self) -> Option<&PackageEntry> {
        self.view.selected().map(|pos| self.packages[pos].as_ref())
    }

    /// Visible packages with their current dispositions, in display order
    pub fn visible_rows(&self) -> Result<Vec<(Rc<PackageEntry>, Disposition)>, LedgerError> {
        self.view
            .rows()
            .iter()
            .map(|&pos| {
                let pkg = &self.packages[pos];
                Ok((Rc::clone(pkg), self.ledger.get(&pkg.name)?))
            })
            .collect()
    }

    pub fn summary(&self) -> String {
        stats::render(self.packages.len(), &self.ledger)
    }

    /// Everything that should end up in the keep file
    pub fn keep_list(&self) -> Vec<String> {
        let mut names = self.ledger.keep_forever_names();
        names.extend(self.stale_keeps.iter().cloned());
        names
    }

    pub fn removal_list(&self) -> Vec<String> {
        self.ledger.mark_for_removal_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(names: &[&str], keep: &[&str], hidden: bool) -> Session {
        let packages = names.iter().map(|n| PackageEntry::new(*n, 1)).collect();
        let keep: Vec<String> = keep.iter().map(|n| n.to_string()).collect();
        Session::new(packages, &keep, hidden).unwrap()
    }

    fn visible(session: &Session) -> Vec<String> {
        session
            .visible_rows()
            .unwrap()
            .into_iter()
            .map(|(pkg, _)| pkg.name.clone())
            .collect()
    }

    fn selected(session: &Session) -> Option<&str> {
        session.selected_package().map(|p| p.name.as_str())
    }

    #[test]
    fn no_silent_skip_when_hiding_neighbours() {
        let mut s = session(&["A", "B", "C", "D"], &[], false);
        s.handle(Action::MoveDown).unwrap();
        s.handle(Action::ToggleKeepForever).unwrap();
        s.handle(Action::MoveDown).unwrap();
        s.handle(Action::ToggleKeepForever).unwrap();
        assert_eq!(visible(&s), ["A", "B", "C", "D"]);

        assert_eq!(
            s.handle(Action::ToggleVisibility).unwrap(),
            Effect::ViewChanged { hidden: true }
        );
        assert_eq!(visible(&s), ["A", "D"]);
    }

    #[test]
    fn keeping_selection_in_hidden_mode_falls_back() {
        let mut s = session(&["A", "B", "C"], &[], true);
        s.handle(Action::MoveDown).unwrap();
        assert_eq!(selected(&s), Some("B"));

        let effect = s.handle(Action::ToggleKeepForever).unwrap();
        assert_eq!(
            effect,
            Effect::DispositionChanged {
                name: "B".to_string(),
                now: Disposition::KeepForever
            }
        );
        assert_eq!(visible(&s), ["A", "C"]);
        assert_eq!(selected(&s), Some("A"));
    }

    #[test]
    fn toggles_apply_to_selection_only() {
        let mut s = session(&["A", "B"], &[], false);
        s.handle(Action::MoveDown).unwrap();
        s.handle(Action::ToggleRemove).unwrap();
        assert_eq!(s.removal_list(), ["B"]);
        assert_eq!(s.ledger().get("A"), Ok(Disposition::None));

        s.handle(Action::ToggleKeepForNow).unwrap();
        assert!(s.removal_list().is_empty());
        assert_eq!(s.ledger().get("B"), Ok(Disposition::KeepForNow));
        // Not hidden, so B stays selected
        assert_eq!(selected(&s), Some("B"));
    }

    #[test]
    fn toggles_without_selection_do_nothing() {
        let mut s = session(&["A"], &["A"], true);
        assert_eq!(s.selected_package(), None);
        assert_eq!(s.handle(Action::ToggleRemove).unwrap(), Effect::Nothing);
        assert_eq!(s.handle(Action::MoveDown).unwrap(), Effect::Nothing);
        assert_eq!(s.handle(Action::Select).unwrap(), Effect::Nothing);
    }

    #[test]
    fn quit_stops_accepting_input() {
        let mut s = session(&["A", "B"], &[], false);
        assert_eq!(s.handle(Action::Quit).unwrap(), Effect::Quit);
        assert!(s.is_exiting());
        assert_eq!(s.handle(Action::ToggleRemove).unwrap(), Effect::Nothing);
        assert_eq!(s.handle(Action::MoveDown).unwrap(), Effect::Nothing);
        assert!(s.removal_list().is_empty());
        assert_eq!(selected(&s), Some("A"));
    }

    #[test]
    fn navigation_reports_selection_changes() {
        let mut s = session(&["A", "B", "C"], &[], false);
        assert_eq!(s.handle(Action::MoveUp).unwrap(), Effect::Nothing);
        assert_eq!(s.handle(Action::MoveBy(10)).unwrap(), Effect::SelectionChanged);
        assert_eq!(selected(&s), Some("C"));
        assert_eq!(s.handle(Action::SelectRow(0)).unwrap(), Effect::SelectionChanged);
        assert_eq!(s.handle(Action::SelectRow(9)).unwrap(), Effect::Nothing);
        assert_eq!(s.handle(Action::Select).unwrap(), Effect::SelectionChanged);
    }

    #[test]
    fn stale_keeps_survive_into_keep_list() {
        let mut s = session(&["A", "B"], &["gone", "B"], true);
        assert_eq!(visible(&s), ["A"]);
        s.handle(Action::ToggleKeepForever).unwrap();
        assert_eq!(s.keep_list(), ["A", "B", "gone"]);
    }

    #[test]
    fn duplicate_index_entries_are_dropped() {
        let packages = vec![PackageEntry::new("A", 1), PackageEntry::new("A", 2)];
        let s = Session::new(packages, &[], false).unwrap();
        assert_eq!(s.package_count(), 1);
        assert_eq!(visible(&s), ["A"]);
    }

    #[test]
    fn clicking_a_row_marks_it() {
        let mut s = session(&["A", "B", "C"], &[], true);
        assert_eq!(s.handle(Action::SelectRow(2)).unwrap(), Effect::SelectionChanged);
        s.handle(Action::ToggleRemove).unwrap();
        assert_eq!(s.removal_list(), ["C"]);
        assert_eq!(selected(&s), Some("C"));

        // Clicking it again clears the mark
        assert_eq!(s.handle(Action::SelectRow(2)).unwrap(), Effect::Nothing);
        s.handle(Action::ToggleRemove).unwrap();
        assert!(s.removal_list().is_empty());
    }
}
