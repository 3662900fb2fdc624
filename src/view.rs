//! Visible package list
//!
//! The visible list is always rebuilt from the full package list and the
//! ledger. It is never filtered in place, so hiding a row can't make the
//! traversal skip its neighbour.
//!
//! Rows and the selection are stored as positions into the full package
//! list. That way "nearest preceding visible entry" is a plain comparison.

use std::rc::Rc;

use crate::ledger::{Ledger, LedgerError};
use crate::types::*;

/// Whether `disposition` is shown in the current mode
pub fn is_visible(disposition: Disposition, hidden: bool) -> bool {
    !hidden || !disposition.is_kept()
}

/// Positions in `all` of the entries that should be shown, in order.
pub fn compute(
    all: &[Rc<PackageEntry>],
    ledger: &Ledger,
    hidden: bool,
) -> Result<Vec<usize>, LedgerError> {
    let mut rows = Vec::with_capacity(all.len());
    for (pos, pkg) in all.iter().enumerate() {
        if is_visible(ledger.get(&pkg.name)?, hidden) {
            rows.push(pos);
        }
    }
    Ok(rows)
}

pub struct VisibleSet {
    hidden: bool,
    rows: Vec<usize>,
    /// Index into `rows`
    selected: Option<usize>,
    /// Last package the user picked. Toggling visibility prefers it, so
    /// toggling twice brings the cursor back even after a fallback.
    anchor: Option<usize>,
}

impl VisibleSet {
    pub fn new(all: &[Rc<PackageEntry>], ledger: &Ledger, hidden: bool) -> Result<Self, LedgerError> {
        let rows = compute(all, ledger, hidden)?;
        let selected = if rows.is_empty() { None } else { Some(0) };
        let anchor = selected.map(|row| rows[row]);
        Ok(Self {
            hidden,
            rows,
            selected,
            anchor,
        })
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Positions in the full list, in display order
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Selected row within the visible list
    pub fn selected_row(&self) -> Option<usize> {
        self.selected
    }

    /// Position of the selected package in the full list
    pub fn selected(&self) -> Option<usize> {
        self.selected.map(|row| self.rows[row])
    }

    /// Rebuild after a ledger change. The selection survives if still
    /// visible, otherwise it falls back (see `fallback_row`).
    pub fn refresh(&mut self, all: &[Rc<PackageEntry>], ledger: &Ledger) -> Result<(), LedgerError> {
        let target = self.selected();
        self.rebuild(all, ledger, target)?;
        self.anchor = self.selected();
        Ok(())
    }

    /// Flip hidden mode. No ledger change, so toggling twice restores the
    /// same rows and the same selection.
    pub fn toggle_visibility(&mut self, all: &[Rc<PackageEntry>], ledger: &Ledger) -> Result<(), LedgerError> {
        self.hidden = !self.hidden;
        let target = self.anchor.or(self.selected());
        self.rebuild(all, ledger, target)
    }

    fn rebuild(
        &mut self,
        all: &[Rc<PackageEntry>],
        ledger: &Ledger,
        target: Option<usize>,
    ) -> Result<(), LedgerError> {
        self.rows = compute(all, ledger, self.hidden)?;
        self.selected = match target {
            Some(pos) => self.fallback_row(pos),
            None if self.rows.is_empty() => None,
            None => Some(0),
        };
        Ok(())
    }

    /// Row of `pos` if visible; else the nearest visible row before it;
    /// else the first row; else nothing.
    fn fallback_row(&self, pos: usize) -> Option<usize> {
        if self.rows.is_empty() {
            return None;
        }
        // rows is sorted; Err(n) means n rows come before pos
        match self.rows.binary_search(&pos) {
            Ok(row) => Some(row),
            Err(0) => Some(0),
            Err(after) => Some(after - 1),
        }
    }

    /// Move the selection by `delta` rows, clamped at both ends.
    /// Returns whether the selection changed.
    pub fn move_by(&mut self, delta: isize) -> bool {
        let Some(current) = self.selected else {
            return false;
        };
        let last = self.rows.len() as isize - 1;
        let next = (current as isize + delta).clamp(0, last) as usize;
        self.select_row(next)
    }

    /// Select a row directly. Out of range rows are ignored. Picking the
    /// current row still makes it the anchor.
    pub fn select_row(&mut self, row: usize) -> bool {
        let Some(&pos) = self.rows.get(row) else {
            return false;
        };
        self.anchor = Some(pos);
        let changed = self.selected != Some(row);
        self.selected = Some(row);
        changed
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn setup(names: &[&str]) -> (Vec<Rc<PackageEntry>>, Ledger) {
        let all: Vec<_> = names.iter().map(|n| Rc::new(PackageEntry::new(*n, 1))).collect();
        let ledger = Ledger::from_entries(&all, &HashSet::new());
        (all, ledger)
    }

    fn names(all: &[Rc<PackageEntry>], view: &VisibleSet) -> Vec<String> {
        view.rows().iter().map(|&pos| all[pos].name.clone()).collect()
    }

    fn selected_name(all: &[Rc<PackageEntry>], view: &VisibleSet) -> Option<String> {
        view.selected().map(|pos| all[pos].name.clone())
    }

    #[test]
    fn hidden_mode_drops_kept_in_order() {
        let (all, mut ledger) = setup(&["A", "B", "C", "D"]);
        ledger.set("B", Disposition::KeepForever).unwrap();
        ledger.set("C", Disposition::KeepForever).unwrap();

        let view = VisibleSet::new(&all, &ledger, true).unwrap();
        assert_eq!(names(&all, &view), ["A", "D"]);
    }

    #[test]
    fn removal_marks_stay_visible_when_hidden() {
        let (all, mut ledger) = setup(&["A", "B", "C"]);
        ledger.set("A", Disposition::MarkForRemoval).unwrap();
        ledger.set("B", Disposition::KeepForNow).unwrap();

        let rows = compute(&all, &ledger, true).unwrap();
        assert_eq!(rows, vec![0, 2]);
        assert_eq!(compute(&all, &ledger, false).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn hiding_the_selection_falls_back_to_previous() {
        let (all, mut ledger) = setup(&["A", "B", "C"]);
        let mut view = VisibleSet::new(&all, &ledger, true).unwrap();
        assert!(view.move_by(1));
        assert_eq!(selected_name(&all, &view).as_deref(), Some("B"));

        ledger.set("B", Disposition::KeepForever).unwrap();
        view.refresh(&all, &ledger).unwrap();
        assert_eq!(names(&all, &view), ["A", "C"]);
        assert_eq!(selected_name(&all, &view).as_deref(), Some("A"));
    }

    #[test]
    fn hiding_the_first_row_falls_back_to_new_first() {
        let (all, mut ledger) = setup(&["A", "B", "C"]);
        let mut view = VisibleSet::new(&all, &ledger, true).unwrap();

        ledger.set("A", Disposition::KeepForNow).unwrap();
        view.refresh(&all, &ledger).unwrap();
        assert_eq!(selected_name(&all, &view).as_deref(), Some("B"));
        assert_eq!(view.selected_row(), Some(0));
    }

    #[test]
    fn hiding_everything_leaves_no_selection() {
        let (all, mut ledger) = setup(&["A"]);
        let mut view = VisibleSet::new(&all, &ledger, true).unwrap();

        ledger.set("A", Disposition::KeepForNow).unwrap();
        view.refresh(&all, &ledger).unwrap();
        assert!(view.is_empty());
        assert_eq!(view.selected(), None);
        assert!(!view.move_by(1));

        ledger.set("A", Disposition::KeepForNow).unwrap();
        view.refresh(&all, &ledger).unwrap();
        assert_eq!(selected_name(&all, &view).as_deref(), Some("A"));
    }

    #[test]
    fn unmarking_reshows_in_hidden_mode() {
        let (all, mut ledger) = setup(&["A", "B"]);
        ledger.set("B", Disposition::KeepForever).unwrap();
        let mut view = VisibleSet::new(&all, &ledger, true).unwrap();
        assert_eq!(names(&all, &view), ["A"]);

        ledger.set("B", Disposition::KeepForever).unwrap();
        view.refresh(&all, &ledger).unwrap();
        assert_eq!(names(&all, &view), ["A", "B"]);
        assert_eq!(selected_name(&all, &view).as_deref(), Some("A"));
    }

    #[test]
    fn toggling_twice_restores_rows_and_selection() {
        let (all, mut ledger) = setup(&["A", "B", "C", "D"]);
        ledger.set("C", Disposition::KeepForever).unwrap();
        let mut view = VisibleSet::new(&all, &ledger, false).unwrap();
        view.move_by(2);
        assert_eq!(selected_name(&all, &view).as_deref(), Some("C"));
        let rows = view.rows().to_vec();

        view.toggle_visibility(&all, &ledger).unwrap();
        assert!(view.is_hidden());
        assert_eq!(names(&all, &view), ["A", "B", "D"]);
        assert_eq!(selected_name(&all, &view).as_deref(), Some("B"));

        view.toggle_visibility(&all, &ledger).unwrap();
        assert!(!view.is_hidden());
        assert_eq!(view.rows(), rows.as_slice());
        assert_eq!(selected_name(&all, &view).as_deref(), Some("C"));
    }

    #[test]
    fn movement_does_not_wrap() {
        let (all, ledger) = setup(&["A", "B", "C"]);
        let mut view = VisibleSet::new(&all, &ledger, false).unwrap();

        assert!(!view.move_by(-1));
        assert_eq!(view.selected_row(), Some(0));
        assert!(view.move_by(10_000));
        assert_eq!(view.selected_row(), Some(2));
        assert!(!view.move_by(1));
        assert!(!view.select_row(7));
        assert!(view.select_row(1));
        assert_eq!(selected_name(&all, &view).as_deref(), Some("B"));
    }

    #[test]
    fn reselecting_after_a_fallback_moves_the_anchor() {
        let (all, mut ledger) = setup(&["A", "B", "C", "D"]);
        ledger.set("C", Disposition::KeepForever).unwrap();
        let mut view = VisibleSet::new(&all, &ledger, false).unwrap();
        view.move_by(2);
        view.toggle_visibility(&all, &ledger).unwrap();
        assert_eq!(selected_name(&all, &view).as_deref(), Some("B"));

        // Clicking the row that is already selected
        assert!(!view.select_row(1));
        view.toggle_visibility(&all, &ledger).unwrap();
        assert_eq!(selected_name(&all, &view).as_deref(), Some("B"));
    }

    #[test]
    fn bumping_the_edge_moves_the_anchor() {
        let (all, mut ledger) = setup(&["A", "B", "C"]);
        ledger.set("B", Disposition::KeepForNow).unwrap();
        let mut view = VisibleSet::new(&all, &ledger, false).unwrap();
        view.move_by(1);
        view.toggle_visibility(&all, &ledger).unwrap();
        assert_eq!(selected_name(&all, &view).as_deref(), Some("A"));

        assert!(!view.move_by(-1));
        view.toggle_visibility(&all, &ledger).unwrap();
        assert_eq!(selected_name(&all, &view).as_deref(), Some("A"));
    }
}
