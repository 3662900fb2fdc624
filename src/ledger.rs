//! Disposition ledger
//!
//! The ledger is the single source of truth for what the user decided about
//! each package. It also keeps a running count and size per disposition, so
//! statistics never have to walk the whole package list.
//!
//! Invariants maintained by `set()`:
//! - a package holds at most one of KeepForever / KeepForNow / MarkForRemoval
//! - setting the disposition a package already holds clears it to `None`
//! - each tally equals the count and summed size of the entries holding it

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::types::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The view and the ledger disagree about which packages exist
    #[error("package '{name}' is not known to the ledger")]
    NotFound { name: String },
}

/// Count and summed size of the packages holding one disposition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub count: usize,
    pub size: u64,
}

impl Tally {
    fn add(&mut self, size: u64) {
        self.count += 1;
        self.size += size;
    }

    fn sub(&mut self, size: u64) {
        self.count -= 1;
        self.size -= size;
    }
}

/// Snapshot of all three tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tallies {
    pub keep_forever: Tally,
    pub keep_for_now: Tally,
    pub remove: Tally,
}

impl Tallies {
    pub fn get(&self, disposition: Disposition) -> Tally {
        match disposition {
            Disposition::None => Tally::default(),
            Disposition::KeepForever => self.keep_forever,
            Disposition::KeepForNow => self.keep_for_now,
            Disposition::MarkForRemoval => self.remove,
        }
    }

    fn get_mut(&mut self, disposition: Disposition) -> Option<&mut Tally> {
        match disposition {
            Disposition::None => None,
            Disposition::KeepForever => Some(&mut self.keep_forever),
            Disposition::KeepForNow => Some(&mut self.keep_for_now),
            Disposition::MarkForRemoval => Some(&mut self.remove),
        }
    }
}

struct LedgerEntry {
    package: Rc<PackageEntry>,
    disposition: Disposition,
}

pub struct Ledger {
    entries: Vec<LedgerEntry>,
    by_name: HashMap<String, usize>,
    tallies: Tallies,
}

impl Ledger {
    /// Build a fresh ledger with every package undecided, except those named
    /// in `keep`, which start as `KeepForever`.
    ///
    /// Later duplicates of a name are ignored.
    pub fn from_entries(packages: &[Rc<PackageEntry>], keep: &HashSet<String>) -> Self {
        let mut ledger = Self {
            entries: Vec::with_capacity(packages.len()),
            by_name: HashMap::with_capacity(packages.len()),
            tallies: Tallies::default(),
        };

        for pkg in packages {
            if ledger.by_name.contains_key(&pkg.name) {
                continue;
            }
            let disposition = if keep.contains(&pkg.name) {
                ledger.tallies.keep_forever.add(pkg.size);
                Disposition::KeepForever
            } else {
                Disposition::None
            };
            ledger.by_name.insert(pkg.name.clone(), ledger.entries.len());
            ledger.entries.push(LedgerEntry {
                package: Rc::clone(pkg),
                disposition,
            });
        }

        ledger
    }

    fn position(&self, name: &str) -> Result<usize, LedgerError> {
        self.by_name.get(name).copied().ok_or_else(|| LedgerError::NotFound {
            name: name.to_string(),
        })
    }

    /// Toggle `disposition` on `name` and return what the package holds now.
    ///
    /// Setting the held disposition again (or `None`) clears it. Setting a
    /// different one replaces it. Tallies follow both steps.
    pub fn set(&mut self, name: &str, disposition: Disposition) -> Result<Disposition, LedgerError> {
        let idx = self.position(name)?;
        let entry = &mut self.entries[idx];
        let current = entry.disposition;
        let next = if disposition == current {
            Disposition::None
        } else {
            disposition
        };

        if next == current {
            return Ok(current);
        }

        let size = entry.package.size;
        if let Some(tally) = self.tallies.get_mut(current) {
            tally.sub(size);
        }
        if let Some(tally) = self.tallies.get_mut(next) {
            tally.add(size);
        }
        entry.disposition = next;

        debug!(package = name, from = ?current, to = ?next, "disposition changed");
        Ok(next)
    }

    pub fn get(&self, name: &str) -> Result<Disposition, LedgerError> {
        Ok(self.entries[self.position(name)?].disposition)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tallies(&self) -> Tallies {
        self.tallies
    }

    /// Lower bound of the space freed by removing everything marked.
    pub fn reclaimable_size(&self) -> u64 {
        self.tallies.remove.size
    }

    /// Packages and their dispositions, in package list order
    pub fn iter(&self) -> impl Iterator<Item = (&PackageEntry, Disposition)> {
        self.entries.iter().map(|e| (e.package.as_ref(), e.disposition))
    }

    fn names_with(&self, disposition: Disposition) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.disposition == disposition)
            .map(|e| e.package.name.clone())
            .collect()
    }

    pub fn keep_forever_names(&self) -> Vec<String> {
        self.names_with(Disposition::KeepForever)
    }

    pub fn mark_for_removal_names(&self) -> Vec<String> {
        self.names_with(Disposition::MarkForRemoval)
    }
}
