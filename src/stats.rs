//! Summary of the ledger shown next to the package list

use crate::ledger::Ledger;
use crate::types::*;

/// Render the fixed-shape summary.
///
/// The reclaimable size is a lower bound: sizes are attributed per top-level
/// package, so dependencies shared between two marked packages are not
/// counted. Hence the `>=`.
pub fn render(total_packages: usize, ledger: &Ledger) -> String {
    let tallies = ledger.tallies();
    format!(
        "Packages:        {total_packages}\n\
         Marked removal:  {}\n\
         Kept forever:    {}\n\
         Kept for now:    {}\n\
         Reclaimable:     >={}",
        tallies.remove.count,
        tallies.keep_forever.count,
        tallies.keep_for_now.count,
        human_size(ledger.reclaimable_size()),
    )
}
