//! Final step of a run: show the selection, ask, then remove
//!
//! Runs after the terminal has been restored, so the prompt and pacman's
//! own output go to the normal console.

use std::io::{BufRead, Write};
use std::path::Path;

use color_eyre::Result;
use tracing::{error, info};

use crate::pacman::{PackageManager, lock_message};
use crate::session::Session;
use crate::types::human_size;

pub const PROMPT: &str = "Remove packages? [y/N] ";

/// How the removal step ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NothingSelected,
    DryRun,
    Declined,
    Locked,
    Removed,
}

/// Offer the session's removal list. `remove` is only called after an
/// explicit `y`; a failed removal is returned as an error.
pub fn finish(
    session: &Session,
    manager: &dyn PackageManager,
    lock: &Path,
    dry_run: bool,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Outcome> {
    let names = session.removal_list();
    if names.is_empty() {
        return Ok(Outcome::NothingSelected);
    }

    writeln!(out)?;
    writeln!(out, "Selected for removal: {}", names.join(" "))?;
    writeln!(
        out,
        "At least {} will be freed.",
        human_size(session.ledger().reclaimable_size())
    )?;
    if dry_run {
        writeln!(out, "Dry run, nothing removed.")?;
        return Ok(Outcome::DryRun);
    }

    if !confirm(input, out)? {
        info!("removal declined");
        return Ok(Outcome::Declined);
    }

    if let Some(msg) = lock_message(lock) {
        writeln!(out, "{msg}")?;
        return Ok(Outcome::Locked);
    }

    manager
        .remove(&names)
        .inspect_err(|e| error!(error = %e, "removal failed"))?;
    Ok(Outcome::Removed)
}

/// Only `y`/`Y` counts as yes; EOF is a no.
fn confirm(input: &mut impl BufRead, out: &mut impl Write) -> Result<bool> {
    write!(out, "{PROMPT}")?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
