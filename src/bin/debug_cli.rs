//! Debug CLI for exercising the disposition ledger without a terminal UI
//!
//! Usage:
//!   cargo run --bin debug_cli -- <command> [args]
//!
//! Commands:
//!   status                           Show tallies and all decided packages
//!   info <name>                      Show a package's size and disposition
//!   toggle <name> <remove|keep|now>  Toggle a disposition (same as the TUI keys)
//!   reset                            Clear all dispositions
//!   list [hidden]                    List packages, optionally as hidden mode shows them

use std::collections::{BTreeMap, HashSet};
use std::env;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use color_eyre::Result;
use color_eyre::eyre::{bail, eyre};

use getrid::keepfile;
use getrid::ledger::Ledger;
use getrid::pacman::{PackageIndex, Pacman};
use getrid::stats;
use getrid::types::*;
use getrid::view;

const STATE_FILE: &str = "debug_state.json";

fn main() -> Result<()> {
    color_eyre::install()?;

    let args: Vec<String> = env::args().collect();
    let cmd = args.get(1).map(String::as_str).unwrap_or("help");

    match cmd {
        "status" => cmd_status()?,
        "info" => {
            let name = args.get(2).ok_or_else(|| eyre!("Usage: info <package_name>"))?;
            cmd_info(name)?;
        }
        "toggle" => {
            let name = args.get(2).ok_or_else(|| eyre!("Usage: toggle <package_name> <remove|keep|now>"))?;
            let which = args.get(3).map(String::as_str).unwrap_or("remove");
            cmd_toggle(name, which)?;
        }
        "reset" => cmd_reset()?,
        "list" => cmd_list(args.get(2).map(String::as_str))?,
        _ => {
            println!("Debug CLI for the getrid disposition ledger");
            println!();
            println!("Commands:");
            println!("  status                           Show tallies and all decided packages");
            println!("  info <name>                      Show a package's size and disposition");
            println!("  toggle <name> <remove|keep|now>  Toggle a disposition");
            println!("  reset                            Clear all dispositions");
            println!("  list [hidden]                    List packages");
            println!();
            println!("Example flow:");
            println!("  cli reset");
            println!("  cli toggle firefox remove   # MarkForRemoval");
            println!("  cli toggle firefox keep     # KeepForever, removal mark cleared");
            println!("  cli toggle firefox keep     # back to None");
        }
    }

    Ok(())
}

fn cmd_status() -> Result<()> {
    let state = load_state()?;
    let ledger = &state.ledger;

    println!("=== Ledger Status ===");
    println!();
    println!("{}", stats::render(state.package_count(), ledger));
    println!();

    let decided: Vec<_> = ledger.iter().filter(|(_, d)| *d != Disposition::None).collect();
    if decided.is_empty() {
        println!("No packages decided.");
    } else {
        println!("Decided packages ({}):", decided.len());
        for (pkg, disposition) in decided {
            println!("  {} {:>10} {}", disposition.symbol(), pkg.size_str(), pkg.name);
        }
    }

    Ok(())
}

fn cmd_info(name: &str) -> Result<()> {
    let state = load_state()?;

    match state.ledger.iter().find(|(p, _)| p.name == name) {
        Some((pkg, disposition)) => {
            println!("{}: {} ({})", pkg.name, disposition.label(), pkg.size_str());
        }
        None => {
            println!("Package '{name}' not found");
        }
    }

    Ok(())
}

fn cmd_toggle(name: &str, which: &str) -> Result<()> {
    let disposition = parse_disposition(which)?;
    let mut state = load_state()?;

    if !state.ledger.contains(name) {
        println!("Package '{name}' not found");
        return Ok(());
    }

    let before = state.ledger.get(name)?;
    let after = state.ledger.set(name, disposition)?;
    println!("=== Toggle {name} ({which}) ===");
    println!("{} -> {}", before.label(), after.label());
    println!();
    println!("{}", stats::render(state.package_count(), &state.ledger));

    save_state(&state)?;
    Ok(())
}

fn cmd_reset() -> Result<()> {
    if Path::new(STATE_FILE).exists() {
        fs::remove_file(STATE_FILE)?;
    }
    println!("All dispositions cleared.");
    Ok(())
}

fn cmd_list(mode: Option<&str>) -> Result<()> {
    let hidden = match mode {
        None | Some("all") => false,
        Some("hidden") => true,
        Some(m) => bail!("Unknown mode: {m}. Use 'all' or 'hidden'"),
    };
    let state = load_state()?;

    let rows: Vec<_> = state
        .ledger
        .iter()
        .filter(|(_, d)| view::is_visible(*d, hidden))
        .collect();
    println!("Packages ({} of {}):", rows.len(), state.package_count());
    println!();

    for (pkg, disposition) in rows.iter().take(30) {
        println!("  {} {:>10} {}", disposition.symbol(), pkg.size_str(), pkg.name);
    }

    if rows.len() > 30 {
        println!("  ... and {} more", rows.len() - 30);
    }

    Ok(())
}

fn parse_disposition(which: &str) -> Result<Disposition> {
    Ok(match which {
        "remove" => Disposition::MarkForRemoval,
        "keep" => Disposition::KeepForever,
        "now" => Disposition::KeepForNow,
        "none" => Disposition::None,
        other => bail!("Unknown disposition: {other}. Use remove, keep, now or none"),
    })
}

// === State persistence ===

/// Dispositions replayed on top of the keep file, keyed by package name
#[derive(serde::Serialize, serde::Deserialize, Default)]
struct SavedState {
    dispositions: BTreeMap<String, Disposition>,
}

/// Ledger rebuilt from pacman and the keep file on every call
struct DebugState {
    packages: Vec<Rc<PackageEntry>>,
    ledger: Ledger,
}

impl DebugState {
    fn package_count(&self) -> usize {
        self.packages.len()
    }
}

fn load_state() -> Result<DebugState> {
    let keep: HashSet<String> = keepfile::default_path()
        .map(|path| keepfile::load(&path))
        .unwrap_or_default()
        .into_iter()
        .collect();
    let packages: Vec<Rc<PackageEntry>> = Pacman::new()
        .list_removable_packages()?
        .into_iter()
        .map(Rc::new)
        .collect();
    let mut state = DebugState {
        ledger: Ledger::from_entries(&packages, &keep),
        packages,
    };

    if Path::new(STATE_FILE).exists() {
        let content = fs::read_to_string(STATE_FILE)?;
        let saved: SavedState = serde_json::from_str(&content)?;

        // Replay onto the seeded ledger; setting the held value would clear it
        for (name, disposition) in &saved.dispositions {
            if state.ledger.contains(name) && state.ledger.get(name)? != *disposition {
                state.ledger.set(name, *disposition)?;
            }
        }
    }

    Ok(state)
}

fn save_state(state: &DebugState) -> Result<()> {
    let dispositions = state
        .ledger
        .iter()
        .map(|(pkg, d)| (pkg.name.clone(), d))
        .collect();

    let saved = SavedState { dispositions };
    let content = serde_json::to_string_pretty(&saved)?;
    fs::write(STATE_FILE, content)?;
    Ok(())
}
