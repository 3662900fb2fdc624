//! The "always keep" list
//!
//! A plain text file, one package name per line. Read before the ledger is
//! built, written once the terminal has been restored.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use tracing::{debug, info, warn};

const NAME: &str = "getrid";

/// `$XDG_CONFIG_HOME/getrid`, or `~/.getrid` when that isn't set.
pub fn default_path() -> Option<PathBuf> {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir).join(NAME)),
        _ => dirs::home_dir().map(|home| home.join(format!(".{NAME}"))),
    }
}

/// Trimmed, non-empty, de-duplicated names in file order
pub fn parse(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(*line))
        .map(String::from)
        .collect()
}

/// Load the keep list. A missing or unreadable file means "keep nothing".
pub fn load(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let names = parse(&text);
            info!(path = %path.display(), count = names.len(), "keep list loaded");
            names
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no keep list yet");
            Vec::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "keep list unreadable, starting empty");
            Vec::new()
        }
    }
}

/// Write the keep list, one name per line.
pub fn save(path: &Path, names: &[String]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, names.join("\n"))
        .wrap_err_with(|| format!("writing keep list to {}", path.display()))?;
    info!(path = %path.display(), count = names.len(), "keep list saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_dedups() {
        let names = parse("  vim\n\nemacs\r\nvim\n   \nnano");
        assert_eq!(names, ["vim", "emacs", "nano"]);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("nope")).is_empty());
    }

    #[test]
    fn unreadable_file_is_empty() {
        // A directory can't be read as a file
        let dir = tempfile::tempdir().unwrap();
        assert!(load(dir.path()).is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("getrid");
        let names = vec!["b".to_string(), "a".to_string()];

        save(&path, &names).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "b\na");
        assert_eq!(load(&path), names);
    }

    #[test]
    fn save_failure_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = save(dir.path(), &["a".to_string()]).unwrap_err();
        assert!(err.to_string().contains(&dir.path().display().to_string()));
    }
}
