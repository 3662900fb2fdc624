//! Common types used throughout the application

use ratatui::prelude::*;
use serde::{Deserialize, Serialize};

/// What the user decided to do with a package.
///
/// `None` means undecided. The other three are mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disposition {
    #[default]
    None,
    KeepForever,
    KeepForNow,
    MarkForRemoval,
}

impl Disposition {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::None => " ",
            Self::KeepForever => "=",
            Self::KeepForNow => "~",
            Self::MarkForRemoval => "-",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::None => Color::Reset,
            Self::KeepForever => Color::Green,
            Self::KeepForNow => Color::Blue,
            Self::MarkForRemoval => Color::Red,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "Undecided",
            Self::KeepForever => "Kept forever",
            Self::KeepForNow => "Kept for now",
            Self::MarkForRemoval => "Marked for removal",
        }
    }

    /// Keep dispositions are suppressed from the list in hidden mode.
    pub fn is_kept(&self) -> bool {
        matches!(self, Self::KeepForever | Self::KeepForNow)
    }
}

/// One removable package and the disk space attributed to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub name: String,
    pub size: u64,
}

impl PackageEntry {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    pub fn size_str(&self) -> String {
        human_size(self.size)
    }
}

/// Format a byte count with binary units, e.g. `12.5 MB`.
pub fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Browsing,
    Exiting,
}

/// Input events understood by the session, already decoupled from keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleRemove,
    ToggleKeepForNow,
    ToggleKeepForever,
    ToggleVisibility,
    MoveUp,
    MoveDown,
    /// Relative jump, clamped at both ends (page up/down, home/end)
    MoveBy(isize),
    /// Select a row of the visible list directly (mouse click)
    SelectRow(usize),
    /// Re-request the details of the current selection
    Select,
}

/// What a handled action changed, so the presentation knows what to refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Nothing,
    SelectionChanged,
    ViewChanged { hidden: bool },
    DispositionChanged { name: String, now: Disposition },
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_size_picks_unit() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(human_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn only_keep_dispositions_are_kept() {
        assert!(Disposition::KeepForever.is_kept());
        assert!(Disposition::KeepForNow.is_kept());
        assert!(!Disposition::MarkForRemoval.is_kept());
        assert!(!Disposition::None.is_kept());
    }
}
