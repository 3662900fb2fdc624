//! Package detail text, cached per package and width
//!
//! `pacman -Qi` is a process spawn, and the cursor revisits the same
//! packages constantly, so each (name, width) pair is fetched once.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::pacman::PackageManager;

#[derive(Default)]
pub struct DetailCache {
    entries: HashMap<(String, u16), String>,
}

impl DetailCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached text, fetching it on a miss. A failed query is shown as its
    /// error message and not cached, so the next visit retries.
    pub fn get_or_fetch(&mut self, manager: &dyn PackageManager, name: &str, width: u16) -> String {
        let key = (name.to_string(), width);
        if let Some(text) = self.entries.get(&key) {
            return text.clone();
        }

        debug!(package = name, width, "detail cache miss");
        match manager.query_info(name, width) {
            Ok(text) => {
                self.entries.insert(key, text.clone());
                text
            }
            Err(e) => {
                warn!(package = name, error = %e, "package info unavailable");
                e.to_string()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
