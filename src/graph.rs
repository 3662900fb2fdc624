//! Installed package graph and size attribution
//!
//! Parses `pacman -Qi` output into a dependency graph, picks the top-level
//! packages (nothing installed requires them) and attributes to each its own
//! size plus every dependency that only it pulls in. Dependencies shared by
//! two or more top-level packages are attributed to none of them.

use std::collections::{HashMap, HashSet};

use crate::pacman::PacmanError;
use crate::types::PackageEntry;

/// One block of `pacman -Qi` output, reduced to what the graph needs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    pub size: u64,
    pub depends: Vec<String>,
    pub provides: Vec<String>,
}

/// Parse a size like `12.50 MiB` into bytes.
pub fn parse_size(text: &str) -> Option<u64> {
    let mut parts = text.split_whitespace();
    let value: f64 = parts.next()?.parse().ok()?;
    let unit = match parts.next().unwrap_or("B") {
        "B" => 1.0,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "TiB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    Some((value * unit).round().max(0.0) as u64)
}

/// Strip a version constraint: `zlib>=1.2` -> `zlib`, `libfoo.so=1-64` -> `libfoo.so`
fn bare_name(dep: &str) -> &str {
    let end = dep.find(['<', '>', '=']).unwrap_or(dep.len());
    &dep[..end]
}

fn split_list(value: &str) -> Vec<String> {
    if value.trim() == "None" {
        return Vec::new();
    }
    value
        .split_whitespace()
        .map(|dep| bare_name(dep).to_string())
        .filter(|dep| !dep.is_empty())
        .collect()
}

/// Parse `LC_ALL=C pacman -Qi` output (all installed packages).
pub fn parse_query_info(text: &str) -> Result<Vec<InstalledPackage>, PacmanError> {
    let mut packages = Vec::new();
    let mut current = InstalledPackage::default();
    let mut seen_field = false;
    let mut last_key = String::new();

    let mut finish = |pkg: &mut InstalledPackage, seen: &mut bool| -> Result<(), PacmanError> {
        if *seen {
            if pkg.name.is_empty() {
                return Err(PacmanError::Parse("package block without a Name field".to_string()));
            }
            packages.push(std::mem::take(pkg));
        }
        *seen = false;
        Ok(())
    };

    for line in text.lines() {
        if line.trim().is_empty() {
            finish(&mut current, &mut seen_field)?;
            continue;
        }

        // Wrapped values continue on lines indented past the colon
        let (key, value) = match line.split_once(" : ") {
            Some((key, value)) if !line.starts_with(' ') => (key.trim().to_string(), value),
            _ => (last_key.clone(), line.trim()),
        };
        seen_field = true;

        match key.as_str() {
            "Name" => current.name = value.trim().to_string(),
            "Installed Size" => {
                current.size = parse_size(value).ok_or_else(|| {
                    PacmanError::Parse(format!("bad installed size '{}' for {}", value.trim(), current.name))
                })?;
            }
            "Depends On" => current.depends.extend(split_list(value)),
            "Provides" => current.provides.extend(split_list(value)),
            _ => {}
        }
        last_key = key;
    }
    finish(&mut current, &mut seen_field)?;

    Ok(packages)
}

/// Top-level packages with their attributed sizes, largest first.
pub fn removable_packages(installed: &[InstalledPackage]) -> Vec<PackageEntry> {
    let by_name: HashMap<&str, usize> = installed
        .iter()
        .enumerate()
        .map(|(idx, pkg)| (pkg.name.as_str(), idx))
        .collect();

    // Real names win over provides, first provider wins among provides
    let mut provider: HashMap<&str, usize> = HashMap::new();
    for (idx, pkg) in installed.iter().enumerate() {
        for provided in &pkg.provides {
            provider.entry(provided.as_str()).or_insert(idx);
        }
    }
    provider.extend(by_name.iter().map(|(name, idx)| (*name, *idx)));

    let deps: Vec<Vec<usize>> = installed
        .iter()
        .enumerate()
        .map(|(idx, pkg)| {
            let mut resolved: Vec<usize> = pkg
                .depends
                .iter()
                .filter_map(|dep| provider.get(dep.as_str()).copied())
                .filter(|&dep| dep != idx)
                .collect();
            resolved.sort_unstable();
            resolved.dedup();
            resolved
        })
        .collect();

    let mut required = vec![false; installed.len()];
    for targets in &deps {
        for &dep in targets {
            required[dep] = true;
        }
    }
    let toplevel: Vec<usize> = (0..installed.len()).filter(|&idx| !required[idx]).collect();

    // For every package: how many top-level packages reach it, and the last one seen
    let mut owners: Vec<(usize, usize)> = vec![(0, 0); installed.len()];
    let reach: Vec<HashSet<usize>> = toplevel.iter().map(|&top| reachable(top, &deps)).collect();
    for (top, reached) in toplevel.iter().zip(&reach) {
        for &pkg in reached {
            owners[pkg].0 += 1;
            owners[pkg].1 = *top;
        }
    }

    let mut entries: Vec<PackageEntry> = toplevel
        .iter()
        .zip(&reach)
        .map(|(&top, reached)| {
            let size = reached
                .iter()
                .filter(|&&pkg| owners[pkg] == (1, top))
                .map(|&pkg| installed[pkg].size)
                .sum();
            PackageEntry::new(installed[top].name.clone(), size)
        })
        .collect();

    entries.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name)));
    entries
}

/// Every package reachable from `start`, including itself
fn reachable(start: usize, deps: &[Vec<usize>]) -> HashSet<usize> {
    let mut seen = HashSet::from([start]);
    let mut stack = vec![start];
    while let Some(pkg) = stack.pop() {
        for &dep in &deps[pkg] {
            if seen.insert(dep) {
                stack.push(dep);
            }
        }
    }
    seen
}
